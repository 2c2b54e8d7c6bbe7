//! Interpolation Matcher: protects placeholders across a translation call
//!
//! Placeholders such as `{name}`, `{{count}}` or `%1$s` must reach the target file
//! byte-for-byte. Before a string is sent to a provider, every recognized placeholder
//! is swapped for an anchor marker (`_ID1_`, `_ID2_`, ...) that translation engines
//! leave alone. After translation the markers are swapped back.
//!
//! Markers are matched by index, so a provider that reorders the sentence still gets
//! every placeholder back in its new position:
//!
//! ```ignore
//! Source:     "{user} sent {count} files"
//! Extracted:  "_ID1_ sent _ID2_ files"
//! Translated: "_ID2_ ファイルを _ID1_ が送信"
//! Reinserted: "{count} ファイルを {user} が送信"
//! ```
//!
//! A marker mismatch never fails the run. [`InterpolationMatcher::reinsert`] replaces
//! what it can and reports the rest in [`Reinsertion`].

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::{SyncError, SyncResult};

const ICU_PATTERN: &str = r"\{[^{}]*\}";
const I18NEXT_PATTERN: &str = r"\{\{[^{}]*\}\}";
const SPRINTF_PATTERN: &str = r"%(?:\d+\$)?[-+0#]*\d*(?:\.\d+)?(?:hh|h|ll|l)?[diouxXeEfFgGcs@]";
const MARKER_PATTERN: &str = r"_ID(\d+)_";
/// Source text that could be confused with a marker once markers sit next to it
const LOOKALIKE_PATTERN: &str = r"_ID\d+_?";

/// Built-in placeholder syntaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    /// No placeholders are recognized; strings pass through verbatim
    None,
    /// ICU / Flutter ARB style: `{name}`
    Icu,
    /// i18next style: `{{name}}`
    I18next,
    /// printf style: `%s`, `%d`, `%1$s`, `%@`
    Sprintf,
    /// User-supplied regular expression
    Custom,
}

/// One placeholder lifted out of a source string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// 1-based index, in source order
    pub index: usize,
    /// The original placeholder text, e.g. `{name}`
    pub token: String,
    /// Byte offset of `token` in the original string
    pub position: usize,
    /// The translation-inert marker that replaced `token`
    pub marker: String,
}

/// Output of [`InterpolationMatcher::extract`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub stripped: String,
    pub placeholders: Vec<Placeholder>,
}

/// Output of [`InterpolationMatcher::reinsert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reinsertion {
    pub value: String,
    /// Tokens whose marker did not survive translation
    pub missing: Vec<String>,
    /// Markers left in place: unknown index, or a repeat of a marker already consumed
    pub unexpected: usize,
}

impl Reinsertion {
    /// True when every placeholder came back exactly once
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unexpected == 0
    }
}

/// Placeholder recognizer configured once per run
#[derive(Clone)]
pub struct InterpolationMatcher {
    kind: MatcherKind,
    pattern: Option<Regex>,
    marker: Regex,
    lookalike: Regex,
}

impl InterpolationMatcher {
    /// Create a matcher for one of the built-in syntaxes
    ///
    /// Use [`InterpolationMatcher::custom`] for [`MatcherKind::Custom`].
    pub fn new(kind: MatcherKind) -> SyncResult<Self> {
        let pattern = match kind {
            MatcherKind::None => None,
            MatcherKind::Icu => Some(ICU_PATTERN),
            MatcherKind::I18next => Some(I18NEXT_PATTERN),
            MatcherKind::Sprintf => Some(SPRINTF_PATTERN),
            MatcherKind::Custom => {
                return Err(SyncError::config(
                    "custom matcher requires a pattern (use 'regex:<pattern>')",
                ));
            }
        };
        Ok(Self {
            kind,
            pattern: pattern.map(compile).transpose()?,
            marker: compile(MARKER_PATTERN)?,
            lookalike: compile(LOOKALIKE_PATTERN)?,
        })
    }

    /// Create a matcher from a user-supplied regular expression
    ///
    /// # Errors
    ///
    /// * `SyncError::Config` - If the pattern does not compile, or matches the empty string
    pub fn custom(pattern: &str) -> SyncResult<Self> {
        let regex = compile(pattern)?;
        if regex.is_match("") {
            return Err(SyncError::config(format!(
                "matcher pattern '{}' matches the empty string",
                pattern
            )));
        }
        Ok(Self {
            kind: MatcherKind::Custom,
            pattern: Some(regex),
            marker: compile(MARKER_PATTERN)?,
            lookalike: compile(LOOKALIKE_PATTERN)?,
        })
    }

    pub fn kind(&self) -> MatcherKind {
        self.kind
    }

    /// Replace every recognized placeholder with an anchor marker
    ///
    /// Text that already looks like a marker (`_ID3_`) is protected the same way, so
    /// it comes back verbatim instead of being mistaken for a placeholder.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let matcher: InterpolationMatcher = "i18next".parse()?;
    /// let extraction = matcher.extract("Hi {{name}}, you have {{count}} messages");
    /// assert_eq!(extraction.stripped, "Hi _ID1_, you have _ID2_ messages");
    /// ```
    pub fn extract(&self, value: &str) -> Extraction {
        let Some(pattern) = &self.pattern else {
            return Extraction {
                stripped: value.to_string(),
                placeholders: Vec::new(),
            };
        };

        let mut spans: Vec<(usize, usize)> = pattern
            .find_iter(value)
            .chain(self.lookalike.find_iter(value))
            .filter(|found| !found.as_str().is_empty())
            .map(|found| (found.start(), found.end()))
            .collect();
        // earliest first; on a tie the longer span wins
        spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut stripped = String::with_capacity(value.len());
        let mut placeholders = Vec::new();
        let mut last = 0;
        for (start, end) in spans {
            if start < last {
                continue;
            }
            let index = placeholders.len() + 1;
            let marker = format!("_ID{}_", index);
            stripped.push_str(&value[last..start]);
            stripped.push_str(&marker);
            last = end;
            placeholders.push(Placeholder {
                index,
                token: value[start..end].to_string(),
                position: start,
                marker,
            });
        }
        stripped.push_str(&value[last..]);

        Extraction {
            stripped,
            placeholders,
        }
    }

    /// Swap anchor markers in `translated` back to their original tokens
    ///
    /// Markers are replaced in the order they appear in `translated`. Each placeholder
    /// is reinserted at most once; repeats and unknown markers are left untouched, and
    /// placeholders whose marker was lost are reported in [`Reinsertion::missing`].
    pub fn reinsert(&self, translated: &str, placeholders: &[Placeholder]) -> Reinsertion {
        if placeholders.is_empty() {
            return Reinsertion {
                value: translated.to_string(),
                missing: Vec::new(),
                unexpected: 0,
            };
        }

        let mut value = String::with_capacity(translated.len());
        let mut consumed = vec![false; placeholders.len()];
        let mut unexpected = 0;
        let mut last = 0;

        for caps in self.marker.captures_iter(translated) {
            let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let slot = digits
                .as_str()
                .parse::<usize>()
                .ok()
                .and_then(|index| placeholders.iter().position(|p| p.index == index));

            match slot {
                Some(slot) if !consumed[slot] => {
                    consumed[slot] = true;
                    value.push_str(&translated[last..whole.start()]);
                    value.push_str(&placeholders[slot].token);
                    last = whole.end();
                }
                _ => unexpected += 1,
            }
        }
        value.push_str(&translated[last..]);

        let missing = placeholders
            .iter()
            .zip(&consumed)
            .filter(|(_, consumed)| !**consumed)
            .map(|(p, _)| p.token.clone())
            .collect();

        Reinsertion {
            value,
            missing,
            unexpected,
        }
    }
}

impl FromStr for InterpolationMatcher {
    type Err = SyncError;

    /// Parse `none`, `icu`, `i18next`, `sprintf` or `regex:<pattern>`
    fn from_str(s: &str) -> SyncResult<Self> {
        if let Some(pattern) = s.strip_prefix("regex:") {
            return Self::custom(pattern);
        }
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "none" => MatcherKind::None,
            "icu" => MatcherKind::Icu,
            "i18next" => MatcherKind::I18next,
            "sprintf" => MatcherKind::Sprintf,
            other => {
                return Err(SyncError::config(format!(
                    "unknown matcher '{}' (expected none, icu, i18next, sprintf or regex:<pattern>)",
                    other
                )));
            }
        };
        Self::new(kind)
    }
}

impl fmt::Debug for InterpolationMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpolationMatcher")
            .field("kind", &self.kind)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .finish()
    }
}

fn compile(pattern: &str) -> SyncResult<Regex> {
    Regex::new(pattern).map_err(|e| {
        SyncError::config(format!("invalid matcher pattern '{}': {}", pattern, e))
    })
}
