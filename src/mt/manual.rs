//! Manual "provider": a human types each translation at the terminal
//!
//! Prompts go to stderr so stdout stays reserved for the sync summary. An empty
//! answer keeps the source text unchanged.

use std::io::{BufRead, Write};

use async_trait::async_trait;

use crate::model::TranslationResult;
use crate::mt::error::{ServiceError, ServiceResult};
use crate::mt::translator::{ServiceArgs, TranslationService};

#[derive(Debug, Clone, Copy, Default)]
pub struct ManualTranslator;

impl ManualTranslator {
    pub fn new() -> Self {
        ManualTranslator
    }

    /// Ask for one translation per `(key, value)` pair on the given streams
    fn prompt_all<R: BufRead, W: Write>(
        pairs: &[(String, String)],
        target_lng: &str,
        input: &mut R,
        output: &mut W,
    ) -> ServiceResult<Vec<String>> {
        let mut answers = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            write!(output, "[{}] {}\n{} > ", key, value, target_lng)?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(ServiceError::Translation(format!(
                    "input closed before '{}' was translated",
                    key
                )));
            }
            let answer = line.trim_end_matches(['\r', '\n']);
            answers.push(if answer.is_empty() {
                value.clone()
            } else {
                answer.to_string()
            });
        }
        Ok(answers)
    }
}

#[async_trait]
impl TranslationService for ManualTranslator {
    async fn translate_strings(&self, args: &ServiceArgs<'_>) -> ServiceResult<Vec<TranslationResult>> {
        if args.strings.is_empty() {
            return Ok(Vec::new());
        }

        let pairs: Vec<(String, String)> = args
            .strings
            .iter()
            .map(|s| (s.key.clone(), s.value.clone()))
            .collect();
        let target_lng = args.target_lng.to_string();

        let answers = tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            let stderr = std::io::stderr();
            Self::prompt_all(&pairs, &target_lng, &mut stdin.lock(), &mut stderr.lock())
        })
        .await
        .map_err(|e| ServiceError::Translation(format!("prompt task failed: {}", e)))??;

        args.zip_results(answers)
    }

    fn provider_name(&self) -> &str {
        "Manual"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn pairs() -> Vec<(String, String)> {
        vec![
            ("fruit".to_string(), "Apple".to_string()),
            ("veggie".to_string(), "Carrot".to_string()),
        ]
    }

    #[test]
    fn test_prompt_reads_one_line_per_string() {
        let mut input = Cursor::new("Apfel\n\n");
        let mut output = Vec::new();
        let answers = ManualTranslator::prompt_all(&pairs(), "de", &mut input, &mut output).unwrap();

        // Empty answer keeps the source text
        assert_eq!(answers, vec!["Apfel", "Carrot"]);
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("[fruit] Apple"));
        assert!(shown.contains("de > "));
    }

    #[test]
    fn test_prompt_fails_on_eof() {
        let mut input = Cursor::new("Apfel\n");
        let mut output = Vec::new();
        let result = ManualTranslator::prompt_all(&pairs(), "de", &mut input, &mut output);
        match result {
            Err(ServiceError::Translation(msg)) => assert!(msg.contains("veggie")),
            other => panic!("Expected Translation error, got {:?}", other),
        }
    }
}
