//! Resource Store: reading and writing localization files
//!
//! The sync engine only needs three operations from a file format, captured by
//! [`ResourceStore`]. [`FileResourceStore`] implements them for JSON files:
//!
//! * `flat-json`: one object of `"key": "value"` pairs
//! * `nested-json`: nested objects, flattened to dotted keys (`"menu.file.open"`)
//!
//! In both formats, top-level keys starting with `@` (such as `@metadata`) are
//! ignored, and a `null` value in a target file marks a translation that was
//! cleared on purpose.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{SyncError, SyncResult};
use crate::model::{StringEntry, TargetSet};

/// Supported file syntaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceFormat {
    #[default]
    FlatJson,
    NestedJson,
}

impl ResourceFormat {
    pub fn all() -> &'static [ResourceFormat] {
        &[ResourceFormat::FlatJson, ResourceFormat::NestedJson]
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceFormat::FlatJson => "flat-json",
            ResourceFormat::NestedJson => "nested-json",
        }
    }
}

impl fmt::Display for ResourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceFormat {
    type Err = SyncError;

    fn from_str(s: &str) -> SyncResult<Self> {
        ResourceFormat::all()
            .iter()
            .copied()
            .find(|format| format.name() == s)
            .ok_or_else(|| {
                SyncError::config(format!(
                    "unknown file format '{}' (expected flat-json or nested-json)",
                    s
                ))
            })
    }
}

/// A file path together with the syntax used to read it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    pub path: PathBuf,
    pub format: ResourceFormat,
}

impl ResourceLocation {
    pub fn new(path: impl Into<PathBuf>, format: ResourceFormat) -> Self {
        ResourceLocation {
            path: path.into(),
            format,
        }
    }
}

/// Format-specific access to source and target files
///
/// A file that does not exist is not an error: reads return `Ok(None)`.
pub trait ResourceStore: Send + Sync {
    fn read_source(&self, location: &ResourceLocation) -> SyncResult<Option<Vec<StringEntry>>>;

    fn read_target(&self, location: &ResourceLocation) -> SyncResult<Option<TargetSet>>;

    fn write_target(&self, location: &ResourceLocation, entries: &[StringEntry]) -> SyncResult<()>;
}

/// [`ResourceStore`] for JSON files on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResourceStore;

impl ResourceStore for FileResourceStore {
    fn read_source(&self, location: &ResourceLocation) -> SyncResult<Option<Vec<StringEntry>>> {
        let Some(entries) = read_entries(location)? else {
            return Ok(None);
        };
        Ok(Some(
            entries
                .into_iter()
                .map(|(key, value)| StringEntry {
                    key,
                    value: value.unwrap_or_default(),
                })
                .collect(),
        ))
    }

    fn read_target(&self, location: &ResourceLocation) -> SyncResult<Option<TargetSet>> {
        let Some(entries) = read_entries(location)? else {
            return Ok(None);
        };
        let mut set = TargetSet::new();
        for (key, value) in &entries {
            set.insert(key, value.as_deref());
        }
        Ok(Some(set))
    }

    fn write_target(&self, location: &ResourceLocation, entries: &[StringEntry]) -> SyncResult<()> {
        let path = &location.path;
        let root = match location.format {
            ResourceFormat::FlatJson => entries
                .iter()
                .map(|e| (e.key.clone(), Value::String(e.value.clone())))
                .collect::<Map<String, Value>>(),
            ResourceFormat::NestedJson => nest_entries(path, entries)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
        }
        let mut text = serde_json::to_string_pretty(&Value::Object(root))
            .map_err(|e| SyncError::store(path, format!("failed to serialize: {}", e)))?;
        text.push('\n');
        fs::write(path, text).map_err(|e| SyncError::io(path, e))
    }
}

/// Read `(key, value)` pairs in document order; `None` values are JSON nulls
fn read_entries(location: &ResourceLocation) -> SyncResult<Option<Vec<(String, Option<String>)>>> {
    let path = &location.path;
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SyncError::io(path, e)),
    };
    if content.trim().is_empty() {
        return Ok(Some(Vec::new()));
    }

    let json: Value = serde_json::from_str(&content)
        .map_err(|e| SyncError::store(path, format!("failed to parse JSON: {}", e)))?;
    let obj = json
        .as_object()
        .ok_or_else(|| SyncError::store(path, "root must be an object"))?;

    let mut entries = Vec::new();
    for (key, value) in obj {
        // Skip metadata
        if key.starts_with('@') {
            continue;
        }
        match location.format {
            ResourceFormat::FlatJson => entries.push((key.clone(), leaf_value(path, key, value)?)),
            ResourceFormat::NestedJson => flatten_into(path, key, value, &mut entries)?,
        }
    }
    Ok(Some(entries))
}

fn leaf_value(path: &Path, key: &str, value: &Value) -> SyncResult<Option<String>> {
    match value {
        Value::String(s) => Ok(Some(s.clone())),
        Value::Null => Ok(None),
        other => Err(SyncError::store(
            path,
            format!("value of '{}' must be a string or null, found {}", key, other),
        )),
    }
}

fn flatten_into(
    path: &Path,
    prefix: &str,
    value: &Value,
    out: &mut Vec<(String, Option<String>)>,
) -> SyncResult<()> {
    match value {
        Value::Object(children) => {
            for (child, nested) in children {
                flatten_into(path, &format!("{}.{}", prefix, child), nested, out)?;
            }
            Ok(())
        }
        leaf => {
            out.push((prefix.to_string(), leaf_value(path, prefix, leaf)?));
            Ok(())
        }
    }
}

fn nest_entries(path: &Path, entries: &[StringEntry]) -> SyncResult<Map<String, Value>> {
    let mut root = Map::new();
    for entry in entries {
        let mut segments: Vec<&str> = entry.key.split('.').collect();
        let leaf = segments.pop().unwrap_or_default();

        let mut node = &mut root;
        for segment in segments {
            let child = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            node = match child {
                Value::Object(map) => map,
                _ => {
                    return Err(SyncError::store(
                        path,
                        format!("key '{}' collides with a string value", entry.key),
                    ));
                }
            };
        }
        if node.contains_key(leaf) {
            return Err(SyncError::store(
                path,
                format!("key '{}' collides with a nested object", entry.key),
            ));
        }
        node.insert(leaf.to_string(), Value::String(entry.value.clone()));
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    // ========== Format Tests ==========

    #[test]
    fn test_parse_format_names() {
        assert_eq!(
            "flat-json".parse::<ResourceFormat>().unwrap(),
            ResourceFormat::FlatJson
        );
        assert_eq!(
            "nested-json".parse::<ResourceFormat>().unwrap(),
            ResourceFormat::NestedJson
        );
        assert!("yaml".parse::<ResourceFormat>().unwrap_err().is_config());
    }

    // ========== Flat JSON Tests ==========

    #[test]
    fn test_read_flat_source_in_document_order() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "en.json",
            r#"{"@metadata": {"authors": []}, "zebra": "Zebra", "apple": "Apple", "blank": null}"#,
        );
        let entries = FileResourceStore
            .read_source(&ResourceLocation::new(path, ResourceFormat::FlatJson))
            .unwrap()
            .unwrap();
        assert_eq!(
            entries,
            vec![
                StringEntry::new("zebra", "Zebra"),
                StringEntry::new("apple", "Apple"),
                StringEntry::new("blank", ""),
            ]
        );
    }

    #[test]
    fn test_read_flat_target_keeps_null_marker() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "de.json", r#"{"fruit": null, "veggie": "Gemüse"}"#);
        let set = FileResourceStore
            .read_target(&ResourceLocation::new(path, ResourceFormat::FlatJson))
            .unwrap()
            .unwrap();
        assert_eq!(set.lookup("fruit"), Some(None));
        assert_eq!(set.lookup("veggie"), Some(Some("Gemüse")));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let location = ResourceLocation::new(dir.path().join("nope.json"), ResourceFormat::FlatJson);
        assert!(FileResourceStore.read_target(&location).unwrap().is_none());
        assert!(FileResourceStore.read_source(&location).unwrap().is_none());
    }

    #[test]
    fn test_flat_rejects_nested_values() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "en.json", r#"{"menu": {"open": "Open"}}"#);
        let result =
            FileResourceStore.read_source(&ResourceLocation::new(path, ResourceFormat::FlatJson));
        assert!(matches!(result, Err(SyncError::Store { .. })));
    }

    #[test]
    fn test_invalid_json_is_store_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "en.json", "[1, 2");
        let result =
            FileResourceStore.read_source(&ResourceLocation::new(path, ResourceFormat::FlatJson));
        assert!(matches!(result, Err(SyncError::Store { .. })));
    }

    #[test]
    fn test_write_flat_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("de").join("fruits.json");
        let location = ResourceLocation::new(&path, ResourceFormat::FlatJson);
        FileResourceStore
            .write_target(
                &location,
                &[StringEntry::new("b", "Birne"), StringEntry::new("a", "Apfel")],
            )
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n  \"b\": \"Birne\",\n  \"a\": \"Apfel\"\n}\n");
    }

    // ========== Nested JSON Tests ==========

    #[test]
    fn test_read_nested_flattens_keys() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "en.json",
            r#"{"menu": {"file": {"open": "Open", "close": null}}, "title": "App"}"#,
        );
        let set = FileResourceStore
            .read_target(&ResourceLocation::new(path, ResourceFormat::NestedJson))
            .unwrap()
            .unwrap();
        let keys: Vec<&str> = set.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["menu.file.open", "menu.file.close", "title"]);
        assert_eq!(set.lookup("menu.file.close"), Some(None));
    }

    #[test]
    fn test_write_nested_rebuilds_objects() {
        let dir = TempDir::new().unwrap();
        let location = ResourceLocation::new(dir.path().join("de.json"), ResourceFormat::NestedJson);
        FileResourceStore
            .write_target(
                &location,
                &[
                    StringEntry::new("menu.open", "Öffnen"),
                    StringEntry::new("menu.close", "Schließen"),
                    StringEntry::new("title", "App"),
                ],
            )
            .unwrap();

        let json: Value =
            serde_json::from_str(&fs::read_to_string(&location.path).unwrap()).unwrap();
        assert_eq!(json["menu"]["open"], "Öffnen");
        assert_eq!(json["menu"]["close"], "Schließen");
        assert_eq!(json["title"], "App");
    }

    #[test]
    fn test_write_nested_detects_collision() {
        let dir = TempDir::new().unwrap();
        let location = ResourceLocation::new(dir.path().join("de.json"), ResourceFormat::NestedJson);
        let result = FileResourceStore.write_target(
            &location,
            &[StringEntry::new("menu", "Menü"), StringEntry::new("menu.open", "Öffnen")],
        );
        assert!(matches!(result, Err(SyncError::Store { .. })));
    }
}
