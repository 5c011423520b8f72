//! Read-only dot-path access to YAML documents.
//!
//! Shell scripts use these lookups (`dcx config yaml-get file a.b.c`) instead
//! of depending on a YAML processor for simple reads.

use serde_yaml::Value;
use std::path::Path;

use crate::{Error, Result};

/// Read and parse a YAML document.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and [`Error::Parse`]
/// when it is not valid YAML.
pub fn load(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(e, path, "read"))?;
    serde_yaml::from_str(&content).map_err(|e| Error::parse(path, e.to_string()))
}

/// Walk nested mappings along a dot-separated key.
///
/// An empty path or `.` returns the document itself. `null` values count as
/// absent.
#[must_use]
pub fn lookup<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    if key.is_empty() || key == "." {
        return Some(value);
    }

    let mut current = value;
    for part in key.split('.') {
        current = current.as_mapping()?.get(part)?;
    }

    (!current.is_null()).then_some(current)
}

/// Keys of the mapping found at `key`, in document order.
#[must_use]
pub fn keys(value: &Value, key: &str) -> Vec<String> {
    lookup(value, key)
        .and_then(Value::as_mapping)
        .map(|mapping| mapping.keys().filter_map(scalar_to_string).collect())
        .unwrap_or_default()
}

/// Render a value for shell consumption.
///
/// Scalars print bare; sequences and mappings print as YAML.
#[must_use]
pub fn render(value: &Value) -> String {
    scalar_to_string(value).unwrap_or_else(|| {
        serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default()
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Value {
        serde_yaml::from_str(
            r"
database:
  host: localhost
  port: 5432
  replicas:
    - a
    - b
log:
  level: debug
  file: ~
",
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_nested() {
        let doc = doc();
        assert_eq!(render(lookup(&doc, "database.host").unwrap()), "localhost");
        assert_eq!(render(lookup(&doc, "database.port").unwrap()), "5432");
    }

    #[test]
    fn test_lookup_missing() {
        let doc = doc();
        assert!(lookup(&doc, "database.user").is_none());
        assert!(lookup(&doc, "database.host.inner").is_none());
        assert!(lookup(&doc, "log.file").is_none());
    }

    #[test]
    fn test_keys() {
        let doc = doc();
        assert_eq!(keys(&doc, ""), vec!["database", "log"]);
        assert_eq!(keys(&doc, "database"), vec!["host", "port", "replicas"]);
        assert!(keys(&doc, "database.host").is_empty());
    }

    #[test]
    fn test_render_sequence() {
        let doc = doc();
        assert_eq!(render(lookup(&doc, "database.replicas").unwrap()), "- a\n- b");
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("bad.yaml");
        std::fs::write(&path, "a: [1, 2\n").unwrap();
        assert!(matches!(load(&path), Err(Error::Parse { .. })));
        assert!(matches!(
            load(&temp.path().join("missing.yaml")),
            Err(Error::Io { .. })
        ));
    }
}
