//! Flat exact-dependency files: a bare JSON object of package key to exact
//! version, with no manifest envelope.
//!
//! ```json
//! {
//!     "elm-lang/core": "4.0.5"
//! }
//! ```

use crate::deps::DependencyMap;
use crate::manifest::write_pretty;
use crate::ManifestError;
use std::fs;
use std::path::Path;

pub fn parse_exact_str(input: &str) -> Result<DependencyMap, ManifestError> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    if !value.is_object() {
        return Err(ManifestError::NotAnObject);
    }
    serde_json::from_value(value).map_err(|source| ManifestError::InvalidField {
        field: "<root>",
        source,
    })
}

pub fn load(path: impl AsRef<Path>) -> Result<DependencyMap, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_exact_str(&content)
}

pub fn to_json_string(deps: &DependencyMap) -> Result<String, ManifestError> {
    let mut buf = Vec::new();
    write_pretty(&deps.sorted(), &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `deps` sorted by package key.
pub fn save(deps: &DependencyMap, path: impl AsRef<Path>) -> Result<(), ManifestError> {
    let content = to_json_string(deps)?;
    crate::write_atomic(path.as_ref(), &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_preserves_order_and_save_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elm-native-package.json");
        fs::write(&path, r#"{"b/b": "2.0.0", "a/a": "1.0.0"}"#).unwrap();

        let deps = load(&path).unwrap();
        assert_eq!(deps.keys().collect::<Vec<_>>(), vec!["b/b", "a/a"]);

        save(&deps, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "{\n    \"a/a\": \"1.0.0\",\n    \"b/b\": \"2.0.0\"\n}"
        );
    }

    #[test]
    fn empty_map_serializes_as_empty_object() {
        assert_eq!(to_json_string(&DependencyMap::new()).unwrap(), "{}");
    }

    #[test]
    fn rejects_array_root() {
        assert!(matches!(parse_exact_str("[]"), Err(ManifestError::NotAnObject)));
    }

    #[test]
    fn rejects_nested_values() {
        assert!(matches!(
            parse_exact_str(r#"{"a/a": {"v": 1}}"#),
            Err(ManifestError::InvalidField { .. })
        ));
    }
}
