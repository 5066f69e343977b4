use crate::deps::DependencyMap;
use crate::ManifestError;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tracing::debug;

pub const DEPENDENCIES: &str = "dependencies";
pub const TEST_DEPENDENCIES: &str = "test-dependencies";
pub const REPOSITORY: &str = "repository";
pub const SOURCE_DIRECTORIES: &str = "source-directories";

/// A package manifest held as an insertion-ordered JSON object.
///
/// The well-known fields have typed accessors; everything else is carried
/// through untouched, in the position it was read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    fields: Map<String, Value>,
}

impl Manifest {
    pub fn from_reader(reader: impl Read) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_value(value)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        debug!("loading manifest {}", path.display());
        Self::from_reader(BufReader::new(fs::File::open(path)?))
    }

    fn from_value(value: Value) -> Result<Self, ManifestError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(ManifestError::NotAnObject),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field names in their current order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Set a field, keeping its position if it already exists and appending
    /// it otherwise.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    pub fn dependencies(&self) -> Result<DependencyMap, ManifestError> {
        self.dependency_field(DEPENDENCIES)?
            .ok_or(ManifestError::MissingField(DEPENDENCIES))
    }

    pub fn test_dependencies(&self) -> Result<Option<DependencyMap>, ManifestError> {
        self.dependency_field(TEST_DEPENDENCIES)
    }

    fn dependency_field(&self, field: &'static str) -> Result<Option<DependencyMap>, ManifestError> {
        self.fields
            .get(field)
            .map(|v| {
                DependencyMap::deserialize_value(v)
                    .map_err(|source| ManifestError::InvalidField { field, source })
            })
            .transpose()
    }

    pub fn set_dependencies(&mut self, deps: &DependencyMap) {
        self.set(DEPENDENCIES, deps.to_value());
    }

    pub fn set_test_dependencies(&mut self, deps: &DependencyMap) {
        self.set(TEST_DEPENDENCIES, deps.to_value());
    }

    pub fn repository(&self) -> Result<&str, ManifestError> {
        match self.fields.get(REPOSITORY) {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(ManifestError::WrongType {
                field: REPOSITORY,
                expected: "a string",
            }),
            None => Err(ManifestError::MissingField(REPOSITORY)),
        }
    }

    pub fn source_directories(&self) -> Result<Vec<String>, ManifestError> {
        self.source_directory_values()?
            .iter()
            .map(|v| {
                v.as_str().map(str::to_owned).ok_or(ManifestError::WrongType {
                    field: SOURCE_DIRECTORIES,
                    expected: "an array of strings",
                })
            })
            .collect()
    }

    /// Append `dir` to `source-directories` unless an equal entry is already
    /// there. Returns whether the manifest changed.
    pub fn add_source_directory(&mut self, dir: &str) -> Result<bool, ManifestError> {
        let dirs = match self.fields.get_mut(SOURCE_DIRECTORIES) {
            Some(Value::Array(dirs)) => dirs,
            Some(_) => {
                return Err(ManifestError::WrongType {
                    field: SOURCE_DIRECTORIES,
                    expected: "an array of strings",
                })
            }
            None => return Err(ManifestError::MissingField(SOURCE_DIRECTORIES)),
        };
        if dirs.iter().any(|v| v.as_str() == Some(dir)) {
            return Ok(false);
        }
        dirs.push(Value::String(dir.to_owned()));
        Ok(true)
    }

    fn source_directory_values(&self) -> Result<&Vec<Value>, ManifestError> {
        match self.fields.get(SOURCE_DIRECTORIES) {
            Some(Value::Array(dirs)) => Ok(dirs),
            Some(_) => Err(ManifestError::WrongType {
                field: SOURCE_DIRECTORIES,
                expected: "an array of strings",
            }),
            None => Err(ManifestError::MissingField(SOURCE_DIRECTORIES)),
        }
    }

    /// Serialize with dependency tables sorted. Works on a copy; `self` is
    /// left as it was.
    pub fn to_writer(&self, writer: impl Write) -> Result<(), ManifestError> {
        let mut to_save = self.clone();
        for field in [DEPENDENCIES, TEST_DEPENDENCIES] {
            if let Some(deps) = to_save.dependency_field(field)? {
                to_save.set(field, deps.sorted().to_value());
            }
        }
        write_pretty(&to_save.fields, writer)
    }

    pub fn to_json_string(&self) -> Result<String, ManifestError> {
        let mut buf = Vec::new();
        self.to_writer(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let content = self.to_json_string()?;
        crate::write_atomic(path.as_ref(), &content)
    }

    /// Save without re-sorting anything, so the file diff is limited to what
    /// was actually changed in memory.
    pub fn save_verbatim(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let mut buf = Vec::new();
        write_pretty(&self.fields, &mut buf)?;
        crate::write_atomic(path.as_ref(), &String::from_utf8_lossy(&buf))
    }
}

pub fn parse_manifest_str(input: &str) -> Result<Manifest, ManifestError> {
    let value: Value = serde_json::from_str(input)?;
    Manifest::from_value(value)
}

/// Four-space indentation and `": "` separators; no line ends in whitespace.
pub(crate) fn write_pretty(value: &impl Serialize, writer: impl Write) -> Result<(), ManifestError> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut ser).map_err(ManifestError::Serialize)
}

impl DependencyMap {
    fn deserialize_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde::Deserialize::deserialize(value)
    }

    fn to_value(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(k, v)| (k.to_owned(), Value::String(v.to_owned())))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
    "version": "1.0.0",
    "summary": "helpful summary",
    "repository": "https://github.com/NoRedInk/noredink.git",
    "license": "BSD3",
    "source-directories": [
        "."
    ],
    "exposed-modules": [],
    "dependencies": {
        "elm-lang/html": "2.0.0 <= v < 3.0.0",
        "elm-lang/core": "5.0.0 <= v < 6.0.0"
    },
    "elm-version": "0.18.0 <= v < 0.19.0"
}"#;

    #[test]
    fn parses_and_keeps_field_order() {
        let m = parse_manifest_str(SAMPLE).unwrap();
        assert_eq!(
            m.field_names().collect::<Vec<_>>(),
            vec![
                "version",
                "summary",
                "repository",
                "license",
                "source-directories",
                "exposed-modules",
                "dependencies",
                "elm-version"
            ]
        );
        assert_eq!(m.repository().unwrap(), "https://github.com/NoRedInk/noredink.git");
        assert_eq!(m.source_directories().unwrap(), vec![".".to_owned()]);
        assert_eq!(m.dependencies().unwrap().len(), 2);
    }

    #[test]
    fn dump_sorts_dependencies_only() {
        let m = parse_manifest_str(SAMPLE).unwrap();
        let out = m.to_json_string().unwrap();
        let core = out.find("elm-lang/core").unwrap();
        let html = out.find("elm-lang/html").unwrap();
        assert!(core < html);
        assert!(out.find("\"version\"").unwrap() < out.find("\"summary\"").unwrap());
        assert!(out.find("\"dependencies\"").unwrap() < out.find("\"elm-version\"").unwrap());
    }

    #[test]
    fn dump_does_not_mutate_caller() {
        let m = parse_manifest_str(SAMPLE).unwrap();
        let before = m.clone();
        let _ = m.to_json_string().unwrap();
        assert_eq!(m, before);
        assert_eq!(
            m.dependencies().unwrap().keys().collect::<Vec<_>>(),
            vec!["elm-lang/html", "elm-lang/core"]
        );
    }

    #[test]
    fn dump_has_four_space_indent_and_no_trailing_whitespace() {
        let m = parse_manifest_str(SAMPLE).unwrap();
        let out = m.to_json_string().unwrap();
        assert!(out.contains("\n    \"version\": \"1.0.0\","));
        assert!(out.contains("\n        \"elm-lang/core\": "));
        for line in out.lines() {
            assert!(!line.ends_with(' '), "trailing whitespace in {line:?}");
        }
    }

    #[test]
    fn roundtrip_restores_dependency_values() {
        let m = parse_manifest_str(SAMPLE).unwrap();
        let reloaded = parse_manifest_str(&m.to_json_string().unwrap()).unwrap();
        let deps = reloaded.dependencies().unwrap();
        assert_eq!(deps.keys().collect::<Vec<_>>(), vec!["elm-lang/core", "elm-lang/html"]);
        assert_eq!(deps.get("elm-lang/html"), Some("2.0.0 <= v < 3.0.0"));
        assert_eq!(deps, m.dependencies().unwrap().sorted());
    }

    #[test]
    fn test_dependencies_are_sorted_and_appended_last() {
        let mut m = parse_manifest_str(SAMPLE).unwrap();
        let test_deps: DependencyMap = [("z/z", "1.0.0"), ("a/a", "1.0.0")].into_iter().collect();
        m.set_test_dependencies(&test_deps);
        let reloaded = parse_manifest_str(&m.to_json_string().unwrap()).unwrap();
        assert_eq!(reloaded.field_names().last(), Some(TEST_DEPENDENCIES));
        assert_eq!(
            reloaded.test_dependencies().unwrap().unwrap().keys().collect::<Vec<_>>(),
            vec!["a/a", "z/z"]
        );
    }

    #[test]
    fn add_source_directory_deduplicates() {
        let mut m = parse_manifest_str(SAMPLE).unwrap();
        assert!(!m.add_source_directory(".").unwrap());
        assert!(m.add_source_directory("vendor/src").unwrap());
        assert!(!m.add_source_directory("vendor/src").unwrap());
        assert_eq!(m.source_directories().unwrap(), vec![".", "vendor/src"]);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_manifest_str("{\"dependencies\": "),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn rejects_non_object() {
        assert!(matches!(parse_manifest_str("[1, 2]"), Err(ManifestError::NotAnObject)));
    }

    #[test]
    fn missing_dependencies_is_reported() {
        let m = parse_manifest_str("{}").unwrap();
        assert!(matches!(
            m.dependencies(),
            Err(ManifestError::MissingField(DEPENDENCIES))
        ));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elm-package.json");
        let m = parse_manifest_str(SAMPLE).unwrap();
        m.save(&path).unwrap();
        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded.repository().unwrap(), m.repository().unwrap());
    }

    #[test]
    fn from_reader_parses_stream() {
        let m = Manifest::from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(m.get("elm-version").is_some());
    }
}
