use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Insertion-ordered mapping of package key to version constraint.
///
/// Keys are unique. Inserting an existing key replaces its value without
/// moving it, so a merged map keeps the candidate's layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    entries: Vec<(String, String)>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, package: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == package)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, package: &str) -> bool {
        self.get(package).is_some()
    }

    /// Insert or replace, returning the previous version if there was one.
    pub fn insert(&mut self, package: impl Into<String>, version: impl Into<String>) -> Option<String> {
        let package = package.into();
        let version = version.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == package) {
            return Some(std::mem::replace(&mut slot.1, version));
        }
        self.entries.push((package, version));
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// A copy with entries in ascending lexicographic key order.
    #[must_use]
    pub fn sorted(&self) -> Self {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DependencyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for DependencyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DependencyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = DependencyMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping package names to version strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = DependencyMap::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    map.insert(k, v);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// One difference found while merging a reference map into a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    Inserted {
        package: String,
        version: String,
    },
    /// `from` is the candidate's version, `to` the reference's.
    Changed {
        package: String,
        from: String,
        to: String,
    },
}

impl Change {
    pub fn package(&self) -> &str {
        match self {
            Self::Inserted { package, .. } | Self::Changed { package, .. } => package,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted { package, version } => {
                write!(f, "Inserting new package {package} at version {version}")
            }
            Self::Changed { package, from, to } => {
                write!(f, "Changing {package} from version {from} to {to}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub changes: Vec<Change>,
    pub merged: DependencyMap,
}

impl MergeOutcome {
    pub fn messages(&self) -> Vec<String> {
        self.changes.iter().map(ToString::to_string).collect()
    }
}

/// Merge `reference` into `candidate`. The reference wins on shared keys and
/// candidate-only entries are kept untouched.
pub fn merge(reference: &DependencyMap, candidate: &DependencyMap) -> MergeOutcome {
    let mut merged = candidate.clone();
    let mut changes = Vec::new();

    for (package, ref_version) in reference.iter() {
        match candidate.get(package) {
            None => {
                merged.insert(package, ref_version);
                changes.push(Change::Inserted {
                    package: package.to_owned(),
                    version: ref_version.to_owned(),
                });
            }
            Some(cand_version) if cand_version != ref_version => {
                merged.insert(package, ref_version);
                changes.push(Change::Changed {
                    package: package.to_owned(),
                    from: cand_version.to_owned(),
                    to: ref_version.to_owned(),
                });
            }
            Some(_) => {}
        }
    }

    MergeOutcome { changes, merged }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> DependencyMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn changed_version_message_names_both_versions() {
        let outcome = merge(&map(&[("core", "1.0.0")]), &map(&[("core", "0.1.0")]));
        assert_eq!(outcome.changes.len(), 1);
        assert!(outcome.messages()[0].contains("0.1.0 to 1.0.0"));
        assert_eq!(outcome.merged, map(&[("core", "1.0.0")]));
    }

    #[test]
    fn missing_package_is_inserted() {
        let outcome = merge(&map(&[("a/b", "1.0.0")]), &DependencyMap::new());
        assert_eq!(
            outcome.messages(),
            vec!["Inserting new package a/b at version 1.0.0".to_owned()]
        );
        assert_eq!(outcome.merged.get("a/b"), Some("1.0.0"));
    }

    #[test]
    fn merge_is_idempotent() {
        let reference = map(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let candidate = map(&[("b", "1"), ("z", "9")]);
        let first = merge(&reference, &candidate);
        assert_eq!(first.changes.len(), 3);
        let second = merge(&reference, &first.merged);
        assert!(second.changes.is_empty());
        assert_eq!(second.merged, first.merged);
    }

    #[test]
    fn candidate_only_entries_are_kept() {
        let reference = map(&[("a", "1")]);
        let candidate = map(&[("spec/only", "4.2.0"), ("a", "0")]);
        let outcome = merge(&reference, &candidate);
        assert_eq!(outcome.merged.get("spec/only"), Some("4.2.0"));
        assert_eq!(outcome.merged.len(), 2);
    }

    #[test]
    fn shared_keys_take_reference_value() {
        let reference = map(&[("x", "2"), ("y", "3")]);
        let candidate = map(&[("y", "1"), ("x", "2")]);
        let outcome = merge(&reference, &candidate);
        for (k, v) in reference.iter() {
            assert_eq!(outcome.merged.get(k), Some(v));
        }
        // replaced in place, candidate order kept
        assert_eq!(outcome.merged.keys().collect::<Vec<_>>(), vec!["y", "x"]);
    }

    #[test]
    fn messages_follow_reference_order() {
        let reference = map(&[("b", "1"), ("a", "1")]);
        let outcome = merge(&reference, &DependencyMap::new());
        assert_eq!(outcome.changes[0].package(), "b");
        assert_eq!(outcome.changes[1].package(), "a");
    }

    #[test]
    fn sorted_orders_keys() {
        let sorted = map(&[("c", "1"), ("a", "1"), ("b", "1")]).sorted();
        assert_eq!(sorted.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn deserialize_preserves_order() {
        let parsed: DependencyMap =
            serde_json::from_str(r#"{"z": "1", "a": "2", "m": "3"}"#).unwrap();
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn deserialize_rejects_non_string_versions() {
        assert!(serde_json::from_str::<DependencyMap>(r#"{"a": 1}"#).is_err());
    }
}
