use serde::{Deserialize, Serialize};

use crate::model::set::SetName;

//
// ─── SET INDEX ─────────────────────────────────────────────────────────────────
//

/// One entry of a user's set index.
///
/// Serialized as `{"name": ...}`, the shape stored on the profile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetIndexEntry {
    name: String,
}

impl SetIndexEntry {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The per-user list of set names, stored separately from set contents.
///
/// The index and the set records must stay logically consistent; the save
/// protocol updates both inside one atomic commit. Appending dedups by name:
/// re-adding a name the index already holds leaves the index unchanged, so a
/// re-save replaces the set's cards without growing the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetIndex {
    entries: Vec<SetIndexEntry>,
}

impl SetIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds an index from stored names, preserving order.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: names.into_iter().map(SetIndexEntry::new).collect(),
        }
    }

    /// Returns a copy of the index with `name` appended.
    ///
    /// If the name is already present the index is returned as-is; existing
    /// entries keep their positions.
    #[must_use]
    pub fn appended(&self, name: &SetName) -> Self {
        if self.contains(name.as_str()) {
            return self.clone();
        }
        let mut entries = self.entries.clone();
        entries.push(SetIndexEntry::new(name.as_str()));
        Self { entries }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(SetIndexEntry::name)
    }

    #[must_use]
    pub fn entries(&self) -> &[SetIndexEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> SetName {
        SetName::new(s).unwrap()
    }

    #[test]
    fn append_to_empty_index() {
        let index = SetIndex::new().appended(&name("Biology 101"));
        assert_eq!(index.names().collect::<Vec<_>>(), vec!["Biology 101"]);
    }

    #[test]
    fn append_preserves_order() {
        let index = SetIndex::new()
            .appended(&name("Set A"))
            .appended(&name("Set B"));
        assert_eq!(index.names().collect::<Vec<_>>(), vec!["Set A", "Set B"]);
    }

    #[test]
    fn append_existing_name_leaves_index_unchanged() {
        let index = SetIndex::new()
            .appended(&name("Set A"))
            .appended(&name("Set B"));
        let again = index.appended(&name("Set A"));

        assert_eq!(again, index);
        assert_eq!(again.len(), 2);
        assert_eq!(again.names().collect::<Vec<_>>(), vec!["Set A", "Set B"]);
    }

    #[test]
    fn entry_serde_shape_is_name_object() {
        let entry = SetIndexEntry::new("Set A");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Set A"}));
    }
}
