//! Tag diff computation.
//!
//! Computes the deletions and upserts needed to move a resource from its
//! current tags to a desired tag set.

use std::collections::BTreeSet;

use super::TagSet;

/// Changes required to converge a resource's tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TagDiff {
    /// Keys to remove from the resource.
    pub to_delete: BTreeSet<String>,
    /// Keys to add or overwrite, with their new values.
    pub to_upsert: TagSet,
}

/// Computes the tag changes needed to turn `current` into `desired`.
#[must_use]
pub fn diff(current: &TagSet, desired: &TagSet) -> TagDiff {
    diff_with_exemption(current, desired, &BTreeSet::new())
}

/// Computes the tag changes, never deleting a key in `protected`.
///
/// A protected key that `desired` redefines with a different value is still
/// upserted.
#[must_use]
pub fn diff_with_exemption(
    current: &TagSet,
    desired: &TagSet,
    protected: &BTreeSet<String>,
) -> TagDiff {
    let to_delete = current
        .keys()
        .filter(|key| !desired.contains_key(*key) && !protected.contains(*key))
        .cloned()
        .collect();

    let to_upsert = desired
        .iter()
        .filter(|(key, value)| current.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    TagDiff {
        to_delete,
        to_upsert,
    }
}

impl TagDiff {
    /// Returns true if no API call is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_upsert.is_empty()
    }

    /// Applies the diff to `current`: removals first, then upserts.
    #[must_use]
    pub fn apply_to(&self, current: &TagSet) -> TagSet {
        let mut tags = current.clone();
        for key in &self.to_delete {
            tags.remove(key);
        }
        tags.extend(
            self.to_upsert
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        tags
    }
}

impl std::fmt::Display for TagDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "no changes");
        }
        write!(
            f,
            "{} to upsert, {} to delete",
            self.to_upsert.len(),
            self.to_delete.len()
        )
    }
}
