//! The set of already-described images.

use std::collections::BTreeSet;

/// Identifiers of work items that have been successfully described.
///
/// The set only grows: there is no removal API. Clearing persisted progress
/// is done by deleting the checkpoint through its store, never by editing a
/// loaded set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointSet {
    done: BTreeSet<String>,
}

impl CheckpointSet {
    /// Creates an empty checkpoint set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an identifier as completed. Returns `false` if it was
    /// already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.done.insert(name.into())
    }

    /// Returns whether the identifier has been completed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.done.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.done.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }

    /// Iterates identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.done.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CheckpointSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            done: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for CheckpointSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.done.extend(iter.into_iter().map(Into::into));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_new_entries() {
        let mut set = CheckpointSet::new();
        assert!(set.insert("a.png"));
        assert!(!set.insert("a.png"));
        assert_eq!(set.len(), 1);
        assert!(set.contains("a.png"));
        assert!(!set.contains("b.png"));
    }

    #[test]
    fn test_iter_is_sorted() {
        let set: CheckpointSet = ["c.jpg", "a.png", "b.gif"].into_iter().collect();
        let names: Vec<_> = set.iter().collect();
        assert_eq!(names, vec!["a.png", "b.gif", "c.jpg"]);
    }
}
