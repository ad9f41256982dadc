use std::collections::HashSet;

/// Listing ids persisted during this run.
///
/// Lets a listing that shows up in several overlapping regions skip its
/// detail fetch after the first one. Lives only as long as the collector.
#[derive(Debug, Default)]
pub struct DedupCache {
    ids: HashSet<String>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns false if the id was already cached.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
