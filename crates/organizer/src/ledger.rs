use sort_tree_core::Fingerprint;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Content seen so far in one run: fingerprint -> first source path.
///
/// Entries are only ever added. A fresh ledger is created per run, so files
/// placed by earlier runs are caught by the on-disk probe instead.
#[derive(Debug, Default)]
pub struct DedupLedger {
    seen: HashMap<Fingerprint, PathBuf>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `path` as the first holder of `fingerprint`. If the content
    /// was already recorded, the ledger is left unchanged and the earlier
    /// path is returned.
    pub fn record(&mut self, fingerprint: Fingerprint, path: &Path) -> Option<&Path> {
        match self.seen.entry(fingerprint) {
            Entry::Occupied(e) => Some(e.into_mut().as_path()),
            Entry::Vacant(e) => {
                e.insert(path.to_path_buf());
                None
            }
        }
    }

    pub fn first_seen(&self, fingerprint: &Fingerprint) -> Option<&Path> {
        self.seen.get(fingerprint).map(PathBuf::as_path)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.seen.contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sort_tree_core::hash_content;

    #[test]
    fn first_sighting_is_recorded() {
        let mut ledger = DedupLedger::new();
        let fp = hash_content(b"photo");

        assert!(ledger.record(fp, Path::new("/src/a.jpg")).is_none());
        assert!(ledger.contains(&fp));
        assert_eq!(ledger.first_seen(&fp), Some(Path::new("/src/a.jpg")));
    }

    #[test]
    fn repeat_returns_first_path_and_keeps_it() {
        let mut ledger = DedupLedger::new();
        let fp = hash_content(b"photo");

        ledger.record(fp, Path::new("/src/a.jpg"));
        assert_eq!(
            ledger.record(fp, Path::new("/src/other/b.jpg")),
            Some(Path::new("/src/a.jpg"))
        );
        assert_eq!(ledger.first_seen(&fp), Some(Path::new("/src/a.jpg")));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn distinct_content_gets_distinct_entries() {
        let mut ledger = DedupLedger::new();
        assert!(ledger.is_empty());

        ledger.record(hash_content(b"one"), Path::new("/src/a"));
        ledger.record(hash_content(b"two"), Path::new("/src/a"));

        assert_eq!(ledger.len(), 2);
    }
}
