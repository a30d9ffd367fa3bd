//! Fragment sources — file-backed and static implementations.
//!
//! Fragments live under a configured root directory and are addressed by
//! relative path. Missing files are skipped, not errors; the default
//! fragments shipped in the repo's `prompts/` directory cover the standard
//! policy paths.

use std::collections::HashMap;
use std::path::PathBuf;

use mentora_core::error::FragmentError;
use mentora_core::fragment::FragmentSource;

/// Reads fragments from files under a root directory.
pub struct FileFragmentStore {
    root: PathBuf,
}

impl FileFragmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FragmentSource for FileFragmentStore {
    fn load(&self, path: &str) -> Result<Option<String>, FragmentError> {
        let full = self.root.join(path);
        match std::fs::read_to_string(&full) {
            Ok(text) => Ok(Some(text.trim_end().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FragmentError::Io {
                path: full.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// A fixed in-memory fragment map. Useful for tests and embedded defaults.
#[derive(Default)]
pub struct StaticFragments {
    entries: HashMap<String, String>,
}

impl StaticFragments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fragment at the given relative path.
    pub fn with(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries.insert(path.into(), text.into());
        self
    }
}

impl FragmentSource for StaticFragments {
    fn load(&self, path: &str) -> Result<Option<String>, FragmentError> {
        Ok(self.entries.get(path).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_store_reads_existing_fragment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("policies")).unwrap();
        let mut file = std::fs::File::create(dir.path().join("policies/system.txt")).unwrap();
        writeln!(file, "Stay in character.").unwrap();

        let store = FileFragmentStore::new(dir.path());
        let text = store.load("policies/system.txt").unwrap().unwrap();
        assert_eq!(text, "Stay in character.");
    }

    #[test]
    fn file_store_missing_fragment_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFragmentStore::new(dir.path());
        assert!(store.load("policies/missing.txt").unwrap().is_none());
    }

    #[test]
    fn static_fragments_lookup() {
        let store = StaticFragments::new().with("policies/system.txt", "Never break character.");
        assert_eq!(
            store.load("policies/system.txt").unwrap().as_deref(),
            Some("Never break character.")
        );
        assert!(store.load("policies/other.txt").unwrap().is_none());
    }
}
