//! Unique spill file names
//!
//! Names are `<prefix>-<session>-<id>.spill`. The session is a UUID drawn
//! once per namespace; ids come from a counter shared by all clones.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use uuid::Uuid;

pub const SPILL_EXTENSION: &str = "spill";

#[derive(Debug, Clone)]
pub struct SpillNamespace {
    dir: PathBuf,
    session: Uuid,
    next_id: Arc<AtomicU64>,
}

impl SpillNamespace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            session: Uuid::new_v4(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Allocates a fresh path. Never returns the same path twice.
    pub fn next_path(&self, prefix: &str) -> PathBuf {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            "{}-{}-{}.{}",
            prefix,
            self.session.simple(),
            id,
            SPILL_EXTENSION
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_paths_are_unique_across_clones() {
        let ns = SpillNamespace::new("/tmp/spill");
        let other = ns.clone();

        let mut seen = HashSet::new();
        for _ in 0..50 {
            assert!(seen.insert(ns.next_path("sort")));
            assert!(seen.insert(other.next_path("sort")));
        }
    }

    #[test]
    fn test_separate_namespaces_do_not_collide() {
        let a = SpillNamespace::new("/tmp/spill");
        let b = SpillNamespace::new("/tmp/spill");
        assert_ne!(a.next_path("run"), b.next_path("run"));
    }

    #[test]
    fn test_name_layout() {
        let ns = SpillNamespace::new("/tmp/spill");
        let path = ns.next_path("smj-left");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("smj-left-"));
        assert!(name.ends_with("-0.spill"));
        assert!(name.contains(&ns.session().simple().to_string()));
        assert_eq!(path.parent().unwrap(), Path::new("/tmp/spill"));
    }
}
