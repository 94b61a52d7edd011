use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

/// On-disk shape of the persisted best score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
struct Highscore {
    best: u32,
}

/// Outcome of finalizing a session against the persisted best
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    NewBest,
    NotBeaten,
}

pub trait HighscoreStore {
    /// Read the persisted best; a missing or corrupt value reads as 0.
    fn load(&self) -> u32;
    fn save(&self, best: u32) -> std::io::Result<()>;
}

/// JSON file store under the user state directory
#[derive(Debug, Clone)]
pub struct FileHighscoreStore {
    path: PathBuf,
}

impl FileHighscoreStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::highscore_path()
            .unwrap_or_else(|| PathBuf::from("sana_highscore.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl HighscoreStore for FileHighscoreStore {
    fn load(&self) -> u32 {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(hs) = serde_json::from_slice::<Highscore>(&bytes) {
                return hs.best;
            }
        }
        0
    }

    fn save(&self, best: u32) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&Highscore { best }).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

/// In-memory store for tests and for runs where storage is unavailable
#[derive(Debug, Default)]
pub struct MemoryHighscoreStore {
    best: Cell<u32>,
}

impl MemoryHighscoreStore {
    pub fn with_best(best: u32) -> Self {
        Self { best: Cell::new(best) }
    }
}

impl HighscoreStore for MemoryHighscoreStore {
    fn load(&self) -> u32 {
        self.best.get()
    }

    fn save(&self, best: u32) -> std::io::Result<()> {
        self.best.set(best);
        Ok(())
    }
}

/// The best-score ledger. Reads the persisted value once, holds the live
/// best in memory, and writes back only when a session beats it.
pub struct Ledger {
    best: u32,
    store: Box<dyn HighscoreStore>,
}

impl Ledger {
    pub fn open() -> Self {
        Self::with_store(Box::new(FileHighscoreStore::new()))
    }

    pub fn in_memory() -> Self {
        Self::with_store(Box::new(MemoryHighscoreStore::default()))
    }

    pub fn with_store(store: Box<dyn HighscoreStore>) -> Self {
        let best = store.load();
        Self { best, store }
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    /// Compare a finished session's score against the best. Save failures
    /// degrade to an in-memory-only best for the rest of the run.
    pub fn finalize(&mut self, score: u32) -> RecordStatus {
        if score > self.best {
            self.best = score;
            let _ = self.store.save(score);
            RecordStatus::NewBest
        } else {
            RecordStatus::NotBeaten
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct FailingStore;

    impl HighscoreStore for FailingStore {
        fn load(&self) -> u32 {
            0
        }

        fn save(&self, _best: u32) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn missing_file_reads_as_zero() {
        let dir = tempdir().unwrap();
        let store = FileHighscoreStore::with_path(dir.path().join("none.json"));
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn corrupt_file_reads_as_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("highscore.json");
        fs::write(&path, "not a number at all").unwrap();

        let store = FileHighscoreStore::with_path(&path);
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("highscore.json");
        let store = FileHighscoreStore::with_path(&path);

        store.save(42).unwrap();
        assert_eq!(store.load(), 42);
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deep").join("state").join("highscore.json");
        let store = FileHighscoreStore::with_path(&path);

        store.save(7).unwrap();
        assert_eq!(store.load(), 7);
    }

    #[test]
    fn finalize_reports_new_best() {
        let mut ledger = Ledger::in_memory();
        assert_eq!(ledger.best(), 0);

        assert_eq!(ledger.finalize(5), RecordStatus::NewBest);
        assert_eq!(ledger.best(), 5);
    }

    #[test]
    fn finalize_keeps_higher_best() {
        let mut ledger = Ledger::with_store(Box::new(MemoryHighscoreStore::with_best(10)));

        assert_eq!(ledger.finalize(5), RecordStatus::NotBeaten);
        assert_eq!(ledger.best(), 10);

        // Equal score does not count as beating the record
        assert_eq!(ledger.finalize(10), RecordStatus::NotBeaten);
        assert_eq!(ledger.best(), 10);
    }

    #[test]
    fn finalize_is_max_of_previous_and_score() {
        let mut ledger = Ledger::with_store(Box::new(MemoryHighscoreStore::with_best(3)));
        ledger.finalize(8);
        assert_eq!(ledger.best(), 8);
        ledger.finalize(2);
        assert_eq!(ledger.best(), 8);
    }

    #[test]
    fn corrupt_store_then_score_five_persists_five() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("highscore.json");
        fs::write(&path, "{\"best\": \"garbage\"}").unwrap();

        let mut ledger = Ledger::with_store(Box::new(FileHighscoreStore::with_path(&path)));
        assert_eq!(ledger.best(), 0);

        assert_eq!(ledger.finalize(5), RecordStatus::NewBest);

        let reopened = FileHighscoreStore::with_path(&path);
        assert_eq!(reopened.load(), 5);
    }

    #[test]
    fn save_failure_still_updates_memory() {
        let mut ledger = Ledger::with_store(Box::new(FailingStore));

        assert_eq!(ledger.finalize(9), RecordStatus::NewBest);
        assert_eq!(ledger.best(), 9);
        assert_eq!(ledger.finalize(4), RecordStatus::NotBeaten);
    }

    #[test]
    fn ledger_reads_store_on_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("highscore.json");
        FileHighscoreStore::with_path(&path).save(21).unwrap();

        let ledger = Ledger::with_store(Box::new(FileHighscoreStore::with_path(&path)));
        assert_eq!(ledger.best(), 21);
    }
}
