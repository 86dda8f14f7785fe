//! Flat-file configuration store for demand scenarios.
//!
//! Every scenario owns a few files in one configuration directory, keyed by
//! `(scenario_name, config_kind)`:
//!
//! - `<scenario>_model_selection.json` - sector -> model selection
//! - `<scenario>_td_losses.json` - T&D loss schedule
//! - `<scenario>_consolidated_results.json` - last consolidated run
//! - `<scenario>_consolidated_results.csv` - the same rows as CSV
//!
//! Files are replaced by writing a temporary sibling and renaming it over
//! the target, so a reader sees either the old or the new file. The
//! consolidated JSON and CSV are both staged before either is renamed.
//! Writers for the same scenario are serialized; the last one wins.
//!
//! # Usage
//!
//! ```rust
//! use edv_core::selection::ModelSelection;
//! use edv_store::ConfigStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = ConfigStore::new(dir.path());
//! let selection: ModelSelection = [("Residential", "MLR")].into_iter().collect();
//! store.save_model_selection("base", &selection).unwrap();
//! assert_eq!(store.load_model_selection("base").unwrap(), Some(selection));
//! ```

mod artifacts;
mod configs;
mod files;

use edv_core::error::Result;
use edv_utils::names::sanitize_file_stem;
use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

/// Kinds of per-scenario configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    ModelSelection,
    TdLosses,
    ConsolidatedResults,
}

impl ConfigKind {
    fn suffix(&self) -> &'static str {
        match self {
            ConfigKind::ModelSelection => "model_selection",
            ConfigKind::TdLosses => "td_losses",
            ConfigKind::ConsolidatedResults => "consolidated_results",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// JSON/CSV files under one configuration directory.
///
/// Safe to share between threads; see the module docs for the write
/// guarantees.
pub struct ConfigStore {
    config_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConfigStore {
    /// The directory is created on first write.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        ConfigStore {
            config_dir: config_dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// JSON file holding `kind` for `scenario_name`.
    pub fn path_for(&self, scenario_name: &str, kind: ConfigKind) -> PathBuf {
        self.config_dir
            .join(format!("{}_{}.json", sanitize_file_stem(scenario_name), kind))
    }

    /// Companion CSV of the consolidated results.
    pub fn consolidated_csv_path(&self, scenario_name: &str) -> PathBuf {
        self.path_for(scenario_name, ConfigKind::ConsolidatedResults)
            .with_extension("csv")
    }

    /// Run `write` while holding the scenario's writer lock.
    ///
    /// The lock entry is dropped again once no writer holds or waits on it,
    /// so the map only tracks scenarios with a write in flight.
    fn with_scenario_lock<T>(&self, scenario_name: &str, write: impl FnOnce() -> Result<T>) -> Result<T> {
        let key = sanitize_file_stem(scenario_name);
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                locks
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            write()
        };
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // clones are only taken under the map lock: the map's and ours means idle
        let idle = locks
            .get(&key)
            .is_some_and(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(entry) == 2);
        if idle {
            locks.remove(&key);
        }
        result
    }
}
