//! Thread-safe registry of loaded levels
//!
//! Whole-level construction and teardown are serialized behind one lock so a
//! background loader and the tick thread never race on the same level. Built
//! levels are published as `Arc<Level>`; per-tick queries clone the `Arc` and
//! run without touching any lock.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::{Level, LevelLoadError};
use crate::core::config::LevelConfig;

/// Levels currently loaded, keyed by name
pub struct LevelRegistry {
    config: LevelConfig,
    load_lock: Mutex<()>,
    levels: RwLock<HashMap<String, Arc<Level>>>,
}

impl LevelRegistry {
    /// Create an empty registry reading level files as configured
    pub fn new(config: LevelConfig) -> Self {
        Self {
            config,
            load_lock: Mutex::new(()),
            levels: RwLock::new(HashMap::new()),
        }
    }

    /// Path of the file backing `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.config
            .levels_dir
            .join(format!("{}.{}", name, self.config.extension))
    }

    /// Load a level from disk, or return it if already loaded
    ///
    /// The level is built completely before it is published; a malformed file
    /// leaves the registry unchanged.
    pub fn load(&self, name: &str) -> Result<Arc<Level>, LevelLoadError> {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(level) = self.get(name) {
            log::debug!("Level '{}' already loaded", name);
            return Ok(level);
        }

        let path = self.path_for(name);
        let text = std::fs::read_to_string(&path).map_err(|source| LevelLoadError::Io {
            path: path.clone(),
            source,
        })?;
        let level = Arc::new(Level::parse(name, &text)?);

        self.write_levels().insert(name.to_string(), Arc::clone(&level));
        log::info!(
            "Loaded level '{}' from {} ({} cells, {} doors)",
            name,
            path.display(),
            level.index().cell_count(),
            level.doors().len()
        );
        Ok(level)
    }

    /// Publish an already built level, replacing any level of the same name
    pub fn insert_level(&self, level: Level) -> Arc<Level> {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let level = Arc::new(level);
        self.write_levels()
            .insert(level.name().to_string(), Arc::clone(&level));
        log::info!("Registered level '{}'", level.name());
        level
    }

    /// Get a loaded level
    pub fn get(&self, name: &str) -> Option<Arc<Level>> {
        self.levels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(Arc::clone)
    }

    /// Check whether a level is loaded
    pub fn is_loaded(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of all loaded levels, sorted
    pub fn loaded(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .levels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Drop a level from the registry. Holders of its `Arc` keep a valid copy.
    pub fn unload(&self, name: &str) -> bool {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = self.write_levels().remove(name).is_some();
        if removed {
            log::info!("Unloaded level '{}'", name);
        }
        removed
    }

    /// Mutate a loaded level copy-on-write.
    ///
    /// Readers that cloned the `Arc` before the call keep the old tree; the
    /// mutated level becomes visible only once `f` returns.
    pub fn mutate<R>(&self, name: &str, f: impl FnOnce(&mut Level) -> R) -> Option<R> {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut levels = self.write_levels();
        let level = levels.get_mut(name)?;
        Some(f(Arc::make_mut(level)))
    }

    fn write_levels(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<Level>>> {
        self.levels.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new(LevelConfig::default())
    }
}
