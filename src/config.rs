use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::game::{GameConfig, Level, MAX_DURATION_SECS, MIN_DURATION_SECS};

/// Everything remembered between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub duration_secs: u32,
    pub level: Level,
    pub language: String,
    pub sound: bool,
    pub voice: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            duration_secs: crate::game::DEFAULT_DURATION_SECS,
            level: Level::default(),
            language: crate::phrases::DEFAULT_PACK.to_string(),
            sound: true,
            voice: true,
        }
    }
}

impl Settings {
    /// Session parameters, with a hand-edited file pulled back into range.
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            duration_secs: self.duration_secs.clamp(MIN_DURATION_SECS, MAX_DURATION_SECS),
            level: self.level,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "sana") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("sana_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Settings {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(settings) = serde_json::from_slice::<Settings>(&bytes) {
                return settings;
            }
        }
        Settings::default()
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
