use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::settings::EngineConfig;
use crate::model::game_save::EngineSave;

const APP_DIR: &str = "storyteller_engine";

pub fn config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

pub fn config_path() -> PathBuf {
    config_dir().join("engine_config.json")
}

/// Missing file means defaults. A file that exists but does not parse is an
/// error.
pub fn load_config_from(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(EngineConfig::default());
    }
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Load from the per-user config directory. Unreadable files are logged and
/// replaced by defaults.
pub fn load_config() -> EngineConfig {
    let path = config_path();
    load_config_from(&path).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "bad config, using defaults");
        EngineConfig::default()
    })
}

pub fn save_config_to(path: &Path, config: &EngineConfig) -> Result<()> {
    write_json(path, config)
}

pub fn save_config(config: &EngineConfig) -> Result<()> {
    save_config_to(&config_path(), config)
}

pub fn load_state(path: &Path) -> Result<EngineSave> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing save {}", path.display()))
}

pub fn save_state(path: &Path, save: &EngineSave) -> Result<()> {
    write_json(path, save)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::arc::ArcEpisode;
    use crate::model::time::SimTime;

    #[test]
    fn missing_config_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine_config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("engine_config.json");
        let mut cfg = EngineConfig::default();
        cfg.cooldown.days = 12;
        cfg.fallbacks.background = vec!["Trader".into()];

        save_config_to(&path, &cfg).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn state_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let save = EngineSave {
            active_arc: Some(ArcEpisode::new("Siege", 3, SimTime::from_days(4.0))),
            last_cooldown_event: Some(SimTime::from_days(2.0)),
            ..EngineSave::default()
        };

        save_state(&path, &save).unwrap();
        assert_eq!(load_state(&path).unwrap(), save);
    }
}
