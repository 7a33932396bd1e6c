// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Config file looked up when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dayplan.toml")
}

/// Read and deserialize a config file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Read, deserialize and validate a config file.
///
/// Relative `[store].path` values are resolved against the config file's
/// directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let mut cfg = ConfigFile::try_from(raw)?;

    if cfg.store.path.is_relative() {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            cfg.store.path = dir.join(&cfg.store.path);
        }
    }

    debug!(path = %path.display(), store = %cfg.store.path.display(), "config loaded");
    Ok(cfg)
}

/// Like [`load_and_validate`], but a missing file yields the defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(ConfigFile::default());
    }
    load_and_validate(path)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::errors::PlannerError;

    #[test]
    fn store_path_resolves_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("Dayplan.toml");
        let mut f = fs::File::create(&cfg_path).unwrap();
        writeln!(f, "[planner]\ndaily_minutes = 240\n\n[store]\npath = \"data.toml\"").unwrap();

        let cfg = load_and_validate(&cfg_path).unwrap();
        assert_eq!(cfg.planner_settings().daily_minutes, 240);
        assert_eq!(cfg.store.path, dir.path().join("data.toml"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_or_default(dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.planner.daily_minutes, 480);
    }

    #[test]
    fn missing_file_is_an_io_error_when_required() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, PlannerError::Io(_)));
    }
}
