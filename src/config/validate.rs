// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PlannerError, Result};
use crate::model::MINUTES_PER_DAY;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PlannerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.planner, raw.store))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_planner(cfg)?;
    validate_store(cfg)?;
    Ok(())
}

fn validate_planner(cfg: &RawConfigFile) -> Result<()> {
    let daily = cfg.planner.daily_minutes;
    if !(1..=MINUTES_PER_DAY).contains(&daily) {
        return Err(PlannerError::ConfigError(format!(
            "[planner].daily_minutes must be within 1..={MINUTES_PER_DAY} (got {daily})"
        )));
    }
    if cfg.planner.horizon_days == 0 {
        return Err(PlannerError::ConfigError(
            "[planner].horizon_days must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_store(cfg: &RawConfigFile) -> Result<()> {
    if cfg.store.path.as_os_str().is_empty() {
        return Err(PlannerError::ConfigError(
            "[store].path must not be empty".to_string(),
        ));
    }
    Ok(())
}
