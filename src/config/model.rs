// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::planner::PlannerSettings;
use crate::types::Minutes;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [planner]
/// daily_minutes = 480
/// horizon_days = 365
///
/// [store]
/// path = "dayplan.toml"
/// ```
///
/// All sections are optional and have defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub planner: PlannerSection,

    #[serde(default)]
    pub store: StoreSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub planner: PlannerSection,
    pub store: StoreSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(planner: PlannerSection, store: StoreSection) -> Self {
        Self { planner, store }
    }

    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            daily_minutes: self.planner.daily_minutes,
            horizon_days: self.planner.horizon_days,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(PlannerSection::default(), StoreSection::default())
    }
}

/// `[planner]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerSection {
    /// Nominal time budget of a day, before events and today's consumed time.
    #[serde(default = "default_daily_minutes")]
    pub daily_minutes: Minutes,

    /// How many days ahead the scheduler searches for a free slot.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

fn default_daily_minutes() -> Minutes {
    480
}

fn default_horizon_days() -> u32 {
    365
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            daily_minutes: default_daily_minutes(),
            horizon_days: default_horizon_days(),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// Data file used by the TOML file store. Relative paths resolve against
    /// the config file's directory.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("dayplan.toml")
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}
