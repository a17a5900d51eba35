use crate::event::EventKind;
use crate::slots::SlotGrid;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default duration in minutes per event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindDurations {
    pub operation: u32,
    pub training: u32,
    pub meeting: u32,
    pub social: u32,
}

impl Default for KindDurations {
    fn default() -> Self {
        Self {
            operation: 180,
            training: 90,
            meeting: 60,
            social: 120,
        }
    }
}

impl KindDurations {
    pub fn for_kind(&self, kind: EventKind) -> u32 {
        match kind {
            EventKind::Operation => self.operation,
            EventKind::Training => self.training,
            EventKind::Meeting => self.meeting,
            EventKind::Social => self.social,
        }
    }
}

/// Scheduling policy constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Minimum distance between two Operation start times on one date.
    pub min_separation_minutes: u32,
    /// Number of future events every active series keeps materialised.
    pub rolling_horizon: usize,
    /// Smallest rendered height of a timed event.
    pub min_visual_minutes: u32,
    pub durations: KindDurations,
    pub slot_grid: SlotGrid,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            min_separation_minutes: 210,
            rolling_horizon: 8,
            min_visual_minutes: 15,
            durations: KindDurations::default(),
            slot_grid: SlotGrid::default(),
        }
    }
}

impl SchedulingConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_separation_minutes == 0 {
            return Err(ConfigError::Invalid(
                "min_separation_minutes must be greater than zero".into(),
            ));
        }
        if self.rolling_horizon == 0 {
            return Err(ConfigError::Invalid(
                "rolling_horizon must be greater than zero".into(),
            ));
        }
        if self.min_visual_minutes == 0 {
            return Err(ConfigError::Invalid(
                "min_visual_minutes must be greater than zero".into(),
            ));
        }
        for kind in EventKind::ALL {
            if self.durations.for_kind(kind) == 0 {
                return Err(ConfigError::Invalid(format!(
                    "default duration for {kind} must be greater than zero"
                )));
            }
        }
        self.slot_grid.validate()
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let file = File::open(path)?;
        let config: SchedulingConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_json_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        self.validate()?;
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Reads the file named by `var` when it is set, defaults otherwise.
    pub fn from_env_path(var: &str) -> ConfigResult<Self> {
        match std::env::var_os(var) {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::default()),
        }
    }
}
