use crate::calendar::{WorkCalendar, WorkCalendarConfig};
use crate::errors::ConfigError;
use crate::task::DEFAULT_RESOURCE;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub calendar: WorkCalendarConfig,
    /// Lane used for tasks saved without an explicit resource.
    pub default_resource: String,
    /// Pins "today" for timeline fallbacks. Uses the local clock when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_date: Option<NaiveDate>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            calendar: WorkCalendarConfig::default(),
            default_resource: DEFAULT_RESOURCE.to_string(),
            anchor_date: None,
        }
    }
}

impl ScheduleConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|err| ConfigError::Read(format!("{}: {err}", path.as_ref().display())))?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|err| ConfigError::Read(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_resource.trim().is_empty() {
            return Err(ConfigError::EmptyResource);
        }
        WorkCalendar::from_config(&self.calendar).map(|_| ())
    }

    pub fn build_calendar(&self) -> Result<WorkCalendar, ConfigError> {
        WorkCalendar::from_config(&self.calendar)
    }

    pub fn today(&self) -> NaiveDate {
        self.anchor_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
