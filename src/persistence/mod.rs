use crate::errors::{ConfigError, ScheduleError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schedule rejected snapshot: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("invalid config in snapshot: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub mod file;

pub use file::{ScheduleSnapshot, TaskSnapshot, load_schedule_from_json, save_schedule_to_json};
