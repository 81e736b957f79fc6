pub mod calculations;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod export;
pub mod graph;
pub mod logging;
pub mod persistence;
pub mod schedule;
pub mod task;
pub mod task_validation;
pub mod timeline;

pub use calculations::EffectiveDates;
pub use calendar::{WorkCalendar, WorkCalendarConfig};
pub use config::ScheduleConfig;
pub use errors::{ConfigError, ScheduleError, ScheduleResult};
pub use export::{ExportRecord, TaskStatus};
pub use schedule::{ProgressNode, Schedule};
pub use task::{Campaign, CampaignId, Sprint, SprintId, Task, TaskId, TaskInput};
pub use timeline::{TimelineRow, TimelineScope};
