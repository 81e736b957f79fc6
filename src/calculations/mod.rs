pub mod effective_dates;
pub mod progress;

pub use effective_dates::{DateResolver, EffectiveDates};
