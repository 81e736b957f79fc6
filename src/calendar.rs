use crate::errors::ConfigError;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Business-day arithmetic over a fixed weekly pattern. No holidays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkCalendar {
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn from_config(config: &WorkCalendarConfig) -> Result<Self, ConfigError> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err(ConfigError::NoWorkingDays);
        }
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();
        Ok(Self { non_working_days })
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !self.non_working_days.contains(&date.weekday())
    }

    /// Returns `from` itself when it is a working day, otherwise the next one.
    /// `None` once the walk runs past the last representable date.
    pub fn next_business_day(&self, from: NaiveDate) -> Option<NaiveDate> {
        let mut current = from;
        while !self.is_business_day(current) {
            current = current.succ_opt()?;
        }
        Some(current)
    }

    /// The n-th business day strictly after `from`. `n <= 0` returns `from`.
    /// `None` on date overflow.
    pub fn add_business_days(&self, from: NaiveDate, n: i64) -> Option<NaiveDate> {
        let mut current = from;
        let mut count = 0;
        while count < n {
            current = current.succ_opt()?;
            if self.is_business_day(current) {
                count += 1;
            }
        }
        Some(current)
    }

    /// Count business days in the inclusive range `start..=end`.
    pub fn count_business_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        let mut count = 0;
        let mut current = start;
        while current <= end {
            if self.is_business_day(current) {
                count += 1;
            }
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        count
    }

    /// Number of business days that `add_business_days(from, _)` needs to reach
    /// the first business day on or after `to`. Zero when `to <= from`.
    pub fn business_days_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        match from.succ_opt() {
            Some(next) if to > from => self.count_business_days(next, to),
            _ => 0,
        }
    }
}

impl WorkCalendarConfig {
    pub fn new<I>(working_days: I) -> Self
    where
        I: IntoIterator<Item = Weekday>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());
        Self {
            working_days: working,
        }
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        Self::new(
            WorkCalendar::ALL_WEEKDAYS
                .into_iter()
                .filter(|day| !calendar.non_working_days.contains(day)),
        )
    }
}
