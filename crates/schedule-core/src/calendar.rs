use chrono::{Datelike, Days, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("a work calendar requires at least one working day")]
    NoWorkingDays,
}

/// Strategy that maps whole-day offsets from a project origin onto dates.
///
/// The scheduler works purely in day offsets; a counter decides which days
/// count. Offsets are exclusive at the finish: a five day task starting at
/// offset 0 finishes at offset 5.
pub trait DayCounter: fmt::Debug + Send + Sync {
    /// `None` when the offset lands outside the representable date range.
    fn date_at(&self, origin: NaiveDate, offset: i64) -> Option<NaiveDate>;

    fn offset_of(&self, origin: NaiveDate, date: NaiveDate) -> i64;

    /// Counted days between `start` and `finish` (negative when reversed).
    fn days_between(&self, start: NaiveDate, finish: NaiveDate) -> i64 {
        self.offset_of(start, finish)
    }
}

/// Every day counts. This is the default strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarDays;

impl DayCounter for CalendarDays {
    fn date_at(&self, origin: NaiveDate, offset: i64) -> Option<NaiveDate> {
        let days = Days::new(offset.unsigned_abs());
        if offset >= 0 {
            origin.checked_add_days(days)
        } else {
            origin.checked_sub_days(days)
        }
    }

    fn offset_of(&self, origin: NaiveDate, date: NaiveDate) -> i64 {
        (date - origin).num_days()
    }
}

/// Pick the day counter described by an optional calendar configuration.
pub fn day_counter_for(
    config: Option<&WorkCalendarConfig>,
) -> Result<Arc<dyn DayCounter>, CalendarError> {
    match config {
        Some(config) => Ok(Arc::new(WorkCalendar::from_config(config)?)),
        None => Ok(Arc::new(CalendarDays)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    #[serde(default)]
    holidays: Vec<NaiveDate>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::with_year_range(2025, 2025)
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

    /// Monday to Friday with US federal holidays for the inclusive year range.
    pub fn with_year_range(start_year: i32, end_year: i32) -> Self {
        let (start, end) = if start_year <= end_year {
            (start_year, end_year)
        } else {
            (end_year, start_year)
        };

        let mut calendar = Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        };
        for year in start..=end {
            calendar.add_us_holidays(year);
        }
        calendar
    }

    pub fn custom<I, J>(working_days: I, holidays: J) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let config = WorkCalendarConfig::new(working_days, holidays)?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &WorkCalendarConfig) -> Result<Self, CalendarError> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();

        Ok(Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        })
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    fn add_us_holidays(&mut self, year: i32) {
        let fixed = [(1, 1), (7, 4), (11, 11), (12, 25)];
        for (month, day) in fixed {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.holidays.insert(date);
            }
        }

        // MLK, Presidents', Labor, Columbus, Thanksgiving
        let floating = [
            (1, Weekday::Mon, 3),
            (2, Weekday::Mon, 3),
            (9, Weekday::Mon, 1),
            (10, Weekday::Mon, 2),
            (11, Weekday::Thu, 4),
        ];
        for (month, weekday, n) in floating {
            if let Some(date) = Self::nth_weekday(year, month, weekday, n) {
                self.holidays.insert(date);
            }
        }

        // Memorial Day
        if let Some(date) = Self::last_weekday(year, 5, Weekday::Mon) {
            self.holidays.insert(date);
        }
    }

    fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
        NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
    }

    fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
        let first_of_next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let mut date = first_of_next.pred_opt()?;
        while date.weekday() != weekday {
            date = date.pred_opt()?;
        }
        Some(date)
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    /// Add the same month/day holiday for every year in the inclusive range.
    pub fn add_recurring_holiday(&mut self, month: u32, day: u32, start_year: i32, end_year: i32) {
        for year in start_year..=end_year {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.holidays.insert(date);
            }
        }
    }

    pub fn set_working_days(&mut self, days: &[Weekday]) -> Result<(), CalendarError> {
        if days.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        self.non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !days.contains(day))
            .collect();
        Ok(())
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }

    /// First available date strictly after `from`.
    pub fn next_available(&self, from: NaiveDate) -> Option<NaiveDate> {
        let mut current = from.succ_opt()?;
        while !self.is_available(current) {
            current = current.succ_opt()?;
        }
        Some(current)
    }

    /// First available date strictly before `from`.
    pub fn prev_available(&self, from: NaiveDate) -> Option<NaiveDate> {
        let mut current = from.pred_opt()?;
        while !self.is_available(current) {
            current = current.pred_opt()?;
        }
        Some(current)
    }

    /// The date `days_ahead` available days after `from`.
    pub fn find_next_available(&self, from: NaiveDate, days_ahead: u64) -> Option<NaiveDate> {
        let mut current = from;
        for _ in 0..days_ahead {
            current = self.next_available(current)?;
        }
        Some(current)
    }

    /// The date `days_back` available days before `from`.
    pub fn find_prev_available(&self, from: NaiveDate, days_back: u64) -> Option<NaiveDate> {
        let mut current = from;
        for _ in 0..days_back {
            current = self.prev_available(current)?;
        }
        Some(current)
    }

    pub fn count_available_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| self.is_available(*day))
            .count() as i64
    }

    fn anchor(&self, origin: NaiveDate) -> NaiveDate {
        if self.is_available(origin) {
            origin
        } else {
            self.next_available(origin).unwrap_or(origin)
        }
    }
}

impl DayCounter for WorkCalendar {
    fn date_at(&self, origin: NaiveDate, offset: i64) -> Option<NaiveDate> {
        let base = self.anchor(origin);
        if offset >= 0 {
            self.find_next_available(base, offset.unsigned_abs())
        } else {
            self.find_prev_available(base, offset.unsigned_abs())
        }
    }

    // Number of available days in [base, date), negated when date precedes base.
    fn offset_of(&self, origin: NaiveDate, date: NaiveDate) -> i64 {
        let base = self.anchor(origin);
        if date > base {
            self.count_available_days(base, date - Duration::days(1))
        } else if date < base {
            -self.count_available_days(date, base - Duration::days(1))
        } else {
            0
        }
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        if working.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup();

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Ok(Self {
            working_days: working,
            holidays,
        })
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let working_days = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day))
            .collect();

        let mut holidays: Vec<NaiveDate> = calendar.holidays.iter().copied().collect();
        holidays.sort();

        Self {
            working_days,
            holidays,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn calendar_days_offsets_are_plain_differences() {
        let origin = d(2025, 1, 1);
        assert_eq!(CalendarDays.date_at(origin, 11), Some(d(2025, 1, 12)));
        assert_eq!(CalendarDays.offset_of(origin, d(2024, 12, 30)), -2);
    }

    #[test]
    fn work_calendar_offsets_skip_weekends_both_ways() {
        let cal = WorkCalendar::custom(
            [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
            Vec::<NaiveDate>::new(),
        )
        .unwrap();
        let monday = d(2025, 1, 6);
        assert_eq!(cal.date_at(monday, 5), Some(d(2025, 1, 13)));
        assert_eq!(cal.offset_of(monday, d(2025, 1, 13)), 5);
        assert_eq!(cal.date_at(monday, -1), Some(d(2025, 1, 3)));
        assert_eq!(cal.offset_of(monday, d(2025, 1, 3)), -1);
        // a weekend origin anchors on the following Monday
        assert_eq!(cal.date_at(d(2025, 1, 4), 0), Some(monday));
    }

    #[test]
    fn offsets_past_the_date_range_yield_none() {
        assert_eq!(CalendarDays.date_at(NaiveDate::MAX, 1), None);
        assert_eq!(CalendarDays.date_at(NaiveDate::MIN, -1), None);
        assert_eq!(CalendarDays.date_at(d(2025, 1, 1), i64::MAX), None);
        assert_eq!(CalendarDays.date_at(d(2025, 1, 1), i64::MIN), None);

        let cal = WorkCalendar::default();
        assert_eq!(cal.date_at(NaiveDate::MAX, 3), None);
    }

    #[test]
    fn empty_working_week_is_rejected() {
        assert_eq!(
            WorkCalendarConfig::new(Vec::<Weekday>::new(), Vec::<NaiveDate>::new()),
            Err(CalendarError::NoWorkingDays)
        );
    }
}
