use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, TimeDelta};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::{ScheduleError, ScheduleResult};

/// Day of a scheduling week, Monday first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    /// Days since Monday
    pub fn offset(self) -> usize {
        self as usize
    }

    pub fn from_offset(offset: usize) -> Option<Day> {
        Day::ALL.get(offset).copied()
    }
}

/// Monday that starts the week containing `date`, using calendar arithmetic only
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    let weekday = date.weekday().num_days_from_sunday();
    let back = (weekday + 6) % 7;
    date.checked_sub_days(Days::new(back as u64)).unwrap_or(date)
}

/// Whether `s` has the exact `YYYY-MM-DD` shape
pub fn is_valid_week_key_string(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Canonical week identifier: the Monday starting a calendar week
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey(NaiveDate);

/// Display triple for a day chip, e.g. `Mon` / `Oct` / `13`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayLabel {
    pub weekday_abbrev: String,
    pub month_abbrev: String,
    pub day_number: u32,
}

impl WeekKey {
    /// Week key for the week containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        WeekKey(monday_of(date))
    }

    pub fn monday(&self) -> NaiveDate {
        self.0
    }

    /// Move by a signed number of weeks
    pub fn shift_weeks(&self, delta_weeks: i64) -> ScheduleResult<WeekKey> {
        TimeDelta::try_weeks(delta_weeks)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map(WeekKey::from_date)
            .ok_or_else(|| {
                ScheduleError::InvalidWeekKey(format!("{} shifted by {} weeks", self, delta_weeks))
            })
    }

    pub fn next(&self) -> ScheduleResult<WeekKey> {
        self.shift_weeks(1)
    }

    pub fn previous(&self) -> ScheduleResult<WeekKey> {
        self.shift_weeks(-1)
    }

    /// The seven dates of the week, Monday through Sunday
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.iter_days().take(7)
    }

    pub fn date_of(&self, day: Day) -> Option<NaiveDate> {
        self.0.checked_add_days(Days::new(day.offset() as u64))
    }

    /// Chip label for the day `day_offset` days after Monday
    pub fn day_label(&self, day_offset: usize) -> Option<DayLabel> {
        let date = self.date_of(Day::from_offset(day_offset)?)?;
        Some(DayLabel {
            weekday_abbrev: date.format("%a").to_string(),
            month_abbrev: date.format("%b").to_string(),
            day_number: date.day(),
        })
    }

    /// Heading such as `Week of Monday, October 13`
    pub fn week_label(&self) -> String {
        self.0.format("Week of %A, %B %-d").to_string()
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for WeekKey {
    type Err = ScheduleError;

    /// Parse a `YYYY-MM-DD` date and normalize it to the Monday of its week
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_valid_week_key_string(s) {
            return Err(ScheduleError::InvalidWeekKey(s.to_string()));
        }
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ScheduleError::InvalidWeekKey(s.to_string()))?;
        Ok(WeekKey::from_date(date))
    }
}

impl Serialize for WeekKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Zero-padded `YYYY-MM-DD` key of the Monday starting the week of `date`
pub fn week_key(date: NaiveDate) -> String {
    WeekKey::from_date(date).to_string()
}

/// Resolve a week selector from a URL, falling back to the week of `today`
pub fn resolve_week_param(param: Option<&str>, today: NaiveDate) -> WeekKey {
    match param.map(str::parse::<WeekKey>) {
        Some(Ok(week)) => week,
        Some(Err(err)) => {
            warn!("Ignoring week parameter, using current week: {}", err);
            WeekKey::from_date(today)
        }
        None => WeekKey::from_date(today),
    }
}
