use crate::{utils, Error, Result};
use chrono::{DateTime, Datelike, Days, NaiveTime, TimeDelta, TimeZone, Timelike, Weekday};
use std::{fmt::Display, str::FromStr};

/// Time of the day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Time {
    hour: u8,
    minute: u8,
}

impl Time {
    /// Constructs time from the `hour` (0-23) and `minute` (0-59).
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            Err(Error::InvalidTime(format!("{hour:02}:{minute:02}")))
        } else {
            Ok(Self { hour, minute })
        }
    }

    /// 00:00
    pub const fn start_of_day() -> Self {
        Self { hour: 0, minute: 0 }
    }

    /// 23:59
    pub const fn end_of_day() -> Self {
        Self { hour: 23, minute: 59 }
    }

    /// Hour of the day, 0-23.
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute of the hour, 0-59.
    pub const fn minute(&self) -> u8 {
        self.minute
    }
}

impl FromStr for Time {
    type Err = Error;

    /// Parses four-digit `HHMM` representation.
    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidTime(s.to_owned()));
        }

        let hour = s[..2].parse().map_err(|_| Error::InvalidTime(s.to_owned()))?;
        let minute = s[2..].parse().map_err(|_| Error::InvalidTime(s.to_owned()))?;
        Self::new(hour, minute).map_err(|_| Error::InvalidTime(s.to_owned()))
    }
}

impl TryFrom<String> for Time {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Time> for String {
    fn from(value: Time) -> Self {
        value.to_string()
    }
}

impl From<Time> for NaiveTime {
    fn from(value: Time) -> Self {
        NaiveTime::from_hms_opt(value.hour as u32, value.minute as u32, 0).unwrap_or_default()
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}{:02}", self.hour, self.minute)
    }
}

/// Time interval within a day, both ends are inclusive.
///
/// There is no requirement for `start` to precede `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    /// First minute of the interval.
    pub start: Time,
    /// Last minute of the interval.
    pub end: Time,
}

impl Interval {
    /// Constructs interval from its ends.
    pub const fn new(start: Time, end: Time) -> Self {
        Self { start, end }
    }

    /// The whole day, 00:00-23:59.
    pub const fn whole_day() -> Self {
        Self::new(Time::start_of_day(), Time::end_of_day())
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// What to do within the intervals of an [`Agenda`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Directive {
    /// Work is permitted.
    Allow,
    /// Work is prohibited, overrides any [`Directive::Allow`].
    Forbid,
}

impl Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Directive::Allow => write!(f, "allow"),
            Directive::Forbid => write!(f, "forbid"),
        }
    }
}

/// Set of intervals sharing the same directive, not bound to particular days yet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Agenda {
    /// Intervals in the source order.
    pub intervals: Vec<Interval>,
    /// Directive applied to every interval.
    pub directive: Directive,
}

impl Agenda {
    /// Constructs agenda.
    pub fn new(directive: Directive, intervals: Vec<Interval>) -> Self {
        Self { intervals, directive }
    }
}

/// Interval of time within a single day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeekdayInterval {
    /// Day of the week this interval belongs to.
    pub day_of_week: Weekday,
    /// Time interval within the day.
    pub interval: Interval,
}

impl WeekdayInterval {
    /// Constructs interval bound to the `day_of_week`.
    pub const fn new(day_of_week: Weekday, interval: Interval) -> Self {
        Self { day_of_week, interval }
    }

    /// Returns `true` if `dt` falls within this interval, both ends inclusive.
    ///
    /// The check uses wall clock values of `dt` as is, so it should be already converted
    /// into the timezone of the schedule.
    pub fn contains<Tz: TimeZone>(&self, dt: &DateTime<Tz>) -> bool {
        if dt.weekday() != self.day_of_week {
            return false;
        }

        let (hour, minute) = (dt.hour() as u8, dt.minute() as u8);
        let Interval { start, end } = self.interval;

        (start.hour < hour && hour < end.hour)
            || (start.hour == hour && hour != end.hour && start.minute <= minute)
            || (start.hour != hour && hour == end.hour && minute <= end.minute)
            || (start.hour == hour && hour == end.hour && start.minute <= minute && minute <= end.minute)
    }

    /// Returns the nearest start of this interval at or after the `moment`.
    ///
    /// A start which has already passed today rolls over to the same day next week.
    pub fn next_start_after<Tz: TimeZone>(&self, moment: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = moment.timezone();
        let date = utils::this_or_next_weekday(moment.date_naive(), self.day_of_week);
        let start = utils::at_time(&tz, date, self.interval.start);

        if start >= *moment {
            start
        } else {
            utils::at_time(&tz, date + Days::new(7), self.interval.start)
        }
    }

    /// Returns the nearest moment right after the end of this interval (end + 1 minute),
    /// strictly after the `moment`.
    pub fn next_end_after<Tz: TimeZone>(&self, moment: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = moment.timezone();
        let date = utils::this_or_next_weekday(moment.date_naive(), self.day_of_week);
        let end = utils::at_time(&tz, date, self.interval.end) + TimeDelta::minutes(1);

        if end > *moment {
            end
        } else {
            utils::at_time(&tz, date + Days::new(7), self.interval.end) + TimeDelta::minutes(1)
        }
    }
}

impl Display for WeekdayInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            utils::DAYS_OF_WEEK[self.day_of_week.num_days_from_sunday() as usize],
            self.interval
        )
    }
}
