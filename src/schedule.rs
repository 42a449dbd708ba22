use crate::{
    interval::{Agenda, Directive, Interval, WeekdayInterval},
    lexer::Lexer,
    parser::Parser,
    utils, Error, Result,
};
use chrono::{DateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use std::{fmt::Display, str::FromStr, time::Duration};

const NO_ALLOWED_INTERVALS: &str = "no allowed intervals in the schedule";

/// Weekly set of allowed and forbidden time intervals in some timezone.
///
/// A moment is allowed if it's within at least one allowed interval and isn't within any forbidden one,
/// so forbidden intervals always take precedence regardless of the order they were added.
///
/// For schedule language description and usage examples, please refer to the [crate documentation](crate).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schedule {
    allowed: Vec<WeekdayInterval>,
    forbidden: Vec<WeekdayInterval>,
    tz: Tz,
}

impl Default for Schedule {
    /// Empty schedule in UTC.
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Schedule {
    /// Constructs empty schedule in the `tz` timezone, nothing is allowed.
    pub fn new(tz: Tz) -> Self {
        Self {
            allowed: Vec::new(),
            forbidden: Vec::new(),
            tz,
        }
    }

    /// Constructs schedule which allows the whole week in the `tz` timezone.
    pub fn always_allowed(tz: Tz) -> Self {
        let mut schedule = Self::new(tz);
        schedule.add_agenda_on_days(
            &Agenda::new(Directive::Allow, vec![Interval::whole_day()]),
            &(0..7).map(utils::weekday_from_index).collect::<Vec<_>>(),
        );
        schedule
    }

    /// Parses schedule `source` and binds the result to the `tz` timezone.
    ///
    /// Returns [`Error::Lexer`] or [`Error::Parser`] with a diagnostic of the first problem in the source.
    pub fn from_dsl(source: &str, tz: Tz) -> Result<Self> {
        let schedule = Parser::new(Lexer::new(source)).parse()?;
        Ok(schedule.with_tz(tz))
    }

    /// Same as [`from_dsl()`](Schedule::from_dsl) but takes IANA name of the timezone, like `Europe/Kyiv`.
    pub fn from_dsl_in(source: &str, tz: &str) -> Result<Self> {
        let tz = Tz::from_str(tz).map_err(|_| Error::InvalidTimeZone(tz.to_owned()))?;
        Self::from_dsl(source, tz)
    }

    /// Returns the same schedule bound to another timezone.
    pub fn with_tz(self, tz: Tz) -> Self {
        Self { tz, ..self }
    }

    /// Allowed intervals in order of addition.
    pub fn allowed(&self) -> &[WeekdayInterval] {
        &self.allowed
    }

    /// Forbidden intervals in order of addition.
    pub fn forbidden(&self) -> &[WeekdayInterval] {
        &self.forbidden
    }

    /// Timezone of the schedule.
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Appends allowed interval.
    pub fn allow(&mut self, interval: WeekdayInterval) {
        self.allowed.push(interval);
    }

    /// Appends forbidden interval.
    pub fn forbid(&mut self, interval: WeekdayInterval) {
        self.forbidden.push(interval);
    }

    /// Binds every interval of the `agenda` to each of the `days` and appends the result
    /// to the allowed or forbidden intervals, according to the agenda's directive.
    pub fn add_agenda_on_days(&mut self, agenda: &Agenda, days: &[Weekday]) {
        let intervals = agenda
            .intervals
            .iter()
            .flat_map(|interval| days.iter().map(|day| WeekdayInterval::new(*day, *interval)));

        match agenda.directive {
            Directive::Allow => self.allowed.extend(intervals),
            Directive::Forbid => self.forbidden.extend(intervals),
        }
    }

    /// Applies every agenda in order, see [`add_agenda_on_days()`](Schedule::add_agenda_on_days).
    pub fn add_agendas_on_days(&mut self, agendas: &[Agenda], days: &[Weekday]) {
        for agenda in agendas {
            self.add_agenda_on_days(agenda, days);
        }
    }

    /// Returns `true` if the `moment` is allowed by the schedule.
    ///
    /// The `moment` is converted into the schedule's timezone before evaluation.
    pub fn is_allowed_at<T: TimeZone>(&self, moment: &DateTime<T>) -> bool {
        let moment = moment.with_timezone(&self.tz);
        self.allowed.iter().any(|wdi| wdi.contains(&moment)) && !self.forbidden.iter().any(|wdi| wdi.contains(&moment))
    }

    /// Returns [`Error::Schedule`] if the `moment` isn't allowed.
    pub fn is_allowed_at_or_raise<T: TimeZone>(&self, moment: &DateTime<T>) -> Result<()> {
        if self.is_allowed_at(moment) {
            Ok(())
        } else {
            let moment = moment.with_timezone(&self.tz);
            Err(Error::Schedule(format!("{} is not allowed", moment.format("%A %H:%M"))))
        }
    }

    /// Returns `true` if the current moment is allowed.
    pub fn is_allowed_now(&self) -> bool {
        self.is_allowed_at(&Utc::now())
    }

    /// Returns [`Error::Schedule`] if the current moment isn't allowed.
    pub fn is_allowed_now_or_raise(&self) -> Result<()> {
        self.is_allowed_at_or_raise(&Utc::now())
    }

    /// Returns the nearest allowed moment starting from the `moment` (inclusively).
    ///
    /// Result is in the timezone of the provided `moment`.
    /// Returns [`Error::Schedule`] if the schedule doesn't allow anything at all.
    pub fn next_moment_allowed_after<T: TimeZone>(&self, moment: &DateTime<T>) -> Result<DateTime<T>> {
        let caller_tz = moment.timezone();
        let moment = moment.with_timezone(&self.tz);

        // The nearest allowed moment may be the moment itself, the start of an allowed interval,
        // or the minute after the end of a forbidden one.
        let mut candidates: Vec<DateTime<Tz>> = self
            .allowed
            .iter()
            .map(|wdi| wdi.next_start_after(&moment))
            .chain(self.forbidden.iter().map(|wdi| wdi.next_end_after(&moment)))
            .collect();
        tracing::trace!(candidates = candidates.len() + 1, %moment, "looking for the next allowed moment");
        candidates.push(moment);

        candidates
            .into_iter()
            .filter(|candidate| self.is_allowed_at(candidate))
            .min()
            .map(|next| next.with_timezone(&caller_tz))
            .ok_or_else(|| Error::Schedule(NO_ALLOWED_INTERVALS.to_owned()))
    }

    /// Returns how long to wait from the `moment` until the schedule allows to work,
    /// zero if the `moment` is allowed.
    pub fn duration_until_allowed<T: TimeZone>(&self, moment: &DateTime<T>) -> Result<Duration> {
        if self.is_allowed_at(moment) {
            return Ok(Duration::ZERO);
        }

        let next = self.next_moment_allowed_after(moment)?;
        Ok((next - moment.clone()).to_std().unwrap_or_default())
    }

    /// Blocks the current thread until the schedule allows to work.
    ///
    /// Returns immediately if the current moment is allowed.
    /// The sleep can't be interrupted, so use it in a dedicated thread if cancellation is needed.
    pub fn sleep_until_allowed(&self) -> Result<()> {
        let now = Utc::now();
        if self.is_allowed_at(&now) {
            return Ok(());
        }

        let next = self.next_moment_allowed_after(&now)?;
        let duration = (next - now).to_std().unwrap_or_default();
        tracing::debug!(%next, ?duration, tz = %self.tz, "sleeping until the schedule allows to work");
        std::thread::sleep(duration);

        Ok(())
    }
}

impl Display for Schedule {
    /// Renders schedule in its own language, one interval per line, allowed first.
    ///
    /// The timezone isn't a part of the language, so it's omitted.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines = self
            .allowed
            .iter()
            .map(|wdi| (Directive::Allow, wdi))
            .chain(self.forbidden.iter().map(|wdi| (Directive::Forbid, wdi)));

        for (index, (directive, wdi)) in lines.enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "{} {directive} {}",
                utils::DAYS_OF_WEEK[wdi.day_of_week.num_days_from_sunday() as usize],
                wdi.interval
            )?;
        }

        Ok(())
    }
}

impl TryFrom<String> for Schedule {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<&str> for Schedule {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}

impl FromStr for Schedule {
    type Err = Error;

    /// Parses schedule in UTC timezone.
    fn from_str(s: &str) -> Result<Self> {
        Self::from_dsl(s, Tz::UTC)
    }
}
