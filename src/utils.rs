/// Common utility functions.
use crate::interval::Time;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone, Weekday};

/// Full day names, indexed by the number of days from Sunday.
pub(crate) const DAYS_OF_WEEK: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Short day names, indexed by the number of days from Sunday.
pub(crate) const DAYS_OF_WEEK_SHORT: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Maximum width of the source line shown in diagnostics.
const ERROR_LINE_WIDTH: usize = 80;
/// How many characters to keep to the left of the error column when truncating.
const ERROR_LINE_LEAD: usize = 39;
const ERROR_PADDING: &str = "     ";

/// Converts full or short day name (any case) into a weekday.
pub(crate) fn parse_day_of_week(input: &str) -> Option<Weekday> {
    if input.is_empty() {
        None
    } else {
        let input = input.to_lowercase();
        DAYS_OF_WEEK
            .iter()
            .position(|&x| x == input)
            .or_else(|| DAYS_OF_WEEK_SHORT.iter().position(|&x| x == input))
            .map(weekday_from_index)
    }
}

/// Converts number of days from Sunday (modulo 7) into a weekday.
pub(crate) fn weekday_from_index(index: usize) -> Weekday {
    match index % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

/// Returns the date of the nearest `target` weekday, starting from `date` inclusively.
pub(crate) fn this_or_next_weekday(date: NaiveDate, target: Weekday) -> NaiveDate {
    let ahead = (7 + target.num_days_from_sunday() - date.weekday().num_days_from_sunday()) % 7;
    date + Days::new(ahead as u64)
}

/// Builds timestamp of the `time` at the `date` in the `tz` timezone.
///
/// Ambiguous local time resolves to the earliest instant,
/// non-existent local time (DST gap) is shifted one hour forward.
pub(crate) fn at_time<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: Time) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::from(time));
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// Renders source `line` with an arrow pointing to the `column`.
///
/// Long lines are truncated to the window of [`ERROR_LINE_WIDTH`] characters
/// which keeps the error column visible.
pub(crate) fn render_error_line(line: &str, column: usize) -> String {
    let start = column.saturating_sub(ERROR_LINE_LEAD);
    let visible: String = line.chars().skip(start).take(ERROR_LINE_WIDTH).collect();
    let arrow = " ".repeat(column - start);

    format!(
        "{ERROR_PADDING}{}\n{ERROR_PADDING}{arrow}^",
        visible.trim_end_matches(['\n', '\r'])
    )
}
