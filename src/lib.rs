//! Weekly work window language: tells long-running workers when they may work.
#![deny(unsafe_code, warnings, missing_docs)]

//! This crate is intended to:
//! - parse a tiny schedule language which allows or forbids intervals of the week;
//! - answer whether some moment is allowed by such a schedule;
//! - find the nearest allowed moment or wait for it.
//!
//! Typical usage is a background job which should run only during quiet hours
//! or must not touch a database during business hours.
//!
//! _This is not a jobs scheduler or runner._ The schedule just tells when work is permitted.
//!
//! ## Schedule language
//!
//! A schedule is a sequence of groups, every group is a day (or a range of days) followed by one or more agendas,
//! every agenda is a directive (`allow` or `forbid`) followed by one or more intervals:
//!
//! ```text
//! sunday allow 0000
//! monday-friday allow 0000 forbid 0800-2000
//! saturday allow -1400
//! ```
//!
//! | Element    | Syntax                            | Meaning                                                      |
//! |------------|-----------------------------------|--------------------------------------------------------------|
//! | Day        | `sunday`..`saturday`, `sun`..`sat` | single day of the week, any case                             |
//! | Days range | `DAY-DAY`                         | all days from the first to the last, wraps over the week end |
//! | Directive  | `allow`, `forbid`                 | any case                                                     |
//! | Time       | `HHMM`                            | 24-hour clock, `0000`..`2359`                                |
//! | Interval   | `HHMM-HHMM`                       | both ends inclusive with minute precision                    |
//! | Interval   | `HHMM`                            | from the time until the end of the day (`2359`)              |
//! | Interval   | `-HHMM`                           | from the start of the day (`0000`) until the time            |
//!
//! Some details:
//! - tokens are separated by spaces, tabs or line ends, the layout doesn't matter;
//! - `wed-tue` is the whole week starting from Wednesday, `fri-fri` is Friday only;
//! - a moment is allowed if it's within at least one allowed interval and isn't within any forbidden interval,
//!   so `forbid` always wins regardless of the order;
//! - an interval is bound to its day, so a start later than the end (`2000-0800`) matches nothing.
//!
//! Malformed sources are rejected with [`Error::Lexer`] or [`Error::Parser`],
//! the message shows the position and the offending line with an arrow below the problem.
//! Lines and columns are counted from zero.
//!
//! ## Timezones
//!
//! The language itself has no timezones: a parsed [`Schedule`] is bound to a [`chrono_tz::Tz`] timezone
//! (UTC by default), and every moment is converted into that timezone before evaluation.
//! Results are returned in the timezone of the provided moment.
//!
//! ## How to use
//!
//! The main entity of the crate is a [`Schedule`] structure:
//! - [from_dsl()](Schedule::from_dsl): parses the schedule language and binds the result to a timezone;
//! - [is_allowed_at()](Schedule::is_allowed_at): checks whether the moment is allowed;
//! - [next_moment_allowed_after()](Schedule::next_moment_allowed_after): returns the nearest allowed moment;
//! - [sleep_until_allowed()](Schedule::sleep_until_allowed): blocks the current thread until work is allowed.
//!
//! ### Example
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use work_window::{Result, Schedule};
//!
//! fn quiet_hours() -> Result<()> {
//!     let schedule = Schedule::from_dsl(
//!         "sunday allow 0000 monday-friday allow 0000 forbid 0800-2000 saturday allow -1400",
//!         chrono_tz::Europe::Kyiv,
//!     )?;
//!
//!     // Monday noon in Kyiv is a business hour.
//!     let moment = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
//!     assert!(!schedule.is_allowed_at(&moment));
//!
//!     // Work may be resumed at 20:01 Kyiv time, which is 17:01 UTC.
//!     let next = schedule.next_moment_allowed_after(&moment)?;
//!     assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 3, 17, 1, 0).unwrap());
//!
//!     // Render the schedule back into the language.
//!     println!("{schedule}");
//!
//!     Ok(())
//! }
//!
//! quiet_hours().unwrap();
//! ```
//!
//! Lower level building blocks are public as well: [`Lexer`] produces [`Token`]s,
//! [`Parser`] turns them into a [`Schedule`], and [`Trie`] keeps keywords for prefix matching.
//!
//! # Feature flags
//! * `serde`: adds [`Serialize`](https://docs.rs/serde/latest/serde/trait.Serialize.html) and [`Deserialize`](https://docs.rs/serde/latest/serde/trait.Deserialize.html) trait implementation for [`Schedule`] and its parts.

/// Crate specific Error implementation.
pub mod error;
/// Time of day, intervals and directives of the schedule.
pub mod interval;
/// Tokenizer of the schedule language.
pub mod lexer;
/// Recursive descent parser of the schedule language.
pub mod parser;
/// Weekly schedule model and its evaluation.
pub mod schedule;
/// Prefix tree of keywords.
pub mod trie;
mod utils;

// Re-export of public entities.
pub use error::Error;
pub use interval::{Agenda, Directive, Interval, Time, WeekdayInterval};
pub use lexer::{Lexer, LexerOptions, Position, Token, TokenKind};
pub use parser::Parser;
pub use schedule::Schedule;
pub use trie::Trie;

/// Convenient alias for `Result`.
pub type Result<T, E = Error> = std::result::Result<T, E>;
