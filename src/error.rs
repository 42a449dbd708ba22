use thiserror::Error;

/// Crate specific Errors implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Error {
    /// Malformed character sequence in the schedule source.
    ///
    /// Carries a multi-line diagnostic with the position, the offending source line and,
    /// when known, the characters that were expected.
    #[error("lexer error: {0}")]
    Lexer(String),
    /// Token sequence doesn't match the schedule grammar.
    #[error("parser error: {0}")]
    Parser(String),
    /// Schedule evaluation failure: a rejected moment or no allowed moment at all.
    #[error("schedule error: {0}")]
    Schedule(String),
    /// Invalid time of day value specified.
    #[error("invalid time value: {0}")]
    InvalidTime(String),
    /// Unknown timezone name specified.
    #[error("invalid time zone: {0}")]
    InvalidTimeZone(String),
}
