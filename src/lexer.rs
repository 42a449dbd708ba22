use crate::{
    trie::Trie,
    utils::{self, DAYS_OF_WEEK, DAYS_OF_WEEK_SHORT},
    Error, Result,
};
use std::{fmt::Display, sync::OnceLock};

const ALLOW: &str = "allow";
const FORBID: &str = "forbid";

const HOUR_STARTS: [char; 3] = ['0', '1', '2'];
const HOUR_ENDS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
const HOUR_ENDS_2X: [char; 4] = ['0', '1', '2', '3'];
const MINUTE_STARTS: [char; 6] = ['0', '1', '2', '3', '4', '5'];
const MINUTE_ENDS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

static KEYWORDS: OnceLock<Trie> = OnceLock::new();

fn keywords() -> &'static Trie {
    KEYWORDS.get_or_init(|| {
        [ALLOW, FORBID]
            .into_iter()
            .chain(DAYS_OF_WEEK)
            .chain(DAYS_OF_WEEK_SHORT)
            .collect()
    })
}

/// Kind of the lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    /// No more input.
    EndInput,
    /// `allow` keyword.
    Allow,
    /// `forbid` keyword.
    Forbid,
    /// Full or three-letter day name.
    DayOfWeek,
    /// Four-digit `HHMM` time.
    Time,
    /// `-` separator.
    Dash,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::EndInput => "END_INPUT",
            TokenKind::Allow => "ALLOW",
            TokenKind::Forbid => "FORBID",
            TokenKind::DayOfWeek => "DAY_OF_WEEK",
            TokenKind::Time => "TIME",
            TokenKind::Dash => "DASH",
        };
        write!(f, "{name}")
    }
}

/// Zero-based position of the first token character in the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Line number.
    pub line: usize,
    /// Column (character offset) within the line.
    pub column: usize,
}

impl Position {
    /// Constructs position.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// Lexical token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// What kind of token it is.
    pub kind: TokenKind,
    /// Source text of the token as is.
    pub lexeme: String,
    /// Where the token starts.
    pub position: Position,
}

impl Token {
    /// Constructs token.
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }
}

/// Characters the lexer treats as separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LexerOptions {
    /// Insignificant characters within a line.
    pub whitespace: Vec<char>,
    /// Line terminator.
    pub end_of_line: char,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            whitespace: vec![' ', '\t', '\x0c'],
            end_of_line: '\n',
        }
    }
}

/// Splits schedule source into [`Token`]s.
///
/// The lexer stops at the first malformed character sequence and never tries to recover.
#[derive(Debug, Clone)]
pub struct Lexer {
    source: Vec<char>,
    options: LexerOptions,
    offset: usize,
    line: usize,
    line_start: usize,
}

impl Lexer {
    /// Constructs lexer with default [`LexerOptions`].
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_options(source, LexerOptions::default())
    }

    /// Constructs lexer with custom separators.
    pub fn with_options(source: impl Into<String>, options: LexerOptions) -> Self {
        let mut source: Vec<char> = source.into().chars().collect();
        // The last line always ends with a terminator, so the end of input is always at column 0.
        if source.last().is_some_and(|c| *c != options.end_of_line) {
            source.push(options.end_of_line);
        }

        Self {
            source,
            options,
            offset: 0,
            line: 0,
            line_start: 0,
        }
    }

    /// Current position of the cursor.
    pub fn position(&self) -> Position {
        Position::new(self.line, self.offset - self.line_start)
    }

    /// Returns the next token.
    ///
    /// After the end of input every call returns [`TokenKind::EndInput`].
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let position = self.position();
        let start = self.offset;
        let kind = match self.current() {
            None => TokenKind::EndInput,
            Some(c) if c.is_ascii_alphabetic() => self.keyword()?,
            Some(c) if HOUR_STARTS.contains(&c) => self.time()?,
            Some('-') => {
                self.bump();
                TokenKind::Dash
            }
            Some(_) => return Err(self.unexpected_char(&[], 0)),
        };

        let token = Token::new(kind, self.source[start..self.offset].iter().collect::<String>(), position);
        tracing::trace!(kind = %token.kind, lexeme = %token.lexeme, %position, "token");

        Ok(token)
    }

    /// Renders the source line of the `position` with an arrow under its column.
    pub(crate) fn render_position(&self, position: Position) -> String {
        let line: String = self
            .source
            .split(|c| *c == self.options.end_of_line)
            .nth(position.line)
            .map(|line| line.iter().collect())
            .unwrap_or_default();

        utils::render_error_line(&line, position.column)
    }

    #[inline]
    fn current(&self) -> Option<char> {
        self.source.get(self.offset).copied()
    }

    fn bump(&mut self) {
        if let Some(c) = self.current() {
            self.offset += 1;
            if c == self.options.end_of_line {
                self.line += 1;
                self.line_start = self.offset;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            if c == self.options.end_of_line || self.options.whitespace.contains(&c) {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn keyword(&mut self) -> Result<TokenKind> {
        let start = self.offset;
        while self.current().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.bump();
        }
        let lexeme: String = self.source[start..self.offset].iter().collect();
        let keywords = keywords();

        if !keywords.contains(&lexeme) {
            if keywords.contains_prefix(&lexeme) {
                return Err(self.unexpected_char(&keywords.chars_after(&lexeme), 0));
            }

            // Point to the first character which diverges from every keyword.
            let matched = keywords.max_match_for(&lexeme).len();
            return Err(self.unexpected_char(&[], matched as isize - lexeme.len() as isize));
        }

        match lexeme.to_ascii_lowercase().as_str() {
            ALLOW => Ok(TokenKind::Allow),
            FORBID => Ok(TokenKind::Forbid),
            day if utils::parse_day_of_week(day).is_some() => Ok(TokenKind::DayOfWeek),
            _ => Err(self.unexpected_char(&[], -(lexeme.len() as isize))),
        }
    }

    fn time(&mut self) -> Result<TokenKind> {
        let hour_start = self.expect_one_of(&HOUR_STARTS)?;
        let hour_ends: &[char] = if hour_start == '2' { &HOUR_ENDS_2X } else { &HOUR_ENDS };
        self.expect_one_of(hour_ends)?;
        self.expect_one_of(&MINUTE_STARTS)?;
        self.expect_one_of(&MINUTE_ENDS)?;

        Ok(TokenKind::Time)
    }

    fn expect_one_of(&mut self, expected: &[char]) -> Result<char> {
        match self.current() {
            Some(c) if expected.contains(&c) => {
                self.bump();
                Ok(c)
            }
            _ => Err(self.unexpected_char(expected, 0)),
        }
    }

    fn unexpected_char(&self, expected: &[char], offset: isize) -> Error {
        let position = Position::new(self.line, self.position().column.saturating_add_signed(offset));
        let mut message = format!(
            "missing or unexpected character in input stream on {position}\n\n{}",
            self.render_position(position)
        );

        if !expected.is_empty() {
            let expected = expected.iter().map(|c| format!("'{c}'")).collect::<Vec<_>>().join(", ");
            message.push_str(&format!("\n\nexpected one of: {expected}"));
        }

        Error::Lexer(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Time;
    use proptest::prelude::*;
    use rstest::rstest;

    fn lexer_error(input: &str) -> String {
        let mut lexer = Lexer::new(input);
        loop {
            match lexer.next_token() {
                Ok(token) if token.kind == TokenKind::EndInput => panic!("no error in {input:?}"),
                Ok(_) => continue,
                Err(Error::Lexer(message)) => return message,
                Err(e) => panic!("unexpected error {e:?}"),
            }
        }
    }

    #[test]
    fn test_next_token_positions() {
        let mut lexer = Lexer::new("allow\n forbid\n  sunday\n   0123\n    -");

        assert_eq!(
            lexer.next_token().unwrap(),
            Token::new(TokenKind::Allow, "allow", Position::new(0, 0))
        );
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::new(TokenKind::Forbid, "forbid", Position::new(1, 1))
        );
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::new(TokenKind::DayOfWeek, "sunday", Position::new(2, 2))
        );
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::new(TokenKind::Time, "0123", Position::new(3, 3))
        );
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::new(TokenKind::Dash, "-", Position::new(4, 4))
        );
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::new(TokenKind::EndInput, "", Position::new(5, 0))
        );
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::new(TokenKind::EndInput, "", Position::new(5, 0))
        );
    }

    #[rstest]
    #[case("", Position::new(0, 0))]
    #[case("   ", Position::new(1, 0))]
    #[case("\n\n", Position::new(2, 0))]
    #[case(" \t\x0c\n", Position::new(1, 0))]
    fn test_end_input_position(#[case] input: &str, #[case] expected: Position) {
        let token = Lexer::new(input).next_token().unwrap();
        assert_eq!(token, Token::new(TokenKind::EndInput, "", expected));
    }

    #[rstest]
    #[case("allow", TokenKind::Allow)]
    #[case("ALLOW", TokenKind::Allow)]
    #[case("forbid", TokenKind::Forbid)]
    #[case("Forbid", TokenKind::Forbid)]
    #[case("sunday", TokenKind::DayOfWeek)]
    #[case("sun", TokenKind::DayOfWeek)]
    #[case("monday", TokenKind::DayOfWeek)]
    #[case("mon", TokenKind::DayOfWeek)]
    #[case("tuesday", TokenKind::DayOfWeek)]
    #[case("tue", TokenKind::DayOfWeek)]
    #[case("wednesday", TokenKind::DayOfWeek)]
    #[case("wed", TokenKind::DayOfWeek)]
    #[case("thursday", TokenKind::DayOfWeek)]
    #[case("thu", TokenKind::DayOfWeek)]
    #[case("friday", TokenKind::DayOfWeek)]
    #[case("fri", TokenKind::DayOfWeek)]
    #[case("saturday", TokenKind::DayOfWeek)]
    #[case("SAT", TokenKind::DayOfWeek)]
    fn test_keyword_token(#[case] input: &str, #[case] expected: TokenKind) {
        let token = Lexer::new(input).next_token().unwrap();
        assert_eq!(token, Token::new(expected, input, Position::new(0, 0)));
    }

    #[rstest]
    #[case("0000")]
    #[case("2359")]
    #[case("0100")]
    #[case("0017")]
    #[case("1230")]
    fn test_time_token(#[case] input: &str) {
        let token = Lexer::new(input).next_token().unwrap();
        assert_eq!(token, Token::new(TokenKind::Time, input, Position::new(0, 0)));
    }

    #[rstest]
    #[case("all", "column 3", "expected one of: 'o'")]
    #[case("s", "column 1", "expected one of: 'a', 'u'")]
    #[case("thurs", "column 5", "expected one of: 'd'")]
    fn test_keyword_prefix_error(#[case] input: &str, #[case] column: &str, #[case] expected: &str) {
        let message = lexer_error(input);
        assert!(message.contains(column), "{message}");
        assert!(message.ends_with(expected), "{message}");
    }

    #[rstest]
    #[case("allowed", 5)]
    #[case("sundays", 6)]
    #[case("monk", 3)]
    #[case("xyz", 0)]
    #[case("sunday  Frimday", 11)]
    fn test_keyword_divergence_error(#[case] input: &str, #[case] column: usize) {
        let message = lexer_error(input);
        let expected_arrow = format!("\n{}^", " ".repeat(5 + column));

        assert!(message.starts_with(&format!(
            "missing or unexpected character in input stream on line 0 column {column}\n\n"
        )));
        assert!(message.ends_with(&expected_arrow), "{message}");
        assert!(!message.contains("expected one of"), "{message}");
    }

    #[rstest]
    #[case("2400", "column 1", "expected one of: '0', '1', '2', '3'")]
    #[case("2410", "column 1", "expected one of: '0', '1', '2', '3'")]
    #[case("0060", "column 2", "expected one of: '0', '1', '2', '3', '4', '5'")]
    #[case("0099", "column 2", "expected one of: '0', '1', '2', '3', '4', '5'")]
    #[case("1260", "column 2", "expected one of: '0', '1', '2', '3', '4', '5'")]
    #[case("1", "column 1", "expected one of: '0', '1', '2', '3', '4', '5', '6', '7', '8', '9'")]
    #[case("123", "column 3", "expected one of: '0', '1', '2', '3', '4', '5', '6', '7', '8', '9'")]
    #[case("12:30", "column 2", "expected one of: '0', '1', '2', '3', '4', '5'")]
    fn test_time_token_error(#[case] input: &str, #[case] column: &str, #[case] expected: &str) {
        let message = lexer_error(input);
        assert!(message.contains(column), "{message}");
        assert!(message.ends_with(expected), "{message}");
    }

    #[rstest]
    #[case("!")]
    #[case("3000")]
    #[case("allow ,")]
    #[case("_sunday")]
    #[case("ñ")]
    fn test_unexpected_char_error(#[case] input: &str) {
        let message = lexer_error(input);
        assert!(message.starts_with("missing or unexpected character in input stream on line 0"));
        assert!(!message.contains("expected one of"), "{message}");
    }

    #[test]
    fn test_error_on_later_line() {
        let message = lexer_error("sunday allow 0000\nmonday forbid 0800-2070\n");
        assert_eq!(
            message,
            "missing or unexpected character in input stream on line 1 column 21\n\n     monday forbid 0800-2070\n                          ^\n\nexpected one of: '0', '1', '2', '3', '4', '5'"
        );
    }

    #[test]
    fn test_error_truncates_long_line() {
        let input = format!("{}sunday{}!", " ".repeat(100), " ".repeat(100));
        let message = lexer_error(&input);
        let expected = format!("\n\n     {}!\n     {}^", " ".repeat(39), " ".repeat(39));

        assert!(message.contains("line 0 column 206"), "{message}");
        assert!(message.ends_with(&expected), "{message}");
    }

    #[test]
    fn test_custom_options() {
        let options = LexerOptions {
            whitespace: vec![','],
            end_of_line: ';',
        };
        let mut lexer = Lexer::with_options("sun,allow;mon,,forbid", options);

        assert_eq!(
            lexer.next_token().unwrap(),
            Token::new(TokenKind::DayOfWeek, "sun", Position::new(0, 0))
        );
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::new(TokenKind::Allow, "allow", Position::new(0, 4))
        );
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::new(TokenKind::DayOfWeek, "mon", Position::new(1, 0))
        );
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::new(TokenKind::Forbid, "forbid", Position::new(1, 5))
        );
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndInput);

        let mut lexer = Lexer::with_options("sun allow", LexerOptions { whitespace: vec![','], end_of_line: ';' });
        lexer.next_token().unwrap();
        assert!(matches!(lexer.next_token(), Err(Error::Lexer(_))));
    }

    #[test]
    fn test_token_kind_display() {
        assert_eq!(TokenKind::EndInput.to_string(), "END_INPUT");
        assert_eq!(TokenKind::DayOfWeek.to_string(), "DAY_OF_WEEK");
        assert_eq!(TokenKind::Dash.to_string(), "DASH");
    }

    proptest! {
        #[test]
        fn test_every_valid_time_lexes_into_the_same_time(hour in 0u8..24, minute in 0u8..60) {
            let input = format!("{hour:02}{minute:02}");
            let token = Lexer::new(input.as_str()).next_token().unwrap();

            prop_assert_eq!(token.kind, TokenKind::Time);
            prop_assert_eq!(&token.lexeme, &input);
            prop_assert_eq!(token.lexeme.parse::<Time>().unwrap(), Time::new(hour, minute).unwrap());
        }
    }
}
