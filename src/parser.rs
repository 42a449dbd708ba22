use crate::{
    interval::{Agenda, Directive, Interval, Time},
    lexer::{Lexer, Position, Token, TokenKind},
    utils, Error, Result, Schedule,
};
use chrono::Weekday;

/// Recursive descent parser of the schedule language.
///
/// ```text
/// schedule  := (days agendas)+
/// days      := DAY_OF_WEEK ('-' DAY_OF_WEEK)?
/// agendas   := (ALLOW intervals | FORBID intervals)+
/// intervals := interval+
/// interval  := TIME ('-' TIME)?
///            | '-' TIME
/// ```
///
/// Sub-rule methods (`parse_days`, `parse_agendas`, ...) start from the current token,
/// so the parser should be primed with [`advance()`](Parser::advance) before calling them directly.
/// [`parse()`](Parser::parse) does it itself.
#[derive(Debug, Clone)]
pub struct Parser {
    lexer: Lexer,
    token: Token,
}

impl Parser {
    /// Constructs parser which reads tokens from the `lexer`.
    pub fn new(lexer: Lexer) -> Self {
        let token = Token::new(TokenKind::EndInput, "", Position::default());
        Self { lexer, token }
    }

    /// Current (lookahead) token.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Moves to the next token.
    pub fn advance(&mut self) -> Result<&Token> {
        self.token = self.lexer.next_token()?;
        Ok(&self.token)
    }

    /// Parses the whole input into a [`Schedule`] in UTC timezone.
    pub fn parse(&mut self) -> Result<Schedule> {
        self.advance()?;
        let schedule = self.parse_schedule()?;
        if self.token.kind != TokenKind::EndInput {
            return Err(self.unexpected_token(&[TokenKind::EndInput]));
        }

        Ok(schedule)
    }

    /// `schedule := (days agendas)+`
    pub fn parse_schedule(&mut self) -> Result<Schedule> {
        let mut schedule = Schedule::default();
        loop {
            let days = self.parse_days()?;
            let agendas = self.parse_agendas()?;
            tracing::debug!(?days, agendas = agendas.len(), "parsed schedule group");
            schedule.add_agendas_on_days(&agendas, &days);

            if self.token.kind != TokenKind::DayOfWeek {
                break;
            }
        }

        Ok(schedule)
    }

    /// `days := DAY_OF_WEEK ('-' DAY_OF_WEEK)?`
    ///
    /// Range of days wraps over the end of the week, i.e. `wed-tue` is the whole week starting from Wednesday.
    pub fn parse_days(&mut self) -> Result<Vec<Weekday>> {
        let first = self.day_of_week()?;
        let mut days = vec![first];

        if self.token.kind == TokenKind::Dash {
            self.advance()?;
            let last = self.day_of_week()?;
            let mut day = first;
            while day != last {
                day = day.succ();
                days.push(day);
            }
        }

        Ok(days)
    }

    /// `agendas := agenda+`
    pub fn parse_agendas(&mut self) -> Result<Vec<Agenda>> {
        let mut agendas = vec![self.parse_agenda()?];
        while matches!(self.token.kind, TokenKind::Allow | TokenKind::Forbid) {
            agendas.push(self.parse_agenda()?);
        }

        Ok(agendas)
    }

    /// `agenda := ALLOW intervals | FORBID intervals`
    pub fn parse_agenda(&mut self) -> Result<Agenda> {
        let directive = match self.token.kind {
            TokenKind::Allow => Directive::Allow,
            TokenKind::Forbid => Directive::Forbid,
            TokenKind::EndInput | TokenKind::DayOfWeek | TokenKind::Time | TokenKind::Dash => {
                return Err(self.unexpected_token(&[TokenKind::Allow, TokenKind::Forbid]))
            }
        };
        self.advance()?;
        let intervals = self.parse_intervals()?;

        Ok(Agenda::new(directive, intervals))
    }

    /// `intervals := interval+`
    pub fn parse_intervals(&mut self) -> Result<Vec<Interval>> {
        let mut intervals = vec![self.parse_interval()?];
        while matches!(self.token.kind, TokenKind::Time | TokenKind::Dash) {
            intervals.push(self.parse_interval()?);
        }

        Ok(intervals)
    }

    /// `interval := TIME ('-' TIME)? | '-' TIME`
    ///
    /// Missing end defaults to the end of the day, missing start - to the start of the day.
    pub fn parse_interval(&mut self) -> Result<Interval> {
        match self.token.kind {
            TokenKind::Time => {
                let start = self.time()?;
                let end = if self.token.kind == TokenKind::Dash {
                    self.advance()?;
                    self.time()?
                } else {
                    Time::end_of_day()
                };
                Ok(Interval::new(start, end))
            }
            TokenKind::Dash => {
                self.advance()?;
                Ok(Interval::new(Time::start_of_day(), self.time()?))
            }
            TokenKind::EndInput | TokenKind::Allow | TokenKind::Forbid | TokenKind::DayOfWeek => {
                Err(self.unexpected_token(&[TokenKind::Time, TokenKind::Dash]))
            }
        }
    }

    fn day_of_week(&mut self) -> Result<Weekday> {
        let day = match self.token.kind {
            TokenKind::DayOfWeek => utils::parse_day_of_week(&self.token.lexeme),
            _ => None,
        }
        .ok_or_else(|| self.unexpected_token(&[TokenKind::DayOfWeek]))?;
        self.advance()?;

        Ok(day)
    }

    fn time(&mut self) -> Result<Time> {
        if self.token.kind != TokenKind::Time {
            return Err(self.unexpected_token(&[TokenKind::Time]));
        }
        let time = self.token.lexeme.parse()?;
        self.advance()?;

        Ok(time)
    }

    fn unexpected_token(&self, expected: &[TokenKind]) -> Error {
        let position = self.token.position;
        let expected = expected.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");

        Error::Parser(format!(
            "missing or unexpected token in token stream on {position}\n\n{}\n\nexpected one of: {expected}\ngot: {}",
            self.lexer.render_position(position),
            self.token.kind
        ))
    }
}
