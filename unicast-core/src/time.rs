use logos::Logos;
use std::{fmt, str::FromStr, time};
use thiserror::Error;

/// A human readable duration, e.g. `500ms`, `2s` or `1s 250ms`.
///
/// Used for the timeouts of the command line.
///
/// ```
/// use unicast_core::time::Duration;
///
/// let duration: Duration = "1s 250ms".parse().unwrap();
/// assert_eq!(duration.into_duration().as_millis(), 1_250);
/// assert_eq!(duration.to_string(), "1.25s");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(time::Duration);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("Failed to parse `{0}'")]
    Lexer(String),
    #[error("Expecting duration to start with a number. Cannot parse `{0}'")]
    ExpectedNumber(String),
    #[error("Expecting a measure, failed to parse `{0}'")]
    ExpectedMeasure(String),
    #[error("Number out of range in `{0}'")]
    Overflow(String),
    #[error("Empty duration")]
    Empty,
}

impl Duration {
    pub const fn new(dur: time::Duration) -> Self {
        Self(dur)
    }

    #[inline]
    pub fn into_duration(self) -> time::Duration {
        self.0
    }
}

impl From<time::Duration> for Duration {
    fn from(value: time::Duration) -> Self {
        Self(value)
    }
}

impl From<Duration> for time::Duration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <time::Duration as fmt::Debug>::fmt(&self.0, f)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// A sum of `<number><unit>` terms, whitespace between terms ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = |kind: fn(String) -> DurationParseError| kind(s.to_owned());
        let mut lexer = Unit::lexer(s);
        let mut total: Option<time::Duration> = None;

        while let Some(token) = lexer.next() {
            let Unit::Number = token.map_err(|()| error(DurationParseError::Lexer))? else {
                return Err(error(DurationParseError::ExpectedNumber));
            };
            let count: u64 = lexer
                .slice()
                .parse()
                .map_err(|_| error(DurationParseError::Overflow))?;

            let term = match lexer.next() {
                Some(Ok(Unit::Nanos)) => Some(time::Duration::from_nanos(count)),
                Some(Ok(Unit::Micros)) => Some(time::Duration::from_micros(count)),
                Some(Ok(Unit::Millis)) => Some(time::Duration::from_millis(count)),
                Some(Ok(Unit::Secs)) => Some(time::Duration::from_secs(count)),
                Some(Ok(Unit::Mins)) => count.checked_mul(60).map(time::Duration::from_secs),
                _ => return Err(error(DurationParseError::ExpectedMeasure)),
            }
            .ok_or_else(|| error(DurationParseError::Overflow))?;

            total = Some(
                total
                    .unwrap_or_default()
                    .checked_add(term)
                    .ok_or_else(|| error(DurationParseError::Overflow))?,
            );
        }

        total.map(Self).ok_or(DurationParseError::Empty)
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"\s+")]
enum Unit {
    #[regex("[0-9]+")]
    Number,

    #[token("ns")]
    Nanos,
    #[token("us")]
    #[token("μs")]
    Micros,
    #[token("ms")]
    Millis,
    #[token("s")]
    Secs,
    #[token("m")]
    Mins,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units() {
        let units: Vec<_> = Unit::lexer("10 ns 2us 3μs 4ms 5 s 6m")
            .map(Result::unwrap)
            .filter(|unit| *unit != Unit::Number)
            .collect();

        assert_eq!(
            units,
            [
                Unit::Nanos,
                Unit::Micros,
                Unit::Micros,
                Unit::Millis,
                Unit::Secs,
                Unit::Mins
            ]
        );
    }

    #[test]
    fn parse() {
        let Duration(duration) = "250ms".parse().unwrap();
        assert_eq!(duration.as_millis(), 250);

        let Duration(duration) = "1s 1500ms 500000us 3000000000ns".parse().unwrap();
        assert_eq!(duration.as_secs(), 6);

        let Duration(duration) = "2m 30s".parse().unwrap();
        assert_eq!(duration.as_secs(), 150);

        let Duration(duration) = " 0ns ".parse().unwrap();
        assert!(duration.is_zero());
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "".parse::<Duration>().unwrap_err(),
            DurationParseError::Empty
        );
        assert_eq!(
            "12".parse::<Duration>().unwrap_err(),
            DurationParseError::ExpectedMeasure("12".to_owned())
        );
        assert_eq!(
            "ms".parse::<Duration>().unwrap_err(),
            DurationParseError::ExpectedNumber("ms".to_owned())
        );
        assert!(matches!(
            "5 hours".parse::<Duration>().unwrap_err(),
            DurationParseError::ExpectedMeasure(_) | DurationParseError::Lexer(_)
        ));
    }

    #[test]
    fn overflow() {
        assert_eq!(
            "99999999999999999999s".parse::<Duration>().unwrap_err(),
            DurationParseError::Overflow("99999999999999999999s".to_owned())
        );
        assert!(matches!(
            "18446744073709551615m".parse::<Duration>().unwrap_err(),
            DurationParseError::Overflow(_)
        ));
    }

    #[test]
    fn display() {
        assert_eq!(Duration::new(time::Duration::from_millis(500)).to_string(), "500ms");
    }
}
