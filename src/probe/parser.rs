use thiserror::Error;

const MEDIAN_LABEL: &str = "Round-trip time median:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty probe output")]
    Empty,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("unexpected unit in {0:?}")]
    BadUnit(String),
    #[error("invalid number: {0:?}")]
    BadNumber(String),
    #[error("negative delay: {0:?}")]
    Negative(String),
    #[error("delay out of range: {0:?}")]
    Overflow(String),
}

/// Turns raw probe text into a delay in microseconds.
pub trait DelayParser {
    fn parse(&self, text: &str) -> Result<u64, ParseError>;
}

/// Reads the round-trip median out of `twping` diagnostic output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TwpingParser;

impl DelayParser for TwpingParser {
    fn parse(&self, text: &str) -> Result<u64, ParseError> {
        if text.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        let rest = text
            .lines()
            .find_map(|line| line.split_once(MEDIAN_LABEL).map(|(_, v)| v))
            .ok_or(ParseError::MissingField("round-trip time median"))?;

        // The value is everything up to the last " ms" on the line.
        let value = rest
            .rfind(" ms")
            .map(|i| rest[..i].trim())
            .ok_or_else(|| ParseError::BadUnit(rest.trim().to_string()))?;
        match parse_millis_to_micros(value) {
            Err(ParseError::BadNumber(_)) => parse_float_millis(value),
            other => other,
        }
    }
}

/// Fallback for forms the digit path does not take, such as `1.25e0` or
/// `+1.5`. Truncates like the digit path.
fn parse_float_millis(s: &str) -> Result<u64, ParseError> {
    let ms: f64 = s.parse().map_err(|_| ParseError::BadNumber(s.to_string()))?;
    if !ms.is_finite() {
        return Err(ParseError::BadNumber(s.to_string()));
    }
    if ms < 0.0 {
        return Err(ParseError::Negative(s.to_string()));
    }
    let micros = ms * 1000.0;
    if micros >= u64::MAX as f64 {
        return Err(ParseError::Overflow(s.to_string()));
    }
    Ok(micros as u64)
}

/// Converts a decimal millisecond string to whole microseconds.
///
/// Works on the digits directly so `1.001` is exactly 1001; anything past
/// the third decimal is dropped, never rounded.
pub fn parse_millis_to_micros(s: &str) -> Result<u64, ParseError> {
    if s.starts_with('-') {
        return Err(ParseError::Negative(s.to_string()));
    }
    let bad = || ParseError::BadNumber(s.to_string());
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(bad());
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(bad());
    }

    let mut micros: u64 = 0;
    let frac_digits = frac_part.bytes().chain(std::iter::repeat(b'0')).take(3);
    for b in int_part.bytes().chain(frac_digits) {
        micros = micros
            .checked_mul(10)
            .and_then(|m| m.checked_add(u64::from(b - b'0')))
            .ok_or_else(|| ParseError::Overflow(s.to_string()))?;
    }
    Ok(micros)
}
