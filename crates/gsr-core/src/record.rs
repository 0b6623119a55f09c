//! Text produced by the sampling loop
//!
//! The wireless record is `"<first>,<second>\n"` with both values in decimal.
//! Diagnostic lines are for humans and carry labels instead.

use core::fmt::Write;

use thiserror_no_std::Error;

use crate::reading::{RawReading, ReadingPair};
use crate::sensors::GsrInput;

/// Emitted once on the diagnostic channel at startup.
pub const STARTUP_NOTICE: &str = "The device started, now you can pair it with Bluetooth!";

/// Emitted on the diagnostic channel when both inputs read as unconnected.
pub const NO_SENSOR_NOTICE: &str = "No sensors detected";

/// Value a receiver substitutes for an empty field.
pub const MISSING_READING_DEFAULT: RawReading = 600;

/// "65535,65535\n" is 12 bytes.
pub const RECORD_CAPACITY: usize = 16;

/// "Sensor 1: 65535\tSensor 2: 65535" is 31 bytes.
pub const DIAGNOSTIC_CAPACITY: usize = 48;

pub type BroadcastLine = heapless::String<RECORD_CAPACITY>;
pub type DiagnosticLine = heapless::String<DIAGNOSTIC_CAPACITY>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    #[error("Record is empty")]
    Empty,
    #[error("Record has more than two fields")]
    TooManyFields,
    #[error("Record field is not a reading")]
    InvalidNumber,
    #[error("Record exceeds {max} bytes")]
    Overflow { max: usize },
}

/// Format the wireless record for `pair`, newline included.
pub fn format_record(pair: ReadingPair) -> Result<BroadcastLine, RecordError> {
    let mut line = BroadcastLine::new();
    writeln!(line, "{},{}", pair.first, pair.second).map_err(|_| RecordError::Overflow {
        max: RECORD_CAPACITY,
    })?;
    Ok(line)
}

/// Format the labeled diagnostic line for `pair` (no terminator).
pub fn diagnostic_line(pair: ReadingPair) -> Result<DiagnosticLine, RecordError> {
    let mut line = DiagnosticLine::new();
    write!(
        line,
        "{}: {}\t{}: {}",
        GsrInput::First.label(),
        pair.first,
        GsrInput::Second.label(),
        pair.second
    )
    .map_err(|_| RecordError::Overflow {
        max: DIAGNOSTIC_CAPACITY,
    })?;
    Ok(line)
}

/// Parse a received wireless record.
///
/// Accepts an optional `\n` or `\r\n` terminator. An empty or absent second
/// field takes [`MISSING_READING_DEFAULT`], as does an empty first field.
pub fn parse_record(line: &str) -> Result<ReadingPair, RecordError> {
    let body = line.trim_end_matches(['\r', '\n']);
    if body.trim().is_empty() {
        return Err(RecordError::Empty);
    }

    let mut fields = body.split(',');
    let first = parse_field(fields.next())?;
    let second = parse_field(fields.next())?;

    if fields.next().is_some() {
        return Err(RecordError::TooManyFields);
    }

    Ok(ReadingPair::new(first, second))
}

fn parse_field(field: Option<&str>) -> Result<RawReading, RecordError> {
    match field.map(str::trim) {
        None | Some("") => Ok(MISSING_READING_DEFAULT),
        Some(text) => text.parse().map_err(|_| RecordError::InvalidNumber),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_format() {
        assert_eq!(format_record(ReadingPair::new(314, 320)).unwrap(), "314,320\n");
        assert_eq!(format_record(ReadingPair::new(0, 4095)).unwrap(), "0,4095\n");
        assert_eq!(
            format_record(ReadingPair::new(u16::MAX, u16::MAX)).unwrap(),
            "65535,65535\n"
        );
    }

    #[test]
    fn test_diagnostic_line_has_both_labels() {
        let line = diagnostic_line(ReadingPair::new(512, 1024)).unwrap();
        assert_eq!(line, "Sensor 1: 512\tSensor 2: 1024");
    }

    #[test]
    fn test_parse_accepts_terminators() {
        assert_eq!(parse_record("314,320\n"), Ok(ReadingPair::new(314, 320)));
        assert_eq!(parse_record("314,320\r\n"), Ok(ReadingPair::new(314, 320)));
        assert_eq!(parse_record("0,4095"), Ok(ReadingPair::new(0, 4095)));
    }

    #[test]
    fn test_parse_fills_missing_fields() {
        assert_eq!(parse_record("512,\n"), Ok(ReadingPair::new(512, 600)));
        assert_eq!(parse_record(",512"), Ok(ReadingPair::new(600, 512)));
        assert_eq!(parse_record("512"), Ok(ReadingPair::new(512, 600)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_record(""), Err(RecordError::Empty));
        assert_eq!(parse_record("\r\n"), Err(RecordError::Empty));
        assert_eq!(parse_record("1,2,3"), Err(RecordError::TooManyFields));
        assert_eq!(parse_record("abc,2"), Err(RecordError::InvalidNumber));
        assert_eq!(parse_record("-1,2"), Err(RecordError::InvalidNumber));
        assert_eq!(parse_record("70000,2"), Err(RecordError::InvalidNumber));
    }
}
