use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TrackerError {
    #[error("Username not found: {0}")]
    UnknownSubject(String),

    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error("Invalid baseline '{0}', expected last-week, initial or YYYY-MM-DD")]
    InvalidBaseline(String),

    #[error("Invalid record kind: {0}")]
    InvalidKind(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Invalid series: {0}")]
    InvalidSeries(String),
}
