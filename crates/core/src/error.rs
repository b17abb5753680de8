use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid value for flag '{field}': expected \"1\" or \"0\", got {value:?}")]
    InvalidFlag { field: &'static str, value: String },

    #[error("outage window start {start} is after end {end}")]
    InvertedWindow { start: i64, end: i64 },
}
