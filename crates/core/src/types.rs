//! Aliases shared by every table-backed type.

/// Primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Timestamps are always UTC; billing-week dates are `chrono::NaiveDate`.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
