//! Error types for the trendline system.

use thiserror::Error;

/// SQLSTATE codes treated as transient lock contention.
const LOCK_NOT_AVAILABLE: &str = "55P03";
const DEADLOCK_DETECTED: &str = "40P01";

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No data available for {symbol}")]
    NoData { symbol: String },

    #[error("Store locked: {0}")]
    Locked(sqlx::Error),

    #[error("Constraint violation: {0}")]
    Integrity(sqlx::Error),

    #[error("Database error: {0}")]
    Storage(sqlx::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },
}

impl Error {
    /// Whether this error is transient lock contention the caller may retry.
    pub fn is_locked(&self) -> bool {
        matches!(self, Error::Locked(_))
    }

    /// Whether this error is a constraint violation on a single statement.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Error::Integrity(_))
    }
}

impl From<sqlx::Error> for Error {
    /// Classify a database error into the retry taxonomy.
    ///
    /// Lock contention (55P03, 40P01) is retryable; constraint violations
    /// (SQLSTATE class 23) roll back one statement; everything else is a
    /// fatal storage failure for the current run.
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.code().as_deref() {
                Some(LOCK_NOT_AVAILABLE) | Some(DEADLOCK_DETECTED) => {
                    return Error::Locked(err);
                }
                Some(code) if code.starts_with("23") => {
                    return Error::Integrity(err);
                }
                _ => {}
            }
        }
        Error::Storage(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_is_storage() {
        let err = Error::from(sqlx::Error::RowNotFound);
        assert!(!err.is_locked());
        assert!(!err.is_integrity());
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_no_data_display() {
        let err = Error::NoData {
            symbol: "AAPL".to_string(),
        };
        assert_eq!(err.to_string(), "No data available for AAPL");
    }
}
