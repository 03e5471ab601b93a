use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
///
/// Mirrors the wrap-an-`anyhow::Error` shape used across this codebase, plus the two
/// domain outcomes callers are expected to branch on: an alert dedup collision and a
/// missing row. Everything else collapses into `Other` and is propagated with `?`.
#[derive(Debug)]
pub enum Error {
    /// `(bmkg_alert_code, matched_location_id)` already has a row (any status).
    Duplicate,
    NotFound(&'static str),
    Other(anyhow::Error),
}

impl Error {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::Duplicate)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Duplicate => write!(f, "duplicate alert key"),
            Error::NotFound(what) => write!(f, "{what} not found"),
            Error::Other(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Other(err) => err.source(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value)
    }
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        match &value {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Self::Duplicate,
            _ => Self::Other(anyhow::Error::from(value)),
        }
    }
}
