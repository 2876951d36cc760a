// src/error.rs
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds shared by adapters and scorers.
///
/// None of these abort a run: callers log them and skip, fall back, or
/// treat the affected source as empty.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed credential. The feature stays off for the run.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Rate limit, auth rejection, timeout, upstream 5xx.
    #[error("transient upstream error: {0}")]
    Transient(String),

    /// Upstream payload could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Generic(String),
}

impl Error {
    /// Map an HTTP status returned by an upstream API.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            401 | 403 => Error::Transient(format!("{context}: authentication rejected ({status})")),
            429 => Error::Transient(format!("{context}: rate limited ({status})")),
            s if s >= 500 => Error::Transient(format!("{context}: upstream error ({status})")),
            _ => Error::Generic(format!("{context}: unexpected status {status}")),
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::Transient(m) if m.contains("rate limited"))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Parse(err.to_string())
        } else if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
            Error::Transient(err.to_string())
        } else if let Some(status) = err.status() {
            Error::from_status(status, "http")
        } else {
            Error::Generic(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            Error::from_status(StatusCode::UNAUTHORIZED, "x"),
            Error::Transient(_)
        ));
        assert!(Error::from_status(StatusCode::TOO_MANY_REQUESTS, "x").is_rate_limit());
        assert!(matches!(
            Error::from_status(StatusCode::BAD_GATEWAY, "x"),
            Error::Transient(_)
        ));
        assert!(matches!(
            Error::from_status(StatusCode::BAD_REQUEST, "x"),
            Error::Generic(_)
        ));
    }
}
