use std::fmt;

// Hand-written impls instead of `#[derive(thiserror::Error)]`: the
// `Source` variant's `source` field is a plain source-name String, which
// thiserror would otherwise treat as the error's cause.
#[derive(Debug)]
pub enum Error {
    Database(sqlx::Error),

    Http(reqwest::Error),

    FeedParse(String),

    Source { source: String, reason: String },

    Translation(String),

    RateLimited(String),

    Config(String),

    Io(std::io::Error),

    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database(e) => write!(f, "Database error: {}", e),
            Error::Http(e) => write!(f, "HTTP request error: {}", e),
            Error::FeedParse(msg) => write!(f, "Feed parsing error: {}", msg),
            Error::Source { source, reason } => {
                write!(f, "Source '{}' unavailable: {}", source, reason)
            }
            Error::Translation(msg) => write!(f, "Translation error: {}", msg),
            Error::RateLimited(msg) => write!(f, "Translation rate limited: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(e) => Some(e),
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Database(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl Error {
    /// Rate-limit-class failures are never retried; they abort the
    /// remaining translation work for the current run.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
