use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// Cloudscribe's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Cloudscribe's crate-wide error type.
///
/// Every variant is fatal for a transcription run. The variants exist so callers (and tests)
/// can tell which stage of the pipeline failed:
/// - `Io` / `InvalidWav`: reading the audio file
/// - `Auth`: loading credentials or minting access tokens
/// - `Http` / `Service`: talking to the recognition service
/// - `Timeout`: the optional local wait limit on a long-running operation
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid WAV input: {0}")]
    InvalidWav(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("speech service error (code {code}): {message}")]
    Service { code: i32, message: String },

    #[error("operation '{operation}' did not finish within {limit:?}")]
    Timeout { operation: String, limit: Duration },

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            context: "I/O error".to_owned(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_keeps_context_and_source() {
        let err = Error::io(
            "failed to open WAV file 'a.wav'",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.to_string(), "failed to open WAV file 'a.wav': missing");
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn anyhow_errors_flatten_their_context_chain() {
        let err: Error = anyhow::anyhow!("inner").context("outer").into();
        assert_eq!(err.to_string(), "outer: inner");
    }

    #[test]
    fn service_error_displays_code_and_message() {
        let err = Error::Service {
            code: 3,
            message: "Invalid recognition 'config'".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "speech service error (code 3): Invalid recognition 'config'"
        );
    }
}
