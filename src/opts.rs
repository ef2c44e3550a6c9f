use std::path::PathBuf;
use std::time::Duration;

use crate::speech::AudioEncoding;
use crate::{Error, Result};

/// Default service-account key file, looked up relative to the working directory.
pub const DEFAULT_CREDENTIALS_PATH: &str = "chatkey.json";

pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";

pub const DEFAULT_ENDPOINT: &str = "https://speech.googleapis.com";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Options that control how a transcription is performed.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The binary maps environment variables into this type (see [`Opts::from_env`]) so that
/// tests and other frontends can construct it programmatically.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// Path to the service-account JSON key used to authenticate.
    pub credentials_path: PathBuf,

    /// BCP-47 language tag sent with every request.
    pub language_code: String,

    pub encoding: AudioEncoding,

    /// Base URL of the speech service (no trailing slash needed).
    pub endpoint: String,

    /// Per-HTTP-request timeout. `None` lets a request block indefinitely.
    pub http_timeout: Option<Duration>,

    /// How long-running operations are awaited.
    pub poll: PollOpts,

    /// Request and print per-word time offsets.
    pub enable_word_time_offsets: bool,

    /// Reject files that are not 16-bit PCM WAV with a consistent header.
    ///
    /// When disabled, any file is accepted and the 4 bytes at offset 24 are trusted as the
    /// sample rate.
    pub validate_wav_header: bool,
}

/// Polling behavior for a long-running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOpts {
    /// Delay between status checks.
    pub interval: Duration,

    /// Give up after this long. `None` waits until the service reports a terminal state.
    pub timeout: Option<Duration>,
}

impl Default for PollOpts {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            language_code: DEFAULT_LANGUAGE_CODE.to_owned(),
            encoding: AudioEncoding::Linear16,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            http_timeout: None,
            poll: PollOpts::default(),
            enable_word_time_offsets: false,
            validate_wav_header: false,
        }
    }
}

impl Opts {
    /// Build options from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build options from an arbitrary key lookup, starting from [`Opts::default`].
    ///
    /// Unset and empty variables keep their defaults. Recognized keys:
    /// - `CLOUDSCRIBE_CREDENTIALS`
    /// - `CLOUDSCRIBE_LANGUAGE`
    /// - `CLOUDSCRIBE_ENDPOINT`
    /// - `CLOUDSCRIBE_HTTP_TIMEOUT_SECS`
    /// - `CLOUDSCRIBE_POLL_INTERVAL_MS`
    /// - `CLOUDSCRIBE_TIMEOUT_SECS`
    /// - `CLOUDSCRIBE_WORD_TIME_OFFSETS`
    /// - `CLOUDSCRIBE_VALIDATE_WAV`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut opts = Self::default();

        if let Some(path) = get("CLOUDSCRIBE_CREDENTIALS") {
            opts.credentials_path = PathBuf::from(path);
        }
        if let Some(lang) = get("CLOUDSCRIBE_LANGUAGE") {
            opts.language_code = lang.trim().to_owned();
        }
        if let Some(endpoint) = get("CLOUDSCRIBE_ENDPOINT") {
            opts.endpoint = endpoint.trim().trim_end_matches('/').to_owned();
        }
        if let Some(v) = get("CLOUDSCRIBE_HTTP_TIMEOUT_SECS") {
            opts.http_timeout = Some(Duration::from_secs(parse_u64(
                "CLOUDSCRIBE_HTTP_TIMEOUT_SECS",
                &v,
            )?));
        }
        if let Some(v) = get("CLOUDSCRIBE_POLL_INTERVAL_MS") {
            opts.poll.interval =
                Duration::from_millis(parse_u64("CLOUDSCRIBE_POLL_INTERVAL_MS", &v)?);
        }
        if let Some(v) = get("CLOUDSCRIBE_TIMEOUT_SECS") {
            opts.poll.timeout = Some(Duration::from_secs(parse_u64(
                "CLOUDSCRIBE_TIMEOUT_SECS",
                &v,
            )?));
        }
        if let Some(v) = get("CLOUDSCRIBE_WORD_TIME_OFFSETS") {
            opts.enable_word_time_offsets = parse_bool("CLOUDSCRIBE_WORD_TIME_OFFSETS", &v)?;
        }
        if let Some(v) = get("CLOUDSCRIBE_VALIDATE_WAV") {
            opts.validate_wav_header = parse_bool("CLOUDSCRIBE_VALIDATE_WAV", &v)?;
        }

        Ok(opts)
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{key} must be a whole number, got '{value}'")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!(
            "{key} must be a boolean (true/false), got '{value}'"
        ))),
    }
}
