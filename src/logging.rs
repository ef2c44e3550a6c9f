//! Diagnostics for the `cloudscribe` binary.
//!
//! The binary's stdout is the transcription report and nothing else, so it can be piped or
//! diffed. Every log event goes to stderr as one JSON object per line, next to the progress bar,
//! which is cleared before the transcripts are printed.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter directives, e.g. `cloudscribe=debug`.
pub const LOG_ENV_VAR: &str = "CLOUDSCRIBE_LOG";

/// Install the JSON subscriber on stderr.
///
/// Only fatal errors are logged unless `CLOUDSCRIBE_LOG` says otherwise; at `debug` the
/// library reports the loaded audio, each operation poll and the token exchange. Calling this
/// more than once keeps the first subscriber.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(filter(std::env::var(LOG_ENV_VAR).ok().as_deref()))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init();
}

/// Build the filter from `directives`, keeping the valid ones and falling back to `error`.
fn filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .parse_lossy(directives.unwrap_or_default())
}
