use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::error;

use cloudscribe::report::Report;
use cloudscribe::{GoogleSpeechClient, OperationSnapshot, Opts};

#[derive(Parser, Debug)]
#[command(name = "cloudscribe", version)]
#[command(about = "Transcribe a WAV file with Google Cloud Speech-to-Text")]
#[command(
    after_help = "Configuration is read from CLOUDSCRIBE_* environment variables \
                  (CLOUDSCRIBE_CREDENTIALS, CLOUDSCRIBE_LANGUAGE, CLOUDSCRIBE_TIMEOUT_SECS, ...)."
)]
struct Params {
    /// Path to a linear PCM WAV file.
    audio_path: Option<PathBuf>,
}

fn main() {
    cloudscribe::logging::init();

    if let Err(err) = run() {
        error!(error = ?err, "cloudscribe failed");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let params = Params::parse();
    let stdout = io::stdout();

    let Some((audio_path, opts)) = load(params, Opts::from_env)? else {
        Report::new(stdout.lock()).no_argument()?;
        return Ok(());
    };

    let pb = progress_bar()?;

    let res = cloudscribe::cloudscribe::run_with_progress(
        Some(audio_path.as_path()),
        &opts,
        GoogleSpeechClient::new,
        stdout.lock(),
        |snapshot: &OperationSnapshot| {
            // The transcripts print right after the final snapshot; clear the bar first.
            if snapshot.is_done() {
                pb.finish_and_clear();
                return;
            }
            if pb.is_hidden() && !pb.is_finished() {
                pb.set_draw_target(ProgressDrawTarget::stderr());
                pb.enable_steady_tick(Duration::from_millis(120));
            }
            if let Some(percent) = snapshot.progress.percent {
                pb.set_position(u64::from(percent));
            }
        },
    );

    pb.finish_and_clear();
    Ok(res?)
}

/// Resolve the audio path and configuration, or `None` when no path was given.
///
/// Configuration is only read once there is a file to transcribe, so a bad `CLOUDSCRIBE_*`
/// value cannot turn the no-argument case into a failure.
fn load<F>(params: Params, opts: F) -> Result<Option<(PathBuf, Opts)>>
where
    F: FnOnce() -> cloudscribe::Result<Opts>,
{
    let Some(audio_path) = params.audio_path else {
        return Ok(None);
    };
    let opts = opts().context("failed to load configuration")?;
    Ok(Some((audio_path, opts)))
}

/// Progress bar for the wait on the service.
///
/// It starts hidden so it cannot interleave with the header lines, and switches to stderr once
/// the first status arrives. Nothing is drawn when stderr is not a terminal.
fn progress_bar() -> Result<ProgressBar> {
    let pb = ProgressBar::hidden();
    pb.set_length(100);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} transcribing {bar:40.cyan/blue} {pos}%")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
