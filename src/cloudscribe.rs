//! High-level API for transcribing a WAV file with a cloud backend.
//!
//! `run` is the whole program as a linear sequence of fallible steps:
//! print path → read sample rate → read content → connect → submit → wait → print.
//! The first failing step short-circuits the rest and its error is returned to the caller.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::Result;
use crate::backend::{OperationSnapshot, RecognitionBackend};
use crate::operation::LongRunningOperation;
use crate::opts::Opts;
use crate::report::Report;
use crate::speech::{RecognitionRequest, RecognitionResponse};
use crate::wav;

/// Transcribe the WAV file at `audio_path` and write the report to `out`.
///
/// - `None` for `audio_path` prints the no-argument message and returns `Ok` without touching
///   the filesystem or calling `connect`.
/// - `connect` builds the backend. It runs after the audio has been read, so file errors surface
///   before credential errors.
pub fn run<B, C, W>(audio_path: Option<&Path>, opts: &Opts, connect: C, out: W) -> Result<()>
where
    B: RecognitionBackend,
    C: FnOnce(&Opts) -> Result<B>,
    W: Write,
{
    run_with_progress(audio_path, opts, connect, out, |_| {})
}

/// Like [`run`], but reports each operation snapshot observed while waiting on the service.
pub fn run_with_progress<B, C, W, P>(
    audio_path: Option<&Path>,
    opts: &Opts,
    connect: C,
    out: W,
    on_progress: P,
) -> Result<()>
where
    B: RecognitionBackend,
    C: FnOnce(&Opts) -> Result<B>,
    W: Write,
    P: FnMut(&OperationSnapshot),
{
    let started = Instant::now();
    let mut report = Report::new(out).with_word_time_offsets(opts.enable_word_time_offsets);

    let Some(audio_path) = audio_path else {
        return report.no_argument();
    };

    report.audio_file(audio_path)?;

    let sample_rate = wav::sample_rate_from_path(audio_path)?;
    report.sample_rate(sample_rate)?;

    let content = wav::read_audio_content(audio_path)?;
    if opts.validate_wav_header {
        wav::validate_wav(&content, sample_rate)?;
    }
    debug!(
        path = %audio_path.display(),
        sample_rate,
        bytes = content.len(),
        "audio loaded"
    );

    let backend = connect(opts)?;
    let request = build_request(opts, sample_rate, content);
    let response = recognize(&backend, request, opts, on_progress)?;

    report.transcripts(&response)?;
    report.elapsed(started.elapsed())?;
    Ok(())
}

/// Combine the fixed options with what was read from the file.
pub fn build_request(opts: &Opts, sample_rate: u32, content: Vec<u8>) -> RecognitionRequest {
    RecognitionRequest {
        encoding: opts.encoding,
        sample_rate_hertz: sample_rate,
        language_code: opts.language_code.clone(),
        enable_word_time_offsets: opts.enable_word_time_offsets,
        content,
    }
}

/// Submit a request and block until the service resolves it.
pub fn recognize<B, P>(
    backend: &B,
    request: RecognitionRequest,
    opts: &Opts,
    on_progress: P,
) -> Result<RecognitionResponse>
where
    B: RecognitionBackend + ?Sized,
    P: FnMut(&OperationSnapshot),
{
    let op = LongRunningOperation::start(backend, &request)?;
    info!(operation = %op.name(), "waiting for recognition");

    let response = op.wait_with(&opts.poll, on_progress)?;
    info!(
        results = response.results.len(),
        billed = ?response.total_billed_time,
        "recognition complete"
    );
    Ok(response)
}
