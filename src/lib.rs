//! `cloudscribe` — transcribe WAV files with a cloud speech-to-text service.
//!
//! This crate provides:
//! - WAV header inspection (sample rate at its fixed offset)
//! - A pluggable recognition backend trait, with a Google Speech-to-Text implementation
//! - A blocking handle for long-running recognition operations
//! - The console report printed by the `cloudscribe` binary
//!
//! Most consumers should start with [`cloudscribe::run`].

mod error;

// High-level API (most consumers should start here).
pub mod cloudscribe;
pub mod opts;

// Request/response types and the backend seam.
pub mod backend;
pub mod operation;
pub mod speech;

// Built-in backends.
pub mod backends;

// Audio input and console output.
pub mod report;
pub mod wav;

// Logging configuration.
#[cfg(feature = "logging")]
pub mod logging;

pub use backend::{OperationProgress, OperationSnapshot, OperationState, RecognitionBackend};
pub use backends::google::GoogleSpeechClient;
pub use error::{Error, Result};
pub use operation::LongRunningOperation;
pub use opts::{Opts, PollOpts};
pub use speech::{RecognitionRequest, RecognitionResponse};
