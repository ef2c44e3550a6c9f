//! JSON shapes of the Speech-to-Text v1 REST surface.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::backend::{OperationProgress, OperationSnapshot, OperationState, Status};
use crate::speech::{AudioEncoding, RecognitionRequest, RecognitionResponse};
use crate::{Error, Result};

#[derive(Debug, Serialize)]
pub(crate) struct LongRunningRecognizeBody<'a> {
    config: RecognitionConfigBody<'a>,
    audio: RecognitionAudioBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfigBody<'a> {
    encoding: AudioEncoding,
    sample_rate_hertz: u32,
    language_code: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    enable_word_time_offsets: bool,
}

#[derive(Debug, Serialize)]
struct RecognitionAudioBody {
    /// Base64 of the full file content.
    content: String,
}

impl<'a> LongRunningRecognizeBody<'a> {
    pub(crate) fn new(request: &'a RecognitionRequest) -> Self {
        Self {
            config: RecognitionConfigBody {
                encoding: request.encoding,
                sample_rate_hertz: request.sample_rate_hertz,
                language_code: &request.language_code,
                enable_word_time_offsets: request.enable_word_time_offsets,
            },
            audio: RecognitionAudioBody {
                content: STANDARD.encode(&request.content),
            },
        }
    }
}

/// `google.longrunning.Operation`.
#[derive(Debug, Deserialize)]
pub(crate) struct OperationBody {
    name: String,

    #[serde(default)]
    done: bool,

    #[serde(default)]
    metadata: Option<MetadataBody>,

    #[serde(default)]
    response: Option<RecognitionResponse>,

    #[serde(default)]
    error: Option<StatusBody>,
}

/// `LongRunningRecognizeMetadata`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataBody {
    #[serde(default)]
    progress_percent: Option<u8>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    last_update_time: Option<String>,
}

/// `google.rpc.Status`.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// HTTP error envelope: `{"error": {"code": 400, "message": "...", "status": "INVALID_ARGUMENT"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: StatusBody,
}

impl OperationBody {
    pub(crate) fn into_snapshot(self) -> Result<OperationSnapshot> {
        if self.name.is_empty() {
            return Err(Error::msg("service returned an operation without a name"));
        }

        let metadata = self.metadata.unwrap_or_default();
        let progress = OperationProgress {
            percent: metadata.progress_percent,
            start_time: metadata
                .start_time
                .as_deref()
                .and_then(|s| parse_rfc3339("startTime", s)),
            last_update_time: metadata
                .last_update_time
                .as_deref()
                .and_then(|s| parse_rfc3339("lastUpdateTime", s)),
        };

        let state = match (self.done, self.error, self.response) {
            (_, Some(status), _) => OperationState::Failed(Status {
                code: status.code,
                message: status.message,
            }),
            (true, None, response) => OperationState::Succeeded(response.unwrap_or_default()),
            (false, None, _) => OperationState::Running,
        };

        Ok(OperationSnapshot {
            name: self.name,
            progress,
            state,
        })
    }
}

/// Parse a metadata timestamp (`2024-05-01T12:34:56.789Z`, any RFC 3339 offset) as UTC.
///
/// Metadata timestamps are informational: a malformed one is logged and dropped.
fn parse_rfc3339(field: &'static str, s: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(err) => {
            warn!(field, value = s, error = %err, "ignoring malformed operation timestamp");
            None
        }
    }
}
