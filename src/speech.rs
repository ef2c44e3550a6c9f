//! Recognition request and response types.
//!
//! The response types deserialize straight from the JSON mapping of the Speech-to-Text v1 API
//! (camelCase keys, omitted default fields, durations as `"1.500s"` strings), so backends can hand
//! them through without a translation layer.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Audio encodings we can send.
///
/// Only linear PCM is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioEncoding {
    /// Uncompressed 16-bit signed little-endian samples.
    #[default]
    #[serde(rename = "LINEAR16")]
    Linear16,
}

/// A single-shot recognition request: how to interpret the audio, plus the audio itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionRequest {
    pub encoding: AudioEncoding,

    /// Sample rate as read from the WAV header, passed through unmodified.
    pub sample_rate_hertz: u32,

    /// BCP-47 language tag, e.g. `"en-US"`.
    pub language_code: String,

    /// Ask the service for per-word start/end offsets.
    pub enable_word_time_offsets: bool,

    /// The complete file content, sent inline.
    pub content: Vec<u8>,
}

/// The final result of a long-running recognition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResponse {
    #[serde(default)]
    pub results: Vec<SpeechRecognitionResult>,

    #[serde(default, deserialize_with = "de_opt_duration")]
    pub total_billed_time: Option<Duration>,
}

impl RecognitionResponse {
    /// Iterate every alternative across all result groups, in service order.
    pub fn alternatives(&self) -> impl Iterator<Item = &SpeechRecognitionAlternative> {
        self.results.iter().flat_map(|r| r.alternatives.iter())
    }
}

/// One result group: a consecutive portion of the audio.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRecognitionResult {
    /// Alternatives ordered as the service returned them (most likely first).
    #[serde(default)]
    pub alternatives: Vec<SpeechRecognitionAlternative>,

    #[serde(default)]
    pub channel_tag: Option<i32>,

    #[serde(default, deserialize_with = "de_opt_duration")]
    pub result_end_time: Option<Duration>,

    #[serde(default)]
    pub language_code: Option<String>,
}

/// One transcript hypothesis.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRecognitionAlternative {
    #[serde(default)]
    pub transcript: String,

    /// Conventionally in `[0, 1]`. The service omits it (reads as `0.0`) when unavailable.
    #[serde(default)]
    pub confidence: f32,

    /// Only populated when word time offsets were requested.
    #[serde(default)]
    pub words: Vec<WordInfo>,
}

/// Timing for a single recognized word, relative to the start of the audio.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordInfo {
    #[serde(default)]
    pub word: String,

    #[serde(default, deserialize_with = "de_duration")]
    pub start_time: Duration,

    #[serde(default, deserialize_with = "de_duration")]
    pub end_time: Duration,
}

/// Parse a protobuf JSON duration such as `"1.500s"`, `"3s"` or `"0.000000001s"`.
pub fn parse_proto_duration(s: &str) -> Result<Duration, String> {
    let digits = s
        .strip_suffix('s')
        .ok_or_else(|| format!("duration '{s}' is missing the 's' suffix"))?;

    let (secs, frac) = match digits.split_once('.') {
        Some((secs, frac)) => (secs, frac),
        None => (digits, ""),
    };

    if secs.is_empty() || frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid duration '{s}'"));
    }

    let secs: u64 = secs
        .parse()
        .map_err(|_| format!("invalid duration seconds in '{s}'"))?;

    // Right-pad the fraction to nanoseconds: "5" -> 500_000_000.
    let nanos = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<9}");
        padded
            .parse::<u32>()
            .map_err(|_| format!("invalid duration fraction in '{s}'"))?
    };

    Ok(Duration::new(secs, nanos))
}

fn de_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_proto_duration(&s).map_err(serde::de::Error::custom)
}

fn de_opt_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) => parse_proto_duration(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
