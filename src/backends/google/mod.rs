//! Google Cloud Speech-to-Text v1 backend over REST.

pub mod auth;
mod wire;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::backend::{OperationSnapshot, RecognitionBackend};
use crate::opts::Opts;
use crate::speech::RecognitionRequest;
use crate::{Error, Result};

use self::auth::{ServiceAccountKey, TokenSource};
use self::wire::{ErrorEnvelope, LongRunningRecognizeBody, OperationBody};

const USER_AGENT: &str = concat!("cloudscribe/", env!("CARGO_PKG_VERSION"));

/// Blocking client for the long-running recognition API.
#[derive(Debug)]
pub struct GoogleSpeechClient {
    http: Client,
    endpoint: String,
    tokens: TokenSource,
}

impl GoogleSpeechClient {
    /// Load credentials from `opts.credentials_path` and build the HTTP client.
    ///
    /// No network traffic happens here; the first token is minted on the first request.
    pub fn new(opts: &Opts) -> Result<Self> {
        let key = ServiceAccountKey::from_file(&opts.credentials_path)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(opts.http_timeout)
            .build()
            .map_err(|err| Error::Http(format!("failed to build HTTP client: {err}")))?;

        Self::with_key(key, http, &opts.endpoint)
    }

    /// Build a client from an already-loaded key and HTTP client.
    pub fn with_key(key: ServiceAccountKey, http: Client, endpoint: &str) -> Result<Self> {
        let tokens = TokenSource::new(key, http.clone())?;
        info!(client_email = %tokens.client_email(), endpoint, "speech client ready");

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            tokens,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.tokens.token()?;
        Ok(builder
            .bearer_auth(token)
            .header(ACCEPT, "application/json"))
    }

    fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let resp = self.authorized(builder)?.send()?;
        let status = resp.status();
        let body = resp.bytes()?;

        if !status.is_success() {
            return Err(error_from_reply(status, &body));
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

impl RecognitionBackend for GoogleSpeechClient {
    fn start_recognition(&self, request: &RecognitionRequest) -> Result<OperationSnapshot> {
        let url = format!("{}/v1/speech:longrunningrecognize", self.endpoint);
        let body = serde_json::to_vec(&LongRunningRecognizeBody::new(request))?;
        debug!(
            %url,
            sample_rate = request.sample_rate_hertz,
            language = %request.language_code,
            audio_bytes = request.content.len(),
            "submitting recognition"
        );

        let op: OperationBody = self.send_json(
            self.http
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body),
        )?;
        op.into_snapshot()
    }

    fn poll_operation(&self, name: &str) -> Result<OperationSnapshot> {
        let url = format!("{}/v1/operations/{}", self.endpoint, name);
        let op: OperationBody = self.send_json(self.http.get(url))?;
        op.into_snapshot()
    }
}

/// Turn a non-2xx reply into an error, preferring the service's own error envelope.
fn error_from_reply(status: StatusCode, body: &[u8]) -> Error {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => Error::Service {
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => Error::Http(format!(
            "{status}: {}",
            String::from_utf8_lossy(body).trim()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_becomes_service_error() {
        let err = error_from_reply(
            StatusCode::FORBIDDEN,
            br#"{"error": {"code": 403, "message": "Quota exceeded", "status": "PERMISSION_DENIED"}}"#,
        );
        match err {
            Error::Service { code, message } => {
                assert_eq!(code, 403);
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn non_json_reply_becomes_http_error() {
        let err = error_from_reply(StatusCode::BAD_GATEWAY, b"<html>upstream down</html>\n");
        assert_eq!(
            err.to_string(),
            "HTTP request failed: 502 Bad Gateway: <html>upstream down</html>"
        );
    }

    #[test]
    fn missing_credentials_fail_construction() {
        let opts = Opts {
            credentials_path: "does/not/exist.json".into(),
            ..Opts::default()
        };
        let err = GoogleSpeechClient::new(&opts).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
