//! Service-account authentication (OAuth2 JWT-bearer grant).
//!
//! We sign a short-lived JWT with the service account's RSA key and trade it at the key's
//! `token_uri` for a bearer token. Tokens are cached and refreshed shortly before they expire,
//! because waiting on a long-running operation can outlast a single token.

use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use ring::rand::SystemRandom;
use ring::signature::{RSA_PKCS1_SHA256, RsaKeyPair};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// OAuth2 scope granting access to Cloud APIs, including Speech-to-Text.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Lifetime requested for each signed assertion. Google caps this at one hour.
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// Refresh cached tokens this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// OAuth2 grant type for exchanging a signed JWT assertion.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The fields we need from a service-account JSON key file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub private_key_id: Option<String>,

    /// PEM-encoded PKCS#8 RSA private key.
    pub private_key: String,

    pub client_email: String,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_owned()
}

impl ServiceAccountKey {
    /// Load a key file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|err| {
            Error::auth(format!(
                "failed to read credentials file '{}': {err}",
                path.display()
            ))
        })?;

        Self::from_json(&bytes).map_err(|err| match err {
            Error::Auth(msg) => Error::auth(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let key: Self = serde_json::from_slice(bytes)
            .map_err(|err| Error::auth(format!("invalid service account key: {err}")))?;

        if let Some(kind) = key.key_type.as_deref() {
            if kind != "service_account" {
                return Err(Error::auth(format!(
                    "expected a 'service_account' key, got '{kind}'"
                )));
            }
        }

        Ok(key)
    }
}

/// Strip PEM armor and decode the base64 body into DER bytes.
pub(crate) fn pem_to_der(pem: &str) -> Result<Vec<u8>> {
    let body: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect();

    if body.is_empty() {
        return Err(Error::auth("private key is empty"));
    }

    STANDARD
        .decode(body)
        .map_err(|err| Error::auth(format!("failed to decode private key: {err}")))
}

#[derive(Debug, Serialize)]
struct JwtHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<&'a str>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub(crate) struct JwtClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    refresh_at: Instant,
}

/// Mints and caches bearer tokens for a service account.
pub struct TokenSource {
    key: ServiceAccountKey,
    key_pair: RsaKeyPair,
    rng: SystemRandom,
    http: Client,
    cached: Mutex<Option<AccessToken>>,
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSource")
            .field("client_email", &self.key.client_email)
            .field("token_uri", &self.key.token_uri)
            .finish_non_exhaustive()
    }
}

impl TokenSource {
    /// Parse the key's private key up front so an unusable key fails at construction.
    pub fn new(key: ServiceAccountKey, http: Client) -> Result<Self> {
        let der = pem_to_der(&key.private_key)?;
        let key_pair = RsaKeyPair::from_pkcs8(&der)
            .map_err(|err| Error::auth(format!("failed to parse RSA private key: {err}")))?;

        Ok(Self {
            key,
            key_pair,
            rng: SystemRandom::new(),
            http,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Return a valid bearer token, exchanging a fresh assertion when the cache is stale.
    pub fn token(&self) -> Result<String> {
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| Error::msg("token cache lock poisoned"))?;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let assertion = self.assertion(unix_now()?)?;
        let token = self.exchange(&assertion)?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    pub(crate) fn claims(&self, now: u64) -> JwtClaims {
        JwtClaims {
            iss: self.key.client_email.clone(),
            scope: CLOUD_PLATFORM_SCOPE.to_owned(),
            aud: self.key.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Build a signed RS256 JWT: `base64url(header).base64url(claims).base64url(signature)`.
    pub(crate) fn assertion(&self, now: u64) -> Result<String> {
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
            kid: self.key.private_key_id.as_deref(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&self.claims(now))?)
        );

        let mut signature = vec![0u8; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(
                &RSA_PKCS1_SHA256,
                &self.rng,
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| Error::auth("failed to sign JWT assertion"))?;

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(&signature)
        ))
    }

    fn exchange(&self, assertion: &str) -> Result<AccessToken> {
        debug!(token_uri = %self.key.token_uri, "requesting access token");
        let issued = Instant::now();

        let resp = self
            .http
            .post(&self.key.token_uri)
            .header(ACCEPT, "application/json")
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)])
            .send()
            .map_err(|err| Error::auth(format!("token request failed: {err}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|err| Error::auth(format!("failed to read token response: {err}")))?;

        if !status.is_success() {
            return Err(Error::auth(format!(
                "token endpoint returned {status}: {}",
                body.trim()
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| Error::auth(format!("invalid token response: {err}")))?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS));
        Ok(AccessToken {
            value: token.access_token,
            refresh_at: issued + lifetime.saturating_sub(REFRESH_MARGIN),
        })
    }
}

fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|err| Error::msg(format!("system clock is before the Unix epoch: {err}")))
}
