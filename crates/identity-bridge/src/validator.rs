//! Access Token Validation
//!
//! Verifies Cognito access tokens against the user pool's published JWKS.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use moka::future::Cache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::CognitoConfig;
use crate::error::ValidationError;
use crate::types::{BearerToken, ValidatedPrincipal};

/// Minimum age of a cached key set before an unknown `kid` may trigger a refetch
const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Verifies a bearer token and produces the principal it represents
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate a raw token (scheme already stripped)
    ///
    /// # Returns
    /// * `Ok(ValidatedPrincipal)` - signature, issuer, client, use and expiry all check out
    /// * `Err(ValidationError)` - anything else
    async fn validate(&self, token: &BearerToken) -> Result<ValidatedPrincipal, ValidationError>;

    /// Get a description of this validator (for logging)
    fn description(&self) -> &str {
        "token validator"
    }
}

/// JWKS (JSON Web Key Set) response
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// Individual JWK (JSON Web Key)
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    alg: Option<String>,
    #[serde(rename = "use")]
    key_use: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

impl Jwk {
    fn is_rs256_signing_key(&self) -> bool {
        self.kty == "RSA"
            && self.key_use.as_deref().map_or(true, |u| u == "sig")
            && self.alg.as_deref().map_or(true, |a| a == "RS256")
    }

    fn decoding_key(&self) -> Result<DecodingKey, ValidationError> {
        let n = self
            .n
            .as_ref()
            .ok_or_else(|| ValidationError::InvalidFormat("JWK missing RSA modulus".into()))?;
        let e = self
            .e
            .as_ref()
            .ok_or_else(|| ValidationError::InvalidFormat("JWK missing RSA exponent".into()))?;

        DecodingKey::from_rsa_components(n, e)
            .map_err(|e| ValidationError::InvalidFormat(e.to_string()))
    }
}

/// A fetched key set and when we fetched it
#[derive(Debug)]
struct KeySet {
    keys: Vec<Jwk>,
    fetched_at: Instant,
}

impl KeySet {
    fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .iter()
            .find(|k| k.kid.as_deref() == Some(kid) && k.is_rs256_signing_key())
    }
}

/// Claims of a Cognito access token
#[derive(Debug, Deserialize)]
struct AccessTokenClaims {
    sub: String,
    exp: i64,
    token_use: Option<String>,
    client_id: Option<String>,
    username: Option<String>,
    scope: Option<String>,
}

/// Cognito access token validator
///
/// Holds the only cross-request state in the bridge: the pool's key set,
/// cached read-only in a concurrent TTL cache.
pub struct CognitoTokenValidator {
    config: CognitoConfig,
    issuer: String,
    jwks_url: String,
    key_cache: Cache<String, Arc<KeySet>>,
    http_client: reqwest::Client,
    min_refresh_interval: Duration,
}

impl CognitoTokenValidator {
    /// Create a validator for the configured pool
    pub fn new(config: CognitoConfig) -> Self {
        let key_cache = Cache::builder()
            .time_to_live(config.jwks_ttl)
            .max_capacity(4)
            .build();

        Self {
            issuer: config.issuer(),
            jwks_url: config.jwks_url(),
            config,
            key_cache,
            http_client: reqwest::Client::new(),
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
        }
    }

    /// Use a shared HTTP client (timeouts, connection pool)
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    /// Change how soon an unknown `kid` may force a key set refetch
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Get the key set, fetching it at most once across concurrent callers
    async fn key_set(&self) -> Result<Arc<KeySet>, ValidationError> {
        self.key_cache
            .try_get_with(self.jwks_url.clone(), self.fetch_key_set())
            .await
            .map_err(|err| match err.as_ref() {
                ValidationError::Misconfigured(msg) => ValidationError::Misconfigured(msg.clone()),
                ValidationError::KeySetUnavailable(msg) => ValidationError::KeySetUnavailable(msg.clone()),
                other => ValidationError::KeySetUnavailable(other.to_string()),
            })
    }

    async fn fetch_key_set(&self) -> Result<Arc<KeySet>, ValidationError> {
        debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self.http_client.get(&self.jwks_url).send().await?;
        let status = response.status();

        if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ValidationError::Misconfigured(format!(
                "JWKS endpoint returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(ValidationError::KeySetUnavailable(format!(
                "JWKS endpoint returned {}",
                status
            )));
        }

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| ValidationError::KeySetUnavailable(e.to_string()))?;

        debug!(keys = jwks.keys.len(), "Fetched JWKS");

        Ok(Arc::new(KeySet {
            keys: jwks.keys,
            fetched_at: Instant::now(),
        }))
    }

    /// Resolve the decoding key for a `kid`, refetching once on rotation
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, ValidationError> {
        let key_set = self.key_set().await?;
        if let Some(jwk) = key_set.find(kid) {
            return jwk.decoding_key();
        }

        if key_set.fetched_at.elapsed() < self.min_refresh_interval {
            return Err(ValidationError::KeyNotFound(kid.to_string()));
        }

        debug!(kid = %kid, "Unknown key id, refreshing JWKS");
        self.key_cache.invalidate(&self.jwks_url).await;

        let key_set = self.key_set().await?;
        key_set
            .find(kid)
            .ok_or_else(|| ValidationError::KeyNotFound(kid.to_string()))?
            .decoding_key()
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // Access tokens carry client_id instead of aud
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = 0;
        validation
    }
}

#[async_trait]
impl TokenValidator for CognitoTokenValidator {
    fn description(&self) -> &str {
        "Cognito access token validator"
    }

    async fn validate(&self, token: &BearerToken) -> Result<ValidatedPrincipal, ValidationError> {
        let header = decode_header(token.as_str())
            .map_err(|e| ValidationError::InvalidFormat(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(ValidationError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let kid = header
            .kid
            .ok_or_else(|| ValidationError::MissingClaim("kid".into()))?;

        let decoding_key = self.decoding_key(&kid).await?;
        let claims = decode::<AccessTokenClaims>(token.as_str(), &decoding_key, &self.validation())?.claims;

        match claims.token_use.as_deref() {
            Some("access") => {}
            Some(other) => return Err(ValidationError::WrongTokenUse(other.to_string())),
            None => return Err(ValidationError::MissingClaim("token_use".into())),
        }

        let client_id = claims
            .client_id
            .ok_or_else(|| ValidationError::MissingClaim("client_id".into()))?;
        if client_id != self.config.client_id {
            return Err(ValidationError::ClientMismatch);
        }

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| ValidationError::InvalidFormat("exp out of range".into()))?;

        let mut principal = ValidatedPrincipal::new(claims.sub, client_id, expires_at, token.clone());
        if let Some(username) = claims.username {
            principal = principal.with_username(username);
        }
        if let Some(scope) = claims.scope {
            principal = principal.with_scopes(scope.split_whitespace().map(String::from).collect());
        }

        debug!(subject = %principal.subject, "Access token validated");
        Ok(principal)
    }
}
