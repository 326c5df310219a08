//! Core types for the Identity Bridge

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The two independent trust domains the bridge reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// The identity provider that issued the bearer token (Cognito)
    Provider,
    /// The commerce platform holding the customer record (Shopify)
    Commerce,
}

impl std::fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentitySource::Provider => write!(f, "identity provider"),
            IdentitySource::Commerce => write!(f, "commerce platform"),
        }
    }
}

/// A raw bearer credential with the `Bearer ` scheme already stripped
///
/// The token is a live credential; `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token, rejecting empty or whitespace-only input
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Parse an `Authorization` header value of the form `Bearer <token>`
    ///
    /// The scheme is matched case-insensitively; anything else yields `None`.
    pub fn from_authorization_header(value: &str) -> Option<Self> {
        strip_bearer_scheme(value).and_then(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The credential part of a `Bearer <token>` header value, if the scheme is bearer
pub fn strip_bearer_scheme(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim())
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Opaque, caller-supplied reference to a commerce customer record
///
/// Only presence is checked; the value is unauthenticated input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalRecordReference(String);

impl ExternalRecordReference {
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExternalRecordReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A token that passed signature, issuer, client, use-type and expiry checks
///
/// Lives for one evaluation only: created by the validator, consumed by the
/// identity resolver.
#[derive(Debug, Clone)]
pub struct ValidatedPrincipal {
    /// Subject (`sub`) of the access token
    pub subject: String,

    /// Cognito username, when the token carries one
    pub username: Option<String>,

    /// App client the token was issued to
    pub client_id: String,

    /// When the token expires
    pub expires_at: DateTime<Utc>,

    /// OAuth scopes granted to the token
    pub scopes: Vec<String>,

    /// The access token itself, needed for the user-info lookup
    pub access_token: BearerToken,
}

impl ValidatedPrincipal {
    /// Create a principal for a subject with no optional claims
    pub fn new(
        subject: impl Into<String>,
        client_id: impl Into<String>,
        expires_at: DateTime<Utc>,
        access_token: BearerToken,
    ) -> Self {
        Self {
            subject: subject.into(),
            username: None,
            client_id: client_id.into(),
            expires_at,
            scopes: Vec::new(),
            access_token,
        }
    }

    /// Set username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set scopes
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Check if the principal's token is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// A normalized email address used as the canonical identity attribute
///
/// Normalization is fixed: surrounding whitespace is trimmed and the address
/// is lowercased. Two attributes match iff their normalized forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityAttribute(String);

impl IdentityAttribute {
    /// Normalize a raw email; blank input is not an attribute
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Why a request was denied
///
/// For logs only. The caller sees a bare 401 whatever the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// No bearer token supplied
    MissingToken,
    /// No customer reference supplied
    MissingReference,
    /// Token failed validation
    InvalidToken,
    /// Provider email could not be resolved
    IdentityUnresolved,
    /// Commerce email could not be resolved
    RecordUnresolved,
    /// Both emails resolved but differ
    Mismatch,
    /// Evaluation ran past its deadline
    TimedOut,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DenialReason::MissingToken => "missing_token",
            DenialReason::MissingReference => "missing_reference",
            DenialReason::InvalidToken => "invalid_token",
            DenialReason::IdentityUnresolved => "identity_unresolved",
            DenialReason::RecordUnresolved => "record_unresolved",
            DenialReason::Mismatch => "mismatch",
            DenialReason::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// Outcome of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Authorized,
    Unauthorized(DenialReason),
}

impl Decision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Decision::Authorized)
    }

    /// The denial reason, if any
    pub fn reason(&self) -> Option<DenialReason> {
        match self {
            Decision::Authorized => None,
            Decision::Unauthorized(reason) => Some(*reason),
        }
    }
}

/// The two inputs extracted from an incoming request, either possibly absent
#[derive(Debug, Clone, Default)]
pub struct AuthorizationRequest {
    pub token: Option<String>,
    pub reference: Option<String>,
}

impl AuthorizationRequest {
    pub fn new(token: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            reference: Some(reference.into()),
        }
    }
}
