//! Error types for the Identity Bridge
//!
//! Token and resolution failures are kept apart so each pipeline stage has an
//! independently testable failure mode. Both carry an `is_operational` flag:
//! operational faults mean this service is misconfigured and surface as
//! [`ConfigurationError`] instead of a plain denial.

use thiserror::Error;

use crate::types::IdentitySource;

/// Errors raised while validating a bearer token
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Token is not a well-formed JWT
    #[error("Invalid token format: {0}")]
    InvalidFormat(String),

    /// Token has expired
    #[error("Token expired")]
    Expired,

    /// Token not yet valid (nbf in the future)
    #[error("Token not yet valid")]
    NotYetValid,

    /// Signature does not verify against the pool's key
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Issuer claim does not name the configured user pool
    #[error("Invalid issuer")]
    InvalidIssuer,

    /// Header names an algorithm other than RS256
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Key ID not present in the pool's key set
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Missing required claim
    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    /// Token is not an access token (e.g. an ID token)
    #[error("Wrong token use: expected access, got {0}")]
    WrongTokenUse(String),

    /// Token was issued to a different app client
    #[error("Token issued to a different client")]
    ClientMismatch,

    /// Key set could not be fetched (network or upstream failure)
    #[error("Failed to fetch JWKS: {0}")]
    KeySetUnavailable(String),

    /// Key set endpoint rejected the request; region or pool is wrong
    #[error("JWKS endpoint misconfigured: {0}")]
    Misconfigured(String),

    /// Any other verification failure
    #[error("Token validation failed: {0}")]
    Failed(String),
}

impl ValidationError {
    /// Whether this failure points at our own configuration rather than the caller
    pub fn is_operational(&self) -> bool {
        matches!(self, ValidationError::Misconfigured(_))
    }
}

impl From<jsonwebtoken::errors::Error> for ValidationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => ValidationError::Expired,
            ErrorKind::ImmatureSignature => ValidationError::NotYetValid,
            ErrorKind::InvalidSignature => ValidationError::InvalidSignature(err.to_string()),
            ErrorKind::InvalidIssuer => ValidationError::InvalidIssuer,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                ValidationError::InvalidFormat(err.to_string())
            }
            ErrorKind::MissingRequiredClaim(claim) => ValidationError::MissingClaim(claim.clone()),
            ErrorKind::InvalidAlgorithm => ValidationError::UnsupportedAlgorithm(err.to_string()),
            _ => ValidationError::Failed(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for ValidationError {
    fn from(err: reqwest::Error) -> Self {
        ValidationError::KeySetUnavailable(err.to_string())
    }
}

/// Errors raised while resolving an email from either identity system
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// The referenced record does not exist
    #[error("{system} record not found")]
    NotFound { system: IdentitySource },

    /// The record exists but carries no email
    #[error("{system} record has no email")]
    MissingEmail { system: IdentitySource },

    /// The provider holds an email it has not verified
    #[error("{system} email is not verified")]
    UnverifiedEmail { system: IdentitySource },

    /// The upstream refused the lookup for this caller (e.g. revoked token)
    #[error("{system} rejected lookup: {message}")]
    Rejected { system: IdentitySource, message: String },

    /// Transport failure, throttling, or upstream 5xx
    #[error("{system} unavailable: {message}")]
    Unavailable { system: IdentitySource, message: String },

    /// The upstream answered with a body we could not interpret
    #[error("{system} returned an invalid response: {message}")]
    InvalidResponse { system: IdentitySource, message: String },

    /// Our own credentials for the upstream were refused
    #[error("{system} misconfigured: {message}")]
    Misconfigured { system: IdentitySource, message: String },
}

impl ResolutionError {
    /// Whether this failure points at our own configuration rather than the caller
    pub fn is_operational(&self) -> bool {
        matches!(self, ResolutionError::Misconfigured { .. })
    }

    /// Which identity system produced the failure
    pub fn identity_source(&self) -> IdentitySource {
        match self {
            ResolutionError::NotFound { system }
            | ResolutionError::MissingEmail { system }
            | ResolutionError::UnverifiedEmail { system }
            | ResolutionError::Rejected { system, .. }
            | ResolutionError::Unavailable { system, .. }
            | ResolutionError::InvalidResponse { system, .. }
            | ResolutionError::Misconfigured { system, .. } => *system,
        }
    }

    pub(crate) fn unavailable(system: IdentitySource, err: impl std::fmt::Display) -> Self {
        ResolutionError::Unavailable {
            system,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_response(system: IdentitySource, err: impl std::fmt::Display) -> Self {
        ResolutionError::InvalidResponse {
            system,
            message: err.to_string(),
        }
    }
}

/// The bridge itself is broken: wrong pool, refused admin credential, bad setup
///
/// Never collapsed into a denial so operators can tell "caller not authorized"
/// apart from "service not working".
#[derive(Error, Debug)]
#[error("Configuration error: {0}")]
pub struct ConfigurationError(pub String);

impl From<ValidationError> for ConfigurationError {
    fn from(err: ValidationError) -> Self {
        ConfigurationError(err.to_string())
    }
}

impl From<ResolutionError> for ConfigurationError {
    fn from(err: ResolutionError) -> Self {
        ConfigurationError(err.to_string())
    }
}
