//! Email resolvers for the two identity systems
//!
//! Each resolver reads the canonical email for one side of the cross-match.
//! Neither is an authorization check on its own.

use async_trait::async_trait;

use crate::error::ResolutionError;
use crate::types::{ExternalRecordReference, IdentityAttribute, ValidatedPrincipal};

pub mod cognito;
pub mod shopify;

pub use cognito::CognitoIdentityResolver;
pub use shopify::ShopifyCustomerResolver;

/// Looks up the identity provider's live email for a validated principal
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve the provider-held email
    ///
    /// The live record is authoritative even when the token carries an email
    /// claim of its own.
    async fn resolve_email(&self, principal: &ValidatedPrincipal) -> Result<IdentityAttribute, ResolutionError>;

    /// Get a description of this resolver (for logging)
    fn description(&self) -> &str {
        "identity resolver"
    }
}

/// Looks up the external system's email for a caller-supplied record reference
#[async_trait]
pub trait ExternalRecordResolver: Send + Sync {
    /// Resolve the email registered on the referenced record
    async fn resolve_email(
        &self,
        reference: &ExternalRecordReference,
    ) -> Result<IdentityAttribute, ResolutionError>;

    /// Get a description of this resolver (for logging)
    fn description(&self) -> &str {
        "external record resolver"
    }
}
