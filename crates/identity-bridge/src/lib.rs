//! Identity Bridge
//!
//! Decides whether the caller of a request is one person registered in two
//! independent systems: a Cognito user pool that issued the caller's bearer
//! token, and a Shopify store holding the customer record the caller names.
//!
//! ## Pipeline
//!
//! 1. **Input check** - token and customer reference must both be present
//! 2. **Token validation** - signature (JWKS), issuer, client, use-type, expiry
//! 3. **Dual resolution** - Cognito `GetUser` and Shopify customer lookup, concurrently
//! 4. **Match** - normalized emails must be equal
//!
//! Fail-closed throughout: any missing input, validation failure, lookup
//! failure or mismatch is `Unauthorized`. Only misconfiguration of the bridge
//! itself escapes as a [`ConfigurationError`].
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use identity_bridge::*;
//!
//! let cognito = CognitoConfig::new("eu-west-2", "eu-west-2_AbCdEf123", "app-client-id");
//! let shopify = ShopifyConfig::new("quitelikeau.myshopify.com", "shpat_...");
//!
//! let bridge = IdentityBridge::new(
//!     Arc::new(CognitoTokenValidator::new(cognito.clone())),
//!     Arc::new(CognitoIdentityResolver::new(&cognito)),
//!     Arc::new(ShopifyCustomerResolver::new(&shopify)?),
//! );
//!
//! let decision = bridge.authorize(AuthorizationRequest::new(token, customer_id)).await?;
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod mock;
pub mod policy;
pub mod resolvers;
pub mod types;
pub mod validator;

pub use bridge::IdentityBridge;
pub use config::{CognitoConfig, ShopifyConfig};
pub use error::{ConfigurationError, ResolutionError, ValidationError};
pub use policy::MatchPolicy;
pub use resolvers::{
    CognitoIdentityResolver, ExternalRecordResolver, IdentityResolver, ShopifyCustomerResolver,
};
pub use types::{
    AuthorizationRequest, BearerToken, Decision, DenialReason, ExternalRecordReference,
    IdentityAttribute, IdentitySource, ValidatedPrincipal, strip_bearer_scheme,
};
pub use validator::{CognitoTokenValidator, TokenValidator};
