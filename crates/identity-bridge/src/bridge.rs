//! Identity Bridge - drives one authorization evaluation end to end

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{ConfigurationError, ResolutionError};
use crate::policy::MatchPolicy;
use crate::resolvers::{ExternalRecordResolver, IdentityResolver};
use crate::types::{
    AuthorizationRequest, BearerToken, Decision, DenialReason, ExternalRecordReference, IdentitySource,
};
use crate::validator::TokenValidator;

/// Identity Bridge - cross-matches a token holder against a commerce record
///
/// Stages run strictly in order: input check, token validation, dual
/// resolution, match. Every stage has exactly one exit that is not
/// `Authorized`, and nothing is retried or cached between evaluations.
#[derive(Clone)]
pub struct IdentityBridge {
    validator: Arc<dyn TokenValidator>,
    identity: Arc<dyn IdentityResolver>,
    records: Arc<dyn ExternalRecordResolver>,
}

impl IdentityBridge {
    /// Create a bridge over the three collaborators
    pub fn new(
        validator: Arc<dyn TokenValidator>,
        identity: Arc<dyn IdentityResolver>,
        records: Arc<dyn ExternalRecordResolver>,
    ) -> Self {
        info!(
            validator = validator.description(),
            identity = identity.description(),
            records = records.description(),
            "Identity bridge assembled"
        );
        Self {
            validator,
            identity,
            records,
        }
    }

    /// Evaluate one request
    ///
    /// # Returns
    /// * `Ok(Decision)` - the binary outcome; the reason is for logs only
    /// * `Err(ConfigurationError)` - the bridge itself is misconfigured
    pub async fn authorize(&self, request: AuthorizationRequest) -> Result<Decision, ConfigurationError> {
        let Some(token) = request.token.and_then(BearerToken::new) else {
            return Ok(deny(DenialReason::MissingToken));
        };
        let Some(reference) = request.reference.and_then(ExternalRecordReference::new) else {
            return Ok(deny(DenialReason::MissingReference));
        };

        let principal = match self.validator.validate(&token).await {
            Ok(principal) => principal,
            Err(err) if err.is_operational() => {
                error!(error = %err, "Token validation misconfigured");
                return Err(err.into());
            }
            Err(err) => {
                debug!(error = %err, "Token rejected");
                return Ok(deny(DenialReason::InvalidToken));
            }
        };

        // Independent lookups: the first failure drops the other in-flight call
        let resolved = tokio::try_join!(
            self.identity.resolve_email(&principal),
            self.records.resolve_email(&reference),
        );

        let (provider_email, commerce_email) = match resolved {
            Ok(pair) => pair,
            Err(err) => return resolution_failure(err),
        };

        let decision = MatchPolicy::decide(Some(&provider_email), Some(&commerce_email));
        match decision {
            Decision::Authorized => {
                info!(subject = %principal.subject, customer = %reference, "Identity cross-match succeeded");
            }
            Decision::Unauthorized(reason) => {
                warn!(subject = %principal.subject, customer = %reference, reason = %reason, "Identity cross-match failed");
            }
        }

        Ok(decision)
    }

    /// Evaluate one request with a deadline
    ///
    /// An elapsed deadline cancels any in-flight lookups and denies.
    pub async fn authorize_within(
        &self,
        request: AuthorizationRequest,
        timeout: Duration,
    ) -> Result<Decision, ConfigurationError> {
        match tokio::time::timeout(timeout, self.authorize(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Authorization timed out");
                Ok(Decision::Unauthorized(DenialReason::TimedOut))
            }
        }
    }
}

fn deny(reason: DenialReason) -> Decision {
    debug!(reason = %reason, "Request denied");
    Decision::Unauthorized(reason)
}

fn resolution_failure(err: ResolutionError) -> Result<Decision, ConfigurationError> {
    if err.is_operational() {
        error!(error = %err, "Identity lookup misconfigured");
        return Err(err.into());
    }

    warn!(error = %err, "Identity lookup failed");
    let reason = match err.identity_source() {
        IdentitySource::Provider => DenialReason::IdentityUnresolved,
        IdentitySource::Commerce => DenialReason::RecordUnresolved,
    };
    Ok(Decision::Unauthorized(reason))
}
