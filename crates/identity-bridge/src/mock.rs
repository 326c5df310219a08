//! Scripted collaborators
//!
//! For tests and local runs without Cognito or Shopify. Every mock counts its
//! calls so tests can assert which stages actually ran.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{ResolutionError, ValidationError};
use crate::resolvers::{ExternalRecordResolver, IdentityResolver};
use crate::types::{
    BearerToken, ExternalRecordReference, IdentityAttribute, IdentitySource, ValidatedPrincipal,
};
use crate::validator::TokenValidator;

/// Mock token validator
///
/// Accepts tokens in the format:
/// - "subject" - valid token for that subject
/// - "EXPIRED" - fails with `ValidationError::Expired`
/// - "FAIL:message" - fails with `ValidationError::Failed(message)`
/// - "MISCONFIGURED" - fails with an operational error
#[derive(Default)]
pub struct MockTokenValidator {
    calls: AtomicUsize,
}

impl MockTokenValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `validate` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenValidator for MockTokenValidator {
    fn description(&self) -> &str {
        "mock token validator"
    }

    async fn validate(&self, token: &BearerToken) -> Result<ValidatedPrincipal, ValidationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let raw = token.as_str();
        if let Some(message) = raw.strip_prefix("FAIL:") {
            return Err(ValidationError::Failed(message.to_string()));
        }
        match raw {
            "EXPIRED" => Err(ValidationError::Expired),
            "MISCONFIGURED" => Err(ValidationError::Misconfigured("mock JWKS endpoint".into())),
            subject => Ok(ValidatedPrincipal::new(
                subject,
                "mock-client",
                Utc::now() + ChronoDuration::hours(1),
                token.clone(),
            )),
        }
    }
}

/// What a scripted lookup answers with
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Resolve to this raw email
    Email(String),
    /// No such record
    NotFound,
    /// Record without an email
    MissingEmail,
    /// Simulated network failure
    Unavailable,
    /// Simulated refusal of our own credentials
    Misconfigured,
}

impl MockOutcome {
    fn into_result(self, system: IdentitySource) -> Result<IdentityAttribute, ResolutionError> {
        match self {
            MockOutcome::Email(raw) => {
                IdentityAttribute::parse(&raw).ok_or(ResolutionError::MissingEmail { system })
            }
            MockOutcome::NotFound => Err(ResolutionError::NotFound { system }),
            MockOutcome::MissingEmail => Err(ResolutionError::MissingEmail { system }),
            MockOutcome::Unavailable => Err(ResolutionError::Unavailable {
                system,
                message: "simulated network failure".into(),
            }),
            MockOutcome::Misconfigured => Err(ResolutionError::Misconfigured {
                system,
                message: "simulated credential refusal".into(),
            }),
        }
    }
}

struct ScriptedLookup {
    outcome: MockOutcome,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedLookup {
    fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    async fn run(&self, system: IdentitySource) -> Result<IdentityAttribute, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone().into_result(system)
    }
}

/// Scripted identity provider lookup
pub struct MockIdentityResolver(ScriptedLookup);

impl MockIdentityResolver {
    pub fn new(outcome: MockOutcome) -> Self {
        Self(ScriptedLookup::new(outcome))
    }

    /// Resolve every principal to this email
    pub fn returning(email: impl Into<String>) -> Self {
        Self::new(MockOutcome::Email(email.into()))
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.0.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.0.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityResolver for MockIdentityResolver {
    fn description(&self) -> &str {
        "mock identity resolver"
    }

    async fn resolve_email(&self, _principal: &ValidatedPrincipal) -> Result<IdentityAttribute, ResolutionError> {
        self.0.run(IdentitySource::Provider).await
    }
}

/// Scripted commerce record lookup
pub struct MockRecordResolver(ScriptedLookup);

impl MockRecordResolver {
    pub fn new(outcome: MockOutcome) -> Self {
        Self(ScriptedLookup::new(outcome))
    }

    /// Resolve every reference to this email
    pub fn returning(email: impl Into<String>) -> Self {
        Self::new(MockOutcome::Email(email.into()))
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.0.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.0.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalRecordResolver for MockRecordResolver {
    fn description(&self) -> &str {
        "mock record resolver"
    }

    async fn resolve_email(
        &self,
        _reference: &ExternalRecordReference,
    ) -> Result<IdentityAttribute, ResolutionError> {
        self.0.run(IdentitySource::Commerce).await
    }
}
