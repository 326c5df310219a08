//! Shopify customer lookup via the Admin REST API

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::config::ShopifyConfig;
use crate::error::ResolutionError;
use crate::resolvers::ExternalRecordResolver;
use crate::types::{ExternalRecordReference, IdentityAttribute, IdentitySource};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

const SOURCE: IdentitySource = IdentitySource::Commerce;

#[derive(Debug, Deserialize)]
struct CustomerEnvelope {
    customer: Option<Customer>,
}

#[derive(Debug, Deserialize)]
struct Customer {
    email: Option<String>,
}

/// Resolves the email registered on a Shopify customer
pub struct ShopifyCustomerResolver {
    customers_url: Url,
    access_token: String,
    http_client: reqwest::Client,
}

impl ShopifyCustomerResolver {
    /// Build a resolver; fails if the configured store URL does not parse
    pub fn new(config: &ShopifyConfig) -> Result<Self, ResolutionError> {
        let raw = format!("{}/admin/api/{}/customers", config.base_url(), config.api_version);
        let customers_url = Url::parse(&raw).map_err(|e| ResolutionError::Misconfigured {
            system: SOURCE,
            message: format!("invalid store URL {}: {}", raw, e),
        })?;

        if customers_url.cannot_be_a_base() {
            return Err(ResolutionError::Misconfigured {
                system: SOURCE,
                message: format!("store URL {} cannot be a base", raw),
            });
        }

        Ok(Self {
            customers_url,
            access_token: config.admin_access_token.clone(),
            http_client: reqwest::Client::new(),
        })
    }

    /// Use a shared HTTP client (timeouts, connection pool)
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    /// `{base}/customers/{id}.json`, with the id as one percent-encoded segment
    fn customer_url(&self, reference: &ExternalRecordReference) -> Url {
        let mut url = self.customers_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&format!("{}.json", reference.as_str()));
        }
        url
    }

    fn classify_failure(status: StatusCode) -> ResolutionError {
        match status {
            StatusCode::NOT_FOUND => ResolutionError::NotFound { system: SOURCE },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ResolutionError::Misconfigured {
                system: SOURCE,
                message: format!("admin API refused credentials ({})", status),
            },
            StatusCode::TOO_MANY_REQUESTS => ResolutionError::Unavailable {
                system: SOURCE,
                message: "rate limited".into(),
            },
            s if s.is_server_error() => ResolutionError::Unavailable {
                system: SOURCE,
                message: s.to_string(),
            },
            s => ResolutionError::Rejected {
                system: SOURCE,
                message: s.to_string(),
            },
        }
    }
}

#[async_trait]
impl ExternalRecordResolver for ShopifyCustomerResolver {
    fn description(&self) -> &str {
        "Shopify customer resolver"
    }

    async fn resolve_email(
        &self,
        reference: &ExternalRecordReference,
    ) -> Result<IdentityAttribute, ResolutionError> {
        debug!(customer = %reference, "Resolving commerce email");

        let response = self
            .http_client
            .get(self.customer_url(reference))
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .send()
            .await
            .map_err(|e| ResolutionError::unavailable(SOURCE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_failure(status));
        }

        let envelope: CustomerEnvelope = response
            .json()
            .await
            .map_err(|e| ResolutionError::invalid_response(SOURCE, e))?;

        envelope
            .customer
            .ok_or(ResolutionError::NotFound { system: SOURCE })?
            .email
            .as_deref()
            .and_then(IdentityAttribute::parse)
            .ok_or(ResolutionError::MissingEmail { system: SOURCE })
    }
}
