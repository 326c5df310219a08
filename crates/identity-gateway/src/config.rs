//! Gateway configuration loaded from environment variables

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;

use identity_bridge::{
    CognitoConfig, CognitoIdentityResolver, CognitoTokenValidator, IdentityBridge, ShopifyConfig,
    ShopifyCustomerResolver,
};

/// Process-lifetime configuration for the gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub cognito: CognitoConfig,
    pub shopify: ShopifyConfig,
    /// Deadline for one whole authorization evaluation
    pub request_timeout: Duration,
    /// Per-call timeout for outbound requests to Cognito and Shopify
    pub upstream_timeout: Duration,
}

impl GatewayConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                _ => bail!("{} must be set", key),
            }
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = optional("PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("PORT must be a valid port number")?;

        let mut cognito = CognitoConfig::new(
            required("AWS_REGION")?,
            required("AWS_USER_POOL_ID")?,
            required("AWS_CLIENT_ID")?,
        );
        if let Some(endpoint) = optional("COGNITO_ENDPOINT") {
            cognito = cognito.with_endpoint(endpoint);
        }
        if let Some(flag) = optional("COGNITO_REQUIRE_VERIFIED_EMAIL") {
            cognito = cognito.with_require_verified_email(
                flag.parse()
                    .context("COGNITO_REQUIRE_VERIFIED_EMAIL must be true or false")?,
            );
        }
        if let Some(ttl) = optional("JWKS_CACHE_TTL_SECS") {
            let secs: u64 = ttl.parse().context("JWKS_CACHE_TTL_SECS must be a number")?;
            cognito = cognito.with_jwks_ttl(Duration::from_secs(secs));
        }

        let mut shopify = ShopifyConfig::new(
            required("SHOPIFY_SHOP_DOMAIN")?,
            required("SHOPIFY_ADMIN_API_ACCESS_TOKEN")?,
        );
        if let Some(version) = optional("SHOPIFY_API_VERSION") {
            shopify = shopify.with_api_version(version);
        }
        if let Some(base_url) = optional("SHOPIFY_BASE_URL") {
            shopify = shopify.with_base_url(base_url);
        }

        let request_timeout = millis(optional("REQUEST_TIMEOUT_MS"), 10_000, "REQUEST_TIMEOUT_MS")?;
        let upstream_timeout = millis(optional("UPSTREAM_TIMEOUT_MS"), 5_000, "UPSTREAM_TIMEOUT_MS")?;

        Ok(Self {
            port,
            cognito,
            shopify,
            request_timeout,
            upstream_timeout,
        })
    }

    /// Construct the bridge and its collaborators, sharing one HTTP client
    pub fn build_bridge(&self) -> Result<IdentityBridge> {
        let http_client = reqwest::Client::builder()
            .timeout(self.upstream_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let validator = CognitoTokenValidator::new(self.cognito.clone()).with_http_client(http_client.clone());
        let identity = CognitoIdentityResolver::new(&self.cognito).with_http_client(http_client.clone());
        let records = ShopifyCustomerResolver::new(&self.shopify)
            .context("Invalid Shopify configuration")?
            .with_http_client(http_client);

        Ok(IdentityBridge::new(
            Arc::new(validator),
            Arc::new(identity),
            Arc::new(records),
        ))
    }
}

fn millis(raw: Option<String>, default: u64, key: &str) -> Result<Duration> {
    let ms = match raw {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{} must be a number of milliseconds", key))?,
        None => default,
    };
    if ms == 0 {
        bail!("{} must be greater than zero", key);
    }
    Ok(Duration::from_millis(ms))
}
