//! Connection settings for the two identity systems
//!
//! Both are process-lifetime constants; the bridge never mutates them.

use serde::Deserialize;
use std::time::Duration;

/// Cognito user pool the bearer tokens must come from
#[derive(Debug, Clone, Deserialize)]
pub struct CognitoConfig {
    /// AWS region of the pool (e.g. `eu-west-2`)
    pub region: String,

    /// User pool identifier (e.g. `eu-west-2_AbCdEf123`)
    pub user_pool_id: String,

    /// App client id the access tokens must be issued to
    pub client_id: String,

    /// Base URL of the Cognito IdP service; defaults to the public regional endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Refuse provider emails that Cognito reports as unverified
    #[serde(default = "default_true")]
    pub require_verified_email: bool,

    /// How long a fetched key set is trusted before refetching
    #[serde(default = "default_jwks_ttl", with = "secs")]
    pub jwks_ttl: Duration,
}

fn default_true() -> bool {
    true
}

fn default_jwks_ttl() -> Duration {
    Duration::from_secs(3600)
}

mod secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

impl CognitoConfig {
    /// Create a config for a pool and app client
    pub fn new(
        region: impl Into<String>,
        user_pool_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            user_pool_id: user_pool_id.into(),
            client_id: client_id.into(),
            endpoint: None,
            require_verified_email: true,
            jwks_ttl: default_jwks_ttl(),
        }
    }

    /// Point at a non-default Cognito endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Toggle the verified-email requirement
    pub fn with_require_verified_email(mut self, require: bool) -> Self {
        self.require_verified_email = require;
        self
    }

    /// Set the key set TTL
    pub fn with_jwks_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_ttl = ttl;
        self
    }

    /// Base URL of the IdP service, without trailing slash
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://cognito-idp.{}.amazonaws.com", self.region),
        }
    }

    /// Expected `iss` claim
    ///
    /// Always the public regional URL, even when `endpoint` is overridden:
    /// Cognito stamps tokens with it regardless of how they are fetched.
    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    /// Where the pool publishes its signing keys
    pub fn jwks_url(&self) -> String {
        format!("{}/{}/.well-known/jwks.json", self.endpoint(), self.user_pool_id)
    }
}

/// Shopify store whose customer records are consulted
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyConfig {
    /// Store domain (e.g. `quitelikeau.myshopify.com`)
    pub shop_domain: String,

    /// Admin API version segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Admin API access token
    pub admin_access_token: String,

    /// Override for the store base URL; defaults to `https://{shop_domain}`
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_api_version() -> String {
    "2024-01".to_string()
}

impl ShopifyConfig {
    pub fn new(shop_domain: impl Into<String>, admin_access_token: impl Into<String>) -> Self {
        Self {
            shop_domain: shop_domain.into(),
            api_version: default_api_version(),
            admin_access_token: admin_access_token.into(),
            base_url: None,
        }
    }

    /// Set the Admin API version
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Point at a non-default base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Store base URL, without trailing slash
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}", self.shop_domain),
        }
    }
}
