//! Cognito user-info lookup via the `GetUser` action

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::CognitoConfig;
use crate::error::ResolutionError;
use crate::resolvers::IdentityResolver;
use crate::types::{IdentityAttribute, IdentitySource, ValidatedPrincipal};

const GET_USER_TARGET: &str = "AWSCognitoIdentityProviderService.GetUser";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

const SOURCE: IdentitySource = IdentitySource::Provider;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    #[serde(default)]
    user_attributes: Vec<AttributeType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType {
    name: String,
    value: Option<String>,
}

impl GetUserResponse {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.user_attributes
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_deref())
    }
}

/// AWS JSON protocol error body
#[derive(Debug, Default, Deserialize)]
struct AwsErrorBody {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

impl AwsErrorBody {
    /// `__type` may be namespaced (`com.amazon...#Name`)
    fn short_type(&self) -> &str {
        self.error_type.rsplit('#').next().unwrap_or_default()
    }
}

/// Resolves the email Cognito holds for the owner of an access token
///
/// `GetUser` is authorized by the access token itself, so no AWS signing
/// credentials are involved.
pub struct CognitoIdentityResolver {
    endpoint: String,
    require_verified_email: bool,
    http_client: reqwest::Client,
}

impl CognitoIdentityResolver {
    pub fn new(config: &CognitoConfig) -> Self {
        Self {
            endpoint: format!("{}/", config.endpoint()),
            require_verified_email: config.require_verified_email,
            http_client: reqwest::Client::new(),
        }
    }

    /// Use a shared HTTP client (timeouts, connection pool)
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    fn classify_failure(status: reqwest::StatusCode, body: AwsErrorBody) -> ResolutionError {
        let error_type = body.short_type();
        let message = if body.message.is_empty() {
            format!("{} {}", status, error_type)
        } else {
            format!("{}: {}", error_type, body.message)
        };

        match error_type {
            "TooManyRequestsException" | "InternalErrorException" | "LimitExceededException" => {
                ResolutionError::Unavailable { system: SOURCE, message }
            }
            _ if status.is_server_error() => ResolutionError::Unavailable { system: SOURCE, message },
            _ => ResolutionError::Rejected { system: SOURCE, message },
        }
    }
}

#[async_trait]
impl IdentityResolver for CognitoIdentityResolver {
    fn description(&self) -> &str {
        "Cognito GetUser resolver"
    }

    async fn resolve_email(&self, principal: &ValidatedPrincipal) -> Result<IdentityAttribute, ResolutionError> {
        debug!(subject = %principal.subject, "Resolving provider email");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("X-Amz-Target", GET_USER_TARGET)
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON)
            .json(&serde_json::json!({ "AccessToken": principal.access_token.as_str() }))
            .send()
            .await
            .map_err(|e| ResolutionError::unavailable(SOURCE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<AwsErrorBody>().await.unwrap_or_default();
            return Err(Self::classify_failure(status, body));
        }

        let user: GetUserResponse = response
            .json()
            .await
            .map_err(|e| ResolutionError::invalid_response(SOURCE, e))?;

        let email = user
            .attribute("email")
            .and_then(IdentityAttribute::parse)
            .ok_or(ResolutionError::MissingEmail { system: SOURCE })?;

        if self.require_verified_email && user.attribute("email_verified") != Some("true") {
            return Err(ResolutionError::UnverifiedEmail { system: SOURCE });
        }

        Ok(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup() {
        let user: GetUserResponse = serde_json::from_value(serde_json::json!({
            "Username": "alice",
            "UserAttributes": [
                { "Name": "sub", "Value": "1111" },
                { "Name": "email", "Value": "Alice@Example.com" },
                { "Name": "email_verified", "Value": "true" }
            ]
        }))
        .unwrap();

        assert_eq!(user.attribute("email"), Some("Alice@Example.com"));
        assert_eq!(user.attribute("phone_number"), None);
    }

    #[test]
    fn test_error_classification() {
        let revoked = AwsErrorBody {
            error_type: "NotAuthorizedException".into(),
            message: "Access Token has been revoked".into(),
        };
        assert!(matches!(
            CognitoIdentityResolver::classify_failure(reqwest::StatusCode::BAD_REQUEST, revoked),
            ResolutionError::Rejected { .. }
        ));

        let throttled = AwsErrorBody {
            error_type: "com.amazonaws.cognito#TooManyRequestsException".into(),
            message: String::new(),
        };
        assert!(matches!(
            CognitoIdentityResolver::classify_failure(reqwest::StatusCode::BAD_REQUEST, throttled),
            ResolutionError::Unavailable { .. }
        ));

        assert!(matches!(
            CognitoIdentityResolver::classify_failure(reqwest::StatusCode::BAD_GATEWAY, AwsErrorBody::default()),
            ResolutionError::Unavailable { .. }
        ));
    }
}
