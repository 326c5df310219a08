//! Resolver Tests
//!
//! Cognito `GetUser` and Shopify customer lookups against wiremock, covering
//! the happy path and every fail-closed branch.

use chrono::{Duration, Utc};
use identity_bridge::{
    BearerToken, CognitoConfig, CognitoIdentityResolver, ExternalRecordReference, ExternalRecordResolver,
    IdentityResolver, IdentitySource, ResolutionError, ShopifyConfig, ShopifyCustomerResolver,
    ValidatedPrincipal,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACCESS_TOKEN: &str = "eyJraWQiOiJrMSJ9.eyJzdWIiOiJhIn0.c2ln";

fn principal() -> ValidatedPrincipal {
    ValidatedPrincipal::new(
        "8f1c2d3e",
        "test-app-client",
        Utc::now() + Duration::hours(1),
        BearerToken::new(ACCESS_TOKEN).unwrap(),
    )
}

fn cognito_for(server: &MockServer) -> CognitoIdentityResolver {
    CognitoIdentityResolver::new(
        &CognitoConfig::new("eu-west-2", "eu-west-2_TestPool", "test-app-client").with_endpoint(server.uri()),
    )
}

fn shopify_for(server: &MockServer) -> ShopifyCustomerResolver {
    ShopifyCustomerResolver::new(
        &ShopifyConfig::new("quitelikeau.myshopify.com", "shpat_test_token").with_base_url(server.uri()),
    )
    .unwrap()
}

fn user_attributes(email: Option<&str>, verified: &str) -> serde_json::Value {
    let mut attributes = vec![
        json!({ "Name": "sub", "Value": "8f1c2d3e" }),
        json!({ "Name": "email_verified", "Value": verified }),
    ];
    if let Some(email) = email {
        attributes.push(json!({ "Name": "email", "Value": email }));
    }
    json!({ "Username": "alice", "UserAttributes": attributes })
}

async fn mount_get_user(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("X-Amz-Target", "AWSCognitoIdentityProviderService.GetUser"))
        .and(header("Content-Type", "application/x-amz-json-1.1"))
        .and(body_json(json!({ "AccessToken": ACCESS_TOKEN })))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_customer(server: &MockServer, id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/admin/api/2024-01/customers/{}.json", id)))
        .and(header("X-Shopify-Access-Token", "shpat_test_token"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn reference(id: &str) -> ExternalRecordReference {
    ExternalRecordReference::new(id).unwrap()
}

// =============================================================================
// Cognito GetUser
// =============================================================================

#[tokio::test]
async fn test_cognito_resolves_live_email() {
    let server = MockServer::start().await;
    mount_get_user(
        &server,
        ResponseTemplate::new(200).set_body_json(user_attributes(Some("User@Example.com"), "true")),
    )
    .await;

    let email = cognito_for(&server).resolve_email(&principal()).await.unwrap();
    assert_eq!(email.as_str(), "user@example.com");
}

#[tokio::test]
async fn test_cognito_missing_email() {
    let server = MockServer::start().await;
    mount_get_user(&server, ResponseTemplate::new(200).set_body_json(user_attributes(None, "true"))).await;

    let result = cognito_for(&server).resolve_email(&principal()).await;
    assert!(matches!(
        result,
        Err(ResolutionError::MissingEmail { system: IdentitySource::Provider })
    ));
}

#[tokio::test]
async fn test_cognito_unverified_email() {
    let server = MockServer::start().await;
    mount_get_user(
        &server,
        ResponseTemplate::new(200).set_body_json(user_attributes(Some("user@example.com"), "false")),
    )
    .await;

    let result = cognito_for(&server).resolve_email(&principal()).await;
    assert!(matches!(result, Err(ResolutionError::UnverifiedEmail { .. })));
}

#[tokio::test]
async fn test_cognito_unverified_email_allowed_when_disabled() {
    let server = MockServer::start().await;
    mount_get_user(
        &server,
        ResponseTemplate::new(200).set_body_json(user_attributes(Some("user@example.com"), "false")),
    )
    .await;

    let resolver = CognitoIdentityResolver::new(
        &CognitoConfig::new("eu-west-2", "eu-west-2_TestPool", "test-app-client")
            .with_endpoint(server.uri())
            .with_require_verified_email(false),
    );
    assert!(resolver.resolve_email(&principal()).await.is_ok());
}

#[tokio::test]
async fn test_cognito_revoked_token() {
    let server = MockServer::start().await;
    mount_get_user(
        &server,
        ResponseTemplate::new(400).set_body_json(json!({
            "__type": "NotAuthorizedException",
            "message": "Access Token has been revoked"
        })),
    )
    .await;

    let err = cognito_for(&server).resolve_email(&principal()).await.unwrap_err();
    assert!(matches!(err, ResolutionError::Rejected { .. }));
    assert!(!err.is_operational());
}

#[tokio::test]
async fn test_cognito_outage() {
    let server = MockServer::start().await;
    mount_get_user(&server, ResponseTemplate::new(500)).await;

    let result = cognito_for(&server).resolve_email(&principal()).await;
    assert!(matches!(result, Err(ResolutionError::Unavailable { .. })));
}

#[tokio::test]
async fn test_cognito_garbage_body() {
    let server = MockServer::start().await;
    mount_get_user(&server, ResponseTemplate::new(200).set_body_string("<html>")).await;

    let result = cognito_for(&server).resolve_email(&principal()).await;
    assert!(matches!(result, Err(ResolutionError::InvalidResponse { .. })));
}

// =============================================================================
// Shopify customer lookup
// =============================================================================

#[tokio::test]
async fn test_shopify_resolves_customer_email() {
    let server = MockServer::start().await;
    mount_customer(
        &server,
        "207119551",
        ResponseTemplate::new(200).set_body_json(json!({
            "customer": { "id": 207119551, "email": "user@example.com", "verified_email": true }
        })),
    )
    .await;

    let email = shopify_for(&server).resolve_email(&reference("207119551")).await.unwrap();
    assert_eq!(email.as_str(), "user@example.com");
}

#[tokio::test]
async fn test_shopify_customer_without_email() {
    let server = MockServer::start().await;
    mount_customer(
        &server,
        "207119551",
        ResponseTemplate::new(200).set_body_json(json!({ "customer": { "id": 207119551, "email": null } })),
    )
    .await;

    let result = shopify_for(&server).resolve_email(&reference("207119551")).await;
    assert!(matches!(
        result,
        Err(ResolutionError::MissingEmail { system: IdentitySource::Commerce })
    ));
}

#[tokio::test]
async fn test_shopify_unknown_customer() {
    let server = MockServer::start().await;
    mount_customer(
        &server,
        "1",
        ResponseTemplate::new(404).set_body_json(json!({ "errors": "Not Found" })),
    )
    .await;

    let result = shopify_for(&server).resolve_email(&reference("1")).await;
    assert!(matches!(result, Err(ResolutionError::NotFound { .. })));
}

#[tokio::test]
async fn test_shopify_refused_admin_token_is_operational() {
    let server = MockServer::start().await;
    mount_customer(&server, "1", ResponseTemplate::new(401)).await;

    let err = shopify_for(&server).resolve_email(&reference("1")).await.unwrap_err();
    assert!(err.is_operational());
}

#[tokio::test]
async fn test_shopify_throttled() {
    let server = MockServer::start().await;
    mount_customer(&server, "1", ResponseTemplate::new(429)).await;

    let result = shopify_for(&server).resolve_email(&reference("1")).await;
    assert!(matches!(result, Err(ResolutionError::Unavailable { .. })));
}

#[tokio::test]
async fn test_shopify_unreachable() {
    // Nothing listens on port 1
    let resolver = ShopifyCustomerResolver::new(
        &ShopifyConfig::new("quitelikeau.myshopify.com", "t").with_base_url("http://127.0.0.1:1"),
    )
    .unwrap();

    let result = resolver.resolve_email(&reference("1")).await;
    assert!(matches!(result, Err(ResolutionError::Unavailable { .. })));
}
