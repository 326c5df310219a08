//! Authorization Handler
//!
//! The single endpoint the API gateway (KrakenD) calls before forwarding a
//! request. It reads the bearer token and the Shopify customer id from the
//! request headers and answers 200 or 401.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use identity_bridge::{strip_bearer_scheme, AuthorizationRequest, Decision, IdentityBridge};

use crate::api::error::ApiError;

/// Header carrying the caller's Shopify customer id
pub const CUSTOMER_ID_HEADER: &str = "x-shopify-customer-id";

/// Application state shared across handlers
pub struct AppState {
    /// The cross-match pipeline
    pub bridge: IdentityBridge,
    /// Deadline for one evaluation
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(bridge: IdentityBridge, request_timeout: Duration) -> Self {
        Self {
            bridge,
            request_timeout,
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: impl axum::http::header::AsHeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Extract the two pipeline inputs; anything unreadable counts as absent
pub fn extract_request(headers: &HeaderMap) -> AuthorizationRequest {
    AuthorizationRequest {
        token: header_str(headers, AUTHORIZATION)
            .and_then(strip_bearer_scheme)
            .map(String::from),
        reference: header_str(headers, CUSTOMER_ID_HEADER).map(String::from),
    }
}

/// Authorize a caller
///
/// GET /
///
/// - 200 `{}` when the token is valid and both systems hold the same email.
///   The body must be JSON even though it is empty; KrakenD parses it.
/// - 401 with no body for every denial.
/// - 500 when the gateway is misconfigured.
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let request = extract_request(&headers);

    let decision = state
        .bridge
        .authorize_within(request, state.request_timeout)
        .await
        .inspect_err(|err| error!(error = %err, "Authorization aborted by configuration error"))?;

    match decision {
        Decision::Authorized => Ok(Json(json!({}))),
        Decision::Unauthorized(reason) => {
            info!(reason = %reason, "Request unauthorized");
            Err(ApiError::Unauthorized(reason))
        }
    }
}
