//! Identity Gateway
//!
//! HTTP front for the identity bridge, deployed as the authentication backend
//! of a KrakenD API gateway. KrakenD forwards each request's headers here and
//! only passes the request on when this service answers 200.
//!
//! ## API Endpoints
//!
//! - `GET /` - Authorize: `Authorization: Bearer <cognito access token>` plus
//!   `X-Shopify-Customer-Id`; 200 `{}` or 401
//! - `GET /health` - Liveness check

pub mod api;
pub mod config;

pub use api::create_router;
pub use api::handlers::{AppState, CUSTOMER_ID_HEADER};
pub use config::GatewayConfig;
