//! API request handlers

pub mod authorize;

pub use authorize::{authorize, extract_request, AppState, CUSTOMER_ID_HEADER};
