//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`, capture errors and transactions)
//! 2. CORS (only the configured storefront origin, with credentials)
//! 3. `TraceLayer` (request span with method, URI and request ID)
//! 4. Request ID (record `x-request-id` on the span and the response)
//! 5. Session layer (tower-sessions, in-memory store, binds the cart)

pub mod cors;
pub mod request_id;
pub mod session;

pub use cors::create_cors_layer;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
