//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, start transactions)
//! 2. `TraceLayer` (`http_request` span with status and latency)
//! 3. Request ID (recorded on the span and echoed in responses)
//!
//! Identity is resolved per handler by the [`auth::Caller`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::Caller;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
