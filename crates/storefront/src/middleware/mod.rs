//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. Request ID (correlation id in span, Sentry scope and response)
//! 3. `TraceLayer` (request tracing)
//! 4. CORS (the view layer may run on another origin)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
