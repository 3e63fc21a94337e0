//! Middleware for logging and cross-origin access.

use actix_cors::Cors;
use actix_web::middleware::Logger;

/// Request logging for every route.
///
/// Uses the default format, one line per request:
/// `remote-ip "request-line" status-code response-size "referrer" "user-agent"`
pub fn standard_middleware() -> Logger {
    Logger::default()
}

/// CORS policy for storefront pages that embed the catalog from their own
/// origin. Only `GET` is allowed since the API is read-only.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET"])
        .max_age(3600)
}
