//! # spv-api
//!
//! A minimal host catalog over HTTP: the sort dropdown and the product
//! listing, with the views sort plugged in when it is active.

pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures the catalog routes.
///
/// The binary can mount these under a prefix (e.g. `/api/v1/`) via
/// `web::scope`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/sort-options", web::get().to(handlers::sort_options))
        .route("/products", web::get().to(handlers::list_products));
}
