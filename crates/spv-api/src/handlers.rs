//! # spv-api Handlers
//!
//! Coordinates the flow between HTTP requests, the host's own sort options
//! and the views sort.

use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use spv_core::catalog::{OrderingArgs, SortOptions, ViewsSort};
use spv_core::error::{AppError, Result};
use spv_core::models::SortOrder;
use spv_core::traits::CatalogRepo;

/// Host ordering used when nothing (or an unknown key) is selected.
pub const DEFAULT_ORDERBY: &str = "menu_order";

/// State shared across all Actix-web workers.
pub struct AppState {
    pub repo: Box<dyn CatalogRepo>,
    /// `None` when the view-tracking table is missing
    pub views_sort: Option<ViewsSort>,
    pub page_size: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub orderby: Option<String>,
    pub order: Option<String>,
    pub page: Option<i64>,
}

/// The host catalog's built-in dropdown entries.
pub fn host_sort_options() -> SortOptions {
    let mut options = SortOptions::new();
    options.insert(DEFAULT_ORDERBY, "Default sorting");
    options.insert("date", "Sort by latest");
    options.insert("title", "Sort by name");
    options
}

/// Ordering the host applies on its own: newest first for `date`,
/// ascending otherwise, unless `raw_order` names a direction.
pub fn host_ordering_args(orderby: &str, raw_order: &str) -> OrderingArgs {
    let orderby = if host_sort_options().contains(orderby) {
        orderby
    } else {
        DEFAULT_ORDERBY
    };
    let order = match raw_order {
        "ASC" => SortOrder::Asc,
        "DESC" => SortOrder::Desc,
        _ if orderby == "date" => SortOrder::Desc,
        _ => SortOrder::Asc,
    };
    OrderingArgs::new(orderby, order)
}

/// Offset of a 1-based `page`.
pub fn page_offset(page: Option<i64>, page_size: i64) -> Result<i64> {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(AppError::ValidationError(format!(
            "page must be 1 or greater, got {page}"
        )));
    }
    (page - 1)
        .checked_mul(page_size)
        .ok_or_else(|| AppError::ValidationError(format!("page {page} is out of range")))
}

fn error_response(err: AppError) -> HttpResponse {
    let body = json!({ "error": err.to_string() });
    match err {
        AppError::ValidationError(_) => HttpResponse::BadRequest().json(body),
        AppError::Internal(_) => HttpResponse::InternalServerError().json(body),
    }
}

/// Lists the dropdown entries, with the views option when active.
pub async fn sort_options(data: web::Data<AppState>) -> impl Responder {
    let options = host_sort_options();
    let options = match &data.views_sort {
        Some(views) => views.register_sort_option(options),
        None => options,
    };
    HttpResponse::Ok().json(options)
}

/// Lists one page of products in the selected order.
pub async fn list_products(
    data: web::Data<AppState>,
    query: web::Query<CatalogQuery>,
) -> impl Responder {
    let query = query.into_inner();

    let offset = match page_offset(query.page, data.page_size) {
        Ok(offset) => offset,
        Err(e) => return error_response(e),
    };

    let orderby = query.orderby.unwrap_or_else(|| DEFAULT_ORDERBY.to_string());
    let raw_order = query.order.unwrap_or_default().trim().to_uppercase();

    let mut args = host_ordering_args(&orderby, &raw_order);
    if let Some(views) = &data.views_sort {
        args = views.ordering_args(args, &orderby, &raw_order);
    }

    match data.repo.list_products(&args, data.page_size, offset).await {
        Ok(items) => HttpResponse::Ok().json(items),
        Err(e) => {
            log::error!("catalog listing failed: {e:#}");
            error_response(AppError::Internal("catalog listing failed".into()))
        }
    }
}
