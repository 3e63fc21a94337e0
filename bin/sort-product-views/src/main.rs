//! # sort-product-views Binary
//!
//! Assembles the catalog API around the compiled-in catalog plugin and plugs
//! in the views sort when the view-tracking table is present.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use spv_api::handlers::AppState;
use spv_api::middleware::{cors_policy, standard_middleware};
use spv_config::Settings;

#[cfg(feature = "db-sqlite")]
use spv_db_sqlite::SqliteCatalogRepo;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("no catalog backend enabled; build with the `db-sqlite` feature");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().context("loading settings")?;

    // 1. Initialize Catalog Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteCatalogRepo::new(&settings.database_url).await?;

    // 2. Views sort, inert unless the view counter's table exists
    let views_sort = settings.views_sort().activate(&repo).await;

    let state = web::Data::new(AppState {
        repo: Box::new(repo),
        views_sort,
        page_size: settings.page_size,
    });

    log::info!(
        "catalog listening on http://{}:{}",
        settings.bind_host,
        settings.bind_port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(standard_middleware())
            .wrap(cors_policy())
            .app_data(state.clone())
            .configure(spv_api::configure_routes)
    })
    .bind((settings.bind_host.as_str(), settings.bind_port))?
    .run()
    .await?;

    Ok(())
}
