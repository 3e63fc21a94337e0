//! Seeds a demo catalog: a handful of products and variants, plus the view
//! counter's table with all-time totals.

use anyhow::Context;
use chrono::{Duration, Local, NaiveDateTime};
use spv_config::Settings;
use spv_db_sqlite::{SqliteCatalogRepo, POST_VIEWS_SCHEMA};

/// View counter `type` for the all-time aggregate.
const TOTAL_PERIOD_TYPE: i64 = 4;

struct DemoProduct {
    id: i64,
    parent_id: i64,
    title: &'static str,
    age_days: i64,
    views: Option<i64>,
}

const PRODUCTS: &[DemoProduct] = &[
    DemoProduct { id: 1, parent_id: 0, title: "Canvas tote", age_days: 400, views: Some(1_250) },
    DemoProduct { id: 2, parent_id: 1, title: "Canvas tote - navy", age_days: 380, views: None },
    DemoProduct { id: 3, parent_id: 0, title: "Linen shirt", age_days: 90, views: Some(310) },
    DemoProduct { id: 4, parent_id: 0, title: "Wool beanie", age_days: 12, views: Some(45) },
    DemoProduct { id: 5, parent_id: 0, title: "Rain jacket", age_days: 3, views: None },
    DemoProduct { id: 6, parent_id: 3, title: "Linen shirt - sand", age_days: 8, views: Some(7) },
    DemoProduct { id: 7, parent_id: 0, title: "Leather belt", age_days: 200, views: Some(310) },
];

fn published_at(age_days: i64) -> NaiveDateTime {
    Local::now().naive_local() - Duration::days(age_days)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().context("loading settings")?;
    let repo = SqliteCatalogRepo::new(&settings.database_url).await?;
    let pool = repo.pool();

    sqlx::query(POST_VIEWS_SCHEMA).execute(pool).await?;

    let mut tx = pool.begin().await?;
    for product in PRODUCTS {
        sqlx::query("INSERT OR REPLACE INTO products (id, parent_id, title, published_at) VALUES (?, ?, ?, ?)")
            .bind(product.id)
            .bind(product.parent_id)
            .bind(product.title)
            .bind(published_at(product.age_days))
            .execute(&mut *tx)
            .await?;

        if let Some(count) = product.views {
            sqlx::query("INSERT OR REPLACE INTO post_views (id, type, period, count) VALUES (?, ?, 'total', ?)")
                .bind(product.id)
                .bind(TOTAL_PERIOD_TYPE)
                .bind(count)
                .execute(&mut *tx)
                .await?;
        }
    }
    tx.commit().await?;

    log::info!(
        "seeded {} products into {}",
        PRODUCTS.len(),
        settings.database_url
    );
    Ok(())
}
