//! # spv-db-sqlite Implementation
//!
//! SQLite query executor for the host catalog. Maps the `products` table to
//! `spv-core` items and applies the views ranking plan as a left-joined,
//! cascading `ORDER BY` against the view counter's `post_views` table.

mod order;

use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use spv_core::catalog::OrderingArgs;
use spv_core::models::{Item, Period, ViewCounts};
use spv_core::traits::CatalogRepo;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use order::VIEWS_TABLE;

/// Schema the view counter keeps its aggregates in. The catalog never writes
/// to it; seeding and tests create it.
pub const POST_VIEWS_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS post_views (
    id     INTEGER NOT NULL,
    type   INTEGER NOT NULL,
    period TEXT    NOT NULL,
    count  INTEGER NOT NULL,
    PRIMARY KEY (type, period, id)
)";

pub struct SqliteCatalogRepo {
    pool: SqlitePool,
}

impl SqliteCatalogRepo {
    /// Opens (creating if missing) the catalog database and applies the
    /// catalog migrations.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url {url}"))?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own database.
        let in_memory = url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("opening catalog database {url}"))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("running catalog migrations")?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_item(row: &SqliteRow) -> Item {
    let parent_id: i64 = row.get("parent_id");
    Item {
        id: row.get("id"),
        parent_id: (parent_id != 0).then_some(parent_id),
        title: row.get("title"),
        published_at: row.get("published_at"),
    }
}

#[async_trait]
impl CatalogRepo for SqliteCatalogRepo {
    async fn views_source_available(&self) -> anyhow::Result<bool> {
        let tables: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(VIEWS_TABLE)
                .fetch_one(&self.pool)
                .await?;
        Ok(tables > 0)
    }

    /// Runs the catalog listing. With a ranking plan attached the rows are
    /// ordered by its tie-break levels, otherwise by the host column.
    async fn list_products(&self, args: &OrderingArgs, limit: i64, offset: i64) -> anyhow::Result<Vec<Item>> {
        let mut qb = order::listing_query(args, limit, offset);
        log::debug!("catalog listing: {}", qb.sql());

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_item).collect())
    }

    async fn view_counts(&self, period: &Period) -> anyhow::Result<ViewCounts> {
        let rows = sqlx::query("SELECT id, count FROM post_views WHERE type = ? AND period = ?")
            .bind(period.kind().type_code())
            .bind(period.as_str())
            .fetch_all(&self.pool)
            .await?;

        let mut counts = ViewCounts::new();
        for row in rows {
            counts.insert(row.get("id"), period.clone(), row.get("count"));
        }
        Ok(counts)
    }
}
