//! # Core Traits (Ports)
//!
//! Any catalog plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::catalog::OrderingArgs;
use crate::models::{Item, Period, ViewCounts};

/// Read-only access to the host catalog and the view-tracking table.
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    /// Whether the view-tracking table exists. The views sort stays inert
    /// without it.
    async fn views_source_available(&self) -> anyhow::Result<bool>;

    /// Lists products ordered per `args`, applying its ranking plan if any.
    async fn list_products(&self, args: &OrderingArgs, limit: i64, offset: i64) -> anyhow::Result<Vec<Item>>;

    /// All recorded view counts for one period.
    async fn view_counts(&self, period: &Period) -> anyhow::Result<ViewCounts>;
}
