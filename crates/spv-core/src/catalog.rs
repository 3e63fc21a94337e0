//! # Host Catalog Contract
//!
//! The two touchpoints a host catalog calls: adding the views option to the
//! sort dropdown, and swapping in the ranking when that option is selected.
//! Both are plain functions over values; the host decides when to call them.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{Period, SortOrder};
use crate::ranking::{RankingClauseBuilder, RankingContext, TieBreakLevel};
use crate::traits::CatalogRepo;

/// One entry of the sort dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    pub key: String,
    pub label: String,
}

/// Ordered `key -> label` mapping shown to shoppers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortOptions(Vec<SortOption>);

impl SortOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key`, or relabels it in place when already present.
    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) {
        let key = key.into();
        let label = label.into();
        match self.0.iter_mut().find(|option| option.key == key) {
            Some(existing) => existing.label = label,
            None => self.0.push(SortOption { key, label }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|option| option.key == key)
            .map(|option| option.label.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SortOption> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Read-only join against the view-tracking table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewJoin {
    /// Views recorded for the item itself
    Item,
    /// Views recorded for the item's parent
    Parent,
}

/// Everything a query executor needs to apply the views ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingPlan {
    pub period: Period,
    pub cutoff: NaiveDate,
    pub joins: [ViewJoin; 2],
    pub levels: Vec<TieBreakLevel>,
}

impl RankingPlan {
    pub fn new(context: &RankingContext) -> Self {
        Self {
            period: context.period.clone(),
            cutoff: context.recency_cutoff,
            joins: [ViewJoin::Item, ViewJoin::Parent],
            levels: RankingClauseBuilder::from_context(context).build(),
        }
    }
}

/// Catalog query ordering arguments as the host computes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingArgs {
    /// Host ordering field; empty once a ranking plan replaces it
    pub orderby: String,
    pub order: SortOrder,
    pub ranking: Option<RankingPlan>,
}

impl OrderingArgs {
    pub fn new(orderby: impl Into<String>, order: SortOrder) -> Self {
        Self {
            orderby: orderby.into(),
            order,
            ranking: None,
        }
    }
}

/// The views sort option and its ranking integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewsSort {
    sort_key: String,
    label: String,
    period: Period,
}

impl ViewsSort {
    pub const DEFAULT_KEY: &'static str = "views";

    pub fn new(sort_key: impl Into<String>, label: impl Into<String>, period: Period) -> Self {
        Self {
            sort_key: sort_key.into(),
            label: label.into(),
            period,
        }
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    /// Keeps the integration only when the view-tracking data source exists.
    /// Without it the host falls back to its own options; nothing is
    /// surfaced to the shopper.
    pub async fn activate(self, repo: &dyn CatalogRepo) -> Option<Self> {
        match repo.views_source_available().await {
            Ok(true) => {
                log::info!(
                    "views sort '{}' active (period '{}')",
                    self.sort_key,
                    self.period
                );
                Some(self)
            }
            Ok(false) => {
                log::warn!("view tracking table not found, views sort disabled");
                None
            }
            Err(e) => {
                log::warn!("view tracking check failed, views sort disabled: {e:#}");
                None
            }
        }
    }

    /// Contributes exactly one `(key, label)` entry to the host's options.
    pub fn register_sort_option(&self, mut options: SortOptions) -> SortOptions {
        options.insert(self.sort_key.clone(), self.label.clone());
        options
    }

    /// Replaces the host ordering with the views ranking when `orderby`
    /// selects this option; any other selection passes through untouched.
    pub fn ordering_args(&self, args: OrderingArgs, orderby: &str, raw_order: &str) -> OrderingArgs {
        self.ordering_args_at(args, orderby, raw_order, Local::now().naive_local())
    }

    /// [`Self::ordering_args`] with an explicit request time.
    pub fn ordering_args_at(
        &self,
        args: OrderingArgs,
        orderby: &str,
        raw_order: &str,
        now: NaiveDateTime,
    ) -> OrderingArgs {
        if orderby != self.sort_key {
            return args;
        }

        let order = SortOrder::from_raw(raw_order);
        let context = RankingContext::new(order, self.period.clone(), now);
        log::debug!(
            "ranking by views: order {order}, cutoff {}",
            context.recency_cutoff
        );

        OrderingArgs {
            orderby: String::new(),
            order,
            ranking: Some(RankingPlan::new(&context)),
        }
    }
}
