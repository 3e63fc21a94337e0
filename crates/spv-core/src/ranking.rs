//! # Views Ranking
//!
//! Freshness-boosted popularity expressed as a cascade of tie-break levels.
//! Each level only yields a key for the items matching its condition; items
//! it does not match get no key and sort after every item that has one, in
//! both directions. A query engine applying the levels left to right as a
//! multi-key sort therefore branches between "recent" and "old" items
//! without any scoring math.
//!
//! The same levels are rendered to SQL by the catalog plugins and evaluated
//! in memory by [`compare`] / [`rank`].

use std::cmp::Ordering;

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::{Item, Period, SortOrder, ViewCounts};

/// Items published within this window before "now" count as recent.
pub const RECENCY_WINDOW: Months = Months::new(1);

/// Configuration a single ranking request runs under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingContext {
    pub order: SortOrder,
    pub period: Period,
    /// Recomputed per request, never persisted
    pub recency_cutoff: NaiveDate,
}

impl RankingContext {
    /// Builds the context for a request made at `now`; the cutoff is the
    /// calendar date one month earlier.
    pub fn new(order: SortOrder, period: Period, now: NaiveDateTime) -> Self {
        let today = now.date();
        let recency_cutoff = today.checked_sub_months(RECENCY_WINDOW).unwrap_or(today);
        Self {
            order,
            period,
            recency_cutoff,
        }
    }

    /// First instant counted as recent.
    pub fn cutoff_start(&self) -> NaiveDateTime {
        cutoff_start(self.recency_cutoff)
    }
}

fn cutoff_start(cutoff: NaiveDate) -> NaiveDateTime {
    cutoff.and_time(NaiveTime::MIN)
}

/// Which items a level yields a key for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelCondition {
    /// `published_at >= cutoff`
    Recent,
    /// `published_at < cutoff`
    Old,
    /// parent view count known and `published_at >= cutoff`
    ParentViewsKnownRecent,
    /// parent view count known and `published_at < cutoff`
    ParentViewsKnownOld,
}

/// The value a level sorts by once its condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    PublishedAt,
    ParentViews,
    OwnViews,
}

/// One comparison key of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieBreakLevel {
    pub condition: LevelCondition,
    pub key: KeySource,
    pub order: SortOrder,
}

/// Value produced by a level for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Date(NaiveDateTime),
    Count(i64),
}

/// Per-item inputs the levels look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSignals {
    pub published_at: NaiveDateTime,
    pub own_views: Option<i64>,
    /// `None` both for items without a parent and for parents without views
    pub parent_views: Option<i64>,
}

impl ItemSignals {
    /// Resolves an item's own and parent view counts for `period`.
    pub fn lookup(item: &Item, views: &ViewCounts, period: &Period) -> Self {
        Self {
            published_at: item.published_at,
            own_views: views.get(item.id, period),
            parent_views: item.parent_id.and_then(|parent| views.get(parent, period)),
        }
    }
}

impl TieBreakLevel {
    /// The key this level contributes for `item`, or `None` when the item
    /// does not match (or the keyed value is unknown).
    pub fn evaluate(&self, item: &ItemSignals, cutoff: NaiveDateTime) -> Option<SortKey> {
        let recent = item.published_at >= cutoff;
        let matches = match self.condition {
            LevelCondition::Recent => recent,
            LevelCondition::Old => !recent,
            LevelCondition::ParentViewsKnownRecent => item.parent_views.is_some() && recent,
            LevelCondition::ParentViewsKnownOld => item.parent_views.is_some() && !recent,
        };
        if !matches {
            return None;
        }

        match self.key {
            KeySource::PublishedAt => Some(SortKey::Date(item.published_at)),
            KeySource::ParentViews => item.parent_views.map(SortKey::Count),
            KeySource::OwnViews => item.own_views.map(SortKey::Count),
        }
    }

    /// Compares two items on this level alone. Missing keys go last
    /// regardless of direction.
    pub fn compare(&self, a: &ItemSignals, b: &ItemSignals, cutoff: NaiveDateTime) -> Ordering {
        match (self.evaluate(a, cutoff), self.evaluate(b, cutoff)) {
            (Some(a), Some(b)) => match self.order {
                SortOrder::Asc => a.cmp(&b),
                SortOrder::Desc => b.cmp(&a),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Produces the six tie-break levels for one order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingClauseBuilder {
    order: SortOrder,
}

impl RankingClauseBuilder {
    pub fn new(order: SortOrder) -> Self {
        Self { order }
    }

    pub fn from_context(context: &RankingContext) -> Self {
        Self::new(context.order)
    }

    /// Levels in application order: the first is the primary key.
    pub fn build(&self) -> Vec<TieBreakLevel> {
        use KeySource::*;
        use LevelCondition::*;

        [
            (Recent, PublishedAt),
            (ParentViewsKnownRecent, ParentViews),
            (ParentViewsKnownOld, ParentViews),
            (Recent, OwnViews),
            (Old, OwnViews),
            (Old, PublishedAt),
        ]
        .into_iter()
        .map(|(condition, key)| TieBreakLevel {
            condition,
            key,
            order: self.order,
        })
        .collect()
    }
}

/// Applies `levels` left to right; later levels only break exact ties.
pub fn compare(
    levels: &[TieBreakLevel],
    cutoff: NaiveDate,
    a: &ItemSignals,
    b: &ItemSignals,
) -> Ordering {
    let cutoff = cutoff_start(cutoff);
    levels
        .iter()
        .map(|level| level.compare(a, b, cutoff))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Stable sort of `items` by the cascade. Items tied on every level keep
/// their input order.
pub fn rank<T, F>(items: &mut [T], levels: &[TieBreakLevel], cutoff: NaiveDate, signals: F)
where
    F: Fn(&T) -> ItemSignals,
{
    items.sort_by(|a, b| compare(levels, cutoff, &signals(a), &signals(b)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ViewCount;

    fn date(s: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    fn cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    fn item(id: i64, parent_id: Option<i64>, published: &str) -> Item {
        Item {
            id,
            parent_id,
            title: format!("Product {id}"),
            published_at: date(published),
        }
    }

    fn views(rows: &[(i64, i64)]) -> ViewCounts {
        rows.iter()
            .map(|&(item_id, count)| ViewCount {
                item_id,
                period: Period::total(),
                count,
            })
            .collect()
    }

    fn ranked_ids(mut items: Vec<Item>, counts: &ViewCounts, order: SortOrder) -> Vec<i64> {
        let levels = RankingClauseBuilder::new(order).build();
        let period = Period::total();
        rank(&mut items, &levels, cutoff(), |i| {
            ItemSignals::lookup(i, counts, &period)
        });
        items.into_iter().map(|i| i.id).collect()
    }

    #[test]
    fn cutoff_is_one_calendar_month_back() {
        let now = date("2024-03-31") + chrono::Duration::hours(15);
        let ctx = RankingContext::new(SortOrder::Desc, Period::total(), now);
        assert_eq!(ctx.recency_cutoff, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(ctx.cutoff_start(), date("2024-02-29"));
    }

    #[test]
    fn levels_are_emitted_in_cascade_order() {
        let levels = RankingClauseBuilder::new(SortOrder::Asc).build();
        let shape: Vec<_> = levels.iter().map(|l| (l.condition, l.key)).collect();
        assert_eq!(
            shape,
            vec![
                (LevelCondition::Recent, KeySource::PublishedAt),
                (LevelCondition::ParentViewsKnownRecent, KeySource::ParentViews),
                (LevelCondition::ParentViewsKnownOld, KeySource::ParentViews),
                (LevelCondition::Recent, KeySource::OwnViews),
                (LevelCondition::Old, KeySource::OwnViews),
                (LevelCondition::Old, KeySource::PublishedAt),
            ]
        );
        assert!(levels.iter().all(|l| l.order == SortOrder::Asc));
    }

    #[test]
    fn building_twice_yields_identical_levels() {
        let builder = RankingClauseBuilder::new(SortOrder::Desc);
        assert_eq!(builder.build(), builder.build());
    }

    #[test]
    fn recent_item_outranks_popular_old_item() {
        // cutoff 2024-02-01: item 1 is old with 50 views, item 2 new with 10
        let items = vec![item(1, None, "2024-01-01"), item(2, None, "2024-02-15")];
        let counts = views(&[(1, 50), (2, 10)]);

        assert_eq!(ranked_ids(items, &counts, SortOrder::Desc), vec![2, 1]);
    }

    #[test]
    fn recent_dominates_even_when_ascending() {
        // level 1 has no key for the old item, so it sorts last either way
        let items = vec![item(1, None, "2024-01-01"), item(2, None, "2024-02-15")];
        let counts = views(&[(1, 50), (2, 10)]);

        assert_eq!(ranked_ids(items, &counts, SortOrder::Asc), vec![2, 1]);
    }

    #[test]
    fn old_items_rank_by_own_views() {
        let items = vec![item(2, None, "2024-01-05"), item(1, None, "2024-01-01")];
        let counts = views(&[(1, 50), (2, 10)]);

        assert_eq!(ranked_ids(items.clone(), &counts, SortOrder::Desc), vec![1, 2]);
        assert_eq!(ranked_ids(items, &counts, SortOrder::Asc), vec![2, 1]);
    }

    #[test]
    fn equal_recent_dates_fall_through_to_views() {
        let items = vec![item(1, None, "2024-02-10"), item(2, None, "2024-02-10")];
        let counts = views(&[(1, 3), (2, 30)]);

        assert_eq!(ranked_ids(items, &counts, SortOrder::Desc), vec![2, 1]);
    }

    #[test]
    fn unknown_views_sort_after_known_in_both_directions() {
        let items = vec![
            item(1, None, "2024-01-10"),
            item(2, None, "2024-01-10"),
            item(3, None, "2024-01-10"),
        ];
        let counts = views(&[(2, 5), (3, 9)]);

        assert_eq!(ranked_ids(items.clone(), &counts, SortOrder::Desc), vec![3, 2, 1]);
        assert_eq!(ranked_ids(items, &counts, SortOrder::Asc), vec![2, 3, 1]);
    }

    #[test]
    fn old_variant_uses_parent_views() {
        // item 11 has no views of its own; its parent has 100
        let items = vec![
            item(20, None, "2024-01-03"),
            item(11, Some(10), "2024-01-02"),
        ];
        let counts = views(&[(10, 100), (20, 40)]);

        assert_eq!(ranked_ids(items, &counts, SortOrder::Desc), vec![11, 20]);
    }

    #[test]
    fn parent_views_are_keyed_on_level_three_not_own_views() {
        let level = RankingClauseBuilder::new(SortOrder::Desc).build()[2];
        let variant = ItemSignals {
            published_at: date("2024-01-02"),
            own_views: None,
            parent_views: Some(100),
        };
        assert_eq!(
            level.evaluate(&variant, date("2024-02-01")),
            Some(SortKey::Count(100))
        );
    }

    #[test]
    fn without_any_views_old_items_order_by_date() {
        let items = vec![
            item(1, None, "2023-11-01"),
            item(2, None, "2023-12-01"),
            item(3, None, "2024-02-20"),
        ];
        let counts = ViewCounts::new();

        assert_eq!(ranked_ids(items.clone(), &counts, SortOrder::Desc), vec![3, 2, 1]);
        assert_eq!(ranked_ids(items, &counts, SortOrder::Asc), vec![3, 1, 2]);
    }

    #[test]
    fn item_on_cutoff_day_counts_as_recent() {
        let level = RankingClauseBuilder::new(SortOrder::Desc).build()[0];
        let on_cutoff = ItemSignals {
            published_at: date("2024-02-01"),
            own_views: None,
            parent_views: None,
        };
        assert!(level.evaluate(&on_cutoff, date("2024-02-01")).is_some());
    }

    #[test]
    fn ties_on_every_level_keep_input_order() {
        let items = vec![item(7, None, "2024-01-10"), item(3, None, "2024-01-10")];
        let counts = views(&[(7, 4), (3, 4)]);

        assert_eq!(ranked_ids(items, &counts, SortOrder::Desc), vec![7, 3]);
    }
}
