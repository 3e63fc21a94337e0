//! SQL rendering of catalog ordering.
//!
//! Table and column names are fixed identifiers; the period and the cutoff
//! date are always bound parameters.

use spv_core::catalog::{OrderingArgs, RankingPlan, ViewJoin};
use spv_core::ranking::{KeySource, LevelCondition, TieBreakLevel};
use sqlx::{QueryBuilder, Sqlite};

const PRODUCTS_TABLE: &str = "products";
pub const VIEWS_TABLE: &str = "post_views";

const PRODUCT_COLUMNS: &str = "p.id, p.parent_id, p.title, p.published_at";

fn join_alias(join: ViewJoin) -> &'static str {
    match join {
        ViewJoin::Item => "pv",
        ViewJoin::Parent => "ppv",
    }
}

fn join_column(join: ViewJoin) -> &'static str {
    match join {
        ViewJoin::Item => "p.id",
        ViewJoin::Parent => "p.parent_id",
    }
}

/// Host orderings for the built-in sort options; unknown keys use the
/// catalog's default order.
fn host_column(orderby: &str) -> &'static str {
    match orderby {
        "date" => "p.published_at",
        "title" => "p.title",
        _ => "p.id",
    }
}

/// `SELECT ... FROM products p [joins] ORDER BY ... LIMIT ? OFFSET ?`
pub fn listing_query(args: &OrderingArgs, limit: i64, offset: i64) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM {PRODUCTS_TABLE} p"));

    match &args.ranking {
        Some(plan) => {
            push_joins(&mut qb, plan);
            qb.push(" ORDER BY ");
            push_levels(&mut qb, plan);
        }
        None => {
            qb.push(" ORDER BY ");
            qb.push(host_column(&args.orderby));
            qb.push(" ");
            qb.push(args.order.as_str());
        }
    }

    // SQLite sorts are not stable; the primary key makes ties deterministic.
    qb.push(", p.id ASC LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);
    qb
}

fn push_joins(qb: &mut QueryBuilder<'static, Sqlite>, plan: &RankingPlan) {
    for join in plan.joins {
        let alias = join_alias(join);
        qb.push(format!(
            " LEFT JOIN {VIEWS_TABLE} {alias} ON {} = {alias}.id AND {alias}.type = ",
            join_column(join)
        ));
        qb.push_bind(plan.period.kind().type_code());
        qb.push(format!(" AND {alias}.period = "));
        qb.push_bind(plan.period.as_str().to_string());
    }
}

fn push_levels(qb: &mut QueryBuilder<'static, Sqlite>, plan: &RankingPlan) {
    let cutoff = plan.cutoff.format("%Y-%m-%d").to_string();
    let mut levels = qb.separated(", ");
    for level in &plan.levels {
        levels.push(level_prefix(level));
        levels.push_bind_unseparated(cutoff.clone());
        levels.push_unseparated(level_suffix(level));
    }
}

/// `CASE WHEN <condition with cutoff placeholder>` up to the placeholder.
fn level_prefix(level: &TieBreakLevel) -> String {
    let parent = join_alias(ViewJoin::Parent);
    let condition = match level.condition {
        LevelCondition::Recent => "p.published_at >= ".to_string(),
        LevelCondition::Old => "p.published_at < ".to_string(),
        LevelCondition::ParentViewsKnownRecent => {
            format!("{parent}.count IS NOT NULL AND p.published_at >= ")
        }
        LevelCondition::ParentViewsKnownOld => {
            format!("{parent}.count IS NOT NULL AND p.published_at < ")
        }
    };
    format!("CASE WHEN {condition}")
}

fn level_suffix(level: &TieBreakLevel) -> String {
    let key = match level.key {
        KeySource::PublishedAt => "p.published_at".to_string(),
        KeySource::ParentViews => format!("{}.count", join_alias(ViewJoin::Parent)),
        KeySource::OwnViews => format!("{}.count", join_alias(ViewJoin::Item)),
    };
    format!(" THEN {key} END {} NULLS LAST", level.order)
}
