//! Aggregate join planning.
//!
//! `average_rating` and `min_price` are not stored columns. Each is computed in
//! its own grouped subquery over one child table (one row per parent id) and
//! that single-row-per-parent result is LEFT JOINed onto the base table:
//!
//! ```sql
//! FROM media_partner AS base
//! LEFT JOIN (SELECT mp_id AS parent_id, CAST(AVG(rating) AS DOUBLE PRECISION) AS average_rating
//!            FROM media_partner_review GROUP BY mp_id) AS reviews ON reviews.parent_id = base.id
//! LEFT JOIN (SELECT mp_id AS parent_id, MIN(price) AS min_price
//!            FROM media_partner_package GROUP BY mp_id) AS packages ON packages.parent_id = base.id
//! ```
//!
//! Reviews and packages are never joined to the same parent before grouping, so
//! neither aggregate nor the row count is inflated by fan-out, and the outer
//! query needs no `GROUP BY`.

use sea_orm::sea_query::{
    Alias, Expr, Func, JoinType, Query, SelectStatement, SimpleExpr,
};

use crate::kind::ResourceKind;
use crate::schema::{Listing, Package};

pub const BASE_ALIAS: &str = "base";
pub const REVIEWS_ALIAS: &str = "reviews";
pub const PACKAGES_ALIAS: &str = "packages";
pub const PARENT_ID: &str = "parent_id";

pub const SERVICE_TYPE: &str = "service_type";
pub const AVERAGE_RATING: &str = "average_rating";
pub const MIN_PRICE: &str = "min_price";

/// One pre-aggregated child table joined onto the base row.
#[derive(Debug, Clone)]
pub struct AggregateJoin {
    pub alias: &'static str,
    pub subquery: SelectStatement,
}

/// Joins and projection expressions exposing the aggregates of one kind.
#[derive(Debug, Clone)]
pub struct AggregatePlan {
    pub kind: ResourceKind,
    pub joins: Vec<AggregateJoin>,
}

impl AggregatePlan {
    #[must_use]
    pub fn for_kind(kind: ResourceKind) -> Self {
        let mut joins = vec![AggregateJoin {
            alias: REVIEWS_ALIAS,
            subquery: review_aggregate(kind),
        }];
        if let Some(table) = kind.package_table() {
            joins.push(AggregateJoin {
                alias: PACKAGES_ALIAS,
                subquery: package_aggregate(kind, table),
            });
        }
        Self { kind, joins }
    }

    fn has_packages(&self) -> bool {
        self.joins.iter().any(|join| join.alias == PACKAGES_ALIAS)
    }

    /// Nullable mean rating; `NULL` when the listing has no reviews.
    #[must_use]
    pub fn average_rating_expr(&self) -> SimpleExpr {
        Expr::col((Alias::new(REVIEWS_ALIAS), Alias::new(AVERAGE_RATING))).into()
    }

    /// Cheapest package price, `0` when there are no packages. Kinds without a
    /// package table always report `0`.
    #[must_use]
    pub fn min_price_expr(&self) -> SimpleExpr {
        if self.has_packages() {
            Func::coalesce([
                Expr::col((Alias::new(PACKAGES_ALIAS), Alias::new(MIN_PRICE))).into(),
                Expr::cust("0"),
            ])
            .into()
        } else {
            Expr::cust("CAST(0 AS BIGINT)")
        }
    }

    /// Add the LEFT JOINs to a select whose base table is aliased [`BASE_ALIAS`].
    pub fn apply_joins(&self, select: &mut SelectStatement) {
        for join in &self.joins {
            select.join_subquery(
                JoinType::LeftJoin,
                join.subquery.clone(),
                Alias::new(join.alias),
                Expr::col((Alias::new(join.alias), Alias::new(PARENT_ID)))
                    .equals((Alias::new(BASE_ALIAS), Listing::Id)),
            );
        }
    }
}

fn review_aggregate(kind: ResourceKind) -> SelectStatement {
    Query::select()
        .expr_as(Expr::col(Alias::new(kind.parent_key())), Alias::new(PARENT_ID))
        // PostgreSQL returns NUMERIC for AVG over integers
        .expr_as(
            Expr::cust("CAST(AVG(rating) AS DOUBLE PRECISION)"),
            Alias::new(AVERAGE_RATING),
        )
        .from(Alias::new(kind.review_table()))
        .group_by_col(Alias::new(kind.parent_key()))
        .to_owned()
}

fn package_aggregate(kind: ResourceKind, table: &'static str) -> SelectStatement {
    Query::select()
        .expr_as(Expr::col(Alias::new(kind.parent_key())), Alias::new(PARENT_ID))
        .expr_as(Func::min(Expr::col(Package::Price)), Alias::new(MIN_PRICE))
        .from(Alias::new(table))
        .group_by_col(Alias::new(kind.parent_key()))
        .to_owned()
}
