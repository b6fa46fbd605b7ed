//! Union composition.
//!
//! Each requested kind becomes one branch:
//!
//! ```sql
//! SELECT 'rentals' AS service_type, base.id, base.name, ..., reviews.average_rating,
//!        COALESCE(packages.min_price, 0) AS min_price
//! FROM rentals AS base LEFT JOIN (...) AS reviews ... LEFT JOIN (...) AS packages ...
//! WHERE <compiled predicate>
//! ```
//!
//! Branches are combined with `UNION ALL` into the *filtered* statement. Both
//! the count and the page statement wrap that one statement as a derived table,
//! so they can never disagree on which rows match. Ordering and the page window
//! are applied once, outside the union.

use sea_orm::{
    Value,
    sea_query::{
        Alias, Asterisk, Expr, Func, NullOrdering, Order, Query, SelectStatement, UnionType,
    },
};

use crate::filtering::{FilterSet, Page, SafeSort, SortField, compile};
use crate::kind::ResourceKind;
use crate::planner::{AVERAGE_RATING, AggregatePlan, BASE_ALIAS, MIN_PRICE, SERVICE_TYPE};
use crate::schema::Listing;

/// Alias of the union when wrapped for ordering and paging.
pub const CATALOG_ALIAS: &str = "catalog";
/// Alias of the union inside the count statement.
pub const COUNT_ALIAS: &str = "t";
pub const TOTAL: &str = "total";

/// Tie-breakers appended to every ordering so pages are deterministic.
const TIE_BREAKERS: [SortField; 2] = [SortField::ServiceType, SortField::Id];

/// One per-kind select, unordered and unpaged.
#[derive(Debug, Clone)]
pub struct Branch {
    pub kind: ResourceKind,
    pub select: SelectStatement,
    pub params: Vec<Value>,
    pub satisfiable: bool,
}

impl Branch {
    #[must_use]
    pub fn build(kind: ResourceKind, filters: &FilterSet) -> Self {
        let plan = AggregatePlan::for_kind(kind);
        let compiled = compile(filters, &plan);

        let mut select = Query::select();
        select
            .expr_as(
                Expr::cust(format!("'{}'", kind.discriminator())),
                Alias::new(SERVICE_TYPE),
            )
            .columns(
                Listing::COLUMNS
                    .into_iter()
                    .map(|column| (Alias::new(BASE_ALIAS), column)),
            )
            .expr_as(plan.average_rating_expr(), Alias::new(AVERAGE_RATING))
            .expr_as(plan.min_price_expr(), Alias::new(MIN_PRICE))
            .from_as(Alias::new(kind.base_table()), Alias::new(BASE_ALIAS));
        plan.apply_joins(&mut select);
        if !compiled.is_empty() {
            select.cond_where(compiled.condition);
        }

        Self {
            kind,
            select,
            params: compiled.params,
            satisfiable: compiled.satisfiable,
        }
    }
}

/// The filtered (pre-ORDER, pre-LIMIT) catalog query over one or more kinds.
#[derive(Debug, Clone)]
pub struct ComposedQuery {
    kinds: Vec<ResourceKind>,
    filtered: SelectStatement,
    params: Vec<Value>,
}

impl ComposedQuery {
    /// Compose `filters` over `kinds`.
    ///
    /// Branches excluded by the `service_type` filter are dropped. If every
    /// branch is excluded the first one is kept so the query still has a shape
    /// and simply matches nothing. A single remaining branch is used as is.
    #[must_use]
    pub fn compose(kinds: &[ResourceKind], filters: &FilterSet) -> Self {
        let mut branches: Vec<Branch> = kinds
            .iter()
            .map(|&kind| Branch::build(kind, filters))
            .collect();

        if branches.iter().any(|b| b.satisfiable) {
            branches.retain(|b| b.satisfiable);
        } else {
            branches.truncate(1);
        }

        let mut iter = branches.into_iter();
        let Some(first) = iter.next() else {
            return Self::compose(&ResourceKind::ALL, filters);
        };

        let mut kinds = vec![first.kind];
        let mut filtered = first.select;
        let mut params = first.params;
        for branch in iter {
            kinds.push(branch.kind);
            params.extend(branch.params);
            filtered.union(UnionType::All, branch.select);
        }

        Self {
            kinds,
            filtered,
            params,
        }
    }

    /// Kinds whose branches survived pruning, in emission order.
    #[must_use]
    pub fn kinds(&self) -> &[ResourceKind] {
        &self.kinds
    }

    /// Bound values of the filtered statement, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    #[must_use]
    pub fn filtered_statement(&self) -> &SelectStatement {
        &self.filtered
    }

    /// `SELECT COUNT(*) AS total FROM (<filtered>) AS t`
    #[must_use]
    pub fn count_statement(&self) -> SelectStatement {
        Query::select()
            .expr_as(Func::count(Expr::col(Asterisk)), Alias::new(TOTAL))
            .from_subquery(self.filtered.clone(), Alias::new(COUNT_ALIAS))
            .to_owned()
    }

    /// `SELECT * FROM (<filtered>) AS catalog ORDER BY ... LIMIT ? OFFSET ?`
    ///
    /// `limit` and `offset` are the last two bound values.
    #[must_use]
    pub fn page_statement(&self, sort: &SafeSort, page: Page) -> SelectStatement {
        let mut select = Query::select();
        select
            .column(Asterisk)
            .from_subquery(self.filtered.clone(), Alias::new(CATALOG_ALIAS))
            .order_by_with_nulls(catalog_col(sort.field), sort.direction.clone(), NullOrdering::Last);
        for field in TIE_BREAKERS {
            if field != sort.field {
                select.order_by(catalog_col(field), Order::Asc);
            }
        }
        select.limit(page.limit).offset(page.offset());
        select
    }
}

fn catalog_col(field: SortField) -> (Alias, Alias) {
    (Alias::new(CATALOG_ALIAS), Alias::new(field.column()))
}
