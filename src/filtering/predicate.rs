//! Predicate compilation.
//!
//! A [`FilterSet`] is lowered per resource kind into a list of [`Predicate`]s
//! (the AST), which then compiles into a sea-query [`Condition`] together with
//! the ordered list of values it binds. Every caller-supplied value ends up in a
//! bound parameter; identifiers come only from the closed [`Listing`] set.

use sea_orm::{
    Condition, Value,
    sea_query::{Alias, BinOper, ConditionExpression, Expr, Func, SimpleExpr},
};

use super::filter::{FilterKey, FilterSet};
use crate::kind::ResourceKind;
use crate::planner::{AggregatePlan, BASE_ALIAS};
use crate::schema::Listing;

/// Escape character used in LIKE patterns. `!` renders identically on every
/// backend, unlike backslash.
const LIKE_ESCAPE: char = '!';

/// Whether a predicate filters base columns or a computed aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Row,
    Aggregate,
}

/// One compiled filter rule.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// `base.column = ?`
    Equals { column: Listing, value: Value },
    /// Case-insensitive substring: `UPPER(base.column) LIKE UPPER(?) ESCAPE '!'`
    /// with the bound pattern `%needle%`. Both sides fold through the same
    /// database function, so non-ASCII names still match themselves.
    Contains { column: Listing, needle: String },
    /// `(base.column = ? OR base.column = ? ...)`, order-preserving
    AnyOf { column: Listing, values: Vec<Value> },
    /// `base.column IN (?, ?, ...)`
    In { column: Listing, values: Vec<Value> },
    /// `min_price <= ?` over the computed aggregate
    MinPriceAtMost(i64),
    /// The branch can never match (kind excluded by `service_type`).
    Never,
}

impl Predicate {
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::MinPriceAtMost(_) => Stage::Aggregate,
            _ => Stage::Row,
        }
    }

    /// Values this predicate binds, in placeholder order.
    #[must_use]
    pub fn params(&self) -> Vec<Value> {
        match self {
            Self::Equals { value, .. } => vec![value.clone()],
            Self::Contains { needle, .. } => vec![Value::from(like_pattern(needle))],
            Self::AnyOf { values, .. } | Self::In { values, .. } => values.clone(),
            Self::MinPriceAtMost(ceiling) => vec![Value::from(*ceiling)],
            Self::Never => Vec::new(),
        }
    }

    fn to_condition(&self, plan: &AggregatePlan) -> ConditionExpression {
        let expr = match self {
            Self::Equals { column, value } => base_col(*column).eq(value.clone()),
            Self::Contains { column, needle } => Expr::expr(Func::upper(base_col(*column)))
                .binary(BinOper::Like, folded_pattern(needle)),
            Self::AnyOf { column, values } => {
                let any = values.iter().fold(Condition::any(), |cond, value| {
                    cond.add(base_col(*column).eq(value.clone()))
                });
                return any.into();
            }
            Self::In { column, values } => base_col(*column).is_in(values.iter().cloned()),
            Self::MinPriceAtMost(ceiling) => Expr::expr(plan.min_price_expr()).lte(*ceiling),
            Self::Never => Expr::cust("1 = 0"),
        };
        expr.into()
    }
}

fn base_col(column: Listing) -> Expr {
    Expr::col((Alias::new(BASE_ALIAS), column))
}

fn escape_like_wildcards(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Bound pattern for a contains match. Case folding happens in SQL.
fn like_pattern(needle: &str) -> String {
    format!("%{}%", escape_like_wildcards(needle))
}

/// `UPPER(?) ESCAPE '!'`, the right-hand side of a contains match.
fn folded_pattern(needle: &str) -> SimpleExpr {
    SimpleExpr::Binary(
        Box::new(Func::upper(Expr::val(like_pattern(needle))).into()),
        BinOper::Escape,
        Box::new(SimpleExpr::Constant(LIKE_ESCAPE.into())),
    )
}

/// Lower a filter set into the predicates that apply to `kind`.
///
/// Row predicates come first in [`FilterKey`] order, aggregate predicates last,
/// which is also the order their values are bound.
#[must_use]
pub fn predicates_for(filters: &FilterSet, kind: ResourceKind) -> Vec<Predicate> {
    let mut predicates: Vec<Predicate> = filters
        .active_keys()
        .into_iter()
        .filter_map(|key| predicate_for_key(filters, key, kind))
        .collect();
    predicates.sort_by_key(|p| p.stage() == Stage::Aggregate);
    predicates
}

fn predicate_for_key(filters: &FilterSet, key: FilterKey, kind: ResourceKind) -> Option<Predicate> {
    match key {
        FilterKey::Id => filters.ids.as_ref().map(|ids| Predicate::In {
            column: Listing::Id,
            values: ids.iter().map(|id| Value::from(*id)).collect(),
        }),
        FilterKey::Name => filters.name.as_ref().map(|name| Predicate::Contains {
            column: Listing::Name,
            needle: name.clone(),
        }),
        FilterKey::Field => (!filters.fields.is_empty()).then(|| Predicate::AnyOf {
            column: Listing::Field,
            values: filters.fields.iter().map(|f| Value::from(f.clone())).collect(),
        }),
        FilterKey::IsActive => filters.is_active.map(|v| equals(Listing::IsActive, v)),
        FilterKey::IsApproved => filters.is_approved.map(|v| equals(Listing::IsApproved, v)),
        FilterKey::IsArchived => filters.is_archived.map(|v| equals(Listing::IsArchived, v)),
        FilterKey::CreatedBy => filters
            .created_by
            .as_ref()
            .map(|owner| equals(Listing::CreatedBy, owner.clone())),
        FilterKey::ServiceType => (!filters.admits_kind(kind)).then_some(Predicate::Never),
        FilterKey::Fees => filters
            .fees
            .map(|fees| Predicate::MinPriceAtMost(fees.price_ceiling())),
    }
}

fn equals(column: Listing, value: impl Into<Value>) -> Predicate {
    Predicate::Equals {
        column,
        value: value.into(),
    }
}

/// WHERE fragment for one union branch plus the values it binds.
#[derive(Clone, Debug)]
pub struct CompiledPredicate {
    pub kind: ResourceKind,
    pub condition: Condition,
    /// Bound values in placeholder order, numbered from 1 within the branch.
    pub params: Vec<Value>,
    /// `false` when the branch can never match and may be pruned.
    pub satisfiable: bool,
}

impl CompiledPredicate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.condition.is_empty()
    }
}

/// Compile `filters` for one kind against that kind's aggregate plan.
#[must_use]
pub fn compile(filters: &FilterSet, plan: &AggregatePlan) -> CompiledPredicate {
    let predicates = predicates_for(filters, plan.kind);
    let satisfiable = !predicates.contains(&Predicate::Never);
    let mut condition = Condition::all();
    let mut params = Vec::new();
    for predicate in &predicates {
        params.extend(predicate.params());
        condition = condition.add(predicate.to_condition(plan));
    }
    CompiledPredicate {
        kind: plan.kind,
        condition,
        params,
        satisfiable,
    }
}
