use sea_orm::{ConnectionTrait, DbErr, FromQueryResult, Statement, sea_query::SelectStatement};

use crate::composer::ComposedQuery;
use crate::errors::ApiError;
use crate::filtering::{Page, SafeSort};
use crate::models::{CatalogResult, ServiceListing};

#[derive(Debug, FromQueryResult)]
struct CountRow {
    total: i64,
}

fn build<C: ConnectionTrait>(db: &C, select: &SelectStatement) -> Statement {
    let statement = db.get_database_backend().build(select);
    tracing::debug!(sql = %statement.sql, params = statement.values.as_ref().map_or(0, |v| v.0.len()), "catalog query");
    statement
}

/// Number of rows matched by the composed query.
///
/// # Errors
///
/// Propagates the database error.
pub async fn count<C: ConnectionTrait>(db: &C, query: &ComposedQuery) -> Result<u64, DbErr> {
    let row = CountRow::find_by_statement(build(db, &query.count_statement()))
        .one(db)
        .await?;
    Ok(row.map_or(0, |r| u64::try_from(r.total).unwrap_or(0)))
}

/// Rows of one page, in the requested order.
///
/// # Errors
///
/// Propagates the database error.
pub async fn fetch_page<C: ConnectionTrait>(
    db: &C,
    query: &ComposedQuery,
    sort: &SafeSort,
    page: Page,
) -> Result<Vec<ServiceListing>, DbErr> {
    ServiceListing::find_by_statement(build(db, &query.page_statement(sort, page)))
        .all(db)
        .await
}

/// Count, then fetch the page. Nothing is returned unless both succeed.
///
/// # Errors
///
/// Returns a sanitized 500 if either round trip fails.
pub async fn execute<C: ConnectionTrait>(
    db: &C,
    query: &ComposedQuery,
    sort: &SafeSort,
    page: Page,
) -> Result<CatalogResult, ApiError> {
    let total = count(db, query).await.map_err(ApiError::database)?;
    let data = fetch_page(db, query, sort, page)
        .await
        .map_err(ApiError::database)?;

    tracing::debug!(
        kinds = ?query.kinds(),
        total,
        returned = data.len(),
        page = page.index,
        "catalog page assembled"
    );

    Ok(CatalogResult {
        total,
        limit: page.limit,
        page: page.index,
        total_page: page.total_pages(total),
        data,
    })
}
