//! Catalog service: the read path shared by every listing endpoint, plus the
//! single-resource lookups and status mutations layered on top of it.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, FromQueryResult,
    sea_query::{Alias, Condition, Expr, Order, Query, SelectStatement},
};
use uuid::Uuid;

use crate::auth::Identity;
use crate::composer::ComposedQuery;
use crate::errors::ApiError;
use crate::executor;
use crate::filtering::{FilterSet, Page, SafeSort, parse_sorting};
use crate::kind::ResourceKind;
use crate::models::{
    CatalogParams, CatalogResult, ReviewRow, ServiceDetail, ServiceListing, ServicePackage,
    ServiceReview, SocialMediaLink,
};
use crate::schema::{Listing, Package, Review, SocialMedia};

/// Validated inputs of one browse request.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogRequest {
    pub filters: FilterSet,
    pub sort: SafeSort,
    pub page: Page,
}

impl CatalogRequest {
    /// # Errors
    ///
    /// `BadRequest` if any filter, the sort pair or the page window is invalid.
    pub fn from_params(params: &CatalogParams) -> Result<Self, ApiError> {
        Ok(Self {
            filters: FilterSet::from_params(params)?,
            sort: parse_sorting(params.sort_by.as_deref(), params.sort_method.as_deref())?,
            page: Page::from_params(params.limit.as_deref(), params.page.as_deref())?,
        })
    }
}

/// A status flag change requested through one of the mutation endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusChange {
    Approve(bool),
    Activate(bool),
    Archive(bool),
}

impl StatusChange {
    const fn column(self) -> Listing {
        match self {
            Self::Approve(_) => Listing::IsApproved,
            Self::Activate(_) => Listing::IsActive,
            Self::Archive(_) => Listing::IsArchived,
        }
    }

    const fn value(self) -> bool {
        match self {
            Self::Approve(v) | Self::Activate(v) | Self::Archive(v) => v,
        }
    }

    /// Approval is an admin decision; the other flags belong to the owner.
    const fn admin_only(self) -> bool {
        matches!(self, Self::Approve(_))
    }
}

#[derive(Clone, Debug)]
pub struct Catalog {
    db: DatabaseConnection,
}

impl Catalog {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Filtered, sorted, paginated listing over `kinds`.
    ///
    /// # Errors
    ///
    /// Sanitized 500 on database failure.
    pub async fn browse(
        &self,
        kinds: &[ResourceKind],
        request: &CatalogRequest,
    ) -> Result<CatalogResult, ApiError> {
        let query = ComposedQuery::compose(kinds, &request.filters);
        executor::execute(&self.db, &query, &request.sort, request.page).await
    }

    /// One listing with its aggregates.
    ///
    /// # Errors
    ///
    /// `NotFound` if no row of `kind` has this id.
    pub async fn listing(&self, kind: ResourceKind, id: Uuid) -> Result<ServiceListing, ApiError> {
        let query = ComposedQuery::compose(&[kind], &FilterSet::by_ids(vec![id]));
        let page = Page { limit: 1, index: 0 };
        executor::fetch_page(&self.db, &query, &SafeSort::default(), page)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::not_found(kind.display_name(), Some(id.to_string())))
    }

    /// Listing plus packages (by name), reviews (newest first) and social links.
    ///
    /// # Errors
    ///
    /// `NotFound` if no row of `kind` has this id.
    pub async fn find_by_id(&self, kind: ResourceKind, id: Uuid) -> Result<ServiceDetail, ApiError> {
        let listing = self.listing(kind, id).await?;
        let backend = self.db.get_database_backend();

        let packages = match package_select(kind, id) {
            Some(select) => {
                ServicePackage::find_by_statement(backend.build(&select))
                    .all(&self.db)
                    .await?
            }
            None => Vec::new(),
        };
        let reviews = ReviewRow::find_by_statement(backend.build(&review_select(kind, id)))
            .all(&self.db)
            .await?
            .into_iter()
            .map(ServiceReview::from)
            .collect();
        let social_media =
            SocialMediaLink::find_by_statement(backend.build(&social_media_select(kind, id)))
                .all(&self.db)
                .await?;

        Ok(ServiceDetail {
            listing,
            packages,
            reviews,
            social_media,
        })
    }

    /// Resolve ranked ids into rows, keeping the input order.
    ///
    /// Ids that are malformed, repeated or unknown to `kinds` are dropped.
    ///
    /// # Errors
    ///
    /// Sanitized 500 on database failure.
    pub async fn materialize(
        &self,
        kinds: &[ResourceKind],
        ranked_ids: &[String],
    ) -> Result<Vec<ServiceListing>, ApiError> {
        let mut ids: Vec<Uuid> = Vec::with_capacity(ranked_ids.len());
        for id in ranked_ids.iter().filter_map(|raw| Uuid::parse_str(raw.trim()).ok()) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = ComposedQuery::compose(kinds, &FilterSet::by_ids(ids.clone()));
        let page = Page {
            limit: ids.len() as u64,
            index: 0,
        };
        let rows = executor::fetch_page(&self.db, &query, &SafeSort::default(), page).await?;

        let mut by_id: HashMap<Uuid, ServiceListing> =
            rows.into_iter().map(|row| (row.id, row)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Set one status flag and bump `last_updated` in a single conditional
    /// UPDATE. Non-admins only match rows they own.
    ///
    /// # Errors
    ///
    /// `Forbidden` for a non-admin approval or a row owned by someone else,
    /// `NotFound` if the row does not exist.
    pub async fn set_status(
        &self,
        kind: ResourceKind,
        id: Uuid,
        change: StatusChange,
        identity: &Identity,
    ) -> Result<ServiceListing, ApiError> {
        if change.admin_only() && !identity.is_admin() {
            return Err(ApiError::forbidden("Only administrators can approve listings"));
        }

        let update = Query::update()
            .table(Alias::new(kind.base_table()))
            .value(change.column(), change.value())
            .value(Listing::LastUpdated, Utc::now())
            .cond_where(editable_by(id, identity))
            .to_owned();

        let backend = self.db.get_database_backend();
        let result = self.db.execute(backend.build(&update)).await?;

        if result.rows_affected() == 0 {
            return Err(listing_miss(&self.db, kind, id).await);
        }

        tracing::info!(%kind, %id, ?change, uid = %identity.uid, "listing status updated");
        self.listing(kind, id).await
    }
}

/// Row `id`, restricted to the caller's own rows unless they are an admin.
pub(crate) fn editable_by(id: Uuid, identity: &Identity) -> Condition {
    let mut condition = Condition::all().add(Expr::col(Listing::Id).eq(id));
    if !identity.is_admin() {
        condition = condition.add(Expr::col(Listing::CreatedBy).eq(identity.uid.clone()));
    }
    condition
}

/// Explain why a guarded statement on listing `id` matched nothing.
pub(crate) async fn listing_miss<C: ConnectionTrait>(db: &C, kind: ResourceKind, id: Uuid) -> ApiError {
    let exists = Query::select()
        .column(Listing::Id)
        .from(Alias::new(kind.base_table()))
        .and_where(Expr::col(Listing::Id).eq(id))
        .to_owned();
    match db.query_one(db.get_database_backend().build(&exists)).await {
        Ok(None) => ApiError::not_found(kind.display_name(), Some(id.to_string())),
        Ok(Some(_)) => ApiError::forbidden("You do not own this listing"),
        Err(err) => err.into(),
    }
}

pub(crate) fn parent_is(kind: ResourceKind, id: Uuid) -> sea_orm::sea_query::SimpleExpr {
    Expr::col(Alias::new(kind.parent_key())).eq(id)
}

fn package_select(kind: ResourceKind, id: Uuid) -> Option<SelectStatement> {
    let table = kind.package_table()?;
    let mut select = Query::select();
    select.columns([Package::Id, Package::Name, Package::Price, Package::Description]);
    if kind == ResourceKind::Rentals {
        select.column(Package::Availability);
    } else {
        select.expr_as(Expr::cust("CAST(NULL AS INTEGER)"), Package::Availability);
    }
    select
        .from(Alias::new(table))
        .and_where(parent_is(kind, id))
        .order_by(Package::Name, Order::Asc);
    Some(select)
}

fn review_select(kind: ResourceKind, id: Uuid) -> SelectStatement {
    Query::select()
        .columns([
            Review::Id,
            Review::UserId,
            Review::UserName,
            Review::UserEmail,
            Review::Rating,
            Review::Review,
            Review::CreatedAt,
        ])
        .from(Alias::new(kind.review_table()))
        .and_where(parent_is(kind, id))
        .order_by(Review::CreatedAt, Order::Desc)
        .to_owned()
}

fn social_media_select(kind: ResourceKind, id: Uuid) -> SelectStatement {
    Query::select()
        .columns([SocialMedia::Id, SocialMedia::Name, SocialMedia::Links])
        .from(Alias::new(kind.social_media_table()))
        .and_where(parent_is(kind, id))
        .order_by(SocialMedia::Name, Order::Asc)
        .to_owned()
}
