//! HTTP surface: axum handlers with utoipa annotations and router assembly.
//!
//! | Method | Path | |
//! |--------|------|--|
//! | GET | `/events` | browse every kind |
//! | GET | `/{kind}` | browse one kind |
//! | POST | `/{kind}` | create, owned by the caller |
//! | GET | `/{kind}/{id}` | detail with packages, reviews, social media |
//! | PATCH, DELETE | `/{kind}/{id}` | owner or admin |
//! | PATCH | `/{kind}/{id}/approve` | admin only |
//! | PATCH | `/{kind}/{id}/activate` | owner or admin |
//! | PATCH | `/{kind}/{id}/archive` | owner or admin |
//! | POST | `/{kind}/{id}/package` | owner or admin, not for sponsorships |
//! | PATCH, DELETE | `/{kind}/{id}/package/{package_id}` | owner or admin, not for sponsorships |
//! | POST | `/{kind}/{id}/review` | any signed-in user |
//! | PATCH | `/{kind}/{id}/review/{review_id}` | author |
//! | DELETE | `/{kind}/{id}/review/{review_id}` | author or admin |
//! | GET | `/recommendations/users/{user_id}` | collaborative recommendations |
//! | GET | `/recommendations/{kind}/{id}` | similar listings |
//!
//! `{kind}` is one of `media-partner`, `sponsorship`, `rentals`.
//!
//! Extractor rejections, unknown routes and timeouts all answer with the
//! `{ success, status, message }` error envelope.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{FromRef, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_scalar::{Scalar, Servable};
use uuid::Uuid;

use crate::auth::{Identity, SharedVerifier};
use crate::catalog::{Catalog, CatalogRequest, StatusChange};
use crate::errors::{ApiError, ErrorResponse};
use crate::extract::{Json, Path, Query};
use crate::kind::ResourceKind;
use crate::models::{
    ActivateBody, AddPackagesBody, ApiResponse, ApproveBody, ArchiveBody, CatalogParams,
    CatalogResult, Deleted, ListingChanges, NewListing, PackageChanges, ReviewChanges,
    ReviewInput, ServiceDetail, ServiceListing,
};
use crate::recommend::Recommender;

pub type SharedRecommender = Arc<dyn Recommender>;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub catalog: Catalog,
    pub verifier: SharedVerifier,
    /// `None` when no recommendation service is configured.
    pub recommender: Option<SharedRecommender>,
}

async fn browse(
    catalog: &Catalog,
    kinds: &[ResourceKind],
    params: &CatalogParams,
    message: String,
) -> Result<ApiResponse<CatalogResult>, ApiError> {
    let request = CatalogRequest::from_params(params)?;
    let result = catalog.browse(kinds, &request).await?;
    Ok(ApiResponse::ok(result, message))
}

async fn change_status(
    catalog: &Catalog,
    kind: ResourceKind,
    id: Uuid,
    change: StatusChange,
    identity: &Identity,
) -> Result<ApiResponse<ServiceListing>, ApiError> {
    let listing = catalog.set_status(kind, id, change, identity).await?;
    let message = match change {
        StatusChange::Approve(true) => "approved",
        StatusChange::Approve(false) => "unapproved",
        StatusChange::Activate(true) => "activated",
        StatusChange::Activate(false) => "deactivated",
        StatusChange::Archive(true) => "archived",
        StatusChange::Archive(false) => "unarchived",
    };
    Ok(ApiResponse::ok(
        listing,
        format!("{} {id} {message} successfully", kind.display_name()),
    ))
}

pub mod events {
    use super::*;

    #[utoipa::path(
        get,
        path = "/",
        params(CatalogParams),
        responses(
            (status = axum::http::StatusCode::OK, description = "One page of listings across every kind", body = ApiResponse<CatalogResult>),
            (status = axum::http::StatusCode::BAD_REQUEST, description = "Invalid filter, sort or page", body = ErrorResponse),
            (status = axum::http::StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse)
        ),
        operation_id = "list_events",
        summary = "Browse all services",
        description = "Filters, sorts and paginates media partners, sponsorships and rentals as one list. Each row carries a `service_type` discriminator.",
        tag = "events"
    )]
    pub async fn list(
        State(catalog): State<Catalog>,
        Query(params): Query<CatalogParams>,
    ) -> Result<ApiResponse<CatalogResult>, ApiError> {
        browse(
            &catalog,
            &ResourceKind::ALL,
            &params,
            "Get all event services successfully".to_string(),
        )
        .await
    }
}

/// Per-kind handlers. utoipa needs one annotated function per route, so each
/// kind gets its own module.
macro_rules! kind_handlers {
    ($module:ident, $kind:expr, $tag:tt) => {
        pub mod $module {
            use super::*;

            const KIND: ResourceKind = $kind;

            #[utoipa::path(
                get,
                path = "/",
                params(CatalogParams),
                responses(
                    (status = axum::http::StatusCode::OK, description = "One page of listings", body = ApiResponse<CatalogResult>),
                    (status = axum::http::StatusCode::BAD_REQUEST, description = "Invalid filter, sort or page", body = ErrorResponse),
                    (status = axum::http::StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse)
                ),
                operation_id = format!("list_{}", KIND.discriminator()),
                summary = format!("Browse {}", KIND.path_segment()),
                tag = $tag
            )]
            pub async fn list(
                State(catalog): State<Catalog>,
                Query(params): Query<CatalogParams>,
            ) -> Result<ApiResponse<CatalogResult>, ApiError> {
                let message = format!("Get all {} successfully", KIND.path_segment());
                browse(&catalog, &[KIND], &params, message).await
            }

            #[utoipa::path(
                get,
                path = "/{id}",
                params(("id" = Uuid, Path, description = "Listing id")),
                responses(
                    (status = axum::http::StatusCode::OK, description = "Listing with packages, reviews and social media", body = ApiResponse<ServiceDetail>),
                    (status = axum::http::StatusCode::NOT_FOUND, description = "Listing not found", body = ErrorResponse),
                    (status = axum::http::StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse)
                ),
                operation_id = format!("get_one_{}", KIND.discriminator()),
                tag = $tag
            )]
            pub async fn get_one(
                State(catalog): State<Catalog>,
                Path(id): Path<Uuid>,
            ) -> Result<ApiResponse<ServiceDetail>, ApiError> {
                let detail = catalog.find_by_id(KIND, id).await?;
                Ok(ApiResponse::ok(
                    detail,
                    format!("Get {} {id} successfully", KIND.display_name()),
                ))
            }

            #[utoipa::path(
                patch,
                path = "/{id}/approve",
                params(("id" = Uuid, Path, description = "Listing id")),
                request_body = ApproveBody,
                responses(
                    (status = axum::http::StatusCode::OK, description = "Updated listing", body = ApiResponse<ServiceListing>),
                    (status = axum::http::StatusCode::UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
                    (status = axum::http::StatusCode::FORBIDDEN, description = "Caller is not an administrator", body = ErrorResponse),
                    (status = axum::http::StatusCode::NOT_FOUND, description = "Listing not found", body = ErrorResponse)
                ),
                operation_id = format!("approve_{}", KIND.discriminator()),
                security(("bearer" = [])),
                tag = $tag
            )]
            pub async fn approve(
                State(catalog): State<Catalog>,
                identity: Identity,
                Path(id): Path<Uuid>,
                Json(body): Json<ApproveBody>,
            ) -> Result<ApiResponse<ServiceListing>, ApiError> {
                change_status(&catalog, KIND, id, StatusChange::Approve(body.is_approved), &identity).await
            }

            #[utoipa::path(
                patch,
                path = "/{id}/activate",
                params(("id" = Uuid, Path, description = "Listing id")),
                request_body = ActivateBody,
                responses(
                    (status = axum::http::StatusCode::OK, description = "Updated listing", body = ApiResponse<ServiceListing>),
                    (status = axum::http::StatusCode::UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
                    (status = axum::http::StatusCode::FORBIDDEN, description = "Caller does not own the listing", body = ErrorResponse),
                    (status = axum::http::StatusCode::NOT_FOUND, description = "Listing not found", body = ErrorResponse)
                ),
                operation_id = format!("activate_{}", KIND.discriminator()),
                security(("bearer" = [])),
                tag = $tag
            )]
            pub async fn activate(
                State(catalog): State<Catalog>,
                identity: Identity,
                Path(id): Path<Uuid>,
                Json(body): Json<ActivateBody>,
            ) -> Result<ApiResponse<ServiceListing>, ApiError> {
                change_status(&catalog, KIND, id, StatusChange::Activate(body.is_active), &identity).await
            }

            #[utoipa::path(
                patch,
                path = "/{id}/archive",
                params(("id" = Uuid, Path, description = "Listing id")),
                request_body = ArchiveBody,
                responses(
                    (status = axum::http::StatusCode::OK, description = "Updated listing", body = ApiResponse<ServiceListing>),
                    (status = axum::http::StatusCode::UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
                    (status = axum::http::StatusCode::FORBIDDEN, description = "Caller does not own the listing", body = ErrorResponse),
                    (status = axum::http::StatusCode::NOT_FOUND, description = "Listing not found", body = ErrorResponse)
                ),
                operation_id = format!("archive_{}", KIND.discriminator()),
                security(("bearer" = [])),
                tag = $tag
            )]
            pub async fn archive(
                State(catalog): State<Catalog>,
                identity: Identity,
                Path(id): Path<Uuid>,
                Json(body): Json<ArchiveBody>,
            ) -> Result<ApiResponse<ServiceListing>, ApiError> {
                change_status(&catalog, KIND, id, StatusChange::Archive(body.is_archived), &identity).await
            }

            #[utoipa::path(
                post,
                path = "/",
                request_body = NewListing,
                responses(
                    (status = axum::http::StatusCode::CREATED, description = "Created listing", body = ApiResponse<ServiceDetail>),
                    (status = axum::http::StatusCode::BAD_REQUEST, description = "Invalid listing", body = ErrorResponse),
                    (status = axum::http::StatusCode::UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse)
                ),
                operation_id = format!("create_{}", KIND.discriminator()),
                security(("bearer" = [])),
                tag = $tag
            )]
            pub async fn create(
                State(catalog): State<Catalog>,
                identity: Identity,
                Json(body): Json<NewListing>,
            ) -> Result<ApiResponse<ServiceDetail>, ApiError> {
                let detail = catalog.create_listing(KIND, body, &identity).await?;
                let message = format!("{} created successfully", KIND.display_name());
                Ok(ApiResponse::created(detail, message))
            }

            #[utoipa::path(
                patch,
                path = "/{id}",
                params(("id" = Uuid, Path, description = "Listing id")),
                request_body = ListingChanges,
                responses(
                    (status = axum::http::StatusCode::OK, description = "Updated listing", body = ApiResponse<ServiceDetail>),
                    (status = axum::http::StatusCode::BAD_REQUEST, description = "Nothing to update or invalid value", body = ErrorResponse),
                    (status = axum::http::StatusCode::FORBIDDEN, description = "Caller does not own the listing", body = ErrorResponse),
                    (status = axum::http::StatusCode::NOT_FOUND, description = "Listing not found", body = ErrorResponse)
                ),
                operation_id = format!("update_{}", KIND.discriminator()),
                security(("bearer" = [])),
                tag = $tag
            )]
            pub async fn update(
                State(catalog): State<Catalog>,
                identity: Identity,
                Path(id): Path<Uuid>,
                Json(body): Json<ListingChanges>,
            ) -> Result<ApiResponse<ServiceDetail>, ApiError> {
                let detail = catalog.update_listing(KIND, id, body, &identity).await?;
                Ok(ApiResponse::ok(
                    detail,
                    format!("{} {id} updated successfully", KIND.display_name()),
                ))
            }

            #[utoipa::path(
                delete,
                path = "/{id}",
                params(("id" = Uuid, Path, description = "Listing id")),
                responses(
                    (status = axum::http::StatusCode::OK, description = "Listing and its children removed", body = ApiResponse<Deleted>),
                    (status = axum::http::StatusCode::FORBIDDEN, description = "Caller does not own the listing", body = ErrorResponse),
                    (status = axum::http::StatusCode::NOT_FOUND, description = "Listing not found", body = ErrorResponse)
                ),
                operation_id = format!("delete_{}", KIND.discriminator()),
                security(("bearer" = [])),
                tag = $tag
            )]
            pub async fn remove(
                State(catalog): State<Catalog>,
                identity: Identity,
                Path(id): Path<Uuid>,
            ) -> Result<ApiResponse<Deleted>, ApiError> {
                let deleted = catalog.delete_listing(KIND, id, &identity).await?;
                Ok(ApiResponse::ok(
                    deleted,
                    format!("{} {id} deleted successfully", KIND.display_name()),
                ))
            }

            #[utoipa::path(
                post,
                path = "/{id}/review",
                params(("id" = Uuid, Path, description = "Listing id")),
                request_body = ReviewInput,
                responses(
                    (status = axum::http::StatusCode::CREATED, description = "Listing with the new review", body = ApiResponse<ServiceDetail>),
                    (status = axum::http::StatusCode::BAD_REQUEST, description = "Rating outside 1..=5", body = ErrorResponse),
                    (status = axum::http::StatusCode::NOT_FOUND, description = "Listing not found", body = ErrorResponse)
                ),
                operation_id = format!("add_review_{}", KIND.discriminator()),
                security(("bearer" = [])),
                tag = $tag
            )]
            pub async fn add_review(
                State(catalog): State<Catalog>,
                identity: Identity,
                Path(id): Path<Uuid>,
                Json(body): Json<ReviewInput>,
            ) -> Result<ApiResponse<ServiceDetail>, ApiError> {
                let detail = catalog.add_review(KIND, id, body, &identity).await?;
                Ok(ApiResponse::created(detail, "Review added successfully"))
            }

            #[utoipa::path(
                patch,
                path = "/{id}/review/{review_id}",
                params(
                    ("id" = Uuid, Path, description = "Listing id"),
                    ("review_id" = Uuid, Path, description = "Review id")
                ),
                request_body = ReviewChanges,
                responses(
                    (status = axum::http::StatusCode::OK, description = "Listing with the edited review", body = ApiResponse<ServiceDetail>),
                    (status = axum::http::StatusCode::FORBIDDEN, description = "Caller did not write the review", body = ErrorResponse),
                    (status = axum::http::StatusCode::NOT_FOUND, description = "Review not found", body = ErrorResponse)
                ),
                operation_id = format!("update_review_{}", KIND.discriminator()),
                security(("bearer" = [])),
                tag = $tag
            )]
            pub async fn update_review(
                State(catalog): State<Catalog>,
                identity: Identity,
                Path((id, review_id)): Path<(Uuid, Uuid)>,
                Json(body): Json<ReviewChanges>,
            ) -> Result<ApiResponse<ServiceDetail>, ApiError> {
                let detail = catalog.update_review(KIND, id, review_id, body, &identity).await?;
                Ok(ApiResponse::ok(detail, "Review updated successfully"))
            }

            #[utoipa::path(
                delete,
                path = "/{id}/review/{review_id}",
                params(
                    ("id" = Uuid, Path, description = "Listing id"),
                    ("review_id" = Uuid, Path, description = "Review id")
                ),
                responses(
                    (status = axum::http::StatusCode::OK, description = "Review removed", body = ApiResponse<Deleted>),
                    (status = axum::http::StatusCode::FORBIDDEN, description = "Caller is neither the author nor an administrator", body = ErrorResponse),
                    (status = axum::http::StatusCode::NOT_FOUND, description = "Review not found", body = ErrorResponse)
                ),
                operation_id = format!("delete_review_{}", KIND.discriminator()),
                security(("bearer" = [])),
                tag = $tag
            )]
            pub async fn remove_review(
                State(catalog): State<Catalog>,
                identity: Identity,
                Path((id, review_id)): Path<(Uuid, Uuid)>,
            ) -> Result<ApiResponse<Deleted>, ApiError> {
                let deleted = catalog.delete_review(KIND, id, review_id, &identity).await?;
                Ok(ApiResponse::ok(deleted, "Review deleted successfully"))
            }

            pub fn router() -> OpenApiRouter<AppState> {
                OpenApiRouter::new()
                    .routes(routes!(list, create))
                    .routes(routes!(get_one, update, remove))
                    .routes(routes!(approve))
                    .routes(routes!(activate))
                    .routes(routes!(archive))
                    .routes(routes!(add_review))
                    .routes(routes!(update_review, remove_review))
            }
        }
    };
}

/// Package endpoints for the kinds that sell packages.
macro_rules! package_handlers {
    ($module:ident, $kind:expr, $tag:tt) => {
        pub mod $module {
            use super::*;

            const KIND: ResourceKind = $kind;

            #[utoipa::path(
                post,
                path = "/{id}/package",
                params(("id" = Uuid, Path, description = "Listing id")),
                request_body = AddPackagesBody,
                responses(
                    (status = axum::http::StatusCode::CREATED, description = "Listing with the new packages", body = ApiResponse<ServiceDetail>),
                    (status = axum::http::StatusCode::BAD_REQUEST, description = "Invalid package", body = ErrorResponse),
                    (status = axum::http::StatusCode::FORBIDDEN, description = "Caller does not own the listing", body = ErrorResponse),
                    (status = axum::http::StatusCode::NOT_FOUND, description = "Listing not found", body = ErrorResponse)
                ),
                operation_id = format!("add_package_{}", KIND.discriminator()),
                security(("bearer" = [])),
                tag = $tag
            )]
            pub async fn add(
                State(catalog): State<Catalog>,
                identity: Identity,
                Path(id): Path<Uuid>,
                Json(body): Json<AddPackagesBody>,
            ) -> Result<ApiResponse<ServiceDetail>, ApiError> {
                let detail = catalog.add_packages(KIND, id, body.packages, &identity).await?;
                Ok(ApiResponse::created(detail, "Packages added successfully"))
            }

            #[utoipa::path(
                patch,
                path = "/{id}/package/{package_id}",
                params(
                    ("id" = Uuid, Path, description = "Listing id"),
                    ("package_id" = Uuid, Path, description = "Package id")
                ),
                request_body = PackageChanges,
                responses(
                    (status = axum::http::StatusCode::OK, description = "Listing with the edited package", body = ApiResponse<ServiceDetail>),
                    (status = axum::http::StatusCode::FORBIDDEN, description = "Caller does not own the listing", body = ErrorResponse),
                    (status = axum::http::StatusCode::NOT_FOUND, description = "Listing or package not found", body = ErrorResponse)
                ),
                operation_id = format!("update_package_{}", KIND.discriminator()),
                security(("bearer" = [])),
                tag = $tag
            )]
            pub async fn update(
                State(catalog): State<Catalog>,
                identity: Identity,
                Path((id, package_id)): Path<(Uuid, Uuid)>,
                Json(body): Json<PackageChanges>,
            ) -> Result<ApiResponse<ServiceDetail>, ApiError> {
                let detail = catalog.update_package(KIND, id, package_id, body, &identity).await?;
                Ok(ApiResponse::ok(detail, "Package updated successfully"))
            }

            #[utoipa::path(
                delete,
                path = "/{id}/package/{package_id}",
                params(
                    ("id" = Uuid, Path, description = "Listing id"),
                    ("package_id" = Uuid, Path, description = "Package id")
                ),
                responses(
                    (status = axum::http::StatusCode::OK, description = "Package removed", body = ApiResponse<Deleted>),
                    (status = axum::http::StatusCode::FORBIDDEN, description = "Caller does not own the listing", body = ErrorResponse),
                    (status = axum::http::StatusCode::NOT_FOUND, description = "Listing or package not found", body = ErrorResponse)
                ),
                operation_id = format!("delete_package_{}", KIND.discriminator()),
                security(("bearer" = [])),
                tag = $tag
            )]
            pub async fn remove(
                State(catalog): State<Catalog>,
                identity: Identity,
                Path((id, package_id)): Path<(Uuid, Uuid)>,
            ) -> Result<ApiResponse<Deleted>, ApiError> {
                let deleted = catalog.delete_package(KIND, id, package_id, &identity).await?;
                Ok(ApiResponse::ok(deleted, "Package deleted successfully"))
            }

            pub fn router() -> OpenApiRouter<AppState> {
                OpenApiRouter::new()
                    .routes(routes!(add))
                    .routes(routes!(update, remove))
            }
        }
    };
}

kind_handlers!(media_partner, ResourceKind::MediaPartner, "media-partner");
kind_handlers!(sponsorship, ResourceKind::Sponsorship, "sponsorship");
kind_handlers!(rentals, ResourceKind::Rentals, "rentals");
package_handlers!(media_partner_packages, ResourceKind::MediaPartner, "media-partner");
package_handlers!(rentals_packages, ResourceKind::Rentals, "rentals");

pub mod recommendations {
    use super::*;

    fn recommender(state: &AppState) -> Result<&SharedRecommender, ApiError> {
        state
            .recommender
            .as_ref()
            .ok_or_else(|| ApiError::internal("Recommendation service is not configured", None))
    }

    #[utoipa::path(
        get,
        path = "/users/{user_id}",
        params(("user_id" = String, Path, description = "User uid")),
        responses(
            (status = axum::http::StatusCode::OK, description = "Recommended listings, best first", body = ApiResponse<Vec<ServiceListing>>),
            (status = axum::http::StatusCode::INTERNAL_SERVER_ERROR, description = "Recommendation service unavailable", body = ErrorResponse)
        ),
        tag = "recommendations"
    )]
    pub async fn for_user(
        State(state): State<AppState>,
        Path(user_id): Path<String>,
    ) -> Result<ApiResponse<Vec<ServiceListing>>, ApiError> {
        let ids = recommender(&state)?.for_user(&user_id).await?;
        let rows = state.catalog.materialize(&ResourceKind::ALL, &ids).await?;
        Ok(ApiResponse::ok(rows, "Get recommendations successfully"))
    }

    #[utoipa::path(
        get,
        path = "/{kind}/{id}",
        params(
            ("kind" = String, Path, description = "`media-partner`, `sponsorship` or `rentals`"),
            ("id" = Uuid, Path, description = "Listing id")
        ),
        responses(
            (status = axum::http::StatusCode::OK, description = "Similar listings of the same kind, best first", body = ApiResponse<Vec<ServiceListing>>),
            (status = axum::http::StatusCode::BAD_REQUEST, description = "Unknown kind", body = ErrorResponse),
            (status = axum::http::StatusCode::INTERNAL_SERVER_ERROR, description = "Recommendation service unavailable", body = ErrorResponse)
        ),
        tag = "recommendations"
    )]
    pub async fn similar(
        State(state): State<AppState>,
        Path((kind, id)): Path<(String, Uuid)>,
    ) -> Result<ApiResponse<Vec<ServiceListing>>, ApiError> {
        let kind: ResourceKind = kind.parse().map_err(ApiError::bad_request)?;
        let ids = recommender(&state)?.similar_to(kind, id).await?;
        let rows = state.catalog.materialize(&[kind], &ids).await?;
        Ok(ApiResponse::ok(rows, "Get recommendations successfully"))
    }

    pub fn router() -> OpenApiRouter<AppState> {
        OpenApiRouter::new()
            .routes(routes!(for_user))
            .routes(routes!(similar))
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Service Catalog API",
        description = "Unified browse, detail and write endpoints for media partners, sponsorships and rentals."
    ),
    components(schemas(ErrorResponse, ResourceKind)),
    modifiers(&BearerAuth)
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

async fn unknown_route() -> ApiError {
    ApiError::not_found("Route", None)
}

/// `TimeoutLayer` answers with an empty body; swap in the error envelope.
async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return ApiError::Timeout.into_response();
    }
    response
}

fn with_timeout<S>(router: Router<S>, limit: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, limit))
        .layer(middleware::map_response(timeout_envelope))
}

/// Assemble the application router with docs at `/docs` and the OpenAPI
/// document at `/openapi.json`.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let (api_router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/events", OpenApiRouter::new().routes(routes!(events::list)))
        .nest(
            "/media-partner",
            media_partner::router().merge(media_partner_packages::router()),
        )
        .nest("/sponsorship", sponsorship::router())
        .nest("/rentals", rentals::router().merge(rentals_packages::router()))
        .nest("/recommendations", recommendations::router())
        .split_for_parts();

    let document = openapi.clone();
    let api_router = api_router
        .route("/openapi.json", get(move || async move { axum::Json(document) }))
        .merge(Scalar::with_url("/docs", openapi))
        .fallback(unknown_route);

    with_timeout(api_router, request_timeout)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
