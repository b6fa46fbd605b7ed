use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use serde_with::{StringWithSeparator, formats::CommaSeparator, serde_as};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Query-string parameters shared by `/events` and the per-kind listing endpoints.
///
/// Everything is received as text and validated by the catalog layer, so a bad
/// value produces the regular `{ success, status, message }` error envelope.
/// Unrecognised keys are ignored.
///
/// # Pagination
/// `limit` is required and must be greater than zero. `page` is zero-based.
///
/// # Sorting
/// `sort_by` must name a sortable column (`name`, `created_at`,
/// `average_rating`, `min_price`, ...) and `sort_method` must be `asc` or
/// `desc` (any case).
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CatalogParams {
    /// Page size, must be > 0.
    #[param(example = "10")]
    pub limit: Option<String>,
    /// Zero-based page index.
    #[param(example = "0")]
    pub page: Option<String>,
    /// Case-insensitive substring match on the listing name.
    #[param(example = "expo")]
    pub name: Option<String>,
    /// Comma-separated list of fields; a row matches any of them.
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    #[serde(default)]
    #[param(value_type = Option<String>, example = "music,technology")]
    pub field: Option<Vec<String>>,
    /// `true` or `false`
    pub is_active: Option<String>,
    /// `true` or `false`
    pub is_approved: Option<String>,
    /// `true` or `false`
    pub is_archived: Option<String>,
    /// Owner uid
    pub created_by: Option<String>,
    /// `paid` or `free`; other values are ignored.
    #[param(example = "free")]
    pub fees: Option<String>,
    /// Comma-separated discriminators (`media_partner`, `sponsorship`, `rentals`).
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    #[serde(default)]
    #[param(value_type = Option<String>, example = "media_partner,rentals")]
    pub service_type: Option<Vec<String>>,
    /// Comma-separated listing ids.
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub id: Option<Vec<String>>,
    /// Column to sort by.
    #[param(example = "average_rating")]
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    #[param(example = "desc")]
    pub sort_method: Option<String>,
}

/// One catalog row: base columns of any kind plus the computed aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct ServiceListing {
    /// Discriminator of the originating kind (`media_partner`, `sponsorship`, `rentals`)
    pub service_type: String,
    pub id: Uuid,
    pub name: String,
    pub field: String,
    pub created_by: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub value: Option<String>,
    pub email: Option<String>,
    pub line: Option<String>,
    pub twitter: Option<String>,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub is_approved: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Mean review rating, `null` when the listing has no reviews
    pub average_rating: Option<f64>,
    /// Cheapest package price, `0` when the listing has no packages
    pub min_price: i64,
}

/// Paginated catalog payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogResult {
    /// Number of rows matching the filters, across all pages
    pub total: u64,
    pub limit: u64,
    /// Zero-based page index
    pub page: u64,
    /// `ceil(total / limit)`
    pub total_page: u64,
    pub data: Vec<ServiceListing>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct ServicePackage {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
    /// Units available; only rentals track this
    pub availability: Option<i32>,
}

/// Review row as stored, before the author's email is masked.
#[derive(Debug, Clone, FromQueryResult)]
pub struct ReviewRow {
    pub id: Uuid,
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub rating: i32,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceReview {
    pub id: Uuid,
    pub user_id: String,
    pub rating: i32,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_detail: ReviewerProfile,
}

/// Who wrote a review. The email is partially masked.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewerProfile {
    pub id: String,
    pub name: Option<String>,
    #[schema(example = "j**n@example.com")]
    pub email: Option<String>,
}

impl From<ReviewRow> for ServiceReview {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            user_detail: ReviewerProfile {
                id: row.user_id.clone(),
                name: row.user_name,
                email: row.user_email.as_deref().map(obscure_email),
            },
            user_id: row.user_id,
            rating: row.rating,
            review: row.review,
            created_at: row.created_at,
        }
    }
}

/// Mask the local part of an address except its first and last character.
///
/// Input without a local part is returned unchanged.
#[must_use]
pub fn obscure_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return email.to_string();
    };
    let chars: Vec<char> = local.chars().collect();
    let masked = match chars.as_slice() {
        [] => return email.to_string(),
        [_] => "*".to_string(),
        [first, middle @ .., last] => {
            format!("{first}{}{last}", "*".repeat(middle.len()))
        }
    };
    format!("{masked}@{domain}")
}

#[derive(Debug, Clone, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct SocialMediaLink {
    pub id: Uuid,
    pub name: String,
    pub links: String,
}

/// A single listing with its child collections.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceDetail {
    #[serde(flatten)]
    pub listing: ServiceListing,
    pub packages: Vec<ServicePackage>,
    pub reviews: Vec<ServiceReview>,
    pub social_media: Vec<SocialMediaLink>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PackageInput {
    pub name: String,
    /// Non-negative price
    pub price: i64,
    pub description: Option<String>,
    /// Units available; rentals only
    pub availability: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SocialMediaInput {
    pub name: String,
    pub links: String,
}

/// Body of `POST /{kind}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewListing {
    pub name: String,
    pub field: String,
    /// URL of an already uploaded logo
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub value: Option<String>,
    pub email: Option<String>,
    pub line: Option<String>,
    pub twitter: Option<String>,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
    /// Must be empty for sponsorships
    #[serde(default)]
    pub packages: Vec<PackageInput>,
    #[serde(default)]
    pub social_media: Vec<SocialMediaInput>,
}

/// Body of `PATCH /{kind}/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListingChanges {
    pub name: Option<String>,
    pub field: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub value: Option<String>,
    pub email: Option<String>,
    pub line: Option<String>,
    pub twitter: Option<String>,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddPackagesBody {
    pub packages: Vec<PackageInput>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PackageChanges {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub availability: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewInput {
    /// 1 to 5
    pub rating: i32,
    pub review: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReviewChanges {
    pub rating: Option<i32>,
    pub review: Option<String>,
}

/// Id of a removed row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Deleted {
    pub id: Uuid,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ApproveBody {
    pub is_approved: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ActivateBody {
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ArchiveBody {
    pub is_archived: bool,
}

/// Success envelope: `{ success, status, data, message }`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status: u16,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            status: StatusCode::OK.as_u16(),
            data,
            message: message.into(),
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED.as_u16(),
            ..Self::ok(data, message)
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}
