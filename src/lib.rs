//! # service-catalog
//!
//! One browse API over three heterogeneous kinds of bookable services
//! (media partners, sponsorships, rentals). Each kind lives in its own table
//! with its own packages, reviews and social-media links; the catalog engine
//! composes them into a single filtered, sorted, paginated listing that also
//! carries two computed aggregates:
//!
//! - `average_rating`: mean review rating, `null` without reviews
//! - `min_price`: cheapest package, `0` without packages
//!
//! ## Pipeline
//!
//! ```text
//! CatalogParams ──► FilterSet / SafeSort / Page      (filtering)
//!               ──► per-kind predicate + aggregates  (filtering::predicate, planner)
//!               ──► UNION ALL of kind branches       (composer)
//!               ──► COUNT(*) over it, then the page  (executor)
//!               ──► CatalogResult
//! ```
//!
//! Caller values only ever reach SQL as bound parameters. The one identifier
//! taken from input, the sort column, is resolved through a closed whitelist.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let db = sea_orm::Database::connect("sqlite::memory:").await?;
//! Migrator::up(&db, None).await?;
//! let state = AppState {
//!     catalog: Catalog::new(db),
//!     verifier: Arc::new(JwtVerifier::new("secret")),
//!     recommender: None,
//! };
//! let app = router(state, Duration::from_secs(30));
//! // GET /events?limit=10&name=expo&sort_by=average_rating&sort_method=desc
//! ```

pub mod auth;
pub mod catalog;
pub mod composer;
pub mod config;
pub mod errors;
pub mod executor;
pub mod extract;
pub mod filtering;
pub mod kind;
pub mod migration;
pub mod models;
pub mod mutations;
pub mod planner;
pub mod recommend;
pub mod routes;
pub mod schema;

pub use auth::{DenyAll, Identity, IdentityVerifier, JwtVerifier, Role, SharedVerifier};
pub use catalog::{Catalog, CatalogRequest, StatusChange};
pub use composer::ComposedQuery;
pub use config::AppConfig;
pub use errors::ApiError;
pub use kind::ResourceKind;
pub use migration::Migrator;
pub use models::{CatalogParams, CatalogResult, ServiceDetail, ServiceListing};
pub use recommend::{HttpRecommender, Recommender};
pub use routes::{AppState, SharedRecommender, router};
