#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr,
    sea_query::{Alias, InsertStatement, Query},
};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use service_catalog::{
    ApiError, AppState, Catalog, JwtVerifier, Migrator, Recommender, ResourceKind,
    SharedRecommender, router, schema::Listing,
};

pub const JWT_SECRET: &str = "integration-test-secret";

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

pub fn setup_test_app(db: DatabaseConnection, recommender: Option<SharedRecommender>) -> Router {
    let state = AppState {
        catalog: Catalog::new(db),
        verifier: Arc::new(JwtVerifier::new(JWT_SECRET)),
        recommender,
    };
    router(state, Duration::from_secs(10))
}

/// Fixed base time so `created_at` ordering is deterministic.
pub fn at_minute(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(minute)
}

#[derive(Clone, Debug)]
pub struct ListingSeed {
    pub name: String,
    pub field: String,
    pub created_by: String,
    pub is_active: bool,
    pub is_approved: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

impl ListingSeed {
    pub fn new(name: &str, minute: i64) -> Self {
        Self {
            name: name.to_string(),
            field: "music".to_string(),
            created_by: "owner-1".to_string(),
            is_active: true,
            is_approved: true,
            is_archived: false,
            created_at: at_minute(minute),
        }
    }

    pub fn field(mut self, field: &str) -> Self {
        self.field = field.to_string();
        self
    }

    pub fn owner(mut self, uid: &str) -> Self {
        self.created_by = uid.to_string();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

async fn run(db: &DatabaseConnection, insert: &InsertStatement) {
    let backend = db.get_database_backend();
    db.execute(backend.build(insert)).await.unwrap();
}

pub async fn insert_listing(db: &DatabaseConnection, kind: ResourceKind, seed: ListingSeed) -> Uuid {
    let id = Uuid::new_v4();
    let insert = Query::insert()
        .into_table(Alias::new(kind.base_table()))
        .columns([
            Listing::Id,
            Listing::Name,
            Listing::Field,
            Listing::CreatedBy,
            Listing::IsActive,
            Listing::IsApproved,
            Listing::IsArchived,
            Listing::CreatedAt,
            Listing::LastUpdated,
        ])
        .values_panic([
            id.into(),
            seed.name.into(),
            seed.field.into(),
            seed.created_by.into(),
            seed.is_active.into(),
            seed.is_approved.into(),
            seed.is_archived.into(),
            seed.created_at.into(),
            seed.created_at.into(),
        ])
        .to_owned();
    run(db, &insert).await;
    id
}

pub async fn insert_package(db: &DatabaseConnection, kind: ResourceKind, parent: Uuid, name: &str, price: i64) {
    let table = kind.package_table().expect("kind has packages");
    let insert = Query::insert()
        .into_table(Alias::new(table))
        .columns([
            Alias::new("id"),
            Alias::new(kind.parent_key()),
            Alias::new("name"),
            Alias::new("price"),
        ])
        .values_panic([Uuid::new_v4().into(), parent.into(), name.into(), price.into()])
        .to_owned();
    run(db, &insert).await;
}

pub async fn insert_review(db: &DatabaseConnection, kind: ResourceKind, parent: Uuid, user: &str, rating: i32) {
    let insert = Query::insert()
        .into_table(Alias::new(kind.review_table()))
        .columns([
            Alias::new("id"),
            Alias::new(kind.parent_key()),
            Alias::new("user_id"),
            Alias::new("rating"),
            Alias::new("created_at"),
        ])
        .values_panic([
            Uuid::new_v4().into(),
            parent.into(),
            user.into(),
            rating.into(),
            Utc::now().into(),
        ])
        .to_owned();
    run(db, &insert).await;
}

pub async fn insert_social_media(db: &DatabaseConnection, kind: ResourceKind, parent: Uuid, name: &str, links: &str) {
    let insert = Query::insert()
        .into_table(Alias::new(kind.social_media_table()))
        .columns([
            Alias::new("id"),
            Alias::new(kind.parent_key()),
            Alias::new("name"),
            Alias::new("links"),
        ])
        .values_panic([Uuid::new_v4().into(), parent.into(), name.into(), links.into()])
        .to_owned();
    run(db, &insert).await;
}

fn sign(claims: &Value) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn token(uid: &str, role: &str) -> String {
    let exp = Utc::now().timestamp() + 3600;
    sign(&serde_json::json!({ "sub": uid, "role": role, "exp": exp }))
}

/// Token that also carries the display name and email copied onto reviews.
pub fn token_with_profile(uid: &str, role: &str, name: &str, email: &str) -> String {
    let exp = Utc::now().timestamp() + 3600;
    sign(&serde_json::json!({ "sub": uid, "role": role, "name": name, "email": email, "exp": exp }))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    send(app, request.unwrap()).await
}

pub async fn patch_json(app: &Router, uri: &str, bearer: Option<&str>, body: Value) -> (StatusCode, Value) {
    send_json(app, "PATCH", uri, bearer, Some(body)).await
}

pub async fn post_json(app: &Router, uri: &str, bearer: Option<&str>, body: Value) -> (StatusCode, Value) {
    send_json(app, "POST", uri, bearer, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
    send_json(app, "DELETE", uri, bearer, None).await
}

/// PATCH with a raw body and no content type.
pub async fn patch_raw(app: &Router, uri: &str, bearer: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("PATCH")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Ids of the `data.data` rows of a browse response, in order.
pub fn page_ids(body: &Value) -> Vec<String> {
    body["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap().to_string())
        .collect()
}

/// Canned recommender: fixed id lists, or a failure.
pub struct StubRecommender {
    pub for_user: Vec<String>,
    pub similar: Vec<String>,
    pub fail: bool,
}

#[async_trait]
impl Recommender for StubRecommender {
    async fn for_user(&self, _user_id: &str) -> Result<Vec<String>, ApiError> {
        if self.fail {
            return Err(ApiError::upstream("Recommendation service unavailable", "connection refused"));
        }
        Ok(self.for_user.clone())
    }

    async fn similar_to(&self, _kind: ResourceKind, _id: Uuid) -> Result<Vec<String>, ApiError> {
        if self.fail {
            return Err(ApiError::upstream("Recommendation service unavailable", "connection refused"));
        }
        Ok(self.similar.clone())
    }
}
