/// Recommendation endpoints with a canned recommender.
use std::sync::Arc;

use axum::http::StatusCode;
use service_catalog::ResourceKind;
use uuid::Uuid;

mod common;
use common::{ListingSeed, StubRecommender, get_json, insert_listing, setup_test_app, setup_test_db};

#[tokio::test]
async fn test_user_recommendations_keep_rank_order() {
    let db = setup_test_db().await.unwrap();
    let mp = insert_listing(&db, ResourceKind::MediaPartner, ListingSeed::new("Radio", 0)).await;
    let rt = insert_listing(&db, ResourceKind::Rentals, ListingSeed::new("Tent", 1)).await;
    let sp = insert_listing(&db, ResourceKind::Sponsorship, ListingSeed::new("Fund", 2)).await;

    let stub = StubRecommender {
        for_user: vec![
            rt.to_string(),
            "not-a-uuid".to_string(),
            sp.to_string(),
            Uuid::new_v4().to_string(),
            mp.to_string(),
            rt.to_string(),
        ],
        similar: Vec::new(),
        fail: false,
    };
    let app = setup_test_app(db, Some(Arc::new(stub)));

    let (status, body) = get_json(&app, "/recommendations/users/u-1").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![rt.to_string(), sp.to_string(), mp.to_string()]);
    assert_eq!(body["data"][0]["service_type"], "rentals");
}

#[tokio::test]
async fn test_similar_listings_stay_within_the_kind() {
    let db = setup_test_db().await.unwrap();
    let source = insert_listing(&db, ResourceKind::Rentals, ListingSeed::new("Tent", 0)).await;
    let other_rental = insert_listing(&db, ResourceKind::Rentals, ListingSeed::new("Chairs", 1)).await;
    let media = insert_listing(&db, ResourceKind::MediaPartner, ListingSeed::new("Radio", 2)).await;

    let stub = StubRecommender {
        for_user: Vec::new(),
        similar: vec![media.to_string(), other_rental.to_string()],
        fail: false,
    };
    let app = setup_test_app(db, Some(Arc::new(stub)));

    let (status, body) = get_json(&app, &format!("/recommendations/rentals/{source}")).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], other_rental.to_string());

    let (status, _) = get_json(&app, &format!("/recommendations/catering/{source}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upstream_failure_is_a_sanitized_500() {
    let db = setup_test_db().await.unwrap();
    let stub = StubRecommender {
        for_user: Vec::new(),
        similar: Vec::new(),
        fail: true,
    };
    let app = setup_test_app(db, Some(Arc::new(stub)));

    let (status, body) = get_json(&app, "/recommendations/users/u-1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Recommendation service unavailable");
    assert!(!body.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_unconfigured_recommender() {
    let db = setup_test_db().await.unwrap();
    let app = setup_test_app(db, None);

    let (status, body) = get_json(&app, "/recommendations/users/u-1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Recommendation service is not configured");
}
