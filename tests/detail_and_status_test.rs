/// Single-resource lookups and the ownership-guarded status endpoints.
use axum::http::StatusCode;
use serde_json::json;
use service_catalog::ResourceKind;
use uuid::Uuid;

mod common;
use common::{
    ListingSeed, get_json, insert_listing, insert_package, insert_review, insert_social_media,
    patch_json, patch_raw, setup_test_app, setup_test_db, token,
};

#[tokio::test]
async fn test_detail_includes_children() {
    let db = setup_test_db().await.unwrap();
    let id = insert_listing(&db, ResourceKind::Rentals, ListingSeed::new("Stage kit", 0)).await;
    insert_package(&db, ResourceKind::Rentals, id, "Large", 300).await;
    insert_package(&db, ResourceKind::Rentals, id, "Compact", 120).await;
    insert_review(&db, ResourceKind::Rentals, id, "u1", 5).await;
    insert_review(&db, ResourceKind::Rentals, id, "u2", 4).await;
    insert_social_media(&db, ResourceKind::Rentals, id, "instagram", "https://instagram.com/stagekit").await;
    let app = setup_test_app(db, None);

    let (status, body) = get_json(&app, &format!("/rentals/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let detail = &body["data"];
    assert_eq!(detail["id"], id.to_string());
    assert_eq!(detail["service_type"], "rentals");
    assert_eq!(detail["min_price"], 120);
    assert!((detail["average_rating"].as_f64().unwrap() - 4.5).abs() < f64::EPSILON);

    let packages: Vec<&str> = detail["packages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(packages, vec!["Compact", "Large"]);
    assert_eq!(detail["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(detail["social_media"][0]["name"], "instagram");
}

#[tokio::test]
async fn test_sponsorship_detail_has_no_packages() {
    let db = setup_test_db().await.unwrap();
    let id = insert_listing(&db, ResourceKind::Sponsorship, ListingSeed::new("Fund", 0)).await;
    let app = setup_test_app(db, None);

    let (status, body) = get_json(&app, &format!("/sponsorship/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["packages"], json!([]));
    assert_eq!(body["data"]["min_price"], 0);
    assert!(body["data"]["average_rating"].is_null());
}

#[tokio::test]
async fn test_detail_not_found() {
    let db = setup_test_db().await.unwrap();
    let sponsorship = insert_listing(&db, ResourceKind::Sponsorship, ListingSeed::new("Fund", 0)).await;
    let app = setup_test_app(db, None);

    let (status, body) = get_json(&app, &format!("/media-partner/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], 404);

    // An id of another kind is not visible through this kind's endpoint
    let (status, _) = get_json(&app, &format!("/rentals/{sponsorship}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_change_requires_a_token() {
    let db = setup_test_db().await.unwrap();
    let id = insert_listing(&db, ResourceKind::Rentals, ListingSeed::new("Kit", 0)).await;
    let app = setup_test_app(db, None);

    let uri = format!("/rentals/{id}/activate");
    let (status, body) = patch_json(&app, &uri, None, json!({ "is_active": false })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");

    let (status, _) = patch_json(&app, &uri, Some("not-a-jwt"), json!({ "is_active": false })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_owner_can_activate_and_archive() {
    let db = setup_test_db().await.unwrap();
    let id = insert_listing(&db, ResourceKind::MediaPartner, ListingSeed::new("Radio", 0).owner("alice")).await;
    let app = setup_test_app(db, None);
    let alice = token("alice", "user");

    let (status, body) = patch_json(
        &app,
        &format!("/media-partner/{id}/activate"),
        Some(&alice),
        json!({ "is_active": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);
    assert_ne!(body["data"]["last_updated"], body["data"]["created_at"]);

    let (status, body) = patch_json(
        &app,
        &format!("/media-partner/{id}/archive"),
        Some(&alice),
        json!({ "is_archived": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_archived"], true);

    let (_, body) = get_json(&app, "/media-partner?is_archived=true&is_active=false&limit=10").await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_other_users_are_forbidden() {
    let db = setup_test_db().await.unwrap();
    let id = insert_listing(&db, ResourceKind::Rentals, ListingSeed::new("Kit", 0).owner("alice")).await;
    let app = setup_test_app(db, None);

    let (status, body) = patch_json(
        &app,
        &format!("/rentals/{id}/archive"),
        Some(&token("mallory", "user")),
        json!({ "is_archived": true }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], 403);

    let (_, body) = get_json(&app, &format!("/rentals/{id}")).await;
    assert_eq!(body["data"]["is_archived"], false);
}

#[tokio::test]
async fn test_missing_listing_is_not_found() {
    let db = setup_test_db().await.unwrap();
    let app = setup_test_app(db, None);

    let (status, _) = patch_json(
        &app,
        &format!("/sponsorship/{}/activate", Uuid::new_v4()),
        Some(&token("alice", "user")),
        json!({ "is_active": true }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_admins_approve() {
    let db = setup_test_db().await.unwrap();
    let mut seed = ListingSeed::new("Fund", 0).owner("alice");
    seed.is_approved = false;
    let id = insert_listing(&db, ResourceKind::Sponsorship, seed).await;
    let app = setup_test_app(db, None);
    let uri = format!("/sponsorship/{id}/approve");

    let (status, _) = patch_json(&app, &uri, Some(&token("alice", "user")), json!({ "is_approved": true })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) =
        patch_json(&app, &uri, Some(&token("root", "admin")), json!({ "is_approved": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_approved"], true);
}

#[tokio::test]
async fn test_admin_may_change_any_listing() {
    let db = setup_test_db().await.unwrap();
    let id = insert_listing(&db, ResourceKind::Rentals, ListingSeed::new("Kit", 0).owner("alice")).await;
    let app = setup_test_app(db, None);

    let (status, body) = patch_json(
        &app,
        &format!("/rentals/{id}/activate"),
        Some(&token("root", "admin")),
        json!({ "is_active": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);
}

fn assert_envelope(body: &serde_json::Value, status: u16) {
    assert_eq!(body["success"], false, "{body}");
    assert_eq!(body["status"], status, "{body}");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()), "{body}");
}

#[tokio::test]
async fn test_malformed_id_uses_the_error_envelope() {
    let db = setup_test_db().await.unwrap();
    let app = setup_test_app(db, None);

    let (status, body) = get_json(&app, "/rentals/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, 400);

    let (status, body) = patch_json(
        &app,
        "/rentals/42/activate",
        Some(&token("alice", "user")),
        json!({ "is_active": true }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, 400);
}

#[tokio::test]
async fn test_bad_json_bodies_use_the_error_envelope() {
    let db = setup_test_db().await.unwrap();
    let id = insert_listing(&db, ResourceKind::Rentals, ListingSeed::new("Kit", 0).owner("alice")).await;
    let app = setup_test_app(db, None);
    let uri = format!("/rentals/{id}/activate");
    let alice = token("alice", "user");

    // Missing field
    let (status, body) = patch_json(&app, &uri, Some(&alice), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, 400);

    // Wrong type
    let (status, body) = patch_json(&app, &uri, Some(&alice), json!({ "is_active": "yes" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, 400);

    // No content type, broken syntax
    let (status, body) = patch_raw(&app, &uri, &alice, "{").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_envelope(&body, 400);

    let (_, body) = get_json(&app, &format!("/rentals/{id}")).await;
    assert_eq!(body["data"]["is_active"], true);
}

#[tokio::test]
async fn test_unknown_route_uses_the_error_envelope() {
    let db = setup_test_db().await.unwrap();
    let app = setup_test_app(db, None);

    let (status, body) = get_json(&app, "/catering").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_envelope(&body, 404);
    assert_eq!(body["message"], "Route not found");
}
