use std::sync::Arc;

use api_adapters::web::{build_router, AppState, USER_ID_HEADER};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use domains::{
    NewReview, ReviewKind, ReviewRepository, Role, ScoringRules, Tool, ToolRepository, User,
    UserRepository,
};
use serde_json::{json, Value};
use storage_adapters::{BroadcastEvents, MemoryStore};
use tower::ServiceExt;
use uuid::Uuid;

struct Harness {
    router: Router,
    store: Arc<MemoryStore>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let events = Arc::new(BroadcastEvents::new(16));
    let state = AppState::from_store(store.clone(), events, &ScoringRules::default());
    Harness {
        router: build_router(state),
        store,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn seed_review(store: &MemoryStore) -> (Uuid, Uuid) {
    store.upsert_user(&User::new("author", Role::User)).await.unwrap();
    store.upsert_user(&User::new("voter", Role::User)).await.unwrap();
    let tool = Tool::new("Zapier", "zapier");
    store.create_tool(&tool).await.unwrap();
    let review = NewReview {
        tool_id: tool.id,
        user_id: "author".into(),
        overall_score: Some(7.0),
        value_score: None,
        usage_score: None,
        integration_score: None,
        kind: ReviewKind::Community,
        content: None,
    }
    .into_review();
    store.create_review(&review).await.unwrap();
    (tool.id, review.id)
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness();
    let (status, body) = send(&h.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn vote_requires_identity_header() {
    let h = harness();
    let (_, review_id) = seed_review(&h.store).await;
    let (status, body) = send(
        &h.router,
        post_json(
            &format!("/api/reviews/{review_id}/votes"),
            None,
            json!({ "voteType": "helpful" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn vote_updates_counters_and_revote_overwrites() {
    let h = harness();
    let (_, review_id) = seed_review(&h.store).await;
    let uri = format!("/api/reviews/{review_id}/votes");

    let (status, body) = send(
        &h.router,
        post_json(&uri, Some("voter"), json!({ "voteType": "helpful" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["helpfulVotes"], 1);
    assert_eq!(body["totalVotes"], 1);

    let (status, body) = send(
        &h.router,
        post_json(&uri, Some("voter"), json!({ "voteType": "not_helpful" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["helpfulVotes"], 0);
    assert_eq!(body["totalVotes"], 1);
    assert_eq!(body["voteType"], "not_helpful");
}

#[tokio::test]
async fn unknown_vote_type_is_bad_request() {
    let h = harness();
    let (_, review_id) = seed_review(&h.store).await;
    let (status, body) = send(
        &h.router,
        post_json(
            &format!("/api/reviews/{review_id}/votes"),
            Some("voter"),
            json!({ "voteType": "love_it" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
    assert_eq!(h.store.ledger_counts(review_id).await, (0, 0));
}

#[tokio::test]
async fn vote_on_missing_review_is_not_found() {
    let h = harness();
    seed_review(&h.store).await;
    let (status, _) = send(
        &h.router,
        post_json(
            &format!("/api/reviews/{}/votes", Uuid::new_v4()),
            Some("voter"),
            json!({ "voteType": "helpful" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_uuid_path_ids_get_the_json_error_body() {
    let h = harness();
    seed_review(&h.store).await;

    let requests = [
        post_json(
            "/api/reviews/not-a-uuid/votes",
            Some("voter"),
            json!({ "voteType": "helpful" }),
        ),
        post_json("/api/reviews/not-a-uuid/bookmark", Some("voter"), json!({})),
        get("/api/tools/not-a-uuid/reviews"),
        get("/api/tools/not-a-uuid/verdict"),
        post_json("/api/tools/not-a-uuid/verdict", None, json!({})),
        post_json("/api/tools/not-a-uuid/scores", None, json!({})),
    ];
    for request in requests {
        let uri = request.uri().to_string();
        let (status, body) = send(&h.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "INVALID_INPUT", "{uri}");
    }
}

#[tokio::test]
async fn trust_score_reads_distinguish_never_calculated() {
    let h = harness();
    seed_review(&h.store).await;
    let uri = "/api/users/author/trust-score";

    let (status, body) = send(&h.router, get(uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_calculated");

    let (status, calculated) = send(&h.router, post_json(uri, None, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let score = calculated["score"].as_i64().unwrap();
    assert!((0..=100).contains(&score));

    let (_, body) = send(&h.router, get(uri)).await;
    assert_eq!(body["status"], "calculated");
    assert_eq!(body["score"].as_i64(), Some(score));
}

#[tokio::test]
async fn trust_score_for_unknown_user_is_not_found() {
    let h = harness();
    let (status, body) = send(&h.router, get("/api/users/nobody/trust-score")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn verdict_for_tool_without_reviews_is_insufficient_data() {
    let h = harness();
    let tool = Tool::new("Empty", "empty");
    h.store.create_tool(&tool).await.unwrap();

    let (status, body) = send(
        &h.router,
        post_json(&format!("/api/tools/{}/verdict", tool.id), None, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verdict"], Value::Null);
    assert_eq!(body["confidence"], 0.0);
    assert_eq!(body["reviewCount"], 0);
}

#[tokio::test]
async fn verdict_round_trips_through_read_endpoint() {
    let h = harness();
    let (tool_id, _) = seed_review(&h.store).await;
    let uri = format!("/api/tools/{tool_id}/verdict");

    let (_, before) = send(&h.router, get(&uri)).await;
    assert_eq!(before["status"], "not_calculated");

    let (status, calculated) = send(&h.router, post_json(&uri, None, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calculated["verdict"], "try");

    let (_, read) = send(&h.router, get(&uri)).await;
    assert_eq!(read["status"], "calculated");
    assert_eq!(read["verdict"], calculated["verdict"]);
    assert_eq!(read["confidence"], calculated["confidence"]);
    assert_eq!(read["scores"], calculated["scores"]);

    let (status, list) = send(&h.router, get("/api/verdicts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["verdict"], "try");
}

#[tokio::test]
async fn submitted_review_is_listed_for_its_tool() {
    let h = harness();
    let (tool_id, _) = seed_review(&h.store).await;

    let (status, created) = send(
        &h.router,
        post_json(
            "/api/reviews",
            Some("voter"),
            json!({ "toolId": tool_id, "overallScore": 9.5, "type": "expert" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["userId"], "voter");
    assert_eq!(created["type"], "expert");

    let (_, list) = send(&h.router, get(&format!("/api/tools/{tool_id}/reviews"))).await;
    assert_eq!(list.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn out_of_range_score_is_rejected() {
    let h = harness();
    let (tool_id, _) = seed_review(&h.store).await;
    let (status, _) = send(
        &h.router,
        post_json(
            "/api/reviews",
            Some("voter"),
            json!({ "toolId": tool_id, "overallScore": 11 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metrics_count_recorded_votes() {
    let h = harness();
    let (_, review_id) = seed_review(&h.store).await;
    send(
        &h.router,
        post_json(
            &format!("/api/reviews/{review_id}/votes"),
            Some("voter"),
            json!({ "voteType": "helpful" }),
        ),
    )
    .await;

    let response = h.router.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("breaktool_votes_cast_total{vote_type=\"helpful\"} 1"));
}
