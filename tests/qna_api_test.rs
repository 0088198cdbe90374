use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

use gbp_scheduler_backend::AppState;

async fn setup() -> Option<(sqlx::PgPool, AppState)> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = env::var("DATABASE_URL") else {
        eprintln!("skipping: DATABASE_URL not set");
        return None;
    };
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("OPENAI_API_KEY", "sk-test");
    env::set_var("GBP_API_BASE_URL", "https://mybusiness.example.com/v4");
    env::set_var("GBP_TOKEN_URL", "http://localhost/token");
    env::set_var("DASHBOARD_RPS", "100");

    gbp_scheduler_backend::config::init_config().ok();
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect(&database_url)
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    let state = AppState::new(pool.clone());
    Some((pool, state))
}

async fn seed_user(pool: &sqlx::PgPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, external_id, name, email) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(format!("clerk-{}", id))
    .bind("Test Tenant")
    .bind(format!("tenant_{}@example.com", id))
    .execute(pool)
    .await
    .expect("seed user");
    id
}

fn qna_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/dashboard/qna",
            get(gbp_scheduler_backend::routes::qna::list_qna)
                .post(gbp_scheduler_backend::routes::qna::create_qna_batch),
        )
        .route(
            "/api/dashboard/qna/counts",
            get(gbp_scheduler_backend::routes::qna::count_qna),
        )
        .route(
            "/api/dashboard/qna/:id",
            axum::routing::patch(gbp_scheduler_backend::routes::qna::update_qna)
                .delete(gbp_scheduler_backend::routes::qna::delete_qna),
        )
        .with_state(state)
}

async fn body_json(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn dashboard_qna_flow_end_to_end() {
    let Some((pool, state)) = setup().await else {
        return;
    };
    let user_id = seed_user(&pool).await;
    let app = qna_router(state);

    let publish_time = Utc::now() + Duration::hours(6);
    let create_body = json!({
        "user_id": user_id,
        "qna": [
            {
                "question": "What are your opening hours on weekends?",
                "answer": "We are open 10am-4pm on Saturdays.",
                "location_id": "accounts/1/locations/42"
            },
            {
                "question": "Is there parking available nearby for visitors?",
                "location_id": "accounts/1/locations/42"
            }
        ],
        "scheduled_publish_time": publish_time.to_rfc3339()
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/dashboard/qna")
        .header("content-type", "application/json")
        .body(Body::from(create_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    let batch_id = body["batch_id"].as_str().unwrap().to_string();
    assert_eq!(body["ids"].as_array().unwrap().len(), 2);

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/dashboard/qna?user_id={}", user_id))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let items = body["qna"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    for item in items {
        assert_eq!(item["status"], "scheduled");
        assert!(item["published_at"].is_null());
        assert_eq!(item["batch_id"].as_str().unwrap(), batch_id);
    }
    let first_id = items[0]["id"].as_str().unwrap().to_string();

    let patch_body = json!({
        "user_id": user_id,
        "answer": "Yes, we have a free lot behind the shop."
    });
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/dashboard/qna/{}", first_id))
        .header("content-type", "application/json")
        .body(Body::from(patch_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["answer"], "Yes, we have a free lot behind the shop.");
    assert_eq!(body["user_id"].as_str().unwrap(), user_id.to_string());

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/dashboard/qna/counts?user_id={}", user_id))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["scheduled"], 2);
    assert_eq!(body["published"], 0);
    assert_eq!(body["failed"], 0);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/dashboard/qna/{}?user_id={}", first_id, user_id))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn invalid_entry_rolls_back_whole_batch() {
    let Some((pool, state)) = setup().await else {
        return;
    };
    let user_id = seed_user(&pool).await;
    let app = qna_router(state);

    let good = "What are your opening hours on weekends?";
    let create_body = json!({
        "user_id": user_id,
        "qna": [
            {"question": good},
            {"question": good},
            {"question": good},
            {"question": "Too short?"},
            {"question": good}
        ],
        "scheduled_publish_time": (Utc::now() + Duration::hours(1)).to_rfc3339()
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/dashboard/qna")
        .header("content-type", "application/json")
        .body(Body::from(create_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("qna[3]"), "got: {error}");
    assert!(error.contains("15"), "got: {error}");

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM scheduled_qna WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 0, "no partial batch may be persisted");
}

#[tokio::test]
async fn list_orders_by_publish_time_then_id() {
    let Some((pool, state)) = setup().await else {
        return;
    };
    let user_id = seed_user(&pool).await;
    let app = qna_router(state.clone());

    let base = Utc::now() + Duration::days(1);
    // Inserted out of order on purpose
    for offset in [2i64, 0, 1] {
        let body = json!({
            "user_id": user_id,
            "qna": [{"question": format!("Do you deliver to the north side? (t+{offset})")}],
            "scheduled_publish_time": (base + Duration::hours(offset)).to_rfc3339()
        });
        let req = Request::builder()
            .method("POST")
            .uri("/api/dashboard/qna")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/dashboard/qna?user_id={}", user_id))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let body = body_json(resp).await;
    let questions: Vec<&str> = body["qna"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["question"].as_str().unwrap())
        .collect();
    assert!(questions[0].contains("t+0"));
    assert!(questions[1].contains("t+1"));
    assert!(questions[2].contains("t+2"));
}

#[tokio::test]
async fn published_row_rejects_mutation() {
    let Some((pool, state)) = setup().await else {
        return;
    };
    let user_id = seed_user(&pool).await;
    let app = qna_router(state);

    let create_body = json!({
        "user_id": user_id,
        "qna": [{"question": "What are your opening hours on weekends?"}],
        "scheduled_publish_time": (Utc::now() + Duration::hours(1)).to_rfc3339()
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/dashboard/qna")
        .header("content-type", "application/json")
        .body(Body::from(create_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let body = body_json(resp).await;
    let id = body["ids"][0].as_str().unwrap().to_string();

    // Simulate the external worker having published the row.
    sqlx::query(
        "UPDATE scheduled_qna SET status = 'published', published_at = NOW() WHERE id = $1",
    )
    .bind(Uuid::parse_str(&id).unwrap())
    .execute(&pool)
    .await
    .unwrap();

    let patch_body = json!({
        "user_id": user_id,
        "question": "Can I still change this question after publish?"
    });
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/dashboard/qna/{}", id))
        .header("content-type", "application/json")
        .body(Body::from(patch_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/dashboard/qna/{}?user_id={}", id, user_id))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Row is untouched by the rejected mutations.
    let (question, status): (String, String) = sqlx::query_as(
        "SELECT question, status FROM scheduled_qna WHERE id = $1",
    )
    .bind(Uuid::parse_str(&id).unwrap())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(question, "What are your opening hours on weekends?");
    assert_eq!(status, "published");
}

#[tokio::test]
async fn unknown_tenant_is_unauthorized() {
    let Some((_pool, state)) = setup().await else {
        return;
    };
    let app = qna_router(state);

    let create_body = json!({
        "user_id": Uuid::new_v4(),
        "qna": [{"question": "What are your opening hours on weekends?"}],
        "scheduled_publish_time": (Utc::now() + Duration::hours(1)).to_rfc3339()
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/dashboard/qna")
        .header("content-type", "application/json")
        .body(Body::from(create_body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
