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
    sqlx::query("INSERT INTO users (id, external_id, name, email) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(format!("clerk-{}", id))
        .bind("Post Tenant")
        .bind(format!("post_{}@example.com", id))
        .execute(pool)
        .await
        .expect("seed user");
    id
}

fn post_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/dashboard/posts",
            get(gbp_scheduler_backend::routes::posts::list_posts)
                .post(gbp_scheduler_backend::routes::posts::create_post_batch),
        )
        .route(
            "/api/dashboard/posts/counts",
            get(gbp_scheduler_backend::routes::posts::count_posts),
        )
        .route(
            "/api/dashboard/posts/:id",
            axum::routing::patch(gbp_scheduler_backend::routes::posts::update_post)
                .delete(gbp_scheduler_backend::routes::posts::delete_post),
        )
        .with_state(state)
}

async fn body_json(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn dashboard_post_flow_end_to_end() {
    let Some((pool, state)) = setup().await else {
        return;
    };
    let user_id = seed_user(&pool).await;
    let app = post_router(state);

    let create_body = json!({
        "user_id": user_id,
        "posts": [
            {
                "summary": "Live music this Saturday night.",
                "topic_type": "EVENT",
                "location_id": "accounts/1/locations/42",
                "metadata": {
                    "event": {
                        "title": "Saturday Sessions",
                        "schedule": {"startDate": {"year": 2025, "month": 6, "day": 7}}
                    }
                }
            },
            {
                "summary": "Autumn sale, 20% off everything.",
                "topic_type": "OFFER",
                "action_type": "LEARN_MORE",
                "action_url": "https://example.com/sale",
                "location_id": "accounts/1/locations/42"
            }
        ],
        "scheduled_publish_time": (Utc::now() + Duration::days(2)).to_rfc3339()
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/dashboard/posts")
        .header("content-type", "application/json")
        .body(Body::from(create_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["ids"].as_array().unwrap().len(), 2);

    let req = Request::builder()
        .method("GET")
        .uri(format!(
            "/api/dashboard/posts?user_id={}&status=scheduled",
            user_id
        ))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let items = body["posts"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["language_code"], "en");
    let post_id = items[0]["id"].as_str().unwrap().to_string();

    let patch_body = json!({
        "user_id": user_id,
        "summary": "Live music this Saturday night, doors at 8pm."
    });
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/dashboard/posts/{}", post_id))
        .header("content-type", "application/json")
        .body(Body::from(patch_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["summary"].as_str().unwrap().contains("doors at 8pm"));

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/dashboard/posts/counts?user_id={}", user_id))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["scheduled"], 2);
}

#[tokio::test]
async fn invalid_topic_type_rolls_back_whole_batch() {
    let Some((pool, state)) = setup().await else {
        return;
    };
    let user_id = seed_user(&pool).await;
    let app = post_router(state);

    let create_body = json!({
        "user_id": user_id,
        "posts": [
            {"summary": "Fresh bagels every morning from 7am."},
            {"summary": "Autumn sale, 20% off everything.", "topic_type": "DISCOUNT"}
        ],
        "scheduled_publish_time": (Utc::now() + Duration::days(1)).to_rfc3339()
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/dashboard/posts")
        .header("content-type", "application/json")
        .body(Body::from(create_body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("posts[1]"));

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM scheduled_posts WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 0);
}
