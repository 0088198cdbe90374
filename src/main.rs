use axum::{
    routing::{get, post},
    Router,
};
use gbp_scheduler_backend::services::publish_worker::PublishWorker;
use gbp_scheduler_backend::services::publisher_service::GbpPublisher;
use gbp_scheduler_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool.clone());

    {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let publisher = Arc::new(GbpPublisher::new(
            config.gbp_api_base_url.clone(),
            config.gbp_token_url.clone(),
            http_client,
        ));
        let worker = PublishWorker::new(pool, publisher);
        let idle = Duration::from_millis(config.publish_poll_ms);
        tokio::spawn(async move {
            loop {
                match worker.run_once().await {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(idle).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "publish worker error");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let dashboard_api = Router::new()
        .route(
            "/api/dashboard/qna",
            get(routes::qna::list_qna).post(routes::qna::create_qna_batch),
        )
        .route("/api/dashboard/qna/counts", get(routes::qna::count_qna))
        .route("/api/dashboard/qna/generate", post(routes::generate::generate_qna))
        .route(
            "/api/dashboard/qna/:id",
            axum::routing::patch(routes::qna::update_qna).delete(routes::qna::delete_qna),
        )
        .route(
            "/api/dashboard/posts",
            get(routes::posts::list_posts).post(routes::posts::create_post_batch),
        )
        .route("/api/dashboard/posts/counts", get(routes::posts::count_posts))
        .route(
            "/api/dashboard/posts/:id",
            axum::routing::patch(routes::posts::update_post).delete(routes::posts::delete_post),
        )
        .route("/api/dashboard/users", post(routes::users::register_user))
        .layer(axum::middleware::from_fn_with_state(
            gbp_scheduler_backend::middleware::rate_limit::new_rps_state(config.dashboard_rps),
            gbp_scheduler_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(dashboard_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
