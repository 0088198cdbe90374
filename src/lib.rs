pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    ai_service::AIService, post_service::ScheduledPostService, qna_service::ScheduledQnaService,
    tenant_service::TenantService,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub qna_service: ScheduledQnaService,
    pub post_service: ScheduledPostService,
    pub tenant_service: TenantService,
    pub ai_service: AIService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap();

        let qna_service = ScheduledQnaService::new(pool.clone());
        let post_service = ScheduledPostService::new(pool.clone());
        let tenant_service = TenantService::new(pool.clone());
        let ai_service = AIService::new(config.openai_api_key.clone(), http_client);

        Self {
            pool,
            qna_service,
            post_service,
            tenant_service,
            ai_service,
        }
    }
}
