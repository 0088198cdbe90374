use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::generate_dto::{GenerateQnaPayload, GenerateQnaResponse},
    error::Result,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/dashboard/qna/generate",
    request_body = GenerateQnaPayload,
    responses(
        (status = 200, description = "AI-generated Q&A candidates", body = Json<GenerateQnaResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 502, description = "AI generation service unavailable")
    )
)]
#[axum::debug_handler]
pub async fn generate_qna(
    State(state): State<AppState>,
    Json(payload): Json<GenerateQnaPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let max = crate::config::get_config().max_generated_qna;
    let count = crate::services::ai_service::bounded_count(payload.count, max);
    let qna = state
        .ai_service
        .generate_qna(
            &payload.business_name,
            payload.business_info.as_deref(),
            count,
        )
        .await?;
    Ok(Json(GenerateQnaResponse { qna }))
}
