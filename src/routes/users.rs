use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::user_dto::{RegisterUserPayload, UserResponse},
    error::Result,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/dashboard/users",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Tenant registered", body = Json<UserResponse>),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.tenant_service.register(&payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}
