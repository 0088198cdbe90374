use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::qna_dto::{
        CountsQuery, CreateQnaBatchPayload, CreateQnaBatchResponse, QnaListQuery, QnaListResponse,
        QnaResponse, StatusCountsResponse, TenantQuery, UpdateQnaPayload,
    },
    error::{Error, Result},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/dashboard/qna",
    request_body = CreateQnaBatchPayload,
    responses(
        (status = 201, description = "Batch scheduled successfully", body = Json<CreateQnaBatchResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unknown tenant")
    )
)]
#[axum::debug_handler]
pub async fn create_qna_batch(
    State(state): State<AppState>,
    Json(payload): Json<CreateQnaBatchPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let batch = state
        .qna_service
        .create_batch(payload.user_id, &payload.qna, payload.scheduled_publish_time)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateQnaBatchResponse {
            success: true,
            batch_id: batch.batch_id,
            ids: batch.items.into_iter().map(|item| item.id).collect(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/qna",
    params(
        ("user_id" = Uuid, Query, description = "Tenant ID"),
        ("location_id" = Option<String>, Query, description = "Filter by business location"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "Scheduled Q&A for the tenant", body = Json<QnaListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_qna(
    State(state): State<AppState>,
    Query(query): Query<QnaListQuery>,
) -> Result<impl IntoResponse> {
    let user_id = query
        .user_id
        .ok_or_else(|| Error::Unauthorized("user_id is required".to_string()))?;
    let items = state
        .qna_service
        .list(user_id, query.location_id.as_deref(), query.status.as_deref())
        .await?;
    Ok(Json(QnaListResponse {
        qna: items.into_iter().map(QnaResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/qna/counts",
    params(
        ("user_id" = Uuid, Query, description = "Tenant ID"),
        ("location_id" = Option<String>, Query, description = "Filter by business location")
    ),
    responses(
        (status = 200, description = "Status counts", body = Json<StatusCountsResponse>)
    )
)]
#[axum::debug_handler]
pub async fn count_qna(
    State(state): State<AppState>,
    Query(query): Query<CountsQuery>,
) -> Result<impl IntoResponse> {
    let user_id = query
        .user_id
        .ok_or_else(|| Error::Unauthorized("user_id is required".to_string()))?;
    let counts = state
        .qna_service
        .count_by_status(user_id, query.location_id.as_deref())
        .await?;
    Ok(Json(StatusCountsResponse {
        scheduled: counts.scheduled,
        published: counts.published,
        failed: counts.failed,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/dashboard/qna/{id}",
    params(
        ("id" = Uuid, Path, description = "Scheduled Q&A ID")
    ),
    request_body = UpdateQnaPayload,
    responses(
        (status = 200, description = "Updated row", body = Json<QnaResponse>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already published or failed")
    )
)]
#[axum::debug_handler]
pub async fn update_qna(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQnaPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let row = state
        .qna_service
        .update(id, payload.user_id, &payload)
        .await?;
    Ok(Json(QnaResponse::from(row)))
}

#[utoipa::path(
    delete,
    path = "/api/dashboard/qna/{id}",
    params(
        ("id" = Uuid, Path, description = "Scheduled Q&A ID"),
        ("user_id" = Uuid, Query, description = "Tenant ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already published or failed")
    )
)]
#[axum::debug_handler]
pub async fn delete_qna(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<TenantQuery>,
) -> Result<impl IntoResponse> {
    state.qna_service.delete(id, query.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
