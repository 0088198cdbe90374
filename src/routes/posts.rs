use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::post_dto::{
        CreatePostBatchPayload, CreatePostBatchResponse, PostListResponse, PostResponse,
        UpdatePostPayload,
    },
    dto::qna_dto::{CountsQuery, QnaListQuery, StatusCountsResponse, TenantQuery},
    error::{Error, Result},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/dashboard/posts",
    request_body = CreatePostBatchPayload,
    responses(
        (status = 201, description = "Batch scheduled successfully", body = Json<CreatePostBatchResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unknown tenant")
    )
)]
#[axum::debug_handler]
pub async fn create_post_batch(
    State(state): State<AppState>,
    Json(payload): Json<CreatePostBatchPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let batch = state
        .post_service
        .create_batch(
            payload.user_id,
            &payload.posts,
            payload.scheduled_publish_time,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatePostBatchResponse {
            success: true,
            batch_id: batch.batch_id,
            ids: batch.items.into_iter().map(|item| item.id).collect(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/posts",
    params(
        ("user_id" = Uuid, Query, description = "Tenant ID"),
        ("location_id" = Option<String>, Query, description = "Filter by business location"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "Scheduled posts for the tenant", body = Json<PostListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<QnaListQuery>,
) -> Result<impl IntoResponse> {
    let user_id = query
        .user_id
        .ok_or_else(|| Error::Unauthorized("user_id is required".to_string()))?;
    let items = state
        .post_service
        .list(user_id, query.location_id.as_deref(), query.status.as_deref())
        .await?;
    Ok(Json(PostListResponse {
        posts: items.into_iter().map(PostResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/posts/counts",
    params(
        ("user_id" = Uuid, Query, description = "Tenant ID"),
        ("location_id" = Option<String>, Query, description = "Filter by business location")
    ),
    responses(
        (status = 200, description = "Status counts", body = Json<StatusCountsResponse>)
    )
)]
#[axum::debug_handler]
pub async fn count_posts(
    State(state): State<AppState>,
    Query(query): Query<CountsQuery>,
) -> Result<impl IntoResponse> {
    let user_id = query
        .user_id
        .ok_or_else(|| Error::Unauthorized("user_id is required".to_string()))?;
    let counts = state
        .post_service
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
    path = "/api/dashboard/posts/{id}",
    params(
        ("id" = Uuid, Path, description = "Scheduled post ID")
    ),
    request_body = UpdatePostPayload,
    responses(
        (status = 200, description = "Updated row", body = Json<PostResponse>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already published or failed")
    )
)]
#[axum::debug_handler]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let row = state
        .post_service
        .update(id, payload.user_id, &payload)
        .await?;
    Ok(Json(PostResponse::from(row)))
}

#[utoipa::path(
    delete,
    path = "/api/dashboard/posts/{id}",
    params(
        ("id" = Uuid, Path, description = "Scheduled post ID"),
        ("user_id" = Uuid, Query, description = "Tenant ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already published or failed")
    )
)]
#[axum::debug_handler]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<TenantQuery>,
) -> Result<impl IntoResponse> {
    state.post_service.delete(id, query.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
