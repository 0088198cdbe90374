use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::scheduled_qna::ScheduledQna;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QnaEntryPayload {
    #[validate(length(min = 1))]
    pub question: String,
    pub answer: Option<String>,
    pub location_id: Option<String>,
    pub account_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQnaBatchPayload {
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "batch must contain at least one entry"))]
    pub qna: Vec<QnaEntryPayload>,
    pub scheduled_publish_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQnaBatchResponse {
    pub success: bool,
    pub batch_id: Uuid,
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateQnaPayload {
    pub user_id: Uuid,
    #[validate(length(min = 1))]
    pub question: Option<String>,
    pub answer: Option<String>,
    pub scheduled_publish_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QnaListQuery {
    pub user_id: Option<Uuid>,
    pub location_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CountsQuery {
    pub user_id: Option<Uuid>,
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QnaResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Option<String>,
    pub account_name: Option<String>,
    pub question: String,
    pub answer: Option<String>,
    pub scheduled_publish_time: DateTime<Utc>,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub publish_error: Option<String>,
    pub batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QnaListResponse {
    pub qna: Vec<QnaResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCountsResponse {
    pub scheduled: i64,
    pub published: i64,
    pub failed: i64,
}

impl From<ScheduledQna> for QnaResponse {
    fn from(value: ScheduledQna) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            location_id: value.location_id,
            account_name: value.account_name,
            question: value.question,
            answer: value.answer,
            scheduled_publish_time: value.scheduled_publish_time,
            status: value.status,
            published_at: value.published_at,
            publish_error: value.publish_error,
            batch_id: value.batch_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
