use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::models::scheduled_post::ScheduledPost;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PostEntryPayload {
    #[validate(length(min = 1))]
    pub summary: String,
    pub topic_type: Option<String>,
    pub action_type: Option<String>,
    pub action_url: Option<String>,
    pub media_url: Option<String>,
    pub language_code: Option<String>,
    pub metadata: Option<JsonValue>,
    pub location_id: Option<String>,
    pub account_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostBatchPayload {
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "batch must contain at least one entry"))]
    pub posts: Vec<PostEntryPayload>,
    pub scheduled_publish_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostBatchResponse {
    pub success: bool,
    pub batch_id: Uuid,
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePostPayload {
    pub user_id: Uuid,
    #[validate(length(min = 1))]
    pub summary: Option<String>,
    pub topic_type: Option<String>,
    pub action_type: Option<String>,
    pub action_url: Option<String>,
    pub media_url: Option<String>,
    pub language_code: Option<String>,
    pub metadata: Option<JsonValue>,
    pub scheduled_publish_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Option<String>,
    pub account_name: Option<String>,
    pub summary: String,
    pub topic_type: String,
    pub action_type: Option<String>,
    pub action_url: Option<String>,
    pub media_url: Option<String>,
    pub language_code: String,
    pub metadata: Option<JsonValue>,
    pub scheduled_publish_time: DateTime<Utc>,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub publish_error: Option<String>,
    pub batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
}

impl From<ScheduledPost> for PostResponse {
    fn from(value: ScheduledPost) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            location_id: value.location_id,
            account_name: value.account_name,
            summary: value.summary,
            topic_type: value.topic_type,
            action_type: value.action_type,
            action_url: value.action_url,
            media_url: value.media_url,
            language_code: value.language_code,
            metadata: value.metadata,
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
