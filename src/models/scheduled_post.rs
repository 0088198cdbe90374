use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

pub const TOPIC_TYPES: [&str; 4] = ["STANDARD", "EVENT", "OFFER", "ALERT"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduledPost {
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
    /// Topic-specific payload (event schedule, offer terms) passed through
    /// to the Google Business Profile localPosts call.
    pub metadata: Option<JsonValue>,
    pub scheduled_publish_time: DateTime<Utc>,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub publish_error: Option<String>,
    pub batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
