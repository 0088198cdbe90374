use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduledQna {
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
