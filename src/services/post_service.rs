use crate::dto::post_dto::{PostEntryPayload, UpdatePostPayload};
use crate::error::{Error, Result};
use crate::models::scheduled_post::{ScheduledPost, TOPIC_TYPES};
use crate::models::status::ScheduleStatus;
use crate::services::qna_service::StatusCounts;
use sqlx::PgPool;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, user_id, location_id, account_name, summary, topic_type, \
     action_type, action_url, media_url, language_code, metadata, \
     scheduled_publish_time, status, published_at, publish_error, batch_id, \
     created_at, updated_at";

#[derive(Clone)]
pub struct ScheduledPostService {
    pool: PgPool,
}

pub struct PostBatch {
    pub batch_id: Uuid,
    pub items: Vec<ScheduledPost>,
}

pub fn validate_post_entries(entries: &[PostEntryPayload]) -> Result<()> {
    if entries.is_empty() {
        return Err(Error::BadRequest(
            "batch must contain at least one entry".to_string(),
        ));
    }
    for (index, entry) in entries.iter().enumerate() {
        if entry.summary.trim().is_empty() {
            return Err(Error::BadRequest(format!(
                "posts[{}]: summary must not be empty",
                index
            )));
        }
        if let Some(topic_type) = &entry.topic_type {
            if !TOPIC_TYPES.contains(&topic_type.as_str()) {
                return Err(Error::BadRequest(format!(
                    "posts[{}]: topic_type must be one of {}",
                    index,
                    TOPIC_TYPES.join(", ")
                )));
            }
        }
    }
    Ok(())
}

impl ScheduledPostService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_tenant(&self, user_id: Uuid) -> Result<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND is_active)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        if !exists {
            return Err(Error::Unauthorized("unknown tenant".to_string()));
        }
        Ok(())
    }

    pub async fn create_batch(
        &self,
        user_id: Uuid,
        entries: &[PostEntryPayload],
        scheduled_publish_time: chrono::DateTime<chrono::Utc>,
    ) -> Result<PostBatch> {
        validate_post_entries(entries)?;
        self.ensure_tenant(user_id).await?;

        let batch_id = Uuid::new_v4();
        let insert_sql = format!(
            "INSERT INTO scheduled_posts \
                 (user_id, location_id, account_name, summary, topic_type, action_type, \
                  action_url, media_url, language_code, metadata, \
                  scheduled_publish_time, status, batch_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'scheduled', $12) \
             RETURNING {POST_COLUMNS}"
        );

        let mut tx = self.pool.begin().await?;
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let row = sqlx::query_as::<_, ScheduledPost>(&insert_sql)
                .bind(user_id)
                .bind(entry.location_id.as_deref())
                .bind(entry.account_name.as_deref())
                .bind(entry.summary.trim())
                .bind(entry.topic_type.as_deref().unwrap_or("STANDARD"))
                .bind(entry.action_type.as_deref())
                .bind(entry.action_url.as_deref())
                .bind(entry.media_url.as_deref())
                .bind(entry.language_code.as_deref().unwrap_or("en"))
                .bind(entry.metadata.as_ref())
                .bind(scheduled_publish_time)
                .bind(batch_id)
                .fetch_one(&mut *tx)
                .await?;
            items.push(row);
        }
        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            batch_id = %batch_id,
            count = items.len(),
            "scheduled post batch created"
        );
        Ok(PostBatch { batch_id, items })
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: &UpdatePostPayload,
    ) -> Result<ScheduledPost> {
        if let Some(summary) = &patch.summary {
            if summary.trim().is_empty() {
                return Err(Error::BadRequest("summary must not be empty".to_string()));
            }
        }
        if let Some(topic_type) = &patch.topic_type {
            if !TOPIC_TYPES.contains(&topic_type.as_str()) {
                return Err(Error::BadRequest(format!(
                    "topic_type must be one of {}",
                    TOPIC_TYPES.join(", ")
                )));
            }
        }

        let update_sql = format!(
            "UPDATE scheduled_posts \
             SET summary = COALESCE($3, summary), \
                 topic_type = COALESCE($4, topic_type), \
                 action_type = COALESCE($5, action_type), \
                 action_url = COALESCE($6, action_url), \
                 media_url = COALESCE($7, media_url), \
                 language_code = COALESCE($8, language_code), \
                 metadata = COALESCE($9, metadata), \
                 scheduled_publish_time = COALESCE($10, scheduled_publish_time), \
                 updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND status = 'scheduled' \
             RETURNING {POST_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ScheduledPost>(&update_sql)
            .bind(id)
            .bind(user_id)
            .bind(patch.summary.as_deref().map(str::trim))
            .bind(patch.topic_type.as_deref())
            .bind(patch.action_type.as_deref())
            .bind(patch.action_url.as_deref())
            .bind(patch.media_url.as_deref())
            .bind(patch.language_code.as_deref())
            .bind(patch.metadata.as_ref())
            .bind(patch.scheduled_publish_time)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(row) => Ok(row),
            None => Err(self.mutation_rejection(id, user_id).await?),
        }
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM scheduled_posts \
             WHERE id = $1 AND user_id = $2 AND status = 'scheduled'",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.mutation_rejection(id, user_id).await?);
        }
        Ok(())
    }

    async fn mutation_rejection(&self, id: Uuid, user_id: Uuid) -> Result<Error> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM scheduled_posts WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match status {
            Some(status) => Error::InvalidState(format!(
                "this item is {} and can no longer be changed",
                status
            )),
            None => Error::NotFound("Scheduled post not found".to_string()),
        })
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        location_id: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<ScheduledPost>> {
        if let Some(raw) = status {
            raw.parse::<ScheduleStatus>()
                .map_err(Error::BadRequest)?;
        }

        let mut sql = format!("SELECT {POST_COLUMNS} FROM scheduled_posts WHERE user_id = $1");
        let mut next_arg = 2;
        if location_id.is_some() {
            sql.push_str(&format!(" AND location_id = ${next_arg}"));
            next_arg += 1;
        }
        if status.is_some() {
            sql.push_str(&format!(" AND status = ${next_arg}"));
        }
        sql.push_str(" ORDER BY scheduled_publish_time ASC, id ASC");

        let mut statement = sqlx::query_as::<_, ScheduledPost>(&sql).bind(user_id);
        if let Some(location_id) = location_id {
            statement = statement.bind(location_id);
        }
        if let Some(status) = status {
            statement = statement.bind(status);
        }
        Ok(statement.fetch_all(&self.pool).await?)
    }

    pub async fn count_by_status(
        &self,
        user_id: Uuid,
        location_id: Option<&str>,
    ) -> Result<StatusCounts> {
        let mut sql = String::from(
            "SELECT \
                 COUNT(*) FILTER (WHERE status = 'scheduled') AS scheduled, \
                 COUNT(*) FILTER (WHERE status = 'published') AS published, \
                 COUNT(*) FILTER (WHERE status = 'failed') AS failed \
             FROM scheduled_posts WHERE user_id = $1",
        );
        if location_id.is_some() {
            sql.push_str(" AND location_id = $2");
        }

        let mut statement = sqlx::query_as::<_, (i64, i64, i64)>(&sql).bind(user_id);
        if let Some(location_id) = location_id {
            statement = statement.bind(location_id);
        }
        let (scheduled, published, failed) = statement.fetch_one(&self.pool).await?;
        Ok(StatusCounts {
            scheduled,
            published,
            failed,
        })
    }

    pub async fn claim_due(&self) -> Result<Option<ScheduledPost>> {
        let claim_sql = format!(
            "UPDATE scheduled_posts \
             SET status = 'publishing', updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM scheduled_posts \
                 WHERE status = 'scheduled' AND scheduled_publish_time <= NOW() \
                 ORDER BY scheduled_publish_time ASC, id ASC \
                 FOR UPDATE SKIP LOCKED \
                 LIMIT 1 \
             ) \
             RETURNING {POST_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, ScheduledPost>(&claim_sql)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn mark_published(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE scheduled_posts \
             SET status = 'published', published_at = NOW(), publish_error = NULL, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = 'publishing'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            tracing::warn!(id = %id, "lost publish claim before marking published");
        }
        Ok(())
    }

    pub async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE scheduled_posts \
             SET status = 'failed', publish_error = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'publishing'",
        )
        .bind(id)
        .bind(reason)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            tracing::warn!(id = %id, "lost publish claim before marking failed");
        }
        Ok(())
    }

    pub async fn release_claim(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE scheduled_posts \
             SET status = 'scheduled', updated_at = NOW() \
             WHERE id = $1 AND status = 'publishing'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
