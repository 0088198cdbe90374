use crate::dto::qna_dto::{QnaEntryPayload, UpdateQnaPayload};
use crate::error::{Error, Result};
use crate::models::scheduled_qna::ScheduledQna;
use crate::models::status::ScheduleStatus;
use sqlx::PgPool;
use uuid::Uuid;

pub const MIN_QUESTION_CHARS: usize = 15;
pub const MIN_ANSWER_CHARS: usize = 5;

const QNA_COLUMNS: &str = "id, user_id, location_id, account_name, question, answer, \
     scheduled_publish_time, status, published_at, publish_error, batch_id, \
     created_at, updated_at";

#[derive(Clone)]
pub struct ScheduledQnaService {
    pool: PgPool,
}

pub struct QnaBatch {
    pub batch_id: Uuid,
    pub items: Vec<ScheduledQna>,
}

pub struct StatusCounts {
    pub scheduled: i64,
    pub published: i64,
    pub failed: i64,
}

/// Field checks for one submitted batch. Errors carry the index of the
/// offending entry so the dashboard can highlight it.
pub fn validate_qna_entries(entries: &[QnaEntryPayload]) -> Result<()> {
    if entries.is_empty() {
        return Err(Error::BadRequest(
            "batch must contain at least one entry".to_string(),
        ));
    }
    for (index, entry) in entries.iter().enumerate() {
        if entry.question.trim().chars().count() < MIN_QUESTION_CHARS {
            return Err(Error::BadRequest(format!(
                "qna[{}]: question must be at least {} characters",
                index, MIN_QUESTION_CHARS
            )));
        }
        if let Some(answer) = &entry.answer {
            if answer.trim().chars().count() < MIN_ANSWER_CHARS {
                return Err(Error::BadRequest(format!(
                    "qna[{}]: answer must be at least {} characters",
                    index, MIN_ANSWER_CHARS
                )));
            }
        }
    }
    Ok(())
}

impl ScheduledQnaService {
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

    /// Persists one batch atomically. Either every entry lands with the same
    /// fresh `batch_id`, or nothing is written.
    pub async fn create_batch(
        &self,
        user_id: Uuid,
        entries: &[QnaEntryPayload],
        scheduled_publish_time: chrono::DateTime<chrono::Utc>,
    ) -> Result<QnaBatch> {
        validate_qna_entries(entries)?;
        self.ensure_tenant(user_id).await?;

        let batch_id = Uuid::new_v4();
        let insert_sql = format!(
            "INSERT INTO scheduled_qna \
                 (user_id, location_id, account_name, question, answer, \
                  scheduled_publish_time, status, batch_id) \
             VALUES ($1, $2, $3, $4, $5, $6, 'scheduled', $7) \
             RETURNING {QNA_COLUMNS}"
        );

        let mut tx = self.pool.begin().await?;
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let row = sqlx::query_as::<_, ScheduledQna>(&insert_sql)
                .bind(user_id)
                .bind(entry.location_id.as_deref())
                .bind(entry.account_name.as_deref())
                .bind(entry.question.trim())
                .bind(entry.answer.as_deref().map(str::trim))
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
            "scheduled qna batch created"
        );
        Ok(QnaBatch { batch_id, items })
    }

    /// Edits a row that is still awaiting publication. The status guard sits
    /// inside the UPDATE predicate so an edit racing the publish worker can
    /// never clobber a row whose state already moved on.
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: &UpdateQnaPayload,
    ) -> Result<ScheduledQna> {
        if let Some(question) = &patch.question {
            if question.trim().chars().count() < MIN_QUESTION_CHARS {
                return Err(Error::BadRequest(format!(
                    "question must be at least {} characters",
                    MIN_QUESTION_CHARS
                )));
            }
        }
        if let Some(answer) = &patch.answer {
            if answer.trim().chars().count() < MIN_ANSWER_CHARS {
                return Err(Error::BadRequest(format!(
                    "answer must be at least {} characters",
                    MIN_ANSWER_CHARS
                )));
            }
        }

        let update_sql = format!(
            "UPDATE scheduled_qna \
             SET question = COALESCE($3, question), \
                 answer = COALESCE($4, answer), \
                 scheduled_publish_time = COALESCE($5, scheduled_publish_time), \
                 updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND status = 'scheduled' \
             RETURNING {QNA_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ScheduledQna>(&update_sql)
            .bind(id)
            .bind(user_id)
            .bind(patch.question.as_deref().map(str::trim))
            .bind(patch.answer.as_deref().map(str::trim))
            .bind(patch.scheduled_publish_time)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(row) => Ok(row),
            None => Err(self.mutation_rejection(id, user_id).await?),
        }
    }

    /// Removes a row, permitted only while it is still `scheduled`.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM scheduled_qna \
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

    /// Distinguishes "row gone" from "row no longer editable" after a guarded
    /// mutation matched nothing.
    async fn mutation_rejection(&self, id: Uuid, user_id: Uuid) -> Result<Error> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM scheduled_qna WHERE id = $1 AND user_id = $2",
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
            None => Error::NotFound("Scheduled Q&A not found".to_string()),
        })
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        location_id: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<ScheduledQna>> {
        if let Some(raw) = status {
            raw.parse::<ScheduleStatus>()
                .map_err(Error::BadRequest)?;
        }

        let mut sql = format!("SELECT {QNA_COLUMNS} FROM scheduled_qna WHERE user_id = $1");
        let mut next_arg = 2;
        if location_id.is_some() {
            sql.push_str(&format!(" AND location_id = ${next_arg}"));
            next_arg += 1;
        }
        if status.is_some() {
            sql.push_str(&format!(" AND status = ${next_arg}"));
        }
        sql.push_str(" ORDER BY scheduled_publish_time ASC, id ASC");

        let mut statement = sqlx::query_as::<_, ScheduledQna>(&sql).bind(user_id);
        if let Some(location_id) = location_id {
            statement = statement.bind(location_id);
        }
        if let Some(status) = status {
            statement = statement.bind(status);
        }
        Ok(statement.fetch_all(&self.pool).await?)
    }

    /// Dashboard summary. One aggregate query so the counts are a consistent
    /// snapshot even under concurrent writes.
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
             FROM scheduled_qna WHERE user_id = $1",
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

    /// Claims the next due row for the publish worker. The claim is the
    /// status flip itself, so two workers can never pick up the same row,
    /// and a row that is already `published` can never be claimed again.
    pub async fn claim_due(&self) -> Result<Option<ScheduledQna>> {
        let claim_sql = format!(
            "UPDATE scheduled_qna \
             SET status = 'publishing', updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM scheduled_qna \
                 WHERE status = 'scheduled' AND scheduled_publish_time <= NOW() \
                 ORDER BY scheduled_publish_time ASC, id ASC \
                 FOR UPDATE SKIP LOCKED \
                 LIMIT 1 \
             ) \
             RETURNING {QNA_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, ScheduledQna>(&claim_sql)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn mark_published(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE scheduled_qna \
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
            "UPDATE scheduled_qna \
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

    /// Puts a claimed row back in the queue after a transient publisher
    /// error, to be retried on a later poll.
    pub async fn release_claim(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE scheduled_qna \
             SET status = 'scheduled', updated_at = NOW() \
             WHERE id = $1 AND status = 'publishing'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(question: &str, answer: Option<&str>) -> QnaEntryPayload {
        QnaEntryPayload {
            question: question.to_string(),
            answer: answer.map(|a| a.to_string()),
            location_id: None,
            account_name: None,
        }
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = validate_qna_entries(&[]).unwrap_err();
        assert!(err.to_string().contains("at least one entry"));
    }

    #[test]
    fn short_question_names_the_offending_index() {
        let entries = vec![
            entry("What are your opening hours?", Some("9am-5pm weekdays.")),
            entry("Do you deliver to the north side of town?", None),
            entry("Too short?", None),
        ];
        let err = validate_qna_entries(&entries).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("qna[2]"), "got: {msg}");
        assert!(msg.contains("15"), "got: {msg}");
    }

    #[test]
    fn short_answer_is_rejected() {
        let entries = vec![entry("Is parking available on site?", Some("no"))];
        let err = validate_qna_entries(&entries).unwrap_err();
        assert!(err.to_string().contains("qna[0]"));
        assert!(err.to_string().contains("5"));
    }

    #[test]
    fn question_length_counts_chars_not_bytes() {
        // 15 multibyte chars, more than 15 bytes either way
        let entries = vec![entry("ÀÀÀÀÀÀÀÀÀÀÀÀÀÀÀ", None)];
        assert!(validate_qna_entries(&entries).is_ok());
    }

    #[test]
    fn missing_answer_is_allowed() {
        let entries = vec![entry("What are your opening hours?", None)];
        assert!(validate_qna_entries(&entries).is_ok());
    }
}
