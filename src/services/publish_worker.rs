use crate::error::Result;
use crate::models::scheduled_post::ScheduledPost;
use crate::models::scheduled_qna::ScheduledQna;
use crate::services::post_service::ScheduledPostService;
use crate::services::publisher_service::{PublishError, Publisher};
use crate::services::qna_service::ScheduledQnaService;
use sqlx::PgPool;
use std::sync::Arc;

/// Polls for due scheduled items and pushes them to the external publisher.
/// One item per tick; the claim in `claim_due` is what makes concurrent
/// workers safe, this loop just drives it.
pub struct PublishWorker {
    qna: ScheduledQnaService,
    posts: ScheduledPostService,
    publisher: Arc<dyn Publisher>,
}

impl PublishWorker {
    pub fn new(pool: PgPool, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            qna: ScheduledQnaService::new(pool.clone()),
            posts: ScheduledPostService::new(pool),
            publisher,
        }
    }

    /// Returns `Ok(true)` when it did work, so the caller can poll again
    /// immediately instead of sleeping.
    pub async fn run_once(&self) -> Result<bool> {
        let did_qna = self.publish_next_qna().await?;
        let did_post = self.publish_next_post().await?;
        Ok(did_qna || did_post)
    }

    async fn publish_next_qna(&self) -> Result<bool> {
        let Some(row) = self.qna.claim_due().await? else {
            return Ok(false);
        };

        let Some(location_id) = row.location_id.as_deref() else {
            // Scheduled before a location was picked; nothing to publish against.
            self.qna
                .mark_failed(row.id, "no business location selected")
                .await?;
            return Ok(true);
        };

        match self.push_qna(&row, location_id).await {
            Ok(()) => {
                self.qna.mark_published(row.id).await?;
                tracing::info!(id = %row.id, user_id = %row.user_id, "qna published");
            }
            Err(err) if err.is_transient() => {
                tracing::warn!(id = %row.id, error = %err, "transient qna publish error, requeueing");
                self.qna.release_claim(row.id).await?;
            }
            Err(err) => {
                tracing::error!(id = %row.id, error = %err, "qna publish failed");
                self.qna.mark_failed(row.id, &err.to_string()).await?;
            }
        }
        Ok(true)
    }

    async fn push_qna(
        &self,
        row: &ScheduledQna,
        location_id: &str,
    ) -> std::result::Result<(), PublishError> {
        let question_name = self
            .publisher
            .create_question(location_id, &row.question)
            .await?;
        if let Some(answer) = row.answer.as_deref() {
            // The question already exists upstream at this point. Treat any
            // answer failure as terminal rather than requeueing, which would
            // create the question a second time.
            self.publisher
                .upsert_answer(&question_name, answer)
                .await
                .map_err(|e| match e {
                    PublishError::Transient(msg) => {
                        PublishError::Permanent(format!("answer upsert failed: {}", msg))
                    }
                    permanent => permanent,
                })?;
        }
        Ok(())
    }

    async fn publish_next_post(&self) -> Result<bool> {
        let Some(row) = self.posts.claim_due().await? else {
            return Ok(false);
        };

        let Some(location_id) = row.location_id.clone() else {
            self.posts
                .mark_failed(row.id, "no business location selected")
                .await?;
            return Ok(true);
        };

        match self.push_post(&row, &location_id).await {
            Ok(()) => {
                self.posts.mark_published(row.id).await?;
                tracing::info!(id = %row.id, user_id = %row.user_id, "post published");
            }
            Err(err) if err.is_transient() => {
                tracing::warn!(id = %row.id, error = %err, "transient post publish error, requeueing");
                self.posts.release_claim(row.id).await?;
            }
            Err(err) => {
                tracing::error!(id = %row.id, error = %err, "post publish failed");
                self.posts.mark_failed(row.id, &err.to_string()).await?;
            }
        }
        Ok(true)
    }

    async fn push_post(
        &self,
        row: &ScheduledPost,
        location_id: &str,
    ) -> std::result::Result<(), PublishError> {
        self.publisher.create_post(location_id, row).await?;
        Ok(())
    }
}
