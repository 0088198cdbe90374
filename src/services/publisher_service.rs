use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value as JsonValue};

use crate::models::scheduled_post::ScheduledPost;

/// Outcome classification for the Google Business Profile boundary.
/// Transient failures keep the row in the queue; permanent ones are
/// recorded as the terminal `failed` state.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("transient publisher error: {0}")]
    Transient(String),

    #[error("publish rejected: {0}")]
    Permanent(String),
}

impl PublishError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PublishError::Transient(_))
    }
}

pub type PublishResult<T> = std::result::Result<T, PublishError>;

/// Boundary contract to the Google Business Profile Q&A and Posts APIs.
/// The worker only depends on this trait, so tests mock it out.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Creates a question under a location, returning the external
    /// question resource name.
    async fn create_question(&self, location_id: &str, text: &str) -> PublishResult<String>;

    /// Creates or replaces the owner answer on a question.
    async fn upsert_answer(&self, question_name: &str, text: &str) -> PublishResult<String>;

    /// Creates a local post under a location.
    async fn create_post(&self, location_id: &str, post: &ScheduledPost) -> PublishResult<String>;
}

/// reqwest-backed publisher. The OAuth bearer token comes from an external
/// token-management service; this component never refreshes credentials
/// itself.
#[derive(Clone)]
pub struct GbpPublisher {
    client: Client,
    base_url: String,
    token_url: String,
}

impl GbpPublisher {
    pub fn new(base_url: String, token_url: String, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_url,
        }
    }

    async fn fetch_token(&self) -> PublishResult<String> {
        let response = self
            .client
            .get(&self.token_url)
            .send()
            .await
            .map_err(|e| PublishError::Transient(format!("token service unreachable: {}", e)))?;
        if !response.status().is_success() {
            return Err(PublishError::Transient(format!(
                "token service returned {}",
                response.status()
            )));
        }
        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| PublishError::Transient(format!("bad token response: {}", e)))?;
        body.get("access_token")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| PublishError::Transient("token response missing access_token".into()))
    }

    async fn post_json(&self, path: &str, body: JsonValue) -> PublishResult<JsonValue> {
        let token = self.fetch_token().await?;
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PublishError::Transient(format!("request failed: {}", e)))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if let Some(reason) = classify_status(status) {
            let detail = upstream_message(&text).unwrap_or_else(|| status.to_string());
            return Err(match reason {
                FailureClass::Transient => PublishError::Transient(detail),
                FailureClass::Permanent => PublishError::Permanent(detail),
            });
        }
        serde_json::from_str(&text)
            .map_err(|e| PublishError::Permanent(format!("unparseable response: {}", e)))
    }

    fn resource_name(body: &JsonValue) -> PublishResult<String> {
        body.get("name")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| PublishError::Permanent("response missing resource name".into()))
    }
}

pub(crate) enum FailureClass {
    Transient,
    Permanent,
}

/// Maps an upstream HTTP status to a failure class; `None` means success.
pub(crate) fn classify_status(status: StatusCode) -> Option<FailureClass> {
    if status.is_success() {
        None
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Some(FailureClass::Transient)
    } else {
        Some(FailureClass::Permanent)
    }
}

/// Pulls the human-readable message out of a Google API error body,
/// preserving reasons like QUESTION_TEXT_TOO_SHORT for diagnostics.
pub(crate) fn upstream_message(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = error.get("message").and_then(|m| m.as_str())?;
    let reason = error
        .get("errors")
        .and_then(|e| e.get(0))
        .and_then(|e| e.get("reason"))
        .and_then(|r| r.as_str());
    Some(match reason {
        Some(reason) => format!("{}: {}", reason, message),
        None => message.to_string(),
    })
}

fn post_body(post: &ScheduledPost) -> JsonValue {
    let mut body = json!({
        "languageCode": post.language_code,
        "summary": post.summary,
        "topicType": post.topic_type,
    });
    if let (Some(action_type), Some(action_url)) = (&post.action_type, &post.action_url) {
        body["callToAction"] = json!({
            "actionType": action_type,
            "url": action_url,
        });
    }
    if let Some(media_url) = &post.media_url {
        body["media"] = json!([{ "mediaFormat": "PHOTO", "sourceUrl": media_url }]);
    }
    // Topic-specific sections (event schedule, offer terms) ride along as-is.
    if let Some(JsonValue::Object(extra)) = &post.metadata {
        for (key, value) in extra {
            body[key] = value.clone();
        }
    }
    body
}

#[async_trait]
impl Publisher for GbpPublisher {
    async fn create_question(&self, location_id: &str, text: &str) -> PublishResult<String> {
        let body = self
            .post_json(&format!("{}/questions", location_id), json!({ "text": text }))
            .await?;
        Self::resource_name(&body)
    }

    async fn upsert_answer(&self, question_name: &str, text: &str) -> PublishResult<String> {
        let body = self
            .post_json(
                &format!("{}/answers:upsert", question_name),
                json!({ "answer": { "text": text } }),
            )
            .await?;
        Self::resource_name(&body)
    }

    async fn create_post(&self, location_id: &str, post: &ScheduledPost) -> PublishResult<String> {
        let body = self
            .post_json(&format!("{}/localPosts", location_id), post_body(post))
            .await?;
        Self::resource_name(&body)
    }
}
