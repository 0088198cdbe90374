use crate::dto::generate_dto::GeneratedQna;
use crate::error::{Error, Result};
use crate::services::qna_service::{MIN_ANSWER_CHARS, MIN_QUESTION_CHARS};
use reqwest::Client;
use serde_json::Value as JsonValue;

#[derive(Clone)]
pub struct AIService {
    client: Client,
    api_key: String,
}

impl AIService {
    pub fn new(api_key: String, client: Client) -> Self {
        Self { client, api_key }
    }

    /// Generates candidate Q&A pairs for a business profile. Nothing is
    /// persisted here; the dashboard reviews the candidates and submits the
    /// kept ones as a scheduled batch.
    pub async fn generate_qna(
        &self,
        business_name: &str,
        business_info: Option<&str>,
        count: usize,
    ) -> Result<Vec<GeneratedQna>> {
        let system_prompt = r#"You are a local business marketing assistant.
Generate realistic customer questions with helpful owner answers for a Google Business Profile Q&A section.
The output must be a valid JSON object containing a 'qna' array.

Rules:
1. Generate exactly the requested number of question/answer pairs.
2. Every question must be at least 15 characters, every answer at least 5.
3. Questions should sound like real customers: hours, parking, services, pricing, accessibility.
4. Answers must be specific to the provided business details, friendly and concise.
5. Do not invent facts the business details do not support.
"#;

        let user_schema = serde_json::json!({
            "business_name": business_name,
            "business_info": business_info,
            "required_count": count,
            "schema_example": {
                "qna": [
                    {
                        "question": "What are your opening hours on weekends?",
                        "answer": "We are open 10am-4pm on Saturdays and closed on Sundays."
                    }
                ]
            }
        });

        let payload = serde_json::json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": serde_json::to_string(&user_schema)?}
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.8
        });

        let response_json = self.chat_openai(payload).await?;
        Ok(sanitize_qna(&response_json, count))
    }

    async fn chat_openai(&self, payload: JsonValue) -> Result<JsonValue> {
        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: JsonValue = response.json().await?;
        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("AI generation request failed")
                .to_string();
            return Err(Error::ExternalService(message));
        }

        extract_generation(&body)
    }
}

/// Pulls the generated JSON document out of a chat-completions body. Any
/// malformed output is the AI service's fault, not the caller's, so both
/// failure modes map to the upstream error variant.
fn extract_generation(body: &JsonValue) -> Result<JsonValue> {
    let content = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| Error::ExternalService("AI response missing content".to_string()))?;
    serde_json::from_str(content)
        .map_err(|e| Error::ExternalService(format!("AI response was not valid JSON: {}", e)))
}

/// Clamps the requested candidate count to `1..=max`, tolerating a
/// misconfigured zero maximum.
pub fn bounded_count(requested: Option<usize>, max: usize) -> usize {
    requested.unwrap_or(5).clamp(1, max.max(1))
}

/// Keeps only pairs that would survive batch validation and caps the list
/// at the requested count. Models occasionally pad or truncate output.
fn sanitize_qna(response: &JsonValue, count: usize) -> Vec<GeneratedQna> {
    let Some(entries) = response.get("qna").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let question = entry.get("question")?.as_str()?.trim().to_string();
            let answer = entry.get("answer")?.as_str()?.trim().to_string();
            if question.chars().count() < MIN_QUESTION_CHARS
                || answer.chars().count() < MIN_ANSWER_CHARS
            {
                return None;
            }
            Some(GeneratedQna { question, answer })
        })
        .take(count)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitize_drops_short_pairs_and_caps_count() {
        let response = json!({
            "qna": [
                {"question": "What are your opening hours on weekends?", "answer": "10am-4pm Saturday."},
                {"question": "Hi?", "answer": "Hello there, welcome."},
                {"question": "Do you have wheelchair access at the door?", "answer": "Yes."},
                {"question": "Is there parking available nearby for visitors?", "answer": "Yes, a free lot behind the shop."},
                {"question": "Do you take walk-ins during the week at all?", "answer": "Walk-ins welcome before noon."}
            ]
        });
        let qna = sanitize_qna(&response, 2);
        assert_eq!(qna.len(), 2);
        assert!(qna[0].question.contains("opening hours"));
        assert!(qna[1].question.contains("parking"));
    }

    #[test]
    fn sanitize_handles_missing_array() {
        assert!(sanitize_qna(&json!({"unexpected": true}), 5).is_empty());
    }

    #[test]
    fn unparseable_content_is_an_upstream_error() {
        let body = json!({
            "choices": [{"message": {"content": "Sure! Here are some questions:"}}]
        });
        let err = extract_generation(&body).unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)), "got: {err:?}");
    }

    #[test]
    fn missing_content_is_an_upstream_error() {
        let err = extract_generation(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));
    }

    #[test]
    fn valid_content_is_parsed() {
        let body = json!({
            "choices": [{"message": {"content": "{\"qna\": []}"}}]
        });
        let parsed = extract_generation(&body).unwrap();
        assert!(parsed["qna"].as_array().unwrap().is_empty());
    }

    #[test]
    fn count_is_bounded_even_with_a_zero_maximum() {
        assert_eq!(bounded_count(None, 10), 5);
        assert_eq!(bounded_count(Some(50), 10), 10);
        assert_eq!(bounded_count(Some(0), 10), 1);
        assert_eq!(bounded_count(Some(3), 0), 1);
    }
}
