use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateQnaPayload {
    pub user_id: Uuid,
    #[validate(length(min = 1))]
    pub business_name: String,
    pub business_info: Option<String>,
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQna {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateQnaResponse {
    pub qna: Vec<GeneratedQna>,
}
