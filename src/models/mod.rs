pub mod scheduled_post;
pub mod scheduled_qna;
pub mod status;
pub mod user;
