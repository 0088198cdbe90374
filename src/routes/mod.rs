pub mod generate;
pub mod health;
pub mod posts;
pub mod qna;
pub mod users;
