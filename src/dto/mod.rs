pub mod generate_dto;
pub mod post_dto;
pub mod qna_dto;
pub mod user_dto;
