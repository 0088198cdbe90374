pub mod ai_service;
pub mod post_service;
pub mod publish_worker;
pub mod publisher_service;
pub mod qna_service;
pub mod tenant_service;
