pub mod chat;
pub mod exercise;
pub mod questionnaire;
pub mod resources;
