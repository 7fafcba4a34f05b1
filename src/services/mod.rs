pub mod chat_stream;
pub mod exercise_runtime;
