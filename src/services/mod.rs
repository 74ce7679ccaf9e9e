pub mod database;
pub mod generation;
pub mod llm;
pub mod store;
pub mod synthesis;
pub mod transcript;
pub mod youtube;
