pub mod cli;
pub mod config;
pub mod docs;
pub mod error;
pub mod event_log;
pub mod exec;
pub mod hooks;
pub mod llm;
pub mod safety;
pub mod session_store;
pub mod status_line;
pub mod transcript;
pub mod tts;
