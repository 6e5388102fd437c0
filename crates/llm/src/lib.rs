//! Groq-compatible chat-completion client plus the Critic and Generator
//! collaborators built on top of it.

pub mod critic;
pub mod generator;
pub mod groq;
pub mod prompts;

pub use critic::GroqCritic;
pub use generator::GroqGenerator;
pub use groq::{ChatMessage, GroqClient, GroqConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("api error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Network(format!("request timed out: {err}"))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
