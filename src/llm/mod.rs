//! Quiz generation through a remote language model.

mod gemini;
mod pipeline;
mod prompt;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::{GeminiClient, GenerateContentRequest, GenerateContentResponse};
pub use pipeline::{GeneratedQuiz, QuizOrigin, QuizOutcome, QuizPipeline, first_success};
pub use prompt::build_prompt;

use crate::parser::ParseError;

/// Something that turns a prompt into raw model text.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ModelFailure>;
}

/// Why a single candidate model did not produce a quiz.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelFailure {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response structure: {0}")]
    UnexpectedShape(String),

    #[error("could not parse questions: {0}")]
    Unparseable(#[from] ParseError),
}

/// A model and the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAttempt {
    pub model: String,
    pub failure: ModelFailure,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("API key is not set")]
    MissingApiKey,

    #[error("no candidate models configured")]
    NoModels,

    #[error("All Gemini models failed to generate questions ({} attempts)", attempts.len())]
    AllModelsFailed { attempts: Vec<ModelAttempt> },
}

/// What kind of problem the user should be told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    InvalidKey,
    RateLimited,
    Unparseable,
    Generic,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Advisory::InvalidKey => "Invalid API key. Please check your Gemini API key.",
            Advisory::RateLimited => "Too many requests to the Gemini API. Please try again later.",
            Advisory::Unparseable => {
                "Could not parse the response from Gemini. Using sample questions instead."
            }
            Advisory::Generic => "Failed to generate questions. Using sample questions instead.",
        }
    }
}

impl GenerateError {
    /// Classify the failure for the user-facing message.
    ///
    /// A rate limit on any model wins; a key problem needs every model to have
    /// rejected the request; unparseable needs every model to have answered.
    pub fn advisory(&self) -> Advisory {
        let attempts = match self {
            GenerateError::MissingApiKey => return Advisory::InvalidKey,
            GenerateError::NoModels => return Advisory::Generic,
            GenerateError::AllModelsFailed { attempts } => attempts,
        };
        if attempts.is_empty() {
            return Advisory::Generic;
        }

        let failures = || attempts.iter().map(|a| &a.failure);
        if failures().any(|f| matches!(f, ModelFailure::Http { status: 429, .. })) {
            Advisory::RateLimited
        } else if failures()
            .all(|f| matches!(f, ModelFailure::Http { status: 400 | 401 | 403, .. }))
        {
            Advisory::InvalidKey
        } else if failures().all(|f| matches!(f, ModelFailure::Unparseable(_))) {
            Advisory::Unparseable
        } else {
            Advisory::Generic
        }
    }
}
