use std::future::Future;
use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use super::gemini::GeminiClient;
use super::prompt::build_prompt;
use super::{Advisory, ContentGenerator, GenerateError, ModelAttempt, ModelFailure};
use crate::config::Config;
use crate::fallback::{FallbackKind, fallback_questions};
use crate::models::Question;
use crate::parser::{Strategy, parse_questions};

/// Try `attempt` on each candidate in order and return the first success, or
/// every error when all of them fail.
pub async fn first_success<C, T, E, F, Fut>(
    candidates: impl IntoIterator<Item = C>,
    mut attempt: F,
) -> Result<T, Vec<E>>
where
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut errors = Vec::new();
    for candidate in candidates {
        match attempt(candidate).await {
            Ok(value) => return Ok(value),
            Err(err) => errors.push(err),
        }
    }
    Err(errors)
}

/// Questions produced by a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuiz {
    pub questions: Vec<Question>,
    pub model: String,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizOrigin {
    Model { model: String, strategy: Strategy },
    Synthesized,
    Sample,
}

/// The quiz to play, wherever it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub questions: Vec<Question>,
    pub origin: QuizOrigin,
    pub advisory: Option<Advisory>,
}

/// Sends page text to each candidate model in turn until one reply parses.
#[derive(Clone)]
pub struct QuizPipeline {
    generator: Option<Arc<dyn ContentGenerator>>,
    models: Vec<String>,
    question_count: usize,
}

impl QuizPipeline {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        models: Vec<String>,
        question_count: usize,
    ) -> Self {
        Self {
            generator: Some(generator),
            models,
            question_count,
        }
    }

    /// A Gemini-backed pipeline. Without an API key the pipeline still builds
    /// but every generation fails with [`GenerateError::MissingApiKey`].
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let generator = match config.api_key() {
            Some(key) => Some(Arc::new(GeminiClient::new(key, config)?) as Arc<dyn ContentGenerator>),
            None => None,
        };
        Ok(Self {
            generator,
            models: config.models.clone(),
            question_count: config.question_count,
        })
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Ask each model in preference order; `progress` receives status lines.
    pub async fn generate(
        &self,
        text: &str,
        progress: &(dyn Fn(String) + Send + Sync),
    ) -> Result<GeneratedQuiz, GenerateError> {
        let generator = self.generator.as_ref().ok_or(GenerateError::MissingApiKey)?;
        if self.models.is_empty() {
            return Err(GenerateError::NoModels);
        }
        let prompt = build_prompt(text, self.question_count);

        first_success(self.models.iter(), |model| {
            let prompt = &prompt;
            async move {
                info!(model = model.as_str(), "trying model");
                progress(format!("Trying model: {model}..."));

                let outcome = match generator.generate(model, prompt).await {
                    Ok(raw) => {
                        progress("Formatting questions...".to_string());
                        parse_questions(&raw).map_err(ModelFailure::from)
                    }
                    Err(failure) => Err(failure),
                };

                match outcome {
                    Ok(parsed) => {
                        info!(
                            model = model.as_str(),
                            strategy = %parsed.strategy,
                            count = parsed.questions.len(),
                            "model produced questions"
                        );
                        Ok(GeneratedQuiz {
                            questions: parsed.questions,
                            model: model.clone(),
                            strategy: parsed.strategy,
                        })
                    }
                    Err(failure) => {
                        warn!(model = model.as_str(), %failure, "model failed, trying next");
                        Err(ModelAttempt {
                            model: model.clone(),
                            failure,
                        })
                    }
                }
            }
        })
        .await
        .map_err(|attempts| GenerateError::AllModelsFailed { attempts })
    }

    /// Generate a quiz, falling back to synthesized or sample questions with
    /// an advisory when the models cannot deliver.
    pub async fn build_quiz<R>(
        &self,
        text: &str,
        progress: &(dyn Fn(String) + Send + Sync),
        rng: &mut R,
    ) -> QuizOutcome
    where
        R: Rng + Send + ?Sized,
    {
        match self.generate(text, progress).await {
            Ok(generated) => QuizOutcome {
                questions: generated.questions,
                origin: QuizOrigin::Model {
                    model: generated.model,
                    strategy: generated.strategy,
                },
                advisory: None,
            },
            Err(err) => {
                warn!(error = %err, "error generating questions");
                progress("Generating basic questions from text...".to_string());
                let (questions, kind) = fallback_questions(text, rng);
                QuizOutcome {
                    questions,
                    origin: match kind {
                        FallbackKind::Synthesized => QuizOrigin::Synthesized,
                        FallbackKind::Sample => QuizOrigin::Sample,
                    },
                    advisory: Some(err.advisory()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::parser::ParseError;

    const GOOD_REPLY: &str =
        r#"[{"question": "Q?", "answers": ["a", "b", "c", "d"], "correct": 2}]"#;

    /// Replies per model; records which models were asked.
    struct ScriptedGenerator {
        replies: HashMap<&'static str, Result<String, ModelFailure>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<(&'static str, Result<String, ModelFailure>)>) -> Arc<Self> {
            Arc::new(Self {
                replies: replies.into_iter().collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContentGenerator for ScriptedGenerator {
        async fn generate(&self, model: &str, _prompt: &str) -> Result<String, ModelFailure> {
            self.calls.lock().unwrap().push(model.to_string());
            self.replies
                .get(model)
                .cloned()
                .unwrap_or_else(|| Err(ModelFailure::Network("unknown model".into())))
        }
    }

    fn models() -> Vec<String> {
        vec!["first".into(), "second".into(), "third".into()]
    }

    fn http(status: u16) -> ModelFailure {
        ModelFailure::Http {
            status,
            message: "nope".into(),
        }
    }

    #[tokio::test]
    async fn test_first_success_stops_early() {
        let mut seen = Vec::new();
        let result: Result<u32, Vec<String>> = first_success([1u32, 2, 3], |n| {
            seen.push(n);
            async move { if n == 2 { Ok(n * 10) } else { Err(format!("{n} failed")) } }
        })
        .await;
        assert_eq!(result, Ok(20));
        assert_eq!(seen, vec![1, 2]);

        let all_fail: Result<u32, Vec<u32>> = first_success([1u32, 2], |n| async move { Err(n) }).await;
        assert_eq!(all_fail, Err(vec![1, 2]));
    }

    #[tokio::test]
    async fn test_falls_through_to_next_model() {
        let generator = ScriptedGenerator::new(vec![
            ("first", Err(http(500))),
            ("second", Ok("sorry, no quiz today".into())),
            ("third", Ok(GOOD_REPLY.into())),
        ]);
        let pipeline = QuizPipeline::new(generator.clone(), models(), 5);

        let generated = pipeline.generate("some text", &|_| {}).await.unwrap();
        assert_eq!(generated.model, "third");
        assert_eq!(generated.strategy, Strategy::Direct);
        assert_eq!(generated.questions[0].correct_answer(), "c");
        assert_eq!(generator.calls(), models());
    }

    #[tokio::test]
    async fn test_first_model_success_skips_the_rest() {
        let generator = ScriptedGenerator::new(vec![("first", Ok(format!("```json\n{GOOD_REPLY}\n```")))]);
        let pipeline = QuizPipeline::new(generator.clone(), models(), 5);

        let generated = pipeline.generate("text", &|_| {}).await.unwrap();
        assert_eq!(generated.model, "first");
        assert_eq!(generator.calls(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_all_models_failing_reports_every_attempt() {
        let generator = ScriptedGenerator::new(vec![
            ("first", Err(http(429))),
            ("second", Ok(String::new())),
        ]);
        let pipeline = QuizPipeline::new(generator, models(), 5);

        let err = pipeline.generate("text", &|_| {}).await.unwrap_err();
        let GenerateError::AllModelsFailed { attempts } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(attempts.len(), 3);
        assert_eq!(attempts[1].failure, ModelFailure::Unparseable(ParseError::Empty));
        assert_eq!(err.advisory(), Advisory::RateLimited);
    }

    #[tokio::test]
    async fn test_progress_messages_name_models() {
        let generator = ScriptedGenerator::new(vec![("first", Ok(GOOD_REPLY.into()))]);
        let pipeline = QuizPipeline::new(generator, models(), 5);
        let messages = Mutex::new(Vec::new());

        pipeline
            .generate("text", &|msg| messages.lock().unwrap().push(msg))
            .await
            .unwrap();
        let messages = messages.into_inner().unwrap();
        assert_eq!(messages[0], "Trying model: first...");
    }

    #[tokio::test]
    async fn test_missing_key_falls_back_to_sample() {
        let pipeline = QuizPipeline::from_config(&Config::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let outcome = pipeline.build_quiz("short text", &|_| {}, &mut rng).await;
        assert_eq!(outcome.origin, QuizOrigin::Sample);
        assert_eq!(outcome.advisory, Some(Advisory::InvalidKey));
        assert_eq!(outcome.questions, crate::data::sample_questions());
    }

    #[tokio::test]
    async fn test_failed_generation_synthesizes_from_long_text() {
        let generator = ScriptedGenerator::new(vec![]);
        let pipeline = QuizPipeline::new(generator, models(), 5);
        let mut rng = StdRng::seed_from_u64(5);
        let text = "The compiler is responsible for checking every borrow in the program. ".repeat(4);

        let outcome = pipeline.build_quiz(&text, &|_| {}, &mut rng).await;
        assert_eq!(outcome.origin, QuizOrigin::Synthesized);
        assert_eq!(outcome.advisory, Some(Advisory::Generic));
        assert!(!outcome.questions.is_empty());
    }

    #[tokio::test]
    async fn test_successful_generation_has_no_advisory() {
        let generator = ScriptedGenerator::new(vec![("second", Ok(GOOD_REPLY.into()))]);
        let pipeline = QuizPipeline::new(generator, models(), 5);
        let mut rng = StdRng::seed_from_u64(5);

        let outcome = pipeline.build_quiz("text", &|_| {}, &mut rng).await;
        assert_eq!(outcome.advisory, None);
        assert_eq!(
            outcome.origin,
            QuizOrigin::Model {
                model: "second".into(),
                strategy: Strategy::Direct
            }
        );
    }
}
