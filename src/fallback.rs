//! Questions built without the model.
//!
//! Used when every candidate model failed: first a handful of questions
//! synthesized from declarative sentences in the page text, and if that
//! yields nothing, the built-in sample set.

use std::sync::LazyLock;

use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;
use tracing::{debug, info};

use crate::data::sample_questions;
use crate::models::Question;

/// Texts at or below this length are not worth synthesizing from.
pub const MIN_SYNTHESIS_CHARS: usize = 200;
const MAX_SYNTHESIZED: usize = 5;
const MIN_SENTENCE_CHARS: usize = 30;
const MAX_SENTENCE_CHARS: usize = 150;
const MIN_TARGET_WORD_CHARS: usize = 5;

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+").expect("valid regex"));
static HAS_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(is|are|was|were|has|have|had|can|could|will|would|should|may|might)\b")
        .expect("valid regex")
});
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// Where the questions of a fallback quiz came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    Synthesized,
    Sample,
}

/// Synthesized questions when `text` is long enough and has usable
/// sentences, the sample set otherwise.
pub fn fallback_questions<R: Rng + ?Sized>(text: &str, rng: &mut R) -> (Vec<Question>, FallbackKind) {
    if text.chars().count() > MIN_SYNTHESIS_CHARS {
        let questions = synthesize_questions(text, rng);
        if !questions.is_empty() {
            info!(count = questions.len(), "generated basic questions from text");
            return (questions, FallbackKind::Synthesized);
        }
    }
    info!("falling back to sample questions");
    (sample_questions(), FallbackKind::Sample)
}

/// Turn up to five declarative sentences into "what does the text say"
/// questions, with the sentence itself as the correct answer.
pub fn synthesize_questions<R: Rng + ?Sized>(text: &str, rng: &mut R) -> Vec<Question> {
    let sentences: Vec<&str> = SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| is_usable_sentence(s))
        .take(MAX_SYNTHESIZED)
        .collect();
    debug!(count = sentences.len(), "usable sentences for synthesis");

    sentences
        .into_iter()
        .filter_map(|sentence| question_from_sentence(sentence, rng))
        .collect()
}

fn is_usable_sentence(sentence: &str) -> bool {
    let len = sentence.chars().count();
    len > MIN_SENTENCE_CHARS
        && len < MAX_SENTENCE_CHARS
        && !sentence.contains('?')
        && HAS_VERB.is_match(sentence)
}

fn question_from_sentence<R: Rng + ?Sized>(sentence: &str, rng: &mut R) -> Option<Question> {
    let candidates: Vec<&str> = sentence
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_TARGET_WORD_CHARS)
        .collect();
    let target = candidates
        .choose(rng)
        .map(|w| NON_WORD.replace_all(w, "").into_owned())
        .filter(|w| !w.is_empty())
        .unwrap_or_else(|| "this".to_string());

    let mut options = vec![
        (true, sentence.to_string()),
        (false, format!("The text doesn't mention {target}.")),
        (false, format!("{target} is not important according to the text.")),
        (false, format!("{target} is mentioned but in a different context.")),
    ];
    options.shuffle(rng);

    let correct = options.iter().position(|(is_correct, _)| *is_correct)?;
    let answers: [String; 4] = options
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .try_into()
        .ok()?;

    Question::new(format!("What does the text say about {target}?"), answers, correct)
}
