//! Coerces free-form model output into quiz questions.
//!
//! Model replies are supposed to be a bare JSON array but routinely arrive
//! wrapped in prose, markdown fences or slightly broken JSON. The cascade
//! below tries progressively more forgiving strategies; the first one that
//! yields at least one valid [`Question`] wins.

mod manual;
mod repair;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::models::Question;

pub use manual::extract_questions_manually;
pub use repair::repair_json;

static ARRAY_OF_OBJECTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").expect("valid regex"));
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)[\[{].*[\]}]").expect("valid regex"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("model response was empty")]
    Empty,
    #[error("could not parse any questions from the model response")]
    Unparseable,
}

/// A parsing strategy, listed in the order the cascade tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The whole response is JSON.
    Direct,
    /// A `[{ ... }]` slice of the response is JSON.
    ArraySlice,
    /// The broadest bracketed slice, repaired if needed.
    Repaired,
    /// Field-by-field regex extraction.
    Manual,
}

impl Strategy {
    pub const CASCADE: [Strategy; 4] = [
        Strategy::Direct,
        Strategy::ArraySlice,
        Strategy::Repaired,
        Strategy::Manual,
    ];

    /// Run this strategy alone. `None` means it produced no valid question.
    pub fn apply(self, text: &str) -> Option<Vec<Question>> {
        let questions = match self {
            Strategy::Direct => parse_value(text.trim()),
            Strategy::ArraySlice => ARRAY_OF_OBJECTS
                .find(text)
                .and_then(|m| parse_value(m.as_str())),
            Strategy::Repaired => {
                let stripped = repair::strip_fences(text);
                BRACKETED.find(&stripped).and_then(|m| {
                    parse_value(m.as_str()).or_else(|| {
                        debug!("bracketed slice is not valid JSON, repairing");
                        parse_value(&repair_json(m.as_str()))
                    })
                })
            }
            Strategy::Manual => Some(extract_questions_manually(text)),
        }?;

        if questions.is_empty() {
            None
        } else {
            Some(questions)
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Direct => "direct",
            Strategy::ArraySlice => "array slice",
            Strategy::Repaired => "repaired",
            Strategy::Manual => "manual",
        };
        f.write_str(name)
    }
}

/// Questions recovered from a response and the strategy that found them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuiz {
    pub questions: Vec<Question>,
    pub strategy: Strategy,
}

/// Run the full cascade over a raw model response.
pub fn parse_questions(raw: &str) -> Result<ParsedQuiz, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    for strategy in Strategy::CASCADE {
        match strategy.apply(raw) {
            Some(questions) => {
                debug!(%strategy, count = questions.len(), "parsed model response");
                return Ok(ParsedQuiz {
                    questions,
                    strategy,
                });
            }
            None => debug!(%strategy, "strategy produced no questions"),
        }
    }

    Err(ParseError::Unparseable)
}

/// Parse JSON text and keep every entry that is a valid question.
fn parse_value(text: &str) -> Option<Vec<Question>> {
    let value: Value = serde_json::from_str(text).ok()?;
    Some(questions_from_value(&value))
}

/// Accepts an array of question objects, an object with a `questions` array,
/// or a single question object. Invalid entries are dropped.
pub fn questions_from_value(value: &Value) -> Vec<Question> {
    match value {
        Value::Array(items) => items.iter().filter_map(Question::from_value).collect(),
        Value::Object(obj) => match obj.get("questions") {
            Some(inner @ Value::Array(_)) => questions_from_value(inner),
            _ => Question::from_value(value).into_iter().collect(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_QUESTIONS: &str = r#"[
  {"question": "What is the capital of France?", "answers": ["London", "Berlin", "Paris", "Madrid"], "correct": 2},
  {"question": "Which planet is known as the Red Planet?", "answers": ["Venus", "Mars", "Jupiter", "Saturn"], "correct": 1},
  {"question": "What is 2 + 2?", "answers": ["3", "4", "5", "6"], "correct": 1},
  {"question": "Who wrote 'Romeo and Juliet'?", "answers": ["Charles Dickens", "William Shakespeare", "Jane Austen", "Mark Twain"], "correct": 1},
  {"question": "What is the largest mammal?", "answers": ["Elephant", "Blue Whale", "Giraffe", "Polar Bear"], "correct": 1}
]"#;

    fn expected() -> Vec<Question> {
        let value: Value = serde_json::from_str(FIVE_QUESTIONS).unwrap();
        questions_from_value(&value)
    }

    #[test]
    fn test_valid_array_parses_directly() {
        let parsed = parse_questions(FIVE_QUESTIONS).unwrap();
        assert_eq!(parsed.strategy, Strategy::Direct);
        assert_eq!(parsed.questions.len(), 5);
        assert_eq!(parsed.questions, expected());
        assert_eq!(parsed.questions[3].question, "Who wrote 'Romeo and Juliet'?");
    }

    #[test]
    fn test_fenced_array_recovered_by_repair_strategy() {
        let fenced = format!("```json\n{}\n```", FIVE_QUESTIONS);
        assert!(Strategy::Direct.apply(&fenced).is_none());
        assert_eq!(Strategy::Repaired.apply(&fenced), Some(expected()));
        assert_eq!(parse_questions(&fenced).unwrap().questions, expected());
    }

    #[test]
    fn test_array_embedded_in_prose() {
        let text = format!("Sure! Here is your quiz:\n{}\nGood luck!", FIVE_QUESTIONS);
        let parsed = parse_questions(&text).unwrap();
        assert_eq!(parsed.strategy, Strategy::ArraySlice);
        assert_eq!(parsed.questions, expected());
    }

    #[test]
    fn test_trailing_commas_and_bare_keys_are_repaired() {
        let text = r#"Here you go:
[
  {question: "What is 2 + 2?", answers: ["3", "4", "5", "6",], correct: 1,},
  {question: 'Largest ocean?', answers: ['Atlantic', 'Pacific', 'Indian', 'Arctic'], correct: 1},
]"#;
        let parsed = parse_questions(text).unwrap();
        assert_eq!(parsed.strategy, Strategy::Repaired);
        assert_eq!(parsed.questions.len(), 2);
        assert_eq!(parsed.questions[1].correct_answer(), "Pacific");
    }

    #[test]
    fn test_wrapped_questions_object() {
        let text = format!(r#"{{"questions": {}}}"#, FIVE_QUESTIONS);
        let parsed = parse_questions(&text).unwrap();
        assert_eq!(parsed.strategy, Strategy::Direct);
        assert_eq!(parsed.questions.len(), 5);
    }

    #[test]
    fn test_invalid_entries_are_dropped() {
        let text = r#"[
          {"question": "ok?", "answers": ["a", "b", "c", "d"], "correct": 0},
          {"question": "too few", "answers": ["a", "b"], "correct": 0},
          {"question": "bad index", "answers": ["a", "b", "c", "d"], "correct": 9}
        ]"#;
        let parsed = parse_questions(text).unwrap();
        assert_eq!(parsed.questions.len(), 1);
        assert_eq!(parsed.questions[0].question, "ok?");
    }

    #[test]
    fn test_manual_strategy_keeps_full_question_text() {
        let text = "{'question': 'What's Rust's mascot?', 'answers': ['Ferris','Gopher','Duke','Tux'], 'correct': 0} \
                    {'question': 'Which is a crab?', 'answers': ['Tux','Ferris','Duke','Gopher'], 'correct': 1}";
        let parsed = parse_questions(text).unwrap();
        assert_eq!(parsed.strategy, Strategy::Manual);
        assert_eq!(parsed.questions.len(), 2);
        assert_eq!(parsed.questions[0].question, "What's Rust's mascot?");
        assert_eq!(parsed.questions[1].correct_answer(), "Ferris");
    }

    #[test]
    fn test_empty_and_hopeless_input() {
        assert_eq!(parse_questions("   \n"), Err(ParseError::Empty));
        assert_eq!(
            parse_questions("I cannot help with that request."),
            Err(ParseError::Unparseable)
        );
        assert_eq!(parse_questions("[]"), Err(ParseError::Unparseable));
    }
}
