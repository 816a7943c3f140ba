use serde::Serialize;
use serde_json::Value;

pub const NUM_ANSWERS: usize = 4;

/// A single multiple-choice question.
///
/// Always carries exactly four answers and a `correct` index below four; the
/// only way to build one from untyped JSON is [`Question::from_value`], which
/// enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub question: String,
    pub answers: [String; NUM_ANSWERS],
    pub correct: usize,
}

impl Question {
    pub fn new(
        question: impl Into<String>,
        answers: [String; NUM_ANSWERS],
        correct: usize,
    ) -> Option<Self> {
        let question = question.into().trim().to_string();
        if question.is_empty() || correct >= NUM_ANSWERS {
            return None;
        }
        let answers = answers.map(|a| a.trim().to_string());
        if answers.iter().any(String::is_empty) {
            return None;
        }
        Some(Self {
            question,
            answers,
            correct,
        })
    }

    /// Build a question from loosely-typed model output.
    ///
    /// `correct` may be an integer or a numeric string. Returns `None` when the
    /// object does not describe a valid four-answer question.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let question = obj.get("question")?.as_str()?;

        let answers: Vec<String> = obj
            .get("answers")?
            .as_array()?
            .iter()
            .map(|a| match a {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect::<Option<_>>()?;
        let answers: [String; NUM_ANSWERS] = answers.try_into().ok()?;

        let correct = match obj.get("correct")? {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.trim().parse::<u64>().ok()?,
            _ => return None,
        };

        Self::new(question, answers, usize::try_from(correct).ok()?)
    }

    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct
    }

    pub fn correct_answer(&self) -> &str {
        &self.answers[self.correct]
    }
}
