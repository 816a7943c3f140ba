//! Last-resort extraction of question fields with regular expressions.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::repair::{is_quote, read_string_literal};
use crate::models::{NUM_ANSWERS, Question};

static QUESTION_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']?question["']?\s*:\s*"#).expect("valid regex"));
static ANSWERS_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']?answers["']?\s*:\s*\["#).expect("valid regex"));
static CORRECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?correct["']?\s*:\s*["']?(\d+)"#).expect("valid regex")
});

/// A `question` field found in the text.
struct Entry {
    /// Byte offset where the entry's object starts.
    start: usize,
    question: String,
}

/// Pull questions out of text that resembles, but does not parse as, JSON.
///
/// The text is cut into one segment per `question` field, starting at the
/// nearest preceding `{`, and `answers`/`correct` are only looked up inside
/// that segment. Entries without exactly four answers or with an out-of-range
/// index are skipped.
pub fn extract_questions_manually(text: &str) -> Vec<Question> {
    let entries = find_entries(text);

    let mut questions = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let end = entries.get(index + 1).map_or(text.len(), |next| next.start);
        let segment = &text[entry.start..end];

        let Some(answers) = ANSWERS_KEY
            .find(segment)
            .map(|m| read_answer_list(&segment[m.end()..]))
        else {
            debug!(index, "no answers field near question");
            continue;
        };

        let Some(correct) = CORRECT
            .captures(segment)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
        else {
            debug!(index, "no correct field near question");
            continue;
        };

        let Ok(answers) = <[String; NUM_ANSWERS]>::try_from(answers) else {
            debug!(index, "question does not have four answers");
            continue;
        };

        if let Some(question) = Question::new(entry.question.as_str(), answers, correct) {
            questions.push(question);
        }
    }

    questions
}

/// Locate every `question` key followed by a quoted value. Scanning resumes
/// after each value, so a key-like phrase inside question text is not taken
/// for a new entry.
fn find_entries(text: &str) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut floor = 0;

    while let Some(key) = QUESTION_KEY.find_at(text, floor) {
        let Some((question, consumed)) = read_string_literal(&text[key.end()..]) else {
            floor = key.end();
            continue;
        };
        let start = text[floor..key.start()]
            .rfind('{')
            .map_or(key.start(), |offset| floor + offset);
        entries.push(Entry { start, question });
        floor = key.end() + consumed;
    }

    entries
}

/// Read the items of an answer list whose opening `[` was just consumed.
/// Quoted items follow the same closing-quote rule as JSON repair; bare
/// items run to the next `,` or `]`.
fn read_answer_list(list: &str) -> Vec<String> {
    let mut answers = Vec::new();
    let mut rest = list;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        match rest.chars().next() {
            None | Some(']') => break,
            Some(c) if is_quote(c) => match read_string_literal(rest) {
                Some((answer, consumed)) => {
                    answers.push(answer);
                    rest = &rest[consumed..];
                }
                None => break,
            },
            Some(_) => {
                let end = rest.find(&[',', ']'][..]).unwrap_or(rest.len());
                answers.push(rest[..end].trim().to_string());
                rest = &rest[end..];
            }
        }
    }

    answers.retain(|a| !a.trim().is_empty());
    answers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_from_broken_json() {
        let text = r#"
            {"question": "What is 2 + 2?", "answers": ["3", "4", "5", "6"], "correct": 1}
            {"question": "Capital of Italy?", "answers": ["Rome", "Milan", "Turin", "Naples"] "correct": 0
        "#;
        let questions = extract_questions_manually(text);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].correct_answer(), "4");
        assert_eq!(questions[1].correct_answer(), "Rome");
    }

    #[test]
    fn test_field_order_within_entry_does_not_matter() {
        let text = r#"[
            {"correct": 2, "answers": ["a", "b", "c", "d"], "question": "First?"},
            {"correct": 3, "answers": ["e", "f", "g", "h"], "question": "Second?"}
        ] trailing garbage {"#;
        let questions = extract_questions_manually(text);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "First?");
        assert_eq!(questions[0].correct_answer(), "c");
        assert_eq!(questions[1].question, "Second?");
        assert_eq!(questions[1].correct_answer(), "h");
    }

    #[test]
    fn test_missing_field_does_not_shift_later_entries() {
        let text = r#"
            {"question": "No answers here?", "correct": 0},
            {"question": "Second?", "answers": ["w", "x", "y", "z"], "correct": 3},
        "#;
        let questions = extract_questions_manually(text);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Second?");
        assert_eq!(questions[0].correct_answer(), "z");
    }

    #[test]
    fn test_answers_with_commas_and_escapes() {
        let text = r#"{"question": "Say \"hi\"?", "answers": ["Yes, sure", "No", "Maybe", "Later"], "correct": "0"}"#;
        let questions = extract_questions_manually(text);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Say \"hi\"?");
        assert_eq!(questions[0].answers[0], "Yes, sure");
    }

    #[test]
    fn test_rejects_wrong_answer_count_and_index() {
        let text = r#"
            {"question": "Three?", "answers": ["a", "b", "c"], "correct": 0}
            {"question": "Index?", "answers": ["a", "b", "c", "d"], "correct": 7}
        "#;
        assert!(extract_questions_manually(text).is_empty());
    }

    #[test]
    fn test_apostrophes_in_single_quoted_values() {
        let text = "{'question': 'What's Rust's mascot?', 'answers': ['Ferris', 'Gopher', 'Duke', 'Tux'], 'correct': 0} \
                    {'question': 'Who's the author?', 'answers': ['Graydon's team', 'Guido', 'Bjarne', 'James'], 'correct': 0}";
        let questions = extract_questions_manually(text);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "What's Rust's mascot?");
        assert_eq!(questions[0].correct_answer(), "Ferris");
        assert_eq!(questions[1].question, "Who's the author?");
        assert_eq!(questions[1].answers[0], "Graydon's team");
    }

    #[test]
    fn test_unescaped_inner_double_quotes_kept() {
        let text = r#"{"question": "What does "borrow" mean?", "answers": ["Take a "reference"", "Copy", "Move", "Drop"], "correct": 0}
            {"question": "Second?", "answers": ["a", "b", "c", "d"], "correct": 1}"#;
        let questions = extract_questions_manually(text);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, r#"What does "borrow" mean?"#);
        assert_eq!(questions[0].correct_answer(), r#"Take a "reference""#);
        assert_eq!(questions[1].correct_answer(), "b");
    }

    #[test]
    fn test_key_like_phrase_inside_question_is_not_an_entry() {
        let text = r#"{"question": "Which question: is first?", "answers": ["a", "b", "c", "d"], "correct": 2"#;
        let questions = extract_questions_manually(text);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Which question: is first?");
    }

    #[test]
    fn test_unquoted_answers_fall_back_to_comma_split() {
        let text = "question: 'Pick', answers: [one, two, three, four], correct: 2";
        let questions = extract_questions_manually(text);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer(), "three");
    }
}
