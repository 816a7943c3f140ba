use crate::models::Question;

const SAMPLE: [(&str, [&str; 4], usize); 6] = [
    (
        "What is the capital of France?",
        ["London", "Berlin", "Paris", "Madrid"],
        2,
    ),
    (
        "Which planet is known as the Red Planet?",
        ["Venus", "Mars", "Jupiter", "Saturn"],
        1,
    ),
    ("What is 2 + 2?", ["3", "4", "5", "6"], 1),
    (
        "Who wrote 'Romeo and Juliet'?",
        ["Charles Dickens", "William Shakespeare", "Jane Austen", "Mark Twain"],
        1,
    ),
    (
        "Which element has the chemical symbol 'O'?",
        ["Gold", "Oxygen", "Osmium", "Oganesson"],
        1,
    ),
    (
        "What is the largest mammal in the world?",
        ["African Elephant", "Blue Whale", "Giraffe", "Polar Bear"],
        1,
    ),
];

/// The built-in quiz used when nothing better is available.
pub fn sample_questions() -> Vec<Question> {
    SAMPLE
        .iter()
        .filter_map(|(question, answers, correct)| {
            Question::new(*question, answers.map(String::from), *correct)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_set_is_complete() {
        let questions = sample_questions();
        assert_eq!(questions.len(), SAMPLE.len());
        assert_eq!(questions[0].correct_answer(), "Paris");
    }
}
