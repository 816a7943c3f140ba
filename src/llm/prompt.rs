/// Build the generation prompt for `text`.
///
/// The model is told to answer with nothing but a JSON array in the shape
/// [`crate::parser`] expects; the parser still assumes it will not listen.
pub fn build_prompt(text: &str, question_count: usize) -> String {
    format!(
        r#"You are a quiz generator API that returns only JSON. Generate a multiple-choice quiz based on the provided text.

CRITICAL: Your entire response must be ONLY a valid JSON array. Do not include any explanations, markdown formatting, or text outside the JSON.

Generate exactly {question_count} questions with 4 answer options each, using this exact JSON structure:
[
  {{
    "question": "Question text here?",
    "answers": ["Option A", "Option B", "Option C", "Option D"],
    "correct": 0
  }},
  {{
    "question": "Another question here?",
    "answers": ["Option A", "Option B", "Option C", "Option D"],
    "correct": 1
  }}
]

Rules:
1. The "correct" field must be a number (0-3) indicating the index of the correct answer
2. Questions must be about key concepts in the text
3. Make answers plausible but with only one clearly correct option
4. Use proper JSON syntax with double quotes for strings
5. Do not use single quotes, comments, or trailing commas

Text to generate questions from:
{text}
"#
    )
}
