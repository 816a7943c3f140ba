//! Per-quiz state: which question is showing, what is selected, the score.

use thiserror::Error;

use crate::models::{NUM_ANSWERS, Question};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a quiz needs at least one question")]
    Empty,
    #[error("answer index {0} is out of range")]
    InvalidAnswer(usize),
    #[error("select an answer before submitting")]
    NothingSelected,
    #[error("the answer has already been revealed")]
    AlreadyRevealed,
    #[error("submit an answer before moving on")]
    NotRevealed,
    #[error("the quiz is already finished")]
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the user to pick and submit an answer.
    Answering,
    /// Correctness shown; selection locked until `next`.
    Revealed,
    Finished,
}

/// Result of submitting an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub chosen: usize,
    pub correct: usize,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Question(usize),
    Finished,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    current_index: usize,
    selected: Option<usize>,
    score: usize,
    answers: Vec<Option<usize>>,
    phase: Phase,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        let answers = vec![None; questions.len()];
        Ok(Self {
            questions,
            current_index: 0,
            selected: None,
            score: 0,
            answers,
            phase: Phase::Answering,
        })
    }

    pub fn current_question(&self) -> &Question {
        let index = self.current_index.min(self.questions.len() - 1);
        &self.questions[index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question_number(&self) -> usize {
        self.current_index + 1
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn can_submit(&self) -> bool {
        self.phase == Phase::Answering && self.selected.is_some()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Submitted answer per question, `None` for questions not reached.
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    pub fn select(&mut self, answer: usize) -> Result<(), SessionError> {
        match self.phase {
            Phase::Answering => {}
            Phase::Revealed => return Err(SessionError::AlreadyRevealed),
            Phase::Finished => return Err(SessionError::Finished),
        }
        if answer >= NUM_ANSWERS {
            return Err(SessionError::InvalidAnswer(answer));
        }
        self.selected = Some(answer);
        Ok(())
    }

    pub fn submit(&mut self) -> Result<Submission, SessionError> {
        match self.phase {
            Phase::Answering => {}
            Phase::Revealed => return Err(SessionError::AlreadyRevealed),
            Phase::Finished => return Err(SessionError::Finished),
        }
        let chosen = self.selected.ok_or(SessionError::NothingSelected)?;
        let correct = self.questions[self.current_index].correct;
        let is_correct = chosen == correct;

        if is_correct {
            self.score += 1;
        }
        self.answers[self.current_index] = Some(chosen);
        self.phase = Phase::Revealed;

        Ok(Submission {
            chosen,
            correct,
            is_correct,
        })
    }

    pub fn next(&mut self) -> Result<Advance, SessionError> {
        match self.phase {
            Phase::Revealed => {}
            Phase::Answering => return Err(SessionError::NotRevealed),
            Phase::Finished => return Err(SessionError::Finished),
        }
        self.selected = None;

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.phase = Phase::Answering;
            Ok(Advance::Question(self.current_index))
        } else {
            self.phase = Phase::Finished;
            Ok(Advance::Finished)
        }
    }
}
