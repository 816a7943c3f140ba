use tracing::{info, warn};

use crate::data::sample_questions;
use crate::extract::{DEFAULT_MAX_CHARS, ExtractedText, PageContext, extract_text};
use crate::llm::{QuizOrigin, QuizOutcome};
use crate::models::{AppState, NUM_ANSWERS, Question, TextSource};
use crate::session::{Advance, Phase, QuizSession};

/// Progress reported by the background generation task.
#[derive(Debug)]
pub enum LoadingEvent {
    Status(String),
    Done(QuizOutcome),
}

/// What the event loop has to do after a start request.
#[derive(Debug, PartialEq, Eq)]
pub enum StartAction {
    /// Send this text to the model.
    Generate(String),
    /// The quiz started from preloaded questions.
    Started,
    /// Extraction failed; an alert is showing.
    Failed,
}

pub struct App {
    pub state: AppState,
    page: PageContext,
    max_chars: usize,
    source: TextSource,
    preloaded: Option<Vec<Question>>,
    session: Option<QuizSession>,
    cursor: usize,
    status: String,
    alert: Option<String>,
    origin: Option<QuizOrigin>,
    result_scroll: usize,
}

impl App {
    pub fn new(page: PageContext, max_chars: usize) -> Self {
        Self {
            state: AppState::Start,
            page,
            max_chars,
            source: TextSource::FullPage,
            preloaded: None,
            session: None,
            cursor: 0,
            status: String::new(),
            alert: None,
            origin: None,
            result_scroll: 0,
        }
    }

    /// An app that skips generation and plays `questions`.
    pub fn with_questions(questions: Vec<Question>) -> Self {
        let mut app = Self::new(PageContext::default(), DEFAULT_MAX_CHARS);
        app.preloaded = Some(questions);
        app
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn source(&self) -> TextSource {
        self.source
    }

    pub fn has_preloaded_questions(&self) -> bool {
        self.preloaded.is_some()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn origin(&self) -> Option<&QuizOrigin> {
        self.origin.as_ref()
    }

    pub fn result_scroll(&self) -> usize {
        self.result_scroll
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn toggle_source(&mut self) {
        self.source = match self.source {
            TextSource::FullPage => TextSource::Selection,
            TextSource::Selection => TextSource::FullPage,
        };
    }

    /// Start → Loading. Extracts the page text for `source`; on failure the
    /// app stays on the start screen with an alert.
    pub fn begin(&mut self, source: TextSource) -> StartAction {
        self.source = source;

        if let Some(questions) = self.preloaded.clone() {
            self.start_quiz(questions, None);
            return StartAction::Started;
        }

        match extract_text(&self.page, source, self.max_chars) {
            Ok(ExtractedText { text, truncated }) => {
                self.state = AppState::Loading;
                self.status = if truncated {
                    "Text is long, trimming to improve results...".to_string()
                } else {
                    "Analyzing text...".to_string()
                };
                StartAction::Generate(text)
            }
            Err(err) => {
                warn!(error = %err, "failed to extract text");
                self.state = AppState::Start;
                self.alert = Some(err.to_string());
                StartAction::Failed
            }
        }
    }

    /// Apply an event from the generation task. Ignored unless loading.
    pub fn handle_loading_event(&mut self, event: LoadingEvent) {
        if self.state != AppState::Loading {
            return;
        }
        match event {
            LoadingEvent::Status(status) => self.status = status,
            LoadingEvent::Done(outcome) => {
                if let Some(advisory) = outcome.advisory {
                    self.alert = Some(advisory.message().to_string());
                }
                self.start_quiz(outcome.questions, Some(outcome.origin));
            }
        }
    }

    /// Abandon generation and play the built-in questions.
    pub fn use_sample_questions(&mut self) {
        self.start_quiz(sample_questions(), Some(QuizOrigin::Sample));
    }

    fn start_quiz(&mut self, questions: Vec<Question>, origin: Option<QuizOrigin>) {
        let (session, origin) = match QuizSession::new(questions) {
            Ok(session) => (session, origin),
            Err(err) => {
                warn!(error = %err, "invalid quiz data, using sample questions instead");
                match QuizSession::new(sample_questions()) {
                    Ok(session) => (session, Some(QuizOrigin::Sample)),
                    Err(_) => return,
                }
            }
        };
        info!(total = session.total(), "starting quiz");
        self.session = Some(session);
        self.origin = origin;
        self.cursor = 0;
        self.result_scroll = 0;
        self.state = AppState::Quiz;
    }

    pub fn select_next_option(&mut self) {
        if self.is_answering() {
            self.cursor = (self.cursor + 1) % NUM_ANSWERS;
        }
    }

    pub fn select_previous_option(&mut self) {
        if self.is_answering() {
            self.cursor = (self.cursor + NUM_ANSWERS - 1) % NUM_ANSWERS;
        }
    }

    /// Mark `index` as the chosen answer.
    pub fn choose(&mut self, index: usize) {
        if let Some(session) = self.session.as_mut() {
            if session.select(index).is_ok() {
                self.cursor = index;
            }
        }
    }

    /// Enter: pick the option under the cursor, submit an already picked
    /// option, or move on after the reveal.
    pub fn confirm(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        match session.phase() {
            Phase::Answering if session.selected() == Some(self.cursor) => self.submit_answer(),
            Phase::Answering => self.choose(self.cursor),
            Phase::Revealed => self.next_question(),
            Phase::Finished => self.state = AppState::Result,
        }
    }

    pub fn submit_answer(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Ok(submission) = session.submit() {
                info!(
                    question = session.current_question_number(),
                    correct = submission.is_correct,
                    "answer submitted"
                );
            }
        }
    }

    pub fn next_question(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.next() {
            Ok(Advance::Question(_)) => self.cursor = 0,
            Ok(Advance::Finished) => {
                info!(score = session.score(), total = session.total(), "quiz complete");
                self.state = AppState::Result;
            }
            Err(_) => {}
        }
    }

    pub fn calculate_score(&self) -> usize {
        self.session.as_ref().map_or(0, QuizSession::score)
    }

    pub fn total_questions(&self) -> usize {
        self.session.as_ref().map_or(0, QuizSession::total)
    }

    pub fn scroll_results_down(&mut self) {
        let max_scroll = self.total_questions().saturating_sub(1);
        self.result_scroll = (self.result_scroll + 1).min(max_scroll);
    }

    pub fn scroll_results_up(&mut self) {
        self.result_scroll = self.result_scroll.saturating_sub(1);
    }

    pub fn restart(&mut self) {
        self.state = AppState::Start;
        self.session = None;
        self.origin = None;
        self.cursor = 0;
        self.result_scroll = 0;
        self.status.clear();
        self.alert = None;
    }

    fn is_answering(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.phase() == Phase::Answering)
    }
}
