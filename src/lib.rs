//! # page-quiz
//!
//! Turns the text of a page into a short multiple-choice quiz and plays it
//! in the terminal.
//!
//! Text is sent to a list of Gemini models in order of preference; whatever
//! comes back is coerced into questions by a cascade of parsers. When no
//! model delivers, questions are synthesized from the text itself, or a
//! built-in sample set is used.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use page_quiz::{Config, PageContext, Quiz, QuizError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QuizError> {
//!     let page = PageContext::new("Ferris is the unofficial mascot of Rust.");
//!     let quiz = Quiz::new(page, &Config::default())?;
//!     quiz.run().await
//! }
//! ```

mod app;
pub mod config;
mod data;
pub mod extract;
pub mod fallback;
pub mod llm;
mod models;
pub mod parser;
pub mod session;
pub mod telemetry;
pub mod terminal;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::info;

pub use app::{App, LoadingEvent, StartAction};
pub use config::Config;
pub use data::{LoadError, load_questions_from_json, sample_questions};
pub use extract::{ExtractError, ExtractedText, PageContext, extract_text};
pub use llm::{Advisory, QuizOrigin, QuizOutcome, QuizPipeline};
pub use models::{AppState, NUM_ANSWERS, Question, TextSource};
pub use session::QuizSession;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Failed to load questions: {0}")]
    Load(#[from] LoadError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// A quiz that can be run in the terminal.
pub struct Quiz {
    app: App,
    pipeline: Option<QuizPipeline>,
    initial_source: Option<TextSource>,
}

impl Quiz {
    /// A quiz generated from `page` using the models in `config`.
    pub fn new(page: PageContext, config: &Config) -> Result<Self, QuizError> {
        Ok(Self {
            app: App::new(page, config.max_chars),
            pipeline: Some(QuizPipeline::from_config(config)?),
            initial_source: None,
        })
    }

    /// A quiz over fixed questions; no model is contacted.
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            app: App::with_questions(questions),
            pipeline: None,
            initial_source: None,
        }
    }

    /// Load a quiz from a JSON file.
    ///
    /// ```rust,no_run
    /// use page_quiz::Quiz;
    ///
    /// let quiz = Quiz::from_json("questions.json").expect("Failed to load quiz");
    /// ```
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self, QuizError> {
        let questions = load_questions_from_json(path)?;
        Ok(Self::with_questions(questions))
    }

    /// Skip the start screen and begin generating from `source`.
    pub fn start_with(mut self, source: TextSource) -> Self {
        self.initial_source = Some(source);
        self
    }

    /// Take over the terminal until the user quits.
    pub async fn run(mut self) -> Result<(), QuizError> {
        let mut term = terminal::init()?;
        let result = run_event_loop(
            &mut term,
            &mut self.app,
            self.pipeline.as_ref(),
            self.initial_source,
        )
        .await;
        terminal::restore()?;
        result
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }
}

/// What the event loop does after a key press.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    None,
    Quit,
    Start(TextSource),
    CancelGeneration,
}

async fn run_event_loop(
    terminal: &mut terminal::AppTerminal,
    app: &mut App,
    pipeline: Option<&QuizPipeline>,
    initial_source: Option<TextSource>,
) -> Result<(), QuizError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut generation: Option<JoinHandle<()>> = None;

    if let Some(source) = initial_source {
        generation = start(app, pipeline, source, &tx);
    }

    loop {
        while let Ok(event) = rx.try_recv() {
            app.handle_loading_event(event);
        }

        terminal.draw(|frame| ui::render(frame, app))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match handle_input(app, key.code) {
            Action::None => {}
            Action::Quit => break,
            Action::Start(source) => {
                if let Some(task) = generation.take() {
                    task.abort();
                }
                generation = start(app, pipeline, source, &tx);
            }
            Action::CancelGeneration => {
                if let Some(task) = generation.take() {
                    info!("generation skipped, using sample questions");
                    task.abort();
                }
                app.use_sample_questions();
            }
        }
    }

    if let Some(task) = generation {
        task.abort();
    }
    Ok(())
}

fn start(
    app: &mut App,
    pipeline: Option<&QuizPipeline>,
    source: TextSource,
    tx: &UnboundedSender<LoadingEvent>,
) -> Option<JoinHandle<()>> {
    match app.begin(source) {
        StartAction::Generate(text) => match pipeline {
            Some(pipeline) => Some(spawn_generation(pipeline.clone(), text, tx.clone())),
            None => {
                app.use_sample_questions();
                None
            }
        },
        StartAction::Started | StartAction::Failed => None,
    }
}

/// Run the pipeline off the UI task, reporting progress over `tx`.
fn spawn_generation(
    pipeline: QuizPipeline,
    text: String,
    tx: UnboundedSender<LoadingEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let status_tx = tx.clone();
        let progress = move |status: String| {
            let _ = status_tx.send(LoadingEvent::Status(status));
        };
        let mut rng = StdRng::from_entropy();
        let outcome = pipeline.build_quiz(&text, &progress, &mut rng).await;
        let _ = tx.send(LoadingEvent::Done(outcome));
    })
}

fn handle_input(app: &mut App, key: KeyCode) -> Action {
    if app.alert().is_some() {
        app.dismiss_alert();
        return Action::None;
    }

    match app.state {
        AppState::Start => handle_start_input(app, key),
        AppState::Loading => handle_loading_input(key),
        AppState::Quiz => handle_quiz_input(app, key),
        AppState::Result => handle_result_input(app, key),
    }
}

fn handle_start_input(app: &mut App, key: KeyCode) -> Action {
    match key {
        KeyCode::Enter => Action::Start(app.source()),
        KeyCode::Char('f') | KeyCode::Char('F') => Action::Start(TextSource::FullPage),
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char('h') | KeyCode::Char('H') => {
            Action::Start(TextSource::Selection)
        }
        KeyCode::Up | KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('k') | KeyCode::Tab => {
            app.toggle_source();
            Action::None
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,
        _ => Action::None,
    }
}

fn handle_loading_input(key: KeyCode) -> Action {
    match key {
        KeyCode::Char('u') | KeyCode::Char('U') => Action::CancelGeneration,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,
        _ => Action::None,
    }
}

fn handle_quiz_input(app: &mut App, key: KeyCode) -> Action {
    match key {
        KeyCode::Up | KeyCode::Char('k') => app.select_previous_option(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_option(),
        KeyCode::Char(c @ '1'..='4') => app.choose(c as usize - '1' as usize),
        KeyCode::Char(c @ 'a'..='d') => app.choose(c as usize - 'a' as usize),
        KeyCode::Char(' ') => app.choose(app.cursor()),
        KeyCode::Enter => app.confirm(),
        KeyCode::Char('n') | KeyCode::Char('N') => app.next_question(),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Action::Quit,
        _ => {}
    }
    Action::None
}

fn handle_result_input(app: &mut App, key: KeyCode) -> Action {
    match key {
        KeyCode::Down | KeyCode::Char('j') => app.scroll_results_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_results_up(),
        KeyCode::Char('r') | KeyCode::Char('R') => app.restart(),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Action::Quit,
        _ => {}
    }
    Action::None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz_app() -> App {
        let mut app = App::with_questions(sample_questions());
        app.begin(TextSource::FullPage);
        app
    }

    #[test]
    fn test_start_keys_pick_source() {
        let mut app = App::new(PageContext::new("text"), 100);
        assert_eq!(handle_input(&mut app, KeyCode::Char('s')), Action::Start(TextSource::Selection));
        assert_eq!(handle_input(&mut app, KeyCode::Char('f')), Action::Start(TextSource::FullPage));
        handle_input(&mut app, KeyCode::Down);
        assert_eq!(handle_input(&mut app, KeyCode::Enter), Action::Start(TextSource::Selection));
        assert_eq!(handle_input(&mut app, KeyCode::Char('q')), Action::Quit);
    }

    #[test]
    fn test_loading_skip_key() {
        let mut app = App::new(PageContext::new("text"), 100);
        app.begin(TextSource::FullPage);
        assert_eq!(handle_input(&mut app, KeyCode::Char('u')), Action::CancelGeneration);
        assert_eq!(handle_input(&mut app, KeyCode::Char('x')), Action::None);
    }

    #[test]
    fn test_number_and_letter_keys_select_answers() {
        let mut app = quiz_app();
        handle_input(&mut app, KeyCode::Char('3'));
        assert_eq!(app.session().unwrap().selected(), Some(2));
        handle_input(&mut app, KeyCode::Char('b'));
        assert_eq!(app.session().unwrap().selected(), Some(1));
        assert_eq!(app.cursor(), 1);
    }

    #[test]
    fn test_enter_then_n_walks_the_quiz() {
        let mut app = quiz_app();
        handle_input(&mut app, KeyCode::Char('c'));
        handle_input(&mut app, KeyCode::Enter);
        assert_eq!(app.calculate_score(), 1);
        handle_input(&mut app, KeyCode::Char('n'));
        assert_eq!(app.session().unwrap().current_index(), 1);
    }

    #[test]
    fn test_alert_swallows_next_key() {
        let mut app = App::new(PageContext::new(""), 100);
        app.begin(TextSource::FullPage);
        assert!(app.alert().is_some());
        assert_eq!(handle_input(&mut app, KeyCode::Char('q')), Action::None);
        assert!(app.alert().is_none());
        assert_eq!(handle_input(&mut app, KeyCode::Char('q')), Action::Quit);
    }

    #[test]
    fn test_result_keys() {
        let mut app = quiz_app();
        let total = app.total_questions();
        for _ in 0..total {
            handle_input(&mut app, KeyCode::Char('1'));
            handle_input(&mut app, KeyCode::Enter);
            handle_input(&mut app, KeyCode::Enter);
        }
        assert_eq!(app.state, AppState::Result);
        handle_input(&mut app, KeyCode::Char('r'));
        assert_eq!(app.state, AppState::Start);
    }
}
