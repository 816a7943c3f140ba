mod question;

pub use question::{NUM_ANSWERS, Question};

/// Which page text the quiz is generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSource {
    #[default]
    FullPage,
    Selection,
}

impl TextSource {
    pub fn label(&self) -> &'static str {
        match self {
            TextSource::FullPage => "full page",
            TextSource::Selection => "highlighted text",
        }
    }
}

/// Top-level screen of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Start,
    Loading,
    Quiz,
    Result,
}
