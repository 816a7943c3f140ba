mod loader;
mod sample;

pub use loader::{LoadError, load_questions_from_json};
pub use sample::sample_questions;
