use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use page_quiz::{
    Config, PageContext, Quiz, QuizPipeline, TextSource, config::parse_model_list, extract_text,
    sample_questions, telemetry,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Generate a multiple-choice quiz from page text", long_about = None)]
struct Args {
    /// Text file with the page content, or `-` for stdin
    #[arg(short, long)]
    page: Option<PathBuf>,

    /// Highlighted text to quiz on
    #[arg(long, conflicts_with = "selection_file")]
    selection: Option<String>,

    /// File holding the highlighted text
    #[arg(long)]
    selection_file: Option<PathBuf>,

    /// Start generating right away from this source
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// JSON file to load the questions from instead of generating them
    #[arg(short, long, conflicts_with = "sample")]
    questions: Option<PathBuf>,

    /// Play the built-in sample questions
    #[arg(long)]
    sample: bool,

    /// Print the generated questions as JSON instead of starting the quiz
    #[arg(long)]
    dump: bool,

    /// Config file (defaults to ./page-quiz.toml, then ~/.config/page-quiz/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gemini API key (overrides GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Candidate model, most preferred first; repeat or comma-separate
    #[arg(short, long = "model")]
    models: Vec<String>,

    /// Maximum characters of page text sent to the model
    #[arg(long)]
    max_chars: Option<usize>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Full,
    Selection,
}

impl From<SourceArg> for TextSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Full => TextSource::FullPage,
            SourceArg::Selection => TextSource::Selection,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match &args.log_file {
        Some(path) => telemetry::init_file(path, args.verbose)?,
        None if args.dump => telemetry::init_stderr(),
        None => {}
    }

    if args.sample {
        return Quiz::with_questions(sample_questions())
            .run()
            .await
            .context("Error running quiz");
    }
    if let Some(path) = &args.questions {
        let quiz = Quiz::from_json(path).context("Failed to load questions")?;
        return quiz.run().await.context("Error running quiz");
    }

    let config = load_config(&args)?;
    let page = read_page(&args)?;
    info!(models = ?config.models, "configuration loaded");

    if args.dump {
        let source = args.source.map(TextSource::from).unwrap_or_default();
        return dump_questions(&page, source, &config).await;
    }

    let mut quiz = Quiz::new(page, &config)?;
    if let Some(source) = args.source {
        quiz = quiz.start_with(source.into());
    }
    quiz.run().await.context("Error running quiz")
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;

    if let Some(key) = &args.api_key {
        config.api_key = Some(key.clone());
    }
    let models: Vec<String> = args.models.iter().flat_map(|m| parse_model_list(m)).collect();
    if !models.is_empty() {
        config.models = models;
    }
    if let Some(max_chars) = args.max_chars {
        config.max_chars = max_chars;
    }
    Ok(config)
}

fn read_page(args: &Args) -> Result<PageContext> {
    let body = match args.page.as_deref() {
        Some(path) if path == Path::new("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read page text from stdin")?;
            text
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page {}", path.display()))?,
        None => String::new(),
    };

    let selection = match (&args.selection, &args.selection_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read selection {}", path.display()))?,
        ),
        (None, None) => None,
    };

    if body.trim().is_empty() && selection.is_none() {
        bail!("No page text given; pass --page FILE, --selection TEXT, --questions FILE or --sample");
    }

    let page = PageContext::new(body);
    Ok(match selection {
        Some(selection) => page.with_selection(selection),
        None => page,
    })
}

/// Non-interactive mode: generate once and print the questions.
async fn dump_questions(page: &PageContext, source: TextSource, config: &Config) -> Result<()> {
    let extracted = extract_text(page, source, config.max_chars)?;
    let pipeline = QuizPipeline::from_config(config).context("Failed to build HTTP client")?;
    let mut rng = StdRng::from_entropy();

    let outcome = pipeline
        .build_quiz(&extracted.text, &|status| eprintln!("{status}"), &mut rng)
        .await;
    if let Some(advisory) = outcome.advisory {
        eprintln!("{}", advisory.message());
    }
    println!("{}", serde_json::to_string_pretty(&outcome.questions)?);
    Ok(())
}
