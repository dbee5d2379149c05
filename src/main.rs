//! wordtrail - spaced-repetition vocabulary tracker
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wordtrail::cli::{ActivityCommand, ActivityOptions, ClockInCommand, StatsCommand, StudyCommand};
use wordtrail::config::{wordtrail_home, Config};
use wordtrail::core::{BookId, SystemClock, UserId, WordId};
use wordtrail::error::{exit_codes, Result, WordtrailError};
use wordtrail::storage::FileStore;
use wordtrail::wordbook::WordbookCatalog;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "WORDTRAIL_LOG";

/// Filter used when `WORDTRAIL_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "warn";

// =============================================================================
// CLI Definition
// =============================================================================

/// wordtrail - spaced-repetition vocabulary tracker
#[derive(Parser)]
#[command(name = "wordtrail")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start learning a word
    Study {
        user: String,
        word: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Record a review outcome for a word
    Review {
        user: String,
        word: String,
        /// The word was not remembered
        #[arg(long)]
        forgot: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Show a word's progress
    Progress {
        user: String,
        word: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// List words due for review today
    Due {
        user: String,
        /// Only words in this book
        #[arg(long, short)]
        book: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// List words whose review time has passed
    Overdue {
        user: String,
        /// Only words in this book
        #[arg(long, short)]
        book: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Show learning statistics
    Stats {
        user: String,
        /// Add a summary for this book
        #[arg(long, short)]
        book: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Pick the next unstarted words from a book
    NewWords {
        user: String,
        book: String,
        /// Number of words to pick
        #[arg(long)]
        batch: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Recount today's work and clock in when the goal is met
    ClockIn {
        user: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Show today's clock-in progress
    Today {
        user: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Show the last seven days of clock-ins
    Week {
        user: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Show or change the daily goal
    Goal {
        user: String,
        /// Daily new words target
        #[arg(long = "new")]
        new_words: Option<i64>,
        /// Daily review target
        #[arg(long = "review")]
        review_words: Option<i64>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Summarize study activity over a date range
    Activity {
        user: String,
        /// First day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    init_logging();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("wordtrail error: {}", e);
            ExitCode::from(exit_codes::for_error(&e) as u8)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, appends to `<wordtrail_home>/crash.log` and exits with the
/// failure code.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("wordtrail panic: {}", info);

        if let Some(home) = wordtrail_home() {
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::FAILURE);
    }));
}

/// Log to stderr, filtered by `WORDTRAIL_LOG`.
fn init_logging() {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Shared state for one invocation.
struct Context {
    config: Config,
    store: Arc<FileStore>,
    clock: Arc<SystemClock>,
}

impl Context {
    fn load() -> Result<Self> {
        let config = Config::load();
        let data_dir = config
            .data_dir()
            .ok_or_else(|| WordtrailError::config("could not determine data directory"))?;
        let store = Arc::new(FileStore::with_dir(data_dir)?);
        let clock = Arc::new(config.system_clock());
        Ok(Self {
            config,
            store,
            clock,
        })
    }

    fn wordbooks(&self) -> Result<WordbookCatalog> {
        let dir = self
            .config
            .wordbooks_dir()
            .ok_or_else(|| WordtrailError::config("could not determine wordbooks directory"))?;
        WordbookCatalog::from_dir(&dir)
    }

    fn study(&self) -> StudyCommand<Arc<FileStore>, Arc<SystemClock>> {
        StudyCommand::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    fn stats(&self) -> Result<StatsCommand<Arc<FileStore>, WordbookCatalog, Arc<SystemClock>>> {
        StatsCommand::new(
            Arc::clone(&self.store),
            self.wordbooks()?,
            Arc::clone(&self.clock),
            &self.config,
        )
    }

    fn clock_in(&self) -> ClockInCommand<Arc<FileStore>, Arc<SystemClock>> {
        ClockInCommand::new(Arc::clone(&self.store), Arc::clone(&self.clock), &self.config)
    }
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let ctx = Context::load()?;

    match cli.command {
        Commands::Study { user, word, json } => {
            let output = ctx.study().study(&UserId::new(user)?, &WordId::new(word)?)?;
            emit(&output, json, output.format_text())
        }
        Commands::Review {
            user,
            word,
            forgot,
            json,
        } => {
            let output =
                ctx.study()
                    .review(&UserId::new(user)?, &WordId::new(word)?, !forgot)?;
            emit(&output, json, output.format_text())
        }
        Commands::Progress { user, word, json } => {
            let output = ctx
                .study()
                .progress(&UserId::new(user)?, &WordId::new(word)?)?;
            emit(&output, json, output.format_text())
        }
        Commands::Due { user, book, json } => {
            let book = parse_book(book)?;
            let output = ctx.stats()?.due(&UserId::new(user)?, book.as_ref())?;
            emit(&output, json, output.format_text())
        }
        Commands::Overdue { user, book, json } => {
            let book = parse_book(book)?;
            let output = ctx.stats()?.overdue(&UserId::new(user)?, book.as_ref())?;
            emit(&output, json, output.format_text())
        }
        Commands::Stats { user, book, json } => {
            let book = parse_book(book)?;
            let output = ctx.stats()?.stats(&UserId::new(user)?, book.as_ref())?;
            emit(&output, json, output.format_text())
        }
        Commands::NewWords {
            user,
            book,
            batch,
            json,
        } => {
            let output =
                ctx.stats()?
                    .new_words(&UserId::new(user)?, &BookId::new(book)?, batch)?;
            emit(&output, json, output.format_text())
        }
        Commands::ClockIn { user, json } => {
            let output = ctx.clock_in().clock_in(&UserId::new(user)?)?;
            emit(&output, json, output.format_text())
        }
        Commands::Today { user, json } => {
            let output = ctx.clock_in().today(&UserId::new(user)?)?;
            emit(&output, json, output.format_text())
        }
        Commands::Week { user, json } => {
            let output = ctx.clock_in().week(&UserId::new(user)?)?;
            emit(&output, json, output.format_text())
        }
        Commands::Goal {
            user,
            new_words,
            review_words,
            json,
        } => {
            let output = ctx
                .clock_in()
                .goal(&UserId::new(user)?, new_words, review_words)?;
            emit(&output, json, output.format_text())
        }
        Commands::Activity {
            user,
            from,
            to,
            json,
        } => {
            let cmd = ActivityCommand::new(Arc::clone(&ctx.store), Arc::clone(&ctx.clock));
            let output = cmd.run(&UserId::new(user)?, &ActivityOptions { from, to })?;
            emit(&output, json, output.format_text())
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_book(book: Option<String>) -> Result<Option<BookId>> {
    book.map(BookId::new).transpose()
}

/// Print `output` as pretty JSON, or `text` otherwise.
fn emit<T: Serialize>(output: &T, json: bool, text: String) -> Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
    } else {
        println!("{}", text);
    }
    Ok(ExitCode::from(exit_codes::SUCCESS as u8))
}
