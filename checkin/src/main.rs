//! Pause → Probe → Plan check-in CLI.
//!
//! Runs a check-in conversation on the terminal, scans text for risk terms,
//! and inspects stored session records under `.checkin/`.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use checkin::core::safety::scan;
use checkin::core::types::{FlowState, Input};
use checkin::exit_codes;
use checkin::io::config::load_config;
use checkin::io::init::{CheckinPaths, InitOptions, init_checkin};
use checkin::io::record_log::{JsonlRecordLog, load_records};
use checkin::logging;
use checkin::store::SessionStore;
use checkin::turn::{PersistOutcome, TurnContext, TurnReport, open_session, run_turn};

#[derive(Parser)]
#[command(
    name = "checkin",
    version,
    about = "Pause → Probe → Plan emotional check-in"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.checkin/` with a default config.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Run one check-in conversation on stdin/stdout.
    Chat {
        /// Student identifier stored with the session record (cleared by `/reset`).
        #[arg(long)]
        student_id: Option<String>,
        /// Config file (defaults to `.checkin/config.toml`).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print risk terms found in TEXT; exits non-zero when any match.
    Scan {
        /// Text to scan.
        text: String,
    },
    /// Print stored session records as JSON lines.
    Records {
        /// Show only the most recent N records.
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Config file (defaults to `.checkin/config.toml`).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// One parsed line of chat input.
#[derive(Debug, PartialEq, Eq)]
enum ChatLine {
    Input(Input),
    Reset,
    Quit,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = std::env::current_dir().context("resolve current directory")?;
    match cli.command {
        Command::Init { force } => cmd_init(&root, force),
        Command::Chat { student_id, config } => cmd_chat(&root, student_id, config),
        Command::Scan { text } => Ok(cmd_scan(&text)),
        Command::Records { limit, config } => cmd_records(&root, limit, config),
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_checkin(root, &InitOptions { force })?;
    println!("wrote {}", paths.config_path.display());
    Ok(exit_codes::OK)
}

fn cmd_chat(root: &Path, student_id: Option<String>, config: Option<PathBuf>) -> Result<i32> {
    let config_path = config.unwrap_or_else(|| CheckinPaths::new(root).config_path);
    let config = load_config(&config_path)?;
    let sink = JsonlRecordLog::new(config.record_log_path(root));
    let ctx = TurnContext {
        config: &config,
        sink: &sink,
        responder: None,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let state = chat_loop(&ctx, student_id, stdin.lock(), &mut stdout.lock())?;
    Ok(if state == FlowState::Safety {
        exit_codes::SAFETY
    } else {
        exit_codes::OK
    })
}

/// Drive one session from `input` until it finalizes or the input ends.
///
/// Returns the session's final state.
fn chat_loop<R: BufRead, W: Write>(
    ctx: &TurnContext<'_>,
    student_id: Option<String>,
    input: R,
    out: &mut W,
) -> Result<FlowState> {
    let mut store = SessionStore::new();
    let id = store.create(student_id, Utc::now());
    let opened = open_session(&mut store, &id, ctx, Utc::now())?;
    print_report(out, &opened)?;
    let mut state = opened.state;

    for line in input.lines() {
        let line = line.context("read stdin")?;
        let report = match parse_chat_line(&line) {
            ChatLine::Quit => break,
            ChatLine::Reset => {
                store.reset(&id, Utc::now());
                open_session(&mut store, &id, ctx, Utc::now())?
            }
            ChatLine::Input(input) => run_turn(&mut store, &id, &input, ctx, Utc::now())?,
        };
        print_report(out, &report)?;
        state = report.state;
        if report.persisted.is_some() {
            break;
        }
    }
    info!(session_id = %id, state = state.as_str(), "chat ended");
    Ok(state)
}

fn parse_chat_line(line: &str) -> ChatLine {
    let trimmed = line.trim();
    let (command, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    match (command, rest.trim()) {
        ("/quit", "") => ChatLine::Quit,
        ("/reset", "") => ChatLine::Reset,
        ("/pick", ids) => ChatLine::Input(Input::Pick(
            ids.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        _ => ChatLine::Input(Input::Text(line.to_string())),
    }
}

fn print_report<W: Write>(out: &mut W, report: &TurnReport) -> Result<()> {
    for prompt in &report.prompts {
        writeln!(out, "{prompt}\n").context("write prompt")?;
    }
    if let Some(card) = &report.card {
        writeln!(out, "{card}").context("write plan card")?;
    }
    if let Some(PersistOutcome::Failed(message)) = &report.persisted {
        writeln!(out, "(could not save this check-in: {message})").context("write status")?;
    }
    out.flush().context("flush stdout")?;
    Ok(())
}

fn cmd_scan(text: &str) -> i32 {
    let result = scan(Some(text));
    for term in &result.terms {
        println!("{term}");
    }
    if result.flagged {
        exit_codes::SAFETY
    } else {
        exit_codes::OK
    }
}

fn cmd_records(root: &Path, limit: Option<usize>, config: Option<PathBuf>) -> Result<i32> {
    let config_path = config.unwrap_or_else(|| CheckinPaths::new(root).config_path);
    let config = load_config(&config_path)?;
    let records = load_records(&config.record_log_path(root))?;
    let skip = limit.map_or(0, |limit| records.len().saturating_sub(limit));
    for record in &records[skip..] {
        println!(
            "{}",
            serde_json::to_string(record).context("serialize record")?
        );
    }
    Ok(exit_codes::OK)
}
