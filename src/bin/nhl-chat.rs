//! nhl-chat: command-line front end.
//!
//! ```bash
//! nhl-chat ask "Who leads the league in points?"
//! nhl-chat chat --verbose
//! nhl-chat ingest --season 20232024
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use nhl_assistant::agents::{AgentExecutor, AgentStep, ExecutionMode, Summarizer};
use nhl_assistant::chat::{ChatHandler, ChatReply, ChatSession, ConversationHistory, ResultType};
use nhl_assistant::config::Settings;
use nhl_assistant::ingest::{ingest_season, NhlStatsClient};
use nhl_assistant::llms::{BaseLLM, GeminiCompletion};
use nhl_assistant::stats::StatsService;
use nhl_assistant::store::SqliteStatsStore;
use nhl_assistant::tools::{ToolDispatcher, ToolOutput};
use nhl_assistant::utilities::printer::{Printer, PrinterColor};
use nhl_assistant::utilities::season::current_season;

/// NHL statistics assistant
#[derive(Parser)]
#[command(name = "nhl-chat")]
#[command(about = "Ask questions about NHL statistics", long_about = None)]
#[command(version = nhl_assistant::VERSION)]
struct Cli {
    /// One decide/execute round per question
    #[arg(long, global = true)]
    single_shot: bool,

    /// Print each orchestration step to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colors in verbose output
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer one question and exit
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Interactive chat that remembers earlier turns
    Chat,

    /// Download one season from the NHL stats API into the database
    Ingest {
        /// Season id, e.g. 20232024 (default: current season)
        #[arg(long)]
        season: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if cli.verbose {
        "nhl_assistant=debug"
    } else {
        "warn"
    }))
    .init();

    let mut settings = Settings::load().context("Failed to load configuration")?;
    if cli.single_shot {
        settings.single_shot = true;
    }
    settings.validate().context("Invalid configuration")?;

    let store = SqliteStatsStore::open(&settings.database_path)
        .with_context(|| format!("Failed to open {}", settings.database_path))?;

    match cli.command {
        Command::Ingest { season } => {
            let season = season.unwrap_or_else(current_season);
            run_ingest(&settings, &store, &season)
        }
        Command::Ask { question } => {
            let handler = build_handler(&settings, store, cli.verbose, cli.plain);
            let reply = handler.answer(&question.join(" "), &ConversationHistory::default());
            print_reply(&reply);
            Ok(())
        }
        Command::Chat => {
            let handler = build_handler(&settings, store, cli.verbose, cli.plain);
            run_chat(&handler, settings.history_turns)
        }
    }
}

fn build_handler(settings: &Settings, store: SqliteStatsStore, verbose: bool, plain: bool) -> ChatHandler {
    let llm: Arc<dyn BaseLLM> = Arc::new(
        GeminiCompletion::new(settings.model.clone(), settings.google_api_key.clone())
            .with_timeout(settings.request_timeout()),
    );
    let dispatcher = ToolDispatcher::new(StatsService::new(Arc::new(store)));
    let mut executor = AgentExecutor::new(Arc::clone(&llm), dispatcher).with_mode(settings.execution_mode());
    if verbose {
        let printer = Printer::new(plain);
        if let ExecutionMode::MultiStep { max_iterations } = executor.mode() {
            printer.print(&format!("Multi-step mode, up to {} rounds", max_iterations), PrinterColor::Cyan);
        }
        executor = executor.with_step_callback(move |step| print_step(&printer, step));
    }
    ChatHandler::new(executor, Summarizer::new(llm))
}

fn print_step(printer: &Printer, step: &AgentStep<'_>) {
    match step {
        AgentStep::State { iteration, state } => {
            printer.print(&format!("[{}] {}", iteration, state), PrinterColor::BoldCyan)
        }
        AgentStep::Calling { iteration, call } => {
            printer.print(&format!("[{}] calling {}", iteration, call), PrinterColor::Yellow)
        }
        AgentStep::Executed { iteration, result } => {
            let (message, color) = match &result.output {
                ToolOutput::Data(tables) => {
                    let rows: usize = tables.iter().map(|t| t.len()).sum();
                    (format!("[{}] {} returned {} rows", iteration, result.tool, rows), PrinterColor::Green)
                }
                ToolOutput::Text(text) => (format!("[{}] {}: {}", iteration, result.tool, text), PrinterColor::Red),
            };
            printer.print(&message, color)
        }
    }
}

fn print_reply(reply: &ChatReply) {
    match reply.result_type {
        ResultType::Data => println!("{}\n", reply.payload),
        ResultType::Text => println!("{}", reply.payload),
    }
}

fn run_chat(handler: &ChatHandler, history_turns: usize) -> anyhow::Result<()> {
    let mut session = ChatSession::new(handler, history_turns);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("NHL stats assistant. Type 'exit' to quit.");
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }
        let reply = session.ask(question);
        print_reply(&reply);
    }
    Ok(())
}

fn run_ingest(settings: &Settings, store: &SqliteStatsStore, season: &str) -> anyhow::Result<()> {
    let client = NhlStatsClient::new(settings.nhl_stats_base_url.clone(), settings.request_timeout())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    let report = runtime
        .block_on(ingest_season(&client, store, season))
        .with_context(|| format!("Ingest of season {} failed", season))?;

    print!("{}", report);
    Ok(())
}
