//! CLI binary for edgequake-pdfchat.
//!
//! A thin front-end over the library: uploads one PDF, then asks the
//! questions given with `-q` or read from stdin, rendering the same labels a
//! browser view would ("PDF: name", "Pages: n Uploaded successfully").

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_pdfchat::{
    AskOutcome, ClientConfig, DocumentMetadata, PdfFile, Role, Session, SessionObserver,
    SharedObserver, DEFAULT_API_URL,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Spinner observer using indicatif ─────────────────────────────────────────

/// Shows "Uploading..." while the document is sent and "Thinking…" while an
/// answer is pending, the way the web view relabels its controls.
struct SpinnerObserver {
    spinner: Mutex<Option<ProgressBar>>,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
        })
    }

    fn start(&self, prefix: &str, message: &str) {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix(prefix.to_string());
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Some(old) = self.lock().replace(bar) {
            old.finish_and_clear();
        }
    }

    fn stop(&self) {
        if let Some(bar) = self.lock().take() {
            bar.finish_and_clear();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        self.spinner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionObserver for SpinnerObserver {
    fn on_upload_start(&self, file_name: &str, size: u64) {
        let kib = size as f64 / 1024.0;
        self.start("Uploading...", &format!("{file_name} ({kib:.0} KiB)"));
    }

    fn on_upload_complete(&self, _metadata: &DocumentMetadata) {
        self.stop();
    }

    fn on_upload_failed(&self, _message: &str) {
        self.stop();
    }

    fn on_question_sent(&self, _question: &str) {
        self.start("Thinking…", "");
    }

    fn on_answer(&self, _answer: &str) {
        self.stop();
    }

    fn on_answer_failed(&self, _error: &str) {
        self.stop();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Upload and chat interactively
  pdfchat contract.pdf

  # One-shot questions
  pdfchat contract.pdf -q "What is the payment term?" -q "Is there a late fee?"

  # Point at a remote service and dump the transcript as JSON
  pdfchat --api-url https://qa.example.com contract.pdf -q "Summarise" --json

INTERACTIVE COMMANDS:
  /upload <path>   Replace the current document
  /history         Print the transcript so far
  /help            Show these commands
  /quit            Exit (Ctrl-D works too)

ENVIRONMENT VARIABLES:
  PDFCHAT_API_URL          Question-answering service (default http://localhost:8000)
  PDFCHAT_UPLOAD_TIMEOUT   Upload timeout in seconds
  PDFCHAT_CHAT_TIMEOUT     Per-question timeout in seconds
  RUST_LOG                 Override log filter (e.g. edgequake_pdfchat=debug)
"#;

/// Chat with a PDF through a question-answering service.
#[derive(Parser, Debug)]
#[command(
    name = "pdfchat",
    version,
    about = "Upload a PDF and ask questions about it",
    long_about = "Upload a PDF (max 10 MB) to a question-answering service and hold a \
multi-turn conversation about it. Each question is sent with the conversation so far.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to upload.
    pdf: PathBuf,

    /// Ask this question and exit (repeatable, asked in order).
    #[arg(short = 'q', long = "question")]
    questions: Vec<String>,

    /// Base URL of the question-answering service.
    #[arg(long, env = "PDFCHAT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Upload timeout in seconds.
    #[arg(long, env = "PDFCHAT_UPLOAD_TIMEOUT", default_value_t = 120)]
    upload_timeout: u64,

    /// Per-question timeout in seconds.
    #[arg(long, env = "PDFCHAT_CHAT_TIMEOUT", default_value_t = 60)]
    chat_timeout: u64,

    /// Keep the transcript when `/upload` replaces the document.
    #[arg(long, env = "PDFCHAT_KEEP_HISTORY")]
    keep_history: bool,

    /// Skip the `/api/health` probe before uploading.
    #[arg(long)]
    skip_health_check: bool,

    /// Print the final transcript as JSON on stdout.
    #[arg(long, env = "PDFCHAT_JSON")]
    json: bool,

    /// Disable spinners.
    #[arg(long, env = "PDFCHAT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFCHAT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except answers and errors.
    #[arg(long, env = "PDFCHAT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Spinners already say what is happening; keep INFO logs out of their way.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build session ────────────────────────────────────────────────────
    let mut builder = ClientConfig::builder()
        .base_url(&cli.api_url)
        .upload_timeout_secs(cli.upload_timeout)
        .chat_timeout_secs(cli.chat_timeout)
        .reset_transcript_on_upload(!cli.keep_history);
    if show_progress {
        builder = builder.observer(SpinnerObserver::new() as SharedObserver);
    }
    let config = builder.build().context("Invalid configuration")?;
    let session = Session::new(config).context("Failed to create session")?;

    if !cli.skip_health_check {
        if let Err(e) = session.health().await {
            // Not fatal: some deployments do not expose the probe.
            eprintln!("{} {}", cyan("⚠"), dim(&format!("health check failed: {e}")));
        }
    }

    // ── Upload ───────────────────────────────────────────────────────────
    if let Err(notice) = upload(&session, &cli.pdf, cli.quiet).await? {
        bail!("{notice}");
    }

    // ── Conversation ─────────────────────────────────────────────────────
    if cli.questions.is_empty() {
        repl(&session, cli.quiet).await?;
    } else {
        for q in &cli.questions {
            ask(&session, q, !cli.quiet).await;
        }
    }

    if cli.json {
        let out = serde_json::json!({
            "document": session.metadata(),
            "transcript": session.transcript(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("Failed to serialize transcript")?
        );
    }
    Ok(())
}

/// Load and upload `path`. The outer `Result` is for local I/O failures; the
/// inner one carries the user-facing notice from the session.
async fn upload(session: &Session, path: &Path, quiet: bool) -> Result<Result<(), String>> {
    let file = PdfFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match session.submit_file(file).await {
        Ok(meta) => {
            if !quiet {
                eprintln!("{} {}", bold(&meta.label()), green("✓"));
                eprintln!("{}", dim(&meta.page_info()));
            }
            Ok(Ok(()))
        }
        Err(notice) => Ok(Err(notice.to_string())),
    }
}

async fn ask(session: &Session, question: &str, echo: bool) {
    if echo {
        println!("{} {}", bold("you:"), question);
    }
    match session.ask(question).await {
        Ok(AskOutcome::Ignored) => {}
        Ok(AskOutcome::Answered { answer, citations }) => {
            println!("{} {}", cyan("assistant:"), answer.content());
            let pages: Vec<String> = citations
                .iter()
                .filter_map(|c| c.page.map(|p| format!("p.{p}")))
                .collect();
            if !pages.is_empty() {
                println!("{}", dim(&format!("sources: {}", pages.join(", "))));
            }
        }
        Ok(AskOutcome::Fallback { answer, .. }) => {
            println!("{} {}", cyan("assistant:"), red(answer.content()));
        }
        Err(e) => eprintln!("{} {}", red("✗"), e),
    }
}

/// One line of REPL input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Help,
    History,
    Upload(Option<&'a str>),
    /// A slash command we do not know; never sent as a question.
    Unknown(&'a str),
    Ask(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let (cmd, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, rest)| (c, rest.trim()));
        match cmd {
            "/quit" | "/exit" => Command::Quit,
            "/help" => Command::Help,
            "/history" => Command::History,
            "/upload" => Command::Upload(Some(rest).filter(|p| !p.is_empty())),
            c if c.starts_with('/') => Command::Unknown(c),
            _ => Command::Ask(line),
        }
    }
}

async fn repl(session: &Session, quiet: bool) -> Result<()> {
    if !quiet {
        eprintln!(
            "{}",
            dim("Ask questions about your PDF, e.g. \u{201c}What are the payment terms in this contract?\u{201d}  (/help for commands)")
        );
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("{} ", bold(">"));
        io::stderr().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => eprintln!("{AFTER_HELP}"),
            Command::History => print_history(session),
            Command::Upload(None) => eprintln!("{} usage: /upload <path>", red("✗")),
            Command::Upload(Some(path)) => {
                match upload(session, Path::new(path), quiet).await {
                    Ok(Ok(())) => {}
                    Ok(Err(notice)) => eprintln!("{} {}", red("✗"), notice),
                    Err(e) => eprintln!("{} {:#}", red("✗"), e),
                }
            }
            Command::Unknown(cmd) => eprintln!(
                "{} unknown command {cmd}; try /upload <path>, /history, /help or /quit",
                red("✗")
            ),
            Command::Ask(question) => ask(session, question, false).await,
        }
    }
    Ok(())
}

fn print_history(session: &Session) {
    let transcript = session.transcript();
    if transcript.is_empty() {
        eprintln!("{}", dim("(no messages yet)"));
        return;
    }
    for m in &transcript {
        let who = match m.role() {
            Role::User => bold("you:"),
            Role::Assistant => cyan("assistant:"),
        };
        println!("{who} {}", m.content());
    }
}
