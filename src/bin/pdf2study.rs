//! CLI binary for edgequake-pdf2study.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig`, runs one command and prints the result.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use edgequake_pdf2study::render::{self, EXTRACTED_TEXT_FILE, OUTLINE_FILE};
use edgequake_pdf2study::server::{self, AppState};
use edgequake_pdf2study::{
    extract_text, generate_many, resolve_model_client, Artifact, ArtifactKind, Document,
    GenerationConfig, GenerationProgressCallback, PdfiumExtractor, ProgressCallback, QuizView,
    ServerConfig, Session,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
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

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner on stderr plus one log line per finished step.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER_TICKS);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, byte_len: usize) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(format!("{byte_len} bytes"));
    }

    fn on_extraction_complete(&self, char_count: usize, page_count: usize) {
        self.bar.println(format!(
            "  {} Text extracted  {}",
            green("✓"),
            dim(&format!("{char_count} chars, {page_count} pages"))
        ));
    }

    fn on_generation_start(&self, kind: ArtifactKind) {
        self.bar.set_prefix("Generating");
        self.bar.set_message(kind.to_string());
    }

    fn on_generation_complete(&self, kind: ArtifactKind, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<8}  {}",
            green("✓"),
            kind,
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0))
        ));
    }

    fn on_generation_error(&self, kind: ArtifactKind, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {:<8}  {}", red("✗"), kind, red(&msg)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the HTTP service on 0.0.0.0:3000
  pdf2study serve

  # Print the extracted text, or export it
  pdf2study extract lecture.pdf
  pdf2study extract lecture.pdf -o extracted-text.txt

  # Generate one artifact (text rendering) or all three (JSON)
  pdf2study generate outline lecture.pdf -o outline.txt
  pdf2study generate all lecture.pdf --json

  # Take the quiz in the terminal
  pdf2study quiz lecture.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium, skips auto-download
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Turn PDFs into quizzes, outlines and mind maps with LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2study",
    version,
    about = "Turn PDFs into quizzes, outlines and mind maps with LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// LLM model ID (default: gpt-4o-mini).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Max LLM output tokens per artifact.
    #[arg(long, global = true, env = "PDF2STUDY_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "PDF2STUDY_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Per-call LLM timeout in seconds (default: none).
    #[arg(long, global = true, env = "PDF2STUDY_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Characters of extracted text sent to the model.
    #[arg(long, global = true, env = "PDF2STUDY_MAX_CHARS", default_value_t = 8000)]
    max_chars: usize,

    /// Accept model output wrapped in a Markdown code fence.
    #[arg(long, global = true, env = "PDF2STUDY_JSON_RECOVERY")]
    json_recovery: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, global = true, env = "PDF2STUDY_PASSWORD")]
    password: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2STUDY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2STUDY_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve {
        #[arg(long, env = "PDF2STUDY_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "PDF2STUDY_PORT", default_value_t = 3000)]
        port: u16,
    },
    /// Extract the text of a PDF.
    Extract {
        input: PathBuf,
        /// Write the text to this file (e.g. extracted-text.txt).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate a quiz, outline, mind map, or all three.
    Generate {
        #[arg(value_enum)]
        kind: KindArg,
        input: PathBuf,
        /// Print JSON instead of a text rendering.
        #[arg(long)]
        json: bool,
        /// Write the result to this file (e.g. outline.txt).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Take a generated quiz interactively.
    Quiz { input: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Quiz,
    Outline,
    Mindmap,
    All,
}

impl KindArg {
    fn kinds(self) -> Vec<ArtifactKind> {
        match self {
            KindArg::Quiz => vec![ArtifactKind::Quiz],
            KindArg::Outline => vec![ArtifactKind::Outline],
            KindArg::Mindmap => vec![ArtifactKind::MindMap],
            KindArg::All => ArtifactKind::ALL.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives the feedback that matters; library INFO logs only
    // show up with -v or when the server is running.
    let is_serve = matches!(cli.command, Command::Serve { .. });
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || !is_serve {
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

    ensure_pdfium(cli.quiet)?;

    let progress = if cli.quiet || is_serve {
        None
    } else {
        Some(CliProgressCallback::new())
    };
    let config = build_config(&cli, progress.clone().map(|p| p as ProgressCallback))?;

    let result = match cli.command {
        Command::Serve { ref host, port } => {
            let server_config = ServerConfig {
                host: host.clone(),
                port,
                generation: config.clone(),
            };
            let state = AppState::from_config(config).context("Failed to set up the server")?;
            server::serve(server_config, state)
                .await
                .context("Server failed")
        }
        Command::Extract {
            ref input,
            ref output,
        } => run_extract(input, output.as_deref(), &config, progress.as_deref()).await,
        Command::Generate {
            kind,
            ref input,
            json,
            ref output,
        } => {
            run_generate(
                &kind.kinds(),
                input,
                json,
                output.as_deref(),
                &config,
                progress.as_deref(),
            )
            .await
        }
        Command::Quiz { ref input } => run_quiz(input, &config, progress.as_deref()).await,
    };

    if let Some(p) = progress {
        p.finish();
    }
    result
}

/// Make sure the pdfium library is present before any command needs it.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    #[cfg(feature = "bundled")]
    {
        let _ = quiet;
        tokio::task::block_in_place(pdfium_auto::ensure_pdfium_bundled)
            .context("Failed to extract bundled PDFium engine")?;
    }

    #[cfg(not(feature = "bundled"))]
    if !pdfium_auto::is_pdfium_cached() {
        if quiet {
            tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
                .context("Failed to download PDFium engine")?;
        } else {
            let dl_bar = ProgressBar::new(0);
            dl_bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(SPINNER_TICKS),
            );
            dl_bar.set_prefix("PDF engine");
            dl_bar.enable_steady_tick(Duration::from_millis(80));

            let bar = dl_bar.clone();
            tokio::task::block_in_place(|| {
                pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }))
            })
            .context("Failed to download PDFium engine")?;
            dl_bar.finish_with_message("ready ✓");
        }
    }
    Ok(())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .max_source_chars(cli.max_chars)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .json_recovery(cli.json_recovery);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn extractor_for(config: &GenerationConfig) -> PdfiumExtractor {
    match config.password {
        Some(ref pwd) => PdfiumExtractor::with_password(pwd.clone()),
        None => PdfiumExtractor::new(),
    }
}

async fn read_document(input: &Path) -> Result<Document> {
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    Ok(Document::new(file_name, bytes))
}

/// Print `content` or write it to `output`.
async fn emit(content: &str, output: Option<&Path>, quiet: bool) -> Result<()> {
    match output {
        Some(path) => {
            render::write_export(path, content)
                .await
                .context("Export failed")?;
            if !quiet {
                eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
            if !content.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }
    Ok(())
}

// ── Commands ─────────────────────────────────────────────────────────────────

async fn run_extract(
    input: &Path,
    output: Option<&Path>,
    config: &GenerationConfig,
    progress: Option<&CliProgressCallback>,
) -> Result<()> {
    let document = read_document(input).await?;
    let extracted = extract_text(&document.bytes, &extractor_for(config), config)
        .await
        .context("Text extraction failed")?;
    if let Some(p) = progress {
        p.finish();
    }
    let output = output.map(|p| {
        if p.is_dir() {
            p.join(EXTRACTED_TEXT_FILE)
        } else {
            p.to_path_buf()
        }
    });
    emit(
        &render::extracted_text_export(&extracted.text),
        output.as_deref(),
        progress.is_none(),
    )
    .await
}

async fn run_generate(
    kinds: &[ArtifactKind],
    input: &Path,
    json: bool,
    output: Option<&Path>,
    config: &GenerationConfig,
    progress: Option<&CliProgressCallback>,
) -> Result<()> {
    let document = read_document(input).await?;
    let extracted = extract_text(&document.bytes, &extractor_for(config), config)
        .await
        .context("Text extraction failed")?;
    let client = resolve_model_client(config).context("No LLM provider available")?;

    let results = generate_many(kinds, &extracted.text, &client, config).await;
    if let Some(p) = progress {
        p.finish();
    }

    let mut failed = Vec::new();
    let mut artifacts = Vec::new();
    for (kind, result) in results {
        match result {
            Ok(artifact) => artifacts.push(artifact),
            Err(e) => {
                tracing::error!("{}", e);
                failed.push(format!("{kind}: {}", e.user_message()));
            }
        }
    }

    if !artifacts.is_empty() {
        let content = if json {
            artifacts_json(&artifacts)?
        } else {
            artifacts
                .iter()
                .map(|a| artifact_text(a, artifacts.len() > 1))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let output = output.map(|p| {
            if p.is_dir() && !json && matches!(kinds, [ArtifactKind::Outline]) {
                p.join(OUTLINE_FILE)
            } else {
                p.to_path_buf()
            }
        });
        emit(&content, output.as_deref(), progress.is_none()).await?;
    }

    if !failed.is_empty() {
        bail!("Generation failed for {}", failed.join("; "));
    }
    Ok(())
}

/// One JSON object for a single artifact, or all of them merged.
fn artifacts_json(artifacts: &[Artifact]) -> Result<String> {
    let value = if let [single] = artifacts {
        serde_json::to_value(single)?
    } else {
        let mut merged = serde_json::Map::new();
        for a in artifacts {
            if let serde_json::Value::Object(map) = serde_json::to_value(a)? {
                merged.extend(map);
            }
        }
        serde_json::Value::Object(merged)
    };
    serde_json::to_string_pretty(&value).context("Failed to serialise output")
}

fn artifact_text(artifact: &Artifact, with_heading: bool) -> String {
    let body = match artifact {
        Artifact::Quiz(q) => render::quiz_text(&QuizView::new(q.clone())),
        Artifact::Outline(o) => render::outline_export(o),
        Artifact::MindMap(m) => render::mind_map_tree(&m.mind_map),
    };
    if with_heading {
        format!("{}\n{}", bold(&format!("## {}", artifact.kind())), body)
    } else {
        body
    }
}

async fn run_quiz(
    input: &Path,
    config: &GenerationConfig,
    progress: Option<&CliProgressCallback>,
) -> Result<()> {
    let mut session = Session::new();
    session.load_document(read_document(input).await?);
    session
        .extract(&extractor_for(config), config)
        .await
        .context("Text extraction failed")?;
    let client = resolve_model_client(config).context("No LLM provider available")?;
    session
        .generate(ArtifactKind::Quiz, &client, config)
        .await
        .context("Quiz generation failed")?;
    if let Some(p) = progress {
        p.finish();
    }

    let Some(view) = session.quiz_mut() else {
        bail!("No quiz was generated");
    };
    if view.question_count() == 0 {
        bail!("The model returned an empty quiz");
    }
    if let Some(qi) = view.artifact().questions.iter().position(|q| q.options.is_empty()) {
        bail!("Question {} has no options to choose from", qi + 1);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    for qi in 0..view.question_count() {
        let question = &view.artifact().questions[qi];
        println!("\n{}. {}", qi + 1, bold(&question.question));
        for (oi, option) in question.options.iter().enumerate() {
            println!("   {}. {}", render::option_letter(oi), option);
        }
        let option_count = question.options.len();
        loop {
            print!("Your answer: ");
            io::stdout().flush().ok();
            let Some(line) = lines.next() else {
                bail!("Input closed before the quiz was finished");
            };
            let line = line.context("Failed to read answer")?;
            match parse_answer(&line, option_count) {
                Some(option) => {
                    view.select(qi, option)?;
                    break;
                }
                None => println!("{}", dim("Enter a letter (A, B, …) or an option number.")),
            }
        }
    }

    view.submit()?;
    println!("\n{}", render::quiz_text(view));
    Ok(())
}

/// `"b"`, `"B"` or `"2"` → option index 1.
fn parse_answer(line: &str, option_count: usize) -> Option<usize> {
    let s = line.trim();
    let index = if let Ok(n) = s.parse::<usize>() {
        n.checked_sub(1)?
    } else {
        let mut chars = s.chars();
        let c = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() || !c.is_ascii_uppercase() {
            return None;
        }
        usize::from(c as u8 - b'A')
    };
    (index < option_count).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn answers_by_letter_or_number() {
        assert_eq!(parse_answer("b", 4), Some(1));
        assert_eq!(parse_answer("B ", 4), Some(1));
        assert_eq!(parse_answer("2", 4), Some(1));
        assert_eq!(parse_answer(" 4\n", 4), Some(3));
    }

    #[test]
    fn out_of_range_or_blank_answers_are_refused() {
        assert_eq!(parse_answer("0", 4), None);
        assert_eq!(parse_answer("5", 4), None);
        assert_eq!(parse_answer("Z", 4), None);
        assert_eq!(parse_answer("", 4), None);
        assert_eq!(parse_answer("   ", 4), None);
        assert_eq!(parse_answer("ab", 4), None);
        assert_eq!(parse_answer("é", 4), None);
    }

    #[test]
    fn no_answer_is_valid_without_options() {
        for line in ["a", "1", "0", ""] {
            assert_eq!(parse_answer(line, 0), None, "{line:?}");
        }
    }

    #[test]
    fn provider_flag_reads_the_documented_env_var() {
        let cmd = Cli::command();
        let provider = cmd
            .get_arguments()
            .find(|a| a.get_id() == "provider")
            .unwrap();
        assert_eq!(
            provider.get_env(),
            Some(std::ffi::OsStr::new("EDGEQUAKE_LLM_PROVIDER"))
        );
        assert!(AFTER_HELP.contains("EDGEQUAKE_LLM_PROVIDER"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
