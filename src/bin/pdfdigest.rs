//! CLI binary for pdf-digest.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ProcessingConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use pdf_digest::{
    inspect, process_document, process_to_file, FinalResult, ProcessingConfig,
    ProcessingProgressCallback, ProcessingStage, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Stage spinner that turns into a page bar during extraction and a chunk
/// counter during summarisation. Pages complete out of order; only the count
/// is shown.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Opening");
        bar.set_message("validating PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn page_bar(&self, total: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  \
                 ⏱ {elapsed_precise}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.reset_eta();
    }

    fn spinner(&self) {
        self.bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
    }
}

impl ProcessingProgressCallback for CliProgressCallback {
    fn on_stage(&self, _document_id: &str, stage: ProcessingStage) {
        match stage {
            ProcessingStage::ExtractingIndex => {
                self.bar.set_prefix(stage.label());
                self.bar.set_message("reading table of contents…");
            }
            ProcessingStage::ExtractingPages => {
                self.bar.set_prefix(stage.label());
            }
            ProcessingStage::Summarizing => {
                self.spinner();
                self.bar.set_prefix(stage.label());
                self.bar.set_message("waiting for the model…");
            }
            ProcessingStage::Complete => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", green("✔"), bold("Processing complete"));
            }
            ProcessingStage::Failed => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", red("✘"), bold("Processing failed"));
            }
            ProcessingStage::Queued => {}
        }
    }

    fn on_page_complete(&self, _page: usize, done: usize, total: usize) {
        if self.bar.length() != Some(total as u64) {
            self.page_bar(total);
        }
        self.bar.set_position(done as u64);
    }

    fn on_chunk_complete(&self, chunk: usize, done: usize, total: usize) {
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}",
            green("✓"),
            chunk,
            total
        ));
        if done < total {
            self.bar.set_message(format!("chunk {}/{}", done + 1, total));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summary to stdout (local Ollama, deepseek-r1:1.5b)
  pdfdigest report.pdf

  # Full structured result as JSON
  pdfdigest --json report.pdf > report.json

  # Write the JSON result to a file
  pdfdigest report.pdf -o out/report.json

  # HTML summary fragments
  pdfdigest --html report.pdf > summary.html

  # Table of contents on page 2, smaller chunks, another local model
  pdfdigest --index-page 2 --chunk-words 4000 --model llama3.2 report.pdf

  # Hosted model through an edgequake-llm provider
  pdfdigest --provider openai --model gpt-4.1-mini report.pdf

  # Page count only (no OCR or model needed)
  pdfdigest --inspect-only report.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH       Path to libpdfium
  OLLAMA_GENERATE_URL   Generation endpoint (default http://localhost:11434/api/generate)
  PDFDIGEST_MODEL       Model identifier
  OPENAI_API_KEY        API keys for --provider (also ANTHROPIC_API_KEY, GEMINI_API_KEY, …)
  RUST_LOG              Log filter override (e.g. pdf_digest=debug)

REQUIREMENTS:
  libpdfium   next to the binary, on PDFIUM_LIB_PATH, or installed system-wide
  tesseract   on PATH, for scanned pages and chart text
  ollama      serving the chosen model, unless --provider is used
"#;

/// Extract text, index sections and chart figures from a PDF and summarise it.
#[derive(Parser, Debug)]
#[command(
    name = "pdfdigest",
    version,
    about = "Extract and summarise PDF documents with OCR fallback and an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write the JSON result to this file.
    #[arg(short, long, env = "PDFDIGEST_OUTPUT")]
    output: Option<PathBuf>,

    /// Page holding the table of contents (1-based).
    #[arg(long, env = "PDFDIGEST_INDEX_PAGE", default_value_t = 3)]
    index_page: usize,

    /// Pages extracted concurrently.
    #[arg(short, long, env = "PDFDIGEST_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Words per summary chunk.
    #[arg(long, env = "PDFDIGEST_CHUNK_WORDS", default_value_t = 10_000)]
    chunk_words: usize,

    /// Model identifier.
    #[arg(long, env = "PDFDIGEST_MODEL", default_value = pdf_digest::config::DEFAULT_MODEL)]
    model: String,

    /// Ollama-style generation endpoint.
    #[arg(long, env = "OLLAMA_GENERATE_URL", default_value = pdf_digest::config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Hosted provider (openai, anthropic, gemini, …) instead of the endpoint.
    #[arg(long, env = "PDFDIGEST_PROVIDER")]
    provider: Option<String>,

    /// Max tokens generated per chunk.
    #[arg(long, env = "PDFDIGEST_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Tesseract language pack.
    #[arg(long, env = "PDFDIGEST_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Tesseract executable.
    #[arg(long, env = "TESSERACT_BINARY", default_value = "tesseract")]
    tesseract: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFDIGEST_PASSWORD")]
    password: Option<String>,

    /// Path to libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Directory for the extracted-text artifact.
    #[arg(long, env = "PDFDIGEST_ARTIFACT_DIR", default_value = "extracted_text")]
    artifact_dir: PathBuf,

    /// Print the full result as JSON.
    #[arg(long, conflicts_with = "html")]
    json: bool,

    /// Print the summary as HTML fragments.
    #[arg(long)]
    html: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFDIGEST_NO_PROGRESS")]
    no_progress: bool,

    /// Print the page count only.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFDIGEST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFDIGEST_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless -v is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.inspect_only;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ProcessingProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let pages = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;
        if cli.json {
            println!(
                "{}",
                serde_json::json!({ "source_path": &cli.input, "num_pages": pages })
            );
        } else {
            println!("File:   {}", cli.input.display());
            println!("Pages:  {}", pages);
        }
        return Ok(());
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let result = match cli.output {
        Some(ref output_path) => process_to_file(&cli.input, output_path, &config)
            .await
            .context("Processing failed")?,
        None => process_document(&cli.input, &config)
            .await
            .context("Processing failed")?,
    };

    if cli.output.is_none() {
        print_result(&cli, &result)?;
    }

    if !cli.quiet {
        print_stats(&result, cli.output.as_ref());
    }

    Ok(())
}

/// Map CLI args to `ProcessingConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ProcessingConfig> {
    let mut builder = ProcessingConfig::builder()
        .index_page(cli.index_page)
        .concurrency(cli.concurrency)
        .chunk_words(cli.chunk_words)
        .model(&cli.model)
        .endpoint(&cli.endpoint)
        .max_output_tokens(cli.max_tokens)
        .ocr_language(&cli.ocr_lang)
        .tesseract_binary(&cli.tesseract)
        .artifact_dir(&cli.artifact_dir);

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_result(cli: &Cli, result: &FinalResult) -> Result<()> {
    let body = if cli.json {
        serde_json::to_string_pretty(result).context("Failed to serialise output")?
    } else if cli.html {
        result.summary_html.clone()
    } else {
        result.summary_text.clone()
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(body.as_bytes())
        .context("Failed to write to stdout")?;
    if !body.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

fn print_stats(result: &FinalResult, output: Option<&PathBuf>) {
    let s = &result.stats;
    let marker = if s.failed_pages == 0 && s.degraded_chunks == 0 {
        green("✔")
    } else {
        cyan("⚠")
    };
    eprintln!(
        "{}  {} pages ({} native, {} OCR, {} failed)  {} sections  {} charts  {:.2}s",
        marker,
        result.num_pages,
        s.native_pages,
        s.ocr_pages,
        s.failed_pages,
        result.indexed_sections.len(),
        s.charts_found,
        result.processing_time,
    );
    eprintln!(
        "   {} summary chunks{}",
        dim(&s.summary_chunks.to_string()),
        if s.degraded_chunks > 0 {
            format!(", {} without a summary", red(&s.degraded_chunks.to_string()))
        } else {
            String::new()
        }
    );
    if let Some(ref path) = result.extracted_text_path {
        eprintln!("   extracted text  →  {}", dim(&path.display().to_string()));
    }
    if let Some(path) = output {
        eprintln!("   result          →  {}", bold(&path.display().to_string()));
    }
}
