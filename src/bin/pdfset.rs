//! CLI binary for pdf-set.
//!
//! One subcommand per pipeline step. Each is a thin shim that resolves the
//! book's directories, calls the library and prints a summary.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_set::assemble;
use pdf_set::layout::{self, Selection, TypesetOptions};
use pdf_set::prompts::load_prompt;
use pdf_set::{
    render_pdf, run_ocr, transcribe_file, GeminiBackend, OcrBackend, OcrConfig, OcrJob,
    OcrProgressCallback, ProgressCallback, ProviderBackend, RenderFormat, RenderOptions,
    ServiceConfig,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

/// Live progress bar plus one log line per finished page. Pages of a batch
/// finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
    retries: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Scanning images…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            retries: AtomicUsize::new(0),
        })
    }

    fn elapsed(&self, stem: &str) -> String {
        let ms = self
            .start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(stem))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        dim(&format!("{:.1}s", ms as f64 / 1000.0))
    }
}

impl OcrProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
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
        self.bar.set_prefix("OCR");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Transcribing {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, stem: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(stem.to_string(), Instant::now());
        }
        self.bar.set_message(format!("page {stem}"));
    }

    fn on_page_retry(&self, stem: &str, attempt: u32, error: &str) {
        self.retries.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Page {:>4}  attempt {} failed: {}",
            yellow("↻"),
            stem,
            attempt,
            dim(&shorten(error, 80)),
        ));
    }

    fn on_page_complete(&self, stem: &str, completed: usize, total: usize) {
        self.bar.println(format!(
            "  {} Page {:>4}  {:>3}/{:<3}  {}",
            green("✓"),
            stem,
            completed,
            total,
            self.elapsed(stem),
        ));
        self.bar.inc(1);
    }

    fn on_page_rejected(&self, stem: &str, completed: usize, total: usize) {
        self.bar.println(format!(
            "  {} Page {:>4}  {:>3}/{:<3}  {}  {}",
            yellow("⊘"),
            stem,
            completed,
            total,
            yellow("rejected → .fail.md"),
            self.elapsed(stem),
        ));
        self.bar.inc(1);
    }

    fn on_page_fatal(&self, stem: &str, error: &str) {
        self.bar.println(format!(
            "  {} Page {:>4}  {}  {}",
            red("✗"),
            stem,
            red(&shorten(error, 80)),
            self.elapsed(stem),
        ));
        self.bar.abandon();
    }

    fn on_run_complete(&self, transcribed: usize, rejected: usize) {
        self.bar.finish_and_clear();
        let retries = self.retries.load(Ordering::SeqCst);
        if rejected == 0 {
            eprintln!(
                "{} {} pages transcribed  {}",
                green("✔"),
                bold(&transcribed.to_string()),
                dim(&format!("({retries} retries)")),
            );
        } else {
            eprintln!(
                "{} {} pages transcribed, {} rejected  {}",
                cyan("⚠"),
                bold(&transcribed.to_string()),
                yellow(&rejected.to_string()),
                dim(&format!("({retries} retries)")),
            );
        }
    }
}

fn shorten(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => format!("{}\u{2026}", &s[..i]),
        None => s.to_string(),
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Full pipeline for one book under ./books/origins
  pdfset render books/origins/origins.pdf --base-dir books --book-name origins
  pdfset ocr --base-dir books --book-name origins
  pdfset list-fail --base-dir books --book-name origins
  pdfset merge --base-dir books --book-name origins
  pdfset split --base-dir books --book-name origins
  pdfset typeset --base-dir books --book-name origins
  pdfset merge-final --base-dir books --book-name origins

  # Re-run a fixed range, 5 pages at a time
  pdfset ocr --start 120 --end 180 --batch-size 5

  # One image, explicit output
  pdfset ocr --input-file images/42.jpg --output-file 42.md

  # Any edgequake-llm vision provider instead of the REST endpoint
  pdfset ocr --backend provider --provider openai --model gpt-4.1-mini

BOOK LAYOUT:
  <base-dir>/<book-name>/images/          rendered pages  <n>.jpg
  <base-dir>/<book-name>/ocr-result/      <n>.md, empty <n>.fail.md
  <base-dir>/<book-name>/merge-result/    0.rough.md, <k>.<title>.md
  <base-dir>/<book-name>/typeset-result/  typeset chapters
  <base-dir>/<book-name>/<book-name>.md   final book

ENVIRONMENT VARIABLES:
  PDFSET_API_ENDPOINT     Service base URL (a trailing /v1 is dropped)
  PDFSET_API_KEY          Service API key
  PDFSET_MODEL            Model name
  PDFSET_SECRETS          Secrets file scanned for the three values above
  PDFIUM_LIB_PATH         Path to libpdfium (render only)
  RUST_LOG                Log filter, overrides --verbose
"#;

/// Digitise scanned books: render, OCR, merge, split, typeset.
#[derive(Parser, Debug)]
#[command(
    name = "pdfset",
    version,
    about = "Digitise scanned books with a multimodal OCR service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFSET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFSET_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every PDF page to a numbered image.
    Render(RenderArgs),
    /// Transcribe page images to per-page Markdown.
    Ocr(OcrArgs),
    /// List pages the service rejected.
    ListFail(ListFailArgs),
    /// Merge per-page Markdown into one rough transcript.
    Merge(MergeArgs),
    /// Split the rough transcript into chapters at each H1.
    Split(SplitArgs),
    /// Rebuild paragraphs and clean OCR artefacts in chapter files.
    Typeset(TypesetArgs),
    /// Merge typeset chapters into the final book.
    MergeFinal(MergeFinalArgs),
}

/// Where the book lives.
#[derive(Args, Debug, Clone)]
struct BookDirs {
    /// Directory holding the book (or holding the book directory).
    #[arg(long, env = "PDFSET_BASE_DIR", default_value = ".")]
    base_dir: PathBuf,

    /// Book directory under --base-dir.
    #[arg(long, env = "PDFSET_BOOK_NAME")]
    book_name: Option<String>,
}

impl BookDirs {
    fn root(&self) -> PathBuf {
        match self.book_name {
            Some(ref name) => self.base_dir.join(name),
            None => self.base_dir.clone(),
        }
    }

    fn or_default(&self, explicit: &Option<PathBuf>, default: &str) -> PathBuf {
        explicit.clone().unwrap_or_else(|| self.root().join(default))
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// PDF to rasterise.
    pdf: PathBuf,

    #[command(flatten)]
    dirs: BookDirs,

    /// Output folder (default: <book>/images).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Render resolution (72–600).
    #[arg(long, default_value_t = 144, value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Index of the first page's file name.
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Image format.
    #[arg(long, value_enum, default_value = "jpg")]
    format: FormatArg,

    /// Cap on the longest edge in pixels.
    #[arg(long)]
    max_dim: Option<u32>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Jpg,
    Png,
}

impl From<FormatArg> for RenderFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Jpg => RenderFormat::Jpeg,
            FormatArg::Png => RenderFormat::Png,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BackendArg {
    /// Gemini-compatible REST endpoint from PDFSET_* / secrets file.
    Gemini,
    /// Any edgequake-llm vision provider.
    Provider,
}

#[derive(Args, Debug)]
struct OcrArgs {
    #[command(flatten)]
    dirs: BookDirs,

    /// Images folder (default: <book>/images).
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// OCR this one image instead of a folder.
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// Transcript folder (default: <book>/ocr-result).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Transcript path for --input-file.
    #[arg(long, requires = "input_file")]
    output_file: Option<PathBuf>,

    /// First page index (default: first page without a transcript).
    #[arg(long)]
    start: Option<usize>,

    /// Last page index, inclusive (default: highest image index).
    #[arg(long)]
    end: Option<usize>,

    /// Pages in flight per batch.
    #[arg(short, long, env = "PDFSET_BATCH_SIZE", default_value_t = 3)]
    batch_size: usize,

    /// Attempts per page, first try included.
    #[arg(long, env = "PDFSET_MAX_ATTEMPTS", default_value_t = 5)]
    max_attempts: u32,

    /// Pause between attempts in milliseconds.
    #[arg(long, env = "PDFSET_RETRY_DELAY_MS", default_value_t = 2000)]
    retry_delay_ms: u64,

    /// Per-request timeout in seconds.
    #[arg(long, env = "PDFSET_API_TIMEOUT", default_value_t = 300)]
    api_timeout: u64,

    /// File holding the transcription instruction.
    #[arg(long, env = "PDFSET_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Secrets file with the service snippet.
    #[arg(long, env = "PDFSET_SECRETS", default_value = "secrets.txt")]
    secrets: PathBuf,

    /// Which service to call.
    #[arg(long, value_enum, env = "PDFSET_BACKEND", default_value = "gemini")]
    backend: BackendArg,

    /// Provider name for --backend provider (auto-detected when absent).
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Model name; overrides PDFSET_MODEL and the secrets file.
    #[arg(long)]
    model: Option<String>,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PDFSET_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct ListFailArgs {
    #[command(flatten)]
    dirs: BookDirs,

    /// Transcript folder (default: <book>/ocr-result).
    #[arg(long)]
    ocr_dir: Option<PathBuf>,

    /// Images folder used to build paths (default: <book>/images).
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Print only image file names.
    #[arg(long)]
    basename_only: bool,
}

#[derive(Args, Debug)]
struct MergeArgs {
    #[command(flatten)]
    dirs: BookDirs,

    /// Transcript folder (default: <book>/ocr-result).
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Output folder (default: <book>/merge-result).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output file name or path, relative to --output-dir.
    #[arg(long, default_value = assemble::ROUGH_FILE)]
    output_file: PathBuf,
}

#[derive(Args, Debug)]
struct SplitArgs {
    #[command(flatten)]
    dirs: BookDirs,

    /// Rough transcript (default: <book>/merge-result/0.rough.md).
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// Chapter folder (default: <book>/merge-result).
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TypesetArgs {
    #[command(flatten)]
    dirs: BookDirs,

    /// Chapter folder (default: <book>/merge-result).
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Output folder (default: <book>/typeset-result).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Chapter file names to process.
    #[arg(long, num_args = 1.., conflicts_with_all = ["files_from", "file_indices"])]
    files: Vec<String>,

    /// UTF-8 file listing chapter names, one per line.
    #[arg(long, conflicts_with = "file_indices")]
    files_from: Option<PathBuf>,

    /// Numeric prefixes selecting files like 1.xxx.md.
    #[arg(long, num_args = 1..)]
    file_indices: Vec<usize>,

    /// Treat every file as a table of contents.
    #[arg(long)]
    index: bool,
}

#[derive(Args, Debug)]
struct MergeFinalArgs {
    #[command(flatten)]
    dirs: BookDirs,

    /// Typeset folder (default: <book>/typeset-result).
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Book file (default: <book>/<book dir name>.md).
    #[arg(long)]
    output_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs while it is on screen.
    let show_progress = match cli.command {
        Command::Ocr(ref a) => !cli.quiet && !a.no_progress && !a.json && a.input_file.is_none(),
        _ => false,
    };
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

    match cli.command {
        Command::Render(args) => render(args, cli.quiet).await,
        Command::Ocr(args) => ocr(args, cli.quiet, show_progress).await,
        Command::ListFail(args) => list_fail(args),
        Command::Merge(args) => merge(args, cli.quiet),
        Command::Split(args) => split(args, cli.quiet),
        Command::Typeset(args) => typeset(args, cli.quiet),
        Command::MergeFinal(args) => merge_final(args, cli.quiet),
    }
}

async fn render(args: RenderArgs, quiet: bool) -> Result<()> {
    let output_dir = args.dirs.or_default(&args.output_dir, "images");
    let options = RenderOptions {
        dpi: args.dpi,
        start_index: args.start,
        format: args.format.into(),
        max_dim: args.max_dim,
    };

    let written = render_pdf(&args.pdf, &output_dir, &options)
        .await
        .with_context(|| format!("Failed to render {}", args.pdf.display()))?;

    if !quiet {
        eprintln!(
            "{} {} pages  →  {}",
            green("✔"),
            written.len(),
            bold(&output_dir.display().to_string())
        );
    }
    Ok(())
}

async fn ocr(args: OcrArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let images_dir = args.dirs.or_default(&args.input_dir, "images");
    let output_dir = args.dirs.or_default(&args.output_dir, "ocr-result");

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn OcrProgressCallback>)
    } else {
        None
    };
    let config = build_config(&args, progress)?;
    let backend = build_backend(&args, &config)?;

    if let Some(ref image) = args.input_file {
        let report = transcribe_file(
            image,
            &output_dir,
            args.output_file.as_deref(),
            backend,
            &config,
        )
        .await
        .with_context(|| format!("OCR failed for {}", image.display()))?;

        if args.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialise report")?
            );
        } else if !quiet {
            eprintln!(
                "{} {}  {} attempt(s)  {}ms",
                green("✔"),
                image.display(),
                report.attempts,
                report.duration_ms
            );
        }
        return Ok(());
    }

    let job = OcrJob::new(&images_dir, &output_dir).with_range(args.start, args.end);
    let summary = run_ocr(&job, backend, &config)
        .await
        .context("OCR run stopped")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !quiet && !show_progress {
        eprintln!(
            "Transcribed {}/{} pages ({} rejected) in {}ms",
            summary.transcribed_pages,
            summary.total_pages,
            summary.rejected_pages,
            summary.total_duration_ms
        );
    }
    Ok(())
}

/// Map CLI args to `OcrConfig`.
fn build_config(args: &OcrArgs, progress: Option<ProgressCallback>) -> Result<OcrConfig> {
    let prompt = load_prompt(args.prompt_file.as_deref())
        .with_context(|| format!("Failed to read prompt from {:?}", args.prompt_file))?;

    let mut builder = OcrConfig::builder()
        .batch_size(args.batch_size)
        .max_attempts(args.max_attempts)
        .retry_delay_ms(args.retry_delay_ms)
        .api_timeout_secs(args.api_timeout)
        .prompt(prompt);
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

fn build_backend(args: &OcrArgs, config: &OcrConfig) -> Result<Arc<dyn OcrBackend>> {
    let backend: Arc<dyn OcrBackend> = match args.backend {
        BackendArg::Gemini => {
            let service =
                ServiceConfig::resolve_with_model(Some(&args.secrets), args.model.as_deref())
                    .context("Service is not configured")?;
            tracing::info!("Service {} (model {})", service.endpoint, service.model);
            Arc::new(GeminiBackend::new(service, config.api_timeout_secs)?)
        }
        BackendArg::Provider => {
            let backend = match (&args.provider, &args.model) {
                (Some(p), Some(m)) => ProviderBackend::from_name(p, m)?,
                (Some(p), None) => anyhow::bail!("--provider {p} needs --model"),
                (None, _) => ProviderBackend::from_env()?,
            };
            Arc::new(backend)
        }
    };
    Ok(backend)
}

fn list_fail(args: ListFailArgs) -> Result<()> {
    let ocr_dir = args.dirs.or_default(&args.ocr_dir, "ocr-result");
    let images_dir = args.dirs.or_default(&args.images_dir, "images");

    for page in assemble::list_failed_pages(&ocr_dir)
        .with_context(|| format!("Failed to scan {}", ocr_dir.display()))?
    {
        let name = assemble::failed_image_name(page);
        if args.basename_only {
            println!("{name}");
        } else {
            println!("{}", images_dir.join(name).display());
        }
    }
    Ok(())
}

fn merge(args: MergeArgs, quiet: bool) -> Result<()> {
    let input_dir = args.dirs.or_default(&args.input_dir, "ocr-result");
    let output_dir = args.dirs.or_default(&args.output_dir, "merge-result");
    let output_file = resolve_under(&output_dir, &args.output_file);

    let count = assemble::merge_transcripts(&input_dir, &output_file)
        .with_context(|| format!("Failed to merge {}", input_dir.display()))?;
    if !quiet {
        eprintln!(
            "{} merged {} files  →  {}",
            green("✔"),
            count,
            bold(&output_file.display().to_string())
        );
    }
    Ok(())
}

fn split(args: SplitArgs, quiet: bool) -> Result<()> {
    let output_dir = args.dirs.or_default(&args.output_dir, "merge-result");
    let input_file = args
        .input_file
        .clone()
        .unwrap_or_else(|| output_dir.join(assemble::ROUGH_FILE));

    let written = assemble::split_rough(&input_file, &output_dir)
        .with_context(|| format!("Failed to split {}", input_file.display()))?;
    if !quiet {
        for path in &written {
            eprintln!("  {} {}", dim("created"), path.display());
        }
        eprintln!("{} {} chapters", green("✔"), written.len());
    }
    Ok(())
}

fn typeset(args: TypesetArgs, quiet: bool) -> Result<()> {
    let input_dir = args.dirs.or_default(&args.input_dir, "merge-result");
    let output_dir = args.dirs.or_default(&args.output_dir, "typeset-result");

    let selection = if let Some(ref list) = args.files_from {
        Selection::Files(
            layout::read_file_list(list)
                .with_context(|| format!("Failed to read {}", list.display()))?,
        )
    } else if !args.file_indices.is_empty() {
        Selection::Indices(args.file_indices.clone())
    } else if !args.files.is_empty() {
        Selection::Files(args.files.clone())
    } else {
        Selection::All
    };
    let options = TypesetOptions {
        selection,
        force_index: args.index,
    };

    let report = layout::typeset_dir(&input_dir, &output_dir, &options)
        .with_context(|| format!("Failed to typeset {}", input_dir.display()))?;
    if !quiet {
        for name in &report.missing {
            eprintln!("  {} {} not found", yellow("⚠"), name);
        }
        eprintln!(
            "{} {} files typeset  →  {}",
            green("✔"),
            report.processed.len(),
            bold(&output_dir.display().to_string())
        );
    }
    Ok(())
}

fn merge_final(args: MergeFinalArgs, quiet: bool) -> Result<()> {
    let root = args.dirs.root();
    let input_dir = args.dirs.or_default(&args.input_dir, "typeset-result");
    let output_file = match args.output_file {
        Some(ref p) => p.clone(),
        None => root.join(format!("{}.md", book_name(&root)?)),
    };

    let order = assemble::merge_final(&input_dir, &output_file)
        .with_context(|| format!("Failed to merge {}", input_dir.display()))?;
    if !quiet {
        eprintln!(
            "{} {} chapters  →  {}",
            green("✔"),
            order.len(),
            bold(&output_file.display().to_string())
        );
    }
    Ok(())
}

/// Name of the book directory; `.` resolves to the working directory's name.
fn book_name(root: &Path) -> Result<String> {
    let absolute = std::path::absolute(root)
        .with_context(|| format!("Failed to resolve {}", root.display()))?;
    absolute
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .next_back()
        .map(String::from)
        .context("Cannot derive a book name; pass --output-file")
}

fn resolve_under(dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        dir.join(file)
    }
}
