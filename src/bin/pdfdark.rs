//! CLI binary for pdf-darkmode.
//!
//! A thin shim over the library crate: batch conversion, page inspection,
//! and a line-oriented terminal viewer driving [`Session`].

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_darkmode::{
    convert_to_file, inspect, DarkModeConfig, PageProgressCallback, PageSelection, PageView,
    PdfiumLoader, ProgressCallback, Session,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_document_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Inverting");
        self.bar.reset_eta();
    }

    fn page_elapsed(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl PageProgressCallback for CliProgressCallback {
    fn on_document_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Inverting {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut t) = self.page_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize) {
        let elapsed = self.page_elapsed();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{elapsed:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed = self.page_elapsed();
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{elapsed:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages inverted",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages inverted  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Write an inverted copy
  pdfdark paper.pdf -o paper-dark.pdf

  # Only some pages, rendered at 144 DPI
  pdfdark --pages 1-5 --dpi 144 paper.pdf -o intro-dark.pdf

  # Page count and page sizes
  pdfdark --inspect-only --json paper.pdf

  # Browse the inverted pages in the terminal
  pdfdark --view paper.pdf

VIEWER COMMANDS:
  n                next page
  p                previous page
  g N              go to page N
  w FILE.png       write the current page as PNG
  s FILE.pdf       save the inverted PDF
  o FILE.pdf       open another PDF
  c                close the document
  q                quit

PDFIUM:
  libpdfium is looked up in the current directory, then system-wide.
  Use --pdfium-lib /path/to/libpdfium to point at a specific copy.
"#;

/// View and export dark-mode (colour-inverted) renderings of PDF files.
#[derive(Parser, Debug)]
#[command(
    name = "pdfdark",
    version,
    about = "View and export dark-mode (colour-inverted) renderings of PDF files",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write the inverted PDF to this file.
    #[arg(short, long, required_unless_present_any = ["inspect_only", "view"])]
    output: Option<PathBuf>,

    /// Rendering DPI (36–600). 72 renders one pixel per point.
    #[arg(long, default_value_t = 72,
          value_parser = clap::value_parser!(u32).range(36..=600))]
    dpi: u32,

    /// Maximum rendered width or height in pixels.
    #[arg(long, default_value_t = 4000)]
    max_pixels: u32,

    /// Page selection: all, 5, 3-15, or a list such as 1,3,5-7.
    #[arg(long, default_value = "all")]
    pages: PageSelection,

    /// PDF user password for encrypted documents.
    #[arg(long)]
    password: Option<String>,

    /// Path to the pdfium shared library.
    #[arg(long)]
    pdfium_lib: Option<PathBuf>,

    /// Print page count and page sizes only.
    #[arg(long, conflicts_with = "view")]
    inspect_only: bool,

    /// Browse the inverted pages interactively.
    #[arg(long)]
    view: bool,

    /// Output JSON (with --inspect-only or for conversion stats).
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
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
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn PageProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let summary = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
            );
        } else {
            println!("File:   {}", cli.input.display());
            println!("Pages:  {}", summary.page_count);
            for page in &summary.pages {
                match page.size {
                    Some(s) => println!("  {:>4}  {:.1} x {:.1} pt", page.index + 1, s.width, s.height),
                    None => println!("  {:>4}  {}", page.index + 1, red("unreadable")),
                }
            }
        }
        return Ok(());
    }

    // ── Viewer mode ──────────────────────────────────────────────────────
    if cli.view {
        let input = cli.input.clone();
        return tokio::task::block_in_place(move || run_viewer(input, config));
    }

    // ── Batch conversion ─────────────────────────────────────────────────
    let output_path = cli
        .output
        .as_ref()
        .context("--output is required for conversion")?;
    let stats = convert_to_file(&cli.input, output_path, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
        );
    } else if !cli.quiet {
        let selected = stats.processed_pages + stats.failed_pages;
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if stats.failed_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.processed_pages,
            selected,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        if stats.failed_pages > 0 {
            eprintln!(
                "   {} placeholder pages written",
                red(&stats.failed_pages.to_string())
            );
        }
    }

    Ok(())
}

/// Map CLI args to `DarkModeConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<DarkModeConfig> {
    let mut builder = DarkModeConfig::builder()
        .dpi(cli.dpi)
        .max_rendered_pixels(cli.max_pixels)
        .pages(cli.pages.clone());

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

// ── Terminal viewer ──────────────────────────────────────────────────────────

/// One parsed viewer command.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Next,
    Prev,
    Goto(usize),
    WritePng(PathBuf),
    Save(PathBuf),
    Open(PathBuf),
    Close,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };
    let need_arg = |what: &str| -> Result<PathBuf> {
        if arg.is_empty() {
            anyhow::bail!("'{cmd}' needs {what}");
        }
        Ok(PathBuf::from(arg))
    };

    Ok(match cmd {
        "n" | "next" => Command::Next,
        "p" | "prev" => Command::Prev,
        "g" | "goto" => {
            let page: usize = arg.parse().context("Invalid page number")?;
            if page < 1 {
                anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
            }
            Command::Goto(page)
        }
        "w" | "write" => Command::WritePng(need_arg("a PNG path")?),
        "s" | "save" => Command::Save(need_arg("an output PDF path")?),
        "o" | "open" => Command::Open(need_arg("a PDF path")?),
        "c" | "close" => Command::Close,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => anyhow::bail!("Unknown command '{other}' (h for help)"),
    })
}

fn print_status(session: &Session<PdfiumLoader>) {
    let nav = format!(
        "[{}prev] [{}next] [{}save]",
        if session.can_prev() { "" } else { "-" },
        if session.can_next() { "" } else { "-" },
        if session.can_save() { "" } else { "-" },
    );
    match session.current_view() {
        Ok(PageView::Image { size, image, .. }) => println!(
            "{}  {}x{} px  ({:.0} x {:.0} pt)  {}",
            bold(&session.page_label()),
            image.width(),
            image.height(),
            size.width,
            size.height,
            dim(&nav)
        ),
        Ok(PageView::Placeholder { message, .. }) => println!(
            "{}  {}  {}",
            bold(&session.page_label()),
            red(&message),
            dim(&nav)
        ),
        Err(_) => println!("{}  {}", bold(&session.page_label()), dim("no file selected")),
    }
}

fn run_viewer(input: PathBuf, config: DarkModeConfig) -> Result<()> {
    let loader = PdfiumLoader::new(&config).context("Failed to load PDF engine")?;
    let mut session = Session::new(loader, config);

    match session.open(&input) {
        Ok(()) => println!("{} Opened {}", green("✔"), input.display()),
        Err(e) => eprintln!("{} Could not open or process PDF: {e}", red("✘")),
    }
    print_status(&session);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush().ok();
        let Some(line) = lines.next() else { break };
        let line = line.context("Failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let cmd = match parse_command(&line) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{} {e}", red("✘"));
                continue;
            }
        };

        let outcome: Result<()> = match cmd {
            Command::Quit => break,
            Command::Help => {
                println!("{AFTER_HELP}");
                Ok(())
            }
            Command::Next => session.next().map(|_| ()).map_err(Into::into),
            Command::Prev => session.prev().map(|_| ()).map_err(Into::into),
            Command::Goto(page) => session.go_to(page - 1).map(|_| ()).map_err(Into::into),
            Command::Close => {
                session.close();
                Ok(())
            }
            Command::Open(path) => session
                .open(&path)
                .map(|()| println!("{} Opened {}", green("✔"), path.display()))
                .with_context(|| format!("Could not open or process PDF '{}'", path.display())),
            Command::Save(path) => session
                .export(&path)
                .map(|s| {
                    println!(
                        "{} Inverted PDF saved to {} ({} pages)",
                        green("✔"),
                        s.path.display(),
                        s.pages
                    )
                })
                .context("Could not save inverted PDF"),
            Command::WritePng(path) => write_png(&session, &path),
        };

        if let Err(e) = outcome {
            eprintln!("{} {e:#}", red("✘"));
        }
        print_status(&session);
    }

    session.close();
    Ok(())
}

fn write_png(session: &Session<PdfiumLoader>, path: &Path) -> Result<()> {
    let view = session.current_view()?;
    let png = view
        .to_png()
        .with_context(|| format!("Page {} could not be displayed", view.page_num()))?
        .context("Failed to encode PNG")?;
    std::fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} Wrote {}", green("✔"), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_flag_uses_selection_grammar() {
        let cli = Cli::try_parse_from(["pdfdark", "in.pdf", "-o", "out.pdf", "--pages", "2,4-5"])
            .unwrap();
        assert_eq!(cli.pages, PageSelection::Set(vec![2, 4, 5]));
        assert!(Cli::try_parse_from(["pdfdark", "in.pdf", "-o", "o.pdf", "--pages", "0"]).is_err());
    }

    #[test]
    fn parse_viewer_commands() {
        assert_eq!(parse_command("n").unwrap(), Command::Next);
        assert_eq!(parse_command(" prev ").unwrap(), Command::Prev);
        assert_eq!(parse_command("g 3").unwrap(), Command::Goto(3));
        assert_eq!(
            parse_command("s out dir/dark.pdf").unwrap(),
            Command::Save(PathBuf::from("out dir/dark.pdf"))
        );
        assert!(parse_command("g 0").is_err());
        assert!(parse_command("w").is_err());
        assert!(parse_command("zoom").is_err());
    }
}
