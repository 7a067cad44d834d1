use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use dp_core::DpError;
use dp_core::DpResult;
use dp_enhance::EnhancementReport;
use dp_enhance::EnhancerConfig;
use dp_enhance::PageEvent;
use dp_enhance::PageSession;
use dp_enhance::StaticPage;
use dp_html::HtmlParser;
use dp_html::decode_html_bytes;
use dp_html::serialize_document;
use dp_layout::Viewport;
use tracing::debug;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_PAGE_URL: &str = "http://localhost/";
const DEFAULT_LOG_FILTER: &str = "docpolish=info";

/// Enhance a rendered documentation page.
#[derive(Debug, Parser)]
#[command(name = "docpolish", version, about)]
struct Cli {
    /// Rendered HTML page to enhance.
    input: PathBuf,

    /// Write the enhanced page here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// URL the page is served from; its hostname counts as internal.
    #[arg(long, default_value = DEFAULT_PAGE_URL)]
    page_url: String,

    /// JSON file with enhancer settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Viewport used to estimate layout, as WIDTHxHEIGHT.
    #[arg(long, default_value = "1280x800", value_parser = parse_viewport)]
    viewport: Viewport,

    /// Simulate a scroll to this offset; repeat for several events.
    #[arg(long = "scroll-to", value_name = "PX", allow_negative_numbers = true)]
    scroll_to: Vec<f32>,

    /// Print per-pass counts as JSON on stderr.
    #[arg(long)]
    report: bool,
}

fn parse_viewport(input: &str) -> Result<Viewport, String> {
    Viewport::parse(input).ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{input}`"))
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("docpolish: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> DpResult<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EnhancerConfig::default(),
    };

    let bytes = fs::read(&cli.input).map_err(|error| {
        DpError::new(
            "cli.io.read",
            format!("failed to read `{}`: {error}", cli.input.display()),
        )
    })?;
    info!(input = %cli.input.display(), bytes = bytes.len(), "enhancing page");

    let (html, report) = enhance_page(&bytes, cli, config)?;

    match &cli.output {
        Some(path) => fs::write(path, html.as_bytes()).map_err(|error| {
            DpError::new(
                "cli.io.write",
                format!("failed to write `{}`: {error}", path.display()),
            )
        })?,
        None => std::io::stdout()
            .lock()
            .write_all(html.as_bytes())
            .map_err(|error| DpError::new("cli.io.write", format!("failed to write stdout: {error}")))?,
    }

    if cli.report {
        let json = serde_json::to_string(&report).map_err(|error| {
            DpError::new("cli.report.encode", format!("failed to encode report: {error}"))
        })?;
        eprintln!("{json}");
    }

    Ok(())
}

fn load_config(path: &Path) -> DpResult<EnhancerConfig> {
    let raw = fs::read_to_string(path).map_err(|error| {
        DpError::new(
            "cli.io.read",
            format!("failed to read config `{}`: {error}", path.display()),
        )
    })?;
    let config: EnhancerConfig = serde_json::from_str(&raw).map_err(|error| {
        DpError::new(
            "cli.config.parse",
            format!("invalid config `{}`: {error}", path.display()),
        )
    })?;
    config.validate()?;
    Ok(config)
}

/// Runs content-ready and the requested scrolls; returns the serialized page.
fn enhance_page(
    bytes: &[u8],
    cli: &Cli,
    config: EnhancerConfig,
) -> DpResult<(String, EnhancementReport)> {
    let document = HtmlParser.parse(&decode_html_bytes(bytes));
    let page = StaticPage::new(document, &cli.page_url, cli.viewport)?;
    let interval = config.scroll_min_interval();
    let mut session = PageSession::new(page, config)?;

    let report = session.content_ready();
    // Simulated scrolls are spaced one throttle interval apart so none is dropped.
    let mut at = Instant::now();
    for scroll_top in &cli.scroll_to {
        let outcome = session.dispatch(PageEvent::Scroll {
            scroll_top: *scroll_top,
            at,
        });
        debug!(scroll_top, ?outcome, "simulated scroll");
        at = at.checked_add(interval).unwrap_or(at);
    }

    let document = session.into_host().into_document();
    Ok((serialize_document(&document), report))
}
