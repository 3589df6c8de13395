//! ScrapeSmart main entry point
//!
//! This is the command-line interface: scrape a site once, then ask the model
//! any number of questions about it in one conversation.

use anyhow::Context;
use clap::Parser;
use scrapesmart::config::{load_config_with_hash, Config};
use scrapesmart::crawler::build_http_client;
use scrapesmart::events::{CrawlEvent, EventSink, ExtractionEvent};
use scrapesmart::output::{
    download_images, export_file_stem, print_statistics, write_export, CrawlStatistics,
    ExportFormat,
};
use scrapesmart::{Pipeline, SessionState};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// ScrapeSmart: crawl a website and extract structured data with an LLM
///
/// Pages are crawled from the start URL and their text is handed to the
/// configured model together with each description. Results are printed as
/// they stream in and saved in the chosen export format.
#[derive(Parser, Debug)]
#[command(name = "scrapesmart")]
#[command(version = "1.0.0")]
#[command(about = "Crawl a website and extract structured data with an LLM", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// URL to start crawling from (without it, questions are answered conversationally)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// What to extract; repeat to ask follow-up questions (read from stdin if omitted)
    #[arg(long = "ask", value_name = "DESCRIPTION")]
    ask: Vec<String>,

    /// Export format (text, csv, json, html), overriding the config
    #[arg(long, value_name = "FORMAT")]
    format: Option<ExportFormat>,

    /// Output directory, overriding the config
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Download the images of the last scraped page
    #[arg(long)]
    download_images: bool,

    /// Validate config and show what would be done without doing it
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(out) = &cli.out {
        config.output.directory = out.display().to_string();
    }

    if cli.dry_run {
        handle_dry_run(&config, cli.url.as_deref());
        return Ok(());
    }

    let pipeline = Pipeline::from_config(config)?;
    let mut state = SessionState::new();

    if let Some(url) = &cli.url {
        handle_scrape(&pipeline, &mut state, url).await?;

        if cli.download_images {
            handle_download_images(pipeline.config(), &state).await?;
        }
    }

    if cli.ask.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let description = line.trim();
            if description.is_empty() {
                continue;
            }
            handle_ask(&pipeline, &mut state, description).await?;
        }
    } else {
        for description in &cli.ask {
            handle_ask(&pipeline, &mut state, description).await?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scrapesmart=info,warn"),
            1 => EnvFilter::new("scrapesmart=debug,info"),
            2 => EnvFilter::new("scrapesmart=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config, url: Option<&str>) {
    println!("=== ScrapeSmart Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Follow links: {}", config.crawler.follow_links);
    println!(
        "  Extract images: {} (max {})",
        config.crawler.extract_images, config.crawler.max_images
    );
    println!(
        "  Chunking: {} ({} characters per chunk)",
        config.crawler.chunking, config.crawler.chunk_size
    );
    println!("  Link set: {:?}", config.crawler.link_set);

    println!("\nFetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Settle delay: {}ms", config.fetcher.settle_delay_ms);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!(
        "  Challenge markers: {}",
        config.fetcher.challenge_markers.join(", ")
    );

    println!("\nModel:");
    println!("  Id: {}", config.model.id);
    match config.model.provider() {
        Ok(provider) => println!("  Provider: {}", provider.display_name()),
        Err(e) => println!("  Provider: {}", e),
    }
    match config.model.endpoint() {
        Ok(endpoint) => println!("  Endpoint: {}", endpoint),
        Err(e) => println!("  Endpoint: {}", e),
    }
    match config.model.resolve_api_key() {
        Ok(_) => println!("  API key: available"),
        Err(e) => println!("  API key: {}", e),
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Format: {}", config.output.format);

    println!("\n✓ Configuration is valid");
    match url {
        Some(url) => println!(
            "✓ Would crawl up to {} pages starting at {}",
            config.crawler.max_pages, url
        ),
        None => println!("✓ No URL given; questions would be answered conversationally"),
    }
}

/// Handles the crawl and prints its statistics
async fn handle_scrape(
    pipeline: &Pipeline,
    state: &mut SessionState,
    url: &str,
) -> anyhow::Result<()> {
    let (events, mut rx) = EventSink::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                CrawlEvent::Fetching { index, max, url } => {
                    eprintln!("Scraping {}/{}: {}", index, max, url)
                }
                CrawlEvent::PageFailed { url, error } => {
                    eprintln!("Error scraping {}: {}", url, error)
                }
                CrawlEvent::Aborted { url } => {
                    eprintln!("Bot protection detected at {}, stopping", url)
                }
                CrawlEvent::Progress { .. } | CrawlEvent::Finished(_) => {}
            }
        }
    });

    let outcome = pipeline.scrape(state, url, &events).await;
    drop(events);
    let _ = printer.await;

    let outcome = outcome?;
    print_statistics(&CrawlStatistics::from_outcome(&outcome));

    let links = pipeline.discovered_links(state);
    if !links.is_empty() {
        println!(
            "Discovered links ({:?}):",
            pipeline.config().crawler.link_set
        );
        for link in links {
            println!("  {}", link);
        }
        println!();
    }
    Ok(())
}

/// Handles the --download-images flag
async fn handle_download_images(config: &Config, state: &SessionState) -> anyhow::Result<()> {
    if state.image_urls.is_empty() {
        println!("No images found on the last scraped page");
        return Ok(());
    }

    let client = build_http_client(&config.fetcher)?;
    let directory = Path::new(&config.output.directory).join("images");
    let report = download_images(
        &client,
        &state.image_urls,
        &directory,
        config.crawler.max_images,
    )
    .await?;

    println!(
        "Total Images Downloaded: {} at {}",
        report.saved.len(),
        directory.display()
    );
    Ok(())
}

/// Handles one description: streams the answer and saves the export
async fn handle_ask(
    pipeline: &Pipeline,
    state: &mut SessionState,
    description: &str,
) -> anyhow::Result<()> {
    let (events, mut rx) = EventSink::channel();
    let printer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        while let Some(event) = rx.recv().await {
            match event {
                ExtractionEvent::Fragment(fragment) => {
                    let _ = write!(stdout, "{}", fragment);
                    let _ = stdout.flush();
                }
                ExtractionEvent::Failed(message) => eprintln!("\n{}", message),
                ExtractionEvent::Partial(_) => {}
            }
        }
    });

    let answer = pipeline.ask(state, description, &events).await;
    drop(events);
    let _ = printer.await;
    println!();

    let answer = answer?;
    let config = pipeline.config();
    let format = config.output.format;

    if answer.table.is_empty() {
        println!("No structured data found");
        if format != ExportFormat::Text || answer.text.trim().is_empty() {
            return Ok(());
        }
    }

    let path = write_export(
        Path::new(&config.output.directory),
        &export_file_stem(description),
        format,
        &answer.table,
        &answer.text,
    )?;
    println!("Saved {} to {}", format, path.display());

    Ok(())
}
