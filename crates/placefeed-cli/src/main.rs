// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! placefeed — entry point.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use placefeed::search_url::build_search_url;
use placefeed::{
    load_json, plan_queries, BatchDriver, ChromiumRenderer, FileSink, LaunchOptions, Renderer,
    RunMode, ScrapeConfig,
};

#[derive(Parser)]
#[command(
    name = "placefeed",
    about = "placefeed — collect name/address/phone records from map-search feeds",
    version,
    after_help = "Settings also come from PLACEFEED_* environment variables; flags win."
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Search phrase (default: PLACEFEED_SEARCH or "Toko").
    #[arg(long, global = true)]
    search: Option<String>,

    /// Maximum scroll rounds per feed.
    #[arg(long, global = true)]
    max_scrolls: Option<u32>,

    /// Directory for JSON/CSV output.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Extra attempts for a failing point before it is skipped.
    #[arg(long, global = true)]
    point_retries: Option<u32>,

    /// Show the browser window.
    #[arg(long, global = true)]
    headed: bool,

    /// Path to the Chromium/Chrome binary.
    #[arg(long, global = true)]
    chromium: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every point in a positions file (default command).
    Run {
        /// Positions JSON file (default: PLACEFEED_POSITIONS or positions.json).
        #[arg(long)]
        positions: Option<PathBuf>,
    },
    /// Scrape a single coordinate.
    Single {
        /// Coordinate/zoom token, e.g. "@-6.8890102,106.873541,13z".
        #[arg(long)]
        coordinate: Option<String>,
        /// Area qualifier appended to the search phrase, e.g. ", Cikole, Sukabumi".
        #[arg(long)]
        area: Option<String>,
    },
    /// Print the search URL for a coordinate without opening a browser.
    Url {
        /// Coordinate/zoom token.
        coordinate: String,
        /// Area qualifier appended to the search phrase.
        #[arg(long)]
        area: Option<String>,
    },
    /// Print records from a saved JSON result file.
    Show {
        /// Path to a `.json` output file.
        path: PathBuf,
    },
    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ScrapeConfig::from_env().context("invalid PLACEFEED_* environment")?;
    apply_flags(&cli, &mut config);

    match cli.command.unwrap_or(Commands::Run { positions: None }) {
        Commands::Run { positions } => {
            if let Some(positions) = positions {
                config.mode = RunMode::Batch { positions };
            }
            scrape(&cli.chromium, config).await?;
        }

        Commands::Single { coordinate, area } => {
            let (default_coordinate, default_area) = match config.mode {
                RunMode::Single { coordinate, area } => (coordinate, area),
                RunMode::Batch { .. } => (placefeed::config::DEFAULT_COORDINATE.to_string(), None),
            };
            config.mode = RunMode::Single {
                coordinate: coordinate.unwrap_or(default_coordinate),
                area: area.or(default_area),
            };
            scrape(&cli.chromium, config).await?;
        }

        Commands::Url { coordinate, area } => {
            let url = build_search_url(&config.search_term, area.as_deref(), &coordinate)?;
            println!("{url}");
        }

        Commands::Show { path } => match load_json(&path)? {
            Some(records) => println!("{}", serde_json::to_string_pretty(&records)?),
            None => bail!("no result file at {}", path.display()),
        },

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "placefeed", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn apply_flags(cli: &Cli, config: &mut ScrapeConfig) {
    if let Some(search) = &cli.search {
        config.search_term = search.clone();
    }
    if let Some(max) = cli.max_scrolls {
        config.max_scroll_attempts = max;
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(retries) = cli.point_retries {
        config.point_retries = retries;
    }
    if cli.headed {
        config.headless = false;
    }
}

async fn scrape(chromium: &Option<PathBuf>, config: ScrapeConfig) -> Result<()> {
    config.validate()?;
    let queries = plan_queries(&config)?;
    if queries.is_empty() {
        bail!("no query points to scrape");
    }

    let renderer = ChromiumRenderer::launch(LaunchOptions {
        headless: config.headless,
        executable: chromium.clone(),
        ..LaunchOptions::default()
    })
    .await?;

    let driver =
        BatchDriver::new(&renderer, &config).with_sink(FileSink::new(config.output_dir.clone()));

    let report = tokio::select! {
        report = driver.run_batch(&queries) => Some(report),
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted; closing browser");
            None
        }
    };

    drop(driver);
    renderer.shutdown().await?;
    drop(renderer);

    let Some(report) = report else {
        bail!("interrupted");
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.completed.is_empty() && !report.failed.is_empty() {
        bail!("all {} query points failed", report.failed.len());
    }
    Ok(())
}
