//! Blinc Carousel CLI
//!
//! Inspect section math and replay carousel scenarios without a UI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use blinc_carousel::{sections::section_diff, section_count, Alignment, CarouselConfig};

mod scenario;

use scenario::{Scenario, Simulation};

#[derive(Parser)]
#[command(name = "blinc-carousel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Headless carousel simulator", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the sections for a given item count and visible capacity
    Sections {
        /// Number of items in the carousel
        items: usize,

        /// Items fully visible at once
        visible: usize,

        /// Alignment (start, center, end)
        #[arg(short, long, default_value = "center")]
        alignment: Alignment,
    },

    /// Replay a scenario file frame by frame
    Simulate {
        /// Scenario TOML file
        scenario: PathBuf,

        /// Print events as JSON lines instead of log output
        #[arg(long)]
        json: bool,
    },

    /// Validate a carousel configuration file
    Check {
        /// Configuration TOML file
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Sections {
            items,
            visible,
            alignment,
        } => cmd_sections(items, visible, alignment),
        Commands::Simulate { scenario, json } => cmd_simulate(&scenario, json),
        Commands::Check { config } => cmd_check(&config),
    }
}

fn cmd_sections(items: usize, visible: usize, alignment: Alignment) -> Result<()> {
    if visible == 0 {
        anyhow::bail!("At least one item must be visible");
    }
    let count = section_count(alignment, items, Some(visible));
    let diff = section_diff(alignment, visible.min(items));
    let offset = match alignment {
        Alignment::Start => 0,
        Alignment::Center => diff / 2,
        Alignment::End => diff,
    };

    info!(
        "{} items, {} visible, {} alignment: {} sections",
        items, visible, alignment, count
    );
    for section in 0..count {
        println!("section {:>3}: item {}", section, section + offset);
    }
    Ok(())
}

fn cmd_simulate(path: &Path, json: bool) -> Result<()> {
    let scenario = Scenario::load(path)?;
    info!(
        "Simulating {} ({} steps, {} ms)",
        path.display(),
        scenario.steps.len(),
        scenario.duration_ms
    );

    let summary = Simulation::new(scenario)?.run(|record| {
        if json {
            match serde_json::to_string(&record) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Failed to encode event: {}", e),
            }
        } else {
            scenario::log_record(&record);
        }
    });

    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        info!(
            section_count = summary.section_count,
            section_index = ?summary.section_index,
            max_visible = ?summary.max_visible,
            scroll_left = summary.scroll_left,
            playing = summary.playing,
            "Simulation finished"
        );
    }
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let config = CarouselConfig::load(path)?;
    info!("Configuration OK");
    info!("  alignment: {}", config.alignment);
    info!("  threshold: {}", config.threshold);
    info!(
        "  autoplay: {} (every {} ms)",
        config.autoplay, config.flip_time_ms
    );
    info!("  infinite: {}", config.infinite);
    Ok(())
}
