//! Slide Crop - overlapping crop grids for Whole Slide Images.
//!
//! This binary plans crop grids and runs crop extraction from the command line.

use clap::Parser;
use std::collections::VecDeque;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slide_crop::{
    config::{Cli, Command, PlanConfig, RunConfig, TilingArgs},
    DriverError, ImageSlideBackend, SlideCropDriver,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Plan(config) => run_plan(config).await,
        Command::Run(config) => run_run(config).await,
    }
}

/// Open a driver over the local raster backend.
async fn open_driver(
    tiling: &TilingArgs,
) -> Result<SlideCropDriver<ImageSlideBackend>, DriverError> {
    let backend = ImageSlideBackend::with_min_level_size(tiling.min_level_size);
    SlideCropDriver::open(backend, tiling.to_crop_options()).await
}

// =============================================================================
// Plan Command
// =============================================================================

async fn run_plan(config: PlanConfig) -> ExitCode {
    // Only log to stderr when asked; stdout carries the JSON
    if config.tiling.verbose {
        init_logging(true);
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let driver = match open_driver(&config.tiling).await {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let summary = match driver.summary(config.tiling.batch_size) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let json = if config.compact {
        serde_json::to_string(&summary)
    } else {
        serde_json::to_string_pretty(&summary)
    };

    match json {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: failed to serialize summary: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Run Command
// =============================================================================

async fn run_run(config: RunConfig) -> ExitCode {
    init_logging(config.tiling.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let driver = match open_driver(&config.tiling).await {
        Ok(driver) => driver,
        Err(e) => {
            error!("Failed to open slide {}: {}", config.tiling.slide, e);
            return ExitCode::FAILURE;
        }
    };

    let (mut cohorts, total_batches) = match driver.crop(config.tiling.batch_size) {
        Ok(stream) => stream,
        Err(e) => {
            error!("Cannot crop slide: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (mosaic_height, mosaic_width) = driver.predicted_size();
    info!("Configuration:");
    info!("  Slide: {}", config.tiling.slide);
    info!("  Crops: {}", cohorts.total_crops());
    info!(
        "  Batches: {} of {}, {} per worker",
        total_batches, config.tiling.batch_size, config.tiling.cohort_size
    );
    info!("  Workers: {}", cohorts.len());
    info!("  Mosaic: {}x{}", mosaic_width, mosaic_height);

    let started = Instant::now();
    let mut in_flight = VecDeque::with_capacity(config.cohorts_in_flight);
    let mut produced = 0usize;
    let mut failed = 0usize;
    let mut done = 0usize;

    loop {
        // Keep the window full before resolving the oldest cohort
        while in_flight.len() < config.cohorts_in_flight {
            match cohorts.next() {
                Some(cohort) => in_flight.push_back(cohort),
                None => break,
            }
        }

        let Some(cohort) = in_flight.pop_front() else {
            break;
        };

        for batch in cohort.into_batches() {
            let index = batch.index();
            for result in batch.resolve().await {
                match result {
                    Ok(_) => produced += 1,
                    Err(e) if config.fail_fast => {
                        error!("Batch {} failed, aborting: {}", index, e);
                        return ExitCode::FAILURE;
                    }
                    Err(e) => {
                        warn!("Skipping tile in batch {}: {}", index, e);
                        failed += 1;
                    }
                }
            }

            done += 1;
            info!("Batch {}/{} done", done, total_batches);
        }
    }

    let report = serde_json::json!({
        "slide": config.tiling.slide,
        "batches": total_batches,
        "produced": produced,
        "failed": failed,
        "workers": driver.workers_spawned(),
        "elapsed_ms": started.elapsed().as_millis() as u64,
    });
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Failed to serialize report: {}", e),
    }

    if failed > 0 {
        warn!("{} of {} tiles failed", failed, produced + failed);
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "slide_crop=debug"
    } else {
        "slide_crop=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
