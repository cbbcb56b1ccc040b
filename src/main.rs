// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! SafeWalk - Personal Safety Companion
//!
//! Headless monitoring session: samples camera, microphone and location every few
//! seconds, asks the assessment service for a risk level, and logs the result.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use safewalk::core::{next_event, EventPayload};
use safewalk::{build_info, Config, Coordinates, Session, VERSION};

/// SafeWalk - Personal Safety Companion
#[derive(Parser, Debug)]
#[command(name = "safewalk")]
#[command(author = "SafeWalk Project")]
#[command(version = VERSION)]
#[command(about = "Continuous camera/audio/location risk monitoring")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Demo mode with simulated devices and assessment service
    #[arg(long)]
    demo: bool,

    /// Seconds between assessment cycles
    #[arg(long)]
    interval: Option<u64>,

    /// Fixed latitude (requires --lng)
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Fixed longitude (requires --lat)
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,

    /// Stop monitoring after this many seconds
    #[arg(long)]
    duration: Option<u64>,

    /// Generate an incident report after monitoring stops
    #[arg(long)]
    report: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🛡 SafeWalk v{} - Personal Safety Companion", VERSION);
    let build = build_info();
    info!("Build: {} / {} features={:?}", build.os, build.target, build.features);

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Override with command line args
    if args.demo {
        config.apply_demo_mode();
    }
    if let Some(interval) = args.interval {
        config.session.interval_secs = interval;
    }
    if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
        config.location.latitude = Some(lat);
        config.location.longitude = Some(lng);
    }
    config.validate()?;

    info!("Configuration loaded from {:?}", config_path);
    info!("Demo mode: {}", config.demo_mode);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, args))
}

async fn run(config: Config, args: Args) -> Result<()> {
    let session = Session::from_config(&config)?;
    info!("Session {} ready", session.id());

    // Render events the loop does not already log
    let mut events = session.subscribe();
    let max_places = config.session.max_visible_places;
    let renderer = tokio::spawn(async move {
        while let Some(event) = next_event(&mut events).await {
            match event.payload {
                EventPayload::Places(places) => {
                    for place in places.iter().take(max_places) {
                        info!("📍 {} ({}) {}", place.name, place.distance, place.uri.as_deref().unwrap_or(""));
                    }
                }
                EventPayload::Alert { level, .. } => {
                    // Terminal bell as the local alert
                    eprint!("\x07");
                    info!("🚨 Alert raised at {} level", level);
                }
                _ => {}
            }
        }
    });

    match session.resolve_location().await {
        Some(Coordinates { latitude, longitude }) => info!("Location: {:.5}, {:.5}", latitude, longitude),
        None => warn!("Running without location; no assessments will be made"),
    }

    session.start().await;
    info!("   Press Ctrl+C to stop monitoring");

    match args.duration {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => info!("Monitoring duration elapsed"),
                _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("Shutdown signal received");
        }
    }

    // Report while the camera is still live
    if args.report {
        let report = session.generate_report().await;
        println!("{}", report);
    }

    session.stop().await;

    let state = session.state().await;
    println!("{}", serde_json::to_string_pretty(&state)?);

    renderer.abort();
    info!("SafeWalk shutdown complete");
    Ok(())
}
