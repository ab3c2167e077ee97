use std::{error::Error, path::PathBuf, sync::Arc, time::Duration};

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracker::{
    clock::ManualClock,
    geocode::{Geocoder, NominatimGeocoder, OfflineGeocoder},
    store::JsonFileStore,
    FixDecision, GeocoderConfig, Ports, TrackerConfig, TrackerHandle,
};

mod input;
mod report;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// Feeds recorded position fixes through the route tracker
struct Cli {
    /// Directory holding the saved route
    #[arg(long, default_value = ".")]
    store_dir: PathBuf,
    /// Storage slot of the route (defaults to TRACKER_ROUTE_SLOT or "savedRoute")
    #[arg(long)]
    slot: Option<String>,
    /// Resolve addresses through the geocoding service set in GEOCODER_URL
    #[arg(long)]
    online: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a CSV track (latitude,longitude,timestamp[,accuracy])
    Replay {
        track: PathBuf,
        /// Minimum distance between recorded points in meters
        #[arg(long)]
        threshold: Option<f64>,
        /// Maximum age of a fix in seconds
        #[arg(long)]
        max_age: Option<f64>,
        /// Start a new route instead of continuing the saved one
        #[arg(long)]
        fresh: bool,
    },
    /// Show the saved route and its statistics
    Stats,
    /// Delete the saved route
    Reset,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(why) = run(cli).await {
        log::error!("{}", why);
        eprintln!("error: {}", why);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = TrackerConfig::from_env();
    if let Some(slot) = cli.slot {
        config.route_slot = slot;
    }
    let geocoder: Arc<dyn Geocoder> = if cli.online {
        Arc::new(NominatimGeocoder::new(&GeocoderConfig::from_env())?)
    } else {
        Arc::new(OfflineGeocoder)
    };
    let store = Arc::new(JsonFileStore::new(&cli.store_dir, config.route_slot.clone()));

    match cli.command {
        Command::Replay {
            track,
            threshold,
            max_age,
            fresh,
        } => {
            if let Some(threshold) = threshold {
                config.minimum_distance_threshold_meters = threshold;
            }
            if let Some(max_age) = max_age {
                config.max_fix_age_seconds = max_age;
            }
            let fixes = input::read_fixes(&track)?;
            log::info!("replaying {} fixes from {}", fixes.len(), track.display());

            let start = fixes.first().map(|fix| fix.timestamp).unwrap_or_else(Utc::now);
            let clock = Arc::new(ManualClock::new(start));
            let ports = Ports::new(store, geocoder).with_clock(clock.clone());
            let (handle, _events) = tracker::start(config, ports);
            if fresh {
                handle.reset().await?;
            }

            let mut accepted = 0;
            for record in &fixes {
                // the fix is handled the moment it was captured
                clock.set(record.timestamp);
                match handle.record_fix(record.to_fix()).await? {
                    FixDecision::Accepted { .. } => accepted += 1,
                    rejected => {
                        log::debug!("fix at {} dropped: {:?}", record.timestamp, rejected)
                    }
                }
            }
            log::info!("recorded {} of {} fixes", accepted, fixes.len());

            settle(&handle).await?;
            print_route(&handle).await?;
        }
        Command::Stats => {
            let (handle, _events) = tracker::start(config, Ports::new(store, geocoder));
            // restored points without an address are looked up again
            settle(&handle).await?;
            print_route(&handle).await?;
        }
        Command::Reset => {
            let (handle, _events) = tracker::start(config, Ports::new(store, geocoder));
            handle.reset().await?;
            println!("Route deleted.");
        }
    }
    Ok(())
}

/// Waits for outstanding address lookups so their results get saved.
async fn settle(tracker: &TrackerHandle) -> Result<(), Box<dyn Error>> {
    loop {
        let pending = tracker.pending_lookups().await?;
        if pending == 0 {
            return Ok(());
        }
        log::debug!("waiting for {} address lookups", pending);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

async fn print_route(tracker: &TrackerHandle) -> Result<(), Box<dyn Error>> {
    let path = tracker.path().await?;
    let statistics = tracker.statistics().await?;
    log::info!("{} points, {}", path.len(), report::summary(&statistics));
    print!("{}", report::render_path(&path));
    println!("{}", report::render_statistics(&statistics));
    Ok(())
}
