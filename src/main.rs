use std::future::Future;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fare_scout::{
    load_requests, HttpFareClient, Itinerary, LogNotifier, Notifier, ScanConfig, Scanner,
    TwilioNotifier,
};
use tokio::{signal, sync::watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(about = "Scans fares for flexible round trips and texts the ones within budget")]
struct Args {
    // JSON configuration file; defaults are used when omitted
    #[clap(long)]
    config: Option<PathBuf>,
    // Travel request file, overrides `requests_path` from the configuration
    #[clap(long)]
    requests: Option<PathBuf>,
    // Run a single scan pass and exit
    #[clap(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("Error: {e:?}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ScanConfig::default(),
    };
    if let Some(requests) = args.requests {
        config.requests_path = requests;
    }

    let itineraries = load_itineraries(&config)?;
    if itineraries.is_empty() {
        warn!("No usable travel requests in {}", config.requests_path.display());
    }

    let fetcher = HttpFareClient::new(&config.fares)?;
    let notifier: Box<dyn Notifier> = match config.twilio.clone() {
        Some(twilio) => Box::new(TwilioNotifier::new(twilio)?),
        None => {
            info!("No Twilio account configured, notifications go to the log");
            Box::new(LogNotifier)
        }
    };

    let once = args.once;
    let mut scanner = Scanner::new(config, itineraries, fetcher, notifier);
    if once {
        let summary = scanner.run_pass().await?;
        info!("Scan finished: {:?}", summary);
        return Ok(());
    }

    let (shutdown_sender, shutdown_receiver) = watch::channel(false);
    tokio::spawn(forward_shutdown(signal::ctrl_c(), shutdown_sender));

    scanner.run(shutdown_receiver).await?;
    info!("Scanner stopped");
    Ok(())
}

// Flip the shutdown flag once `signal` fires. If the signal cannot be
// installed the sender is held until the scanner goes away, since a dropped
// sender also reads as shutdown.
async fn forward_shutdown<S>(signal: S, sender: watch::Sender<bool>)
where
    S: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            let _ = sender.send(true);
        }
        Err(e) => {
            error!("Unable to listen for Ctrl-C, scanner runs until killed: {}", e);
            sender.closed().await;
        }
    }
}

// Malformed requests are reported and left out of the scan
fn load_itineraries(config: &ScanConfig) -> anyhow::Result<Vec<Itinerary>> {
    let requests = load_requests(&config.requests_path)
        .with_context(|| format!("reading {}", config.requests_path.display()))?;

    let mut itineraries = Vec::new();
    for request in requests {
        match request.and_then(Itinerary::new) {
            Ok(itinerary) => {
                info!("Loaded itinerary {}", itinerary);
                itineraries.push(itinerary);
            }
            Err(e) => error!("Skipping malformed travel request: {}", e),
        }
    }
    Ok(itineraries)
}
