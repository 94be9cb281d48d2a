// Scan driver
// One pass prices every leg of every itinerary, reports the best and the
// in-budget round trips, then clears the priced legs. Passes repeat on the
// configured interval until shutdown.

use std::io;

use chrono::Local;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::fetch::PriceFetcher;
use crate::flight::Flight;
use crate::itinerary::{Direction, Itinerary};
use crate::notify::Notifier;
use crate::scan_log::ScanLog;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Scan log error: {0}")]
    LogError(#[from] io::Error),
}

// Counters for one scan pass
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PassSummary {
    pub legs_fetched: usize,
    pub legs_failed: usize,
    pub fares_found: usize,
    pub trips_in_budget: usize,
    pub trips_notified: usize,
    pub notifications_failed: usize,
}

pub struct Scanner<F: PriceFetcher, N: Notifier> {
    config: ScanConfig,
    itineraries: Vec<Itinerary>,
    fetcher: F,
    notifier: N,
}

impl<F: PriceFetcher, N: Notifier> Scanner<F, N> {
    pub fn new(config: ScanConfig, itineraries: Vec<Itinerary>, fetcher: F, notifier: N) -> Self {
        Self {
            config,
            itineraries,
            fetcher,
            notifier,
        }
    }

    pub fn itineraries(&self) -> &[Itinerary] {
        &self.itineraries
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    // Repeat scan passes until `shutdown` flips to true or its sender is dropped
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), ScanError> {
        let interval = self.config.scan_interval();
        loop {
            if *shutdown.borrow() {
                break;
            }

            let summary = self.run_pass().await?;
            info!(
                "Scan pass done: {} legs priced, {} failed, {} trips in budget",
                summary.legs_fetched, summary.legs_failed, summary.trips_in_budget
            );

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    info!("Shutdown requested, stopping scanner");
                    break;
                }
            }
        }
        Ok(())
    }

    pub async fn run_pass(&mut self) -> Result<PassSummary, ScanError> {
        let mut summary = PassSummary::default();
        let banner = format!("Starting scan... ({})", Local::now().format("%H:%M:%S"));
        self.send(&banner, &mut summary).await;

        let result = self.scan_itineraries(&mut summary).await;

        // Priced legs only describe the pass that produced them
        for itinerary in &mut self.itineraries {
            itinerary.reset();
        }
        result?;

        let banner = format!("Finished scan at {}", Local::now().format("%H:%M:%S"));
        self.send(&banner, &mut summary).await;
        Ok(summary)
    }

    async fn scan_itineraries(&mut self, summary: &mut PassSummary) -> Result<(), ScanError> {
        let passengers = self.config.passenger_count;
        for idx in 0..self.itineraries.len() {
            collect_fares(&self.fetcher, &mut self.itineraries[idx], passengers, summary).await;

            let log = ScanLog::open_today(&self.config.log_dir)?;
            self.report(&self.itineraries[idx], &log, summary).await?;
            log.flush()?;
        }
        Ok(())
    }

    async fn report(
        &self,
        itinerary: &Itinerary,
        log: &ScanLog,
        summary: &mut PassSummary,
    ) -> Result<(), ScanError> {
        log.log(&Local::now().format("%Y-%m-%d %H:%M:%S").to_string())?;
        log.log(&itinerary.to_string())?;

        log.log("========= Best roundtrip: =========")?;
        match itinerary.best_roundtrip() {
            Ok(best) => log.log(&best.to_string())?,
            Err(e) => {
                warn!("No best round trip for {}: {}", itinerary, e);
                log.log("None")?;
            }
        }
        log.log("====================================")?;

        log.log("==== Best roundtrips within budget: ====")?;
        let trips = itinerary
            .roundtrips_in_budget(None, self.config.pruning_policy)
            .unwrap_or_else(|e| {
                warn!("No round trips for {}: {}", itinerary, e);
                Vec::new()
            });
        summary.trips_in_budget += trips.len();

        for trip in &trips {
            let rendered = trip.to_string();
            log.log(&rendered)?;
            if summary.trips_notified < self.config.max_sms_per_run {
                summary.trips_notified += 1;
                self.send(&rendered, summary).await;
            } else {
                debug!("Text limit reached for this pass, not sending trip");
            }
        }
        if trips.is_empty() {
            log.log("None")?;
        }
        log.log("====================================")?;

        log.file_log("======= All flights: =======")?;
        log.file_log(&itinerary.all_flights_string())?;
        log.file_log("\n============================\n")?;
        Ok(())
    }

    // Notification failures are logged and counted, never propagated
    async fn send(&self, message: &str, summary: &mut PassSummary) {
        if let Err(e) = self.notifier.notify(message).await {
            warn!("Failed to send notification: {}", e);
            summary.notifications_failed += 1;
        }
    }
}

// Price every leg candidate of the itinerary, one lookup at a time. Legs that
// come back priced from generation (the one-way stand-in) skip the lookup.
async fn collect_fares<F: PriceFetcher>(
    fetcher: &F,
    itinerary: &mut Itinerary,
    passengers: u32,
    summary: &mut PassSummary,
) {
    for (direction, legs) in [
        (Direction::Outbound, itinerary.generate_outbound_legs()),
        (Direction::Inbound, itinerary.generate_inbound_legs()),
    ] {
        for leg in legs {
            let priced = if leg.is_priced() {
                vec![leg]
            } else {
                match fetch_leg(fetcher, &leg, passengers, summary).await {
                    Some(flights) => flights,
                    None => continue,
                }
            };

            summary.fares_found += priced.len();
            match direction {
                Direction::Outbound => itinerary.add_outbound_flights(priced),
                Direction::Inbound => itinerary.add_inbound_flights(priced),
            }
        }
    }
}

async fn fetch_leg<F: PriceFetcher>(
    fetcher: &F,
    leg: &Flight,
    passengers: u32,
    summary: &mut PassSummary,
) -> Option<Vec<Flight>> {
    info!("Scraping for {}", leg);
    summary.legs_fetched += 1;
    match fetcher.fetch_prices(leg, passengers).await {
        Ok(flights) => Some(flights),
        Err(e) => {
            warn!("Fare lookup failed for {}, skipping leg: {}", leg, e);
            summary.legs_failed += 1;
            None
        }
    }
}
