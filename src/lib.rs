// Fare scanner library: itinerary model, fare matching and the scan driver

// Core fare model
pub mod flight;
pub mod itinerary;
pub mod roundtrip;

// Request and configuration loading
pub mod config;
pub mod request;

// External collaborators and the scan loop
pub mod fetch;
pub mod notify;
pub mod scan_log;
pub mod scanner;

#[cfg(test)]
mod http_stub;

// Re-export key types for convenience
pub use config::{ConfigError, FareSourceConfig, ScanConfig, TwilioConfig};
pub use fetch::{FetchError, HttpFareClient, PriceFetcher};
pub use flight::{Flight, Money};
pub use itinerary::{Direction, FareError, Itinerary, PruningPolicy};
pub use notify::{DeliveryError, LogNotifier, Notifier, TwilioNotifier};
pub use request::{load_requests, parse_requests, RequestError, TravelRequest};
pub use roundtrip::RoundTrip;
pub use scan_log::ScanLog;
pub use scanner::{PassSummary, ScanError, Scanner};
