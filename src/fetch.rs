// Fare lookup for a single flight leg
// The scanner asks for the prices of one leg at a time and never runs two
// lookups at once against the same fetcher.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::FareSourceConfig;
use crate::flight::{Flight, Money};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Fare source error: {status_code} - {message}")]
    ResponseError { status_code: u16, message: String },

    #[error("Malformed fare response: {0}")]
    MalformedResponse(String),

    #[error("Client error: {0}")]
    ClientError(String),
}

#[async_trait]
pub trait PriceFetcher: Send + Sync {
    // One priced copy of `leg` per fare on offer. No fares is an empty list,
    // not an error.
    async fn fetch_prices(&self, leg: &Flight, passengers: u32) -> Result<Vec<Flight>, FetchError>;
}

// JSON body returned by the fare source
#[derive(Debug, Deserialize, Serialize)]
pub struct FareResponse {
    #[serde(default)]
    pub fares: Vec<Fare>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Fare {
    pub price: Money,
}

impl FareResponse {
    pub fn into_flights(self, leg: &Flight) -> Result<Vec<Flight>, FetchError> {
        self.fares
            .into_iter()
            .map(|fare| {
                if !fare.price.is_finite() || fare.price < 0.0 {
                    return Err(FetchError::MalformedResponse(format!(
                        "invalid price {} for {}",
                        fare.price, leg
                    )));
                }
                Ok(leg.with_price(fare.price))
            })
            .collect()
    }
}

pub struct HttpFareClient {
    client: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
}

impl HttpFareClient {
    pub fn new(config: &FareSourceConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| FetchError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn fares_url(&self) -> String {
        format!("{}/fares", self.base_url)
    }
}

#[async_trait]
impl PriceFetcher for HttpFareClient {
    async fn fetch_prices(&self, leg: &Flight, passengers: u32) -> Result<Vec<Flight>, FetchError> {
        debug!("Requesting fares for {}", leg);

        let passengers = passengers.to_string();
        let response = self
            .client
            .get(self.fares_url())
            .query(&[
                ("origin", leg.origin.as_str()),
                ("destination", leg.destination.as_str()),
                ("date", leg.date.as_str()),
                ("passengers", passengers.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.timeout_ms)
                } else {
                    FetchError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::ResponseError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: FareResponse = response
            .json()
            .await
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        let flights = body.into_flights(leg)?;
        debug!("Found {} fares for {}", flights.len(), leg);
        Ok(flights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_stub::CannedServer;

    fn client_for(server: &CannedServer) -> HttpFareClient {
        HttpFareClient::new(&FareSourceConfig {
            base_url: server.base_url.clone(),
            timeout_ms: 2000,
        })
        .unwrap()
    }

    #[test]
    fn test_fare_response_to_flights() {
        let leg = Flight::new("OAK", "PHX", "05/13");
        let json = r#"{ "fares": [ { "price": 150 }, { "price": 89.5 } ] }"#;
        let body: FareResponse = serde_json::from_str(json).unwrap();

        let flights = body.into_flights(&leg).unwrap();
        assert_eq!(flights.len(), 2);
        assert_eq!(flights[0], Flight::priced("OAK", "PHX", "05/13", 150.0));
        assert_eq!(flights[1].price, Some(89.5));
    }

    #[test]
    fn test_no_fares_is_not_an_error() {
        let leg = Flight::new("OAK", "PHX", "05/13");
        let body: FareResponse = serde_json::from_str("{}").unwrap();
        assert!(body.into_flights(&leg).unwrap().is_empty());
    }

    #[test]
    fn test_negative_fare_is_rejected() {
        let leg = Flight::new("OAK", "PHX", "05/13");
        let body: FareResponse =
            serde_json::from_str(r#"{ "fares": [ { "price": -1 } ] }"#).unwrap();
        assert!(matches!(
            body.into_flights(&leg),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_fares_url_strips_trailing_slash() {
        let client = HttpFareClient::new(&FareSourceConfig {
            base_url: "https://fares.example.com/".to_string(),
            timeout_ms: 1000,
        })
        .unwrap();
        assert_eq!(client.fares_url(), "https://fares.example.com/fares");
    }

    #[tokio::test]
    async fn test_unreachable_source_is_a_fetch_error() {
        let client = HttpFareClient::new(&FareSourceConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_ms: 2000,
        })
        .unwrap();

        let result = client
            .fetch_prices(&Flight::new("OAK", "PHX", "05/13"), 1)
            .await;
        assert!(matches!(
            result,
            Err(FetchError::NetworkError(_)) | Err(FetchError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_prices_queries_leg_and_prices_copies() {
        let body = r#"{ "fares": [ { "price": 150 }, { "price": 99.5 } ] }"#;
        let server = CannedServer::start("200 OK", body).await;
        let client = client_for(&server);
        let leg = Flight::new("OAK", "PHX", "05/13");

        let flights = client.fetch_prices(&leg, 2).await.unwrap();
        assert_eq!(
            flights,
            vec![
                Flight::priced("OAK", "PHX", "05/13", 150.0),
                Flight::priced("OAK", "PHX", "05/13", 99.5),
            ]
        );
        assert!(!leg.is_priced());

        let request = server.received().await;
        assert!(request.starts_with(
            "GET /fares?origin=OAK&destination=PHX&date=05%2F13&passengers=2 HTTP/1.1"
        ));
    }

    #[tokio::test]
    async fn test_error_status_is_a_response_error() {
        let server = CannedServer::start("503 Service Unavailable", "down").await;
        let client = client_for(&server);

        let result = client
            .fetch_prices(&Flight::new("OAK", "PHX", "05/13"), 1)
            .await;
        match result {
            Err(FetchError::ResponseError {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, 503);
                assert_eq!(message, "down");
            }
            other => panic!("expected a response error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = CannedServer::start("200 OK", "<html>maintenance</html>").await;
        let client = client_for(&server);

        let result = client
            .fetch_prices(&Flight::new("OAK", "PHX", "05/13"), 1)
            .await;
        assert!(matches!(result, Err(FetchError::MalformedResponse(_))));
    }
}
