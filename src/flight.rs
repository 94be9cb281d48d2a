// Flight legs: one directional (origin, destination, date) leg, priced or not

use std::cmp::Ordering;
use std::fmt;

// Dollar amounts as scraped from the fare source
pub type Money = f64;

// Marker used for every field of the synthetic "no return" leg
pub const NO_RETURN_MARKER: &str = "None";

#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    pub origin: String,
    pub destination: String,
    pub date: String,
    pub price: Option<Money>,
}

impl Flight {
    // An unpriced leg candidate
    pub fn new(origin: &str, destination: &str, date: &str) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            date: date.to_string(),
            price: None,
        }
    }

    pub fn priced(origin: &str, destination: &str, date: &str, price: Money) -> Self {
        Self {
            price: Some(price),
            ..Self::new(origin, destination, date)
        }
    }

    // Stand-in inbound leg for one-way searches. Costs nothing so the best
    // round trip collapses to the cheapest outbound fare.
    pub fn no_return() -> Self {
        Self::priced(NO_RETURN_MARKER, NO_RETURN_MARKER, NO_RETURN_MARKER, 0.0)
    }

    pub fn is_no_return(&self) -> bool {
        self.origin == NO_RETURN_MARKER
            && self.destination == NO_RETURN_MARKER
            && self.date == NO_RETURN_MARKER
    }

    pub fn set_price(&mut self, price: Money) {
        self.price = Some(price);
    }

    // Priced copy of this leg, the candidate itself is left untouched
    pub fn with_price(&self, price: Money) -> Self {
        Self {
            price: Some(price),
            ..self.clone()
        }
    }

    pub fn is_priced(&self) -> bool {
        self.price.is_some()
    }

    // Sort key where an unpriced leg is dearer than any priced one
    pub fn price_key(&self) -> Money {
        self.price.unwrap_or(Money::INFINITY)
    }

    pub fn cmp_price(&self, other: &Flight) -> Ordering {
        self.price_key().total_cmp(&other.price_key())
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {} -> {}", self.date, self.origin, self.destination)?;
        if let Some(price) = self.price {
            write!(f, ": ${}", price)?;
        }
        Ok(())
    }
}
