use std::fmt;

use crate::flight::{Flight, Money};
use crate::itinerary::FareError;

// A priced outbound leg paired with a priced inbound leg.
// The total is fixed when the pair is built and never recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    outbound: Flight,
    inbound: Flight,
    total_cost: Money,
}

impl RoundTrip {
    pub fn new(outbound: Flight, inbound: Flight) -> Result<Self, FareError> {
        let (out_price, in_price) = match (outbound.price, inbound.price) {
            (Some(out_price), Some(in_price)) => (out_price, in_price),
            (None, _) => return Err(FareError::UnpricedLeg(outbound.to_string())),
            (_, None) => return Err(FareError::UnpricedLeg(inbound.to_string())),
        };

        Ok(Self {
            outbound,
            inbound,
            total_cost: out_price + in_price,
        })
    }

    pub fn outbound(&self) -> &Flight {
        &self.outbound
    }

    pub fn inbound(&self) -> &Flight {
        &self.inbound
    }

    pub fn total_cost(&self) -> Money {
        self.total_cost
    }

    pub fn is_one_way(&self) -> bool {
        self.inbound.is_no_return()
    }
}

impl fmt::Display for RoundTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total cost: ${}\n    {}\n    {}",
            self.total_cost, self.outbound, self.inbound
        )
    }
}
