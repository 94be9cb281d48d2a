// Itineraries and the fare-matching engine
// An itinerary expands a travel request into leg candidates, collects the
// priced legs of the current scan pass and pairs them into round trips.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flight::{Flight, Money};
use crate::request::{RequestError, TravelRequest};
use crate::roundtrip::RoundTrip;

#[derive(Error, Debug, PartialEq)]
pub enum FareError {
    #[error("No priced {direction} flights")]
    NoPricedFlights { direction: Direction },

    #[error("Flight has no price: {0}")]
    UnpricedLeg(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outbound,
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => write!(f, "outbound"),
            Direction::Inbound => write!(f, "inbound"),
        }
    }
}

// How the budget query walks the sorted cross product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruningPolicy {
    // Nested walk over (outbound, inbound) that ends the whole enumeration on
    // the first pair over budget. Matches the historical scanner output, which
    // can miss cheaper pairs under later outbound legs and is not sorted by
    // total once the first outbound leg has been exhausted.
    #[default]
    StopAtFirstOverBudget,
    // Every in-budget pair is a candidate; yields the cheapest pairs in
    // non-decreasing total order.
    Exhaustive,
}

#[derive(Debug, Clone)]
pub struct Itinerary {
    request: TravelRequest,
    outbound_flights: Vec<Flight>,
    inbound_flights: Vec<Flight>,
}

impl Itinerary {
    pub fn new(request: TravelRequest) -> Result<Self, RequestError> {
        request.validate()?;
        Ok(Self {
            request,
            outbound_flights: Vec::new(),
            inbound_flights: Vec::new(),
        })
    }

    pub fn request(&self) -> &TravelRequest {
        &self.request
    }

    pub fn budget(&self) -> Money {
        self.request.budget
    }

    pub fn outbound_flights(&self) -> &[Flight] {
        &self.outbound_flights
    }

    pub fn inbound_flights(&self) -> &[Flight] {
        &self.inbound_flights
    }

    // leave date, then source, then destination
    pub fn generate_outbound_legs(&self) -> Vec<Flight> {
        let mut legs = Vec::new();
        for date in &self.request.leave_dates {
            for src in &self.request.source_airports {
                for dst in &self.request.destination_airports {
                    legs.push(Flight::new(src, dst, date));
                }
            }
        }
        legs
    }

    // Inbound legs fly destination -> source. A request without return dates
    // gets the priced "no return" leg instead.
    pub fn generate_inbound_legs(&self) -> Vec<Flight> {
        if self.request.return_dates.is_empty() {
            return vec![Flight::no_return()];
        }

        let mut legs = Vec::new();
        for date in &self.request.return_dates {
            for src in &self.request.source_airports {
                for dst in &self.request.destination_airports {
                    legs.push(Flight::new(dst, src, date));
                }
            }
        }
        legs
    }

    pub fn add_outbound_flights(&mut self, flights: impl IntoIterator<Item = Flight>) {
        self.outbound_flights.extend(flights);
    }

    pub fn add_inbound_flights(&mut self, flights: impl IntoIterator<Item = Flight>) {
        self.inbound_flights.extend(flights);
    }

    // Drop the priced legs of the last scan pass
    pub fn reset(&mut self) {
        self.outbound_flights.clear();
        self.inbound_flights.clear();
    }

    // Cheapest outbound plus cheapest inbound. With a pure sum cost this is
    // the global minimum over the cross product.
    pub fn best_roundtrip(&self) -> Result<RoundTrip, FareError> {
        let outbound = cheapest(&self.outbound_flights).ok_or(FareError::NoPricedFlights {
            direction: Direction::Outbound,
        })?;
        let inbound = cheapest(&self.inbound_flights).ok_or(FareError::NoPricedFlights {
            direction: Direction::Inbound,
        })?;

        RoundTrip::new(outbound.clone(), inbound.clone())
    }

    // Round trips whose total is within budget, at most `num` of them.
    // Works on sorted copies; the itinerary's own collections keep their order.
    pub fn roundtrips_in_budget(
        &self,
        num: Option<usize>,
        policy: PruningPolicy,
    ) -> Result<Vec<RoundTrip>, FareError> {
        let outbound = sorted_by_price(&self.outbound_flights);
        if outbound.is_empty() {
            return Err(FareError::NoPricedFlights {
                direction: Direction::Outbound,
            });
        }
        let inbound = sorted_by_price(&self.inbound_flights);
        if inbound.is_empty() {
            return Err(FareError::NoPricedFlights {
                direction: Direction::Inbound,
            });
        }

        let limit = num.unwrap_or(usize::MAX);
        match policy {
            PruningPolicy::StopAtFirstOverBudget => {
                stop_at_first_over_budget(&outbound, &inbound, self.budget(), limit)
            }
            PruningPolicy::Exhaustive => cheapest_pairs(&outbound, &inbound, self.budget(), limit),
        }
    }

    pub fn is_in_budget(&self, roundtrip: &RoundTrip) -> bool {
        roundtrip.total_cost() <= self.budget()
    }

    pub fn all_flights_string(&self) -> String {
        self.outbound_flights
            .iter()
            .chain(self.inbound_flights.iter())
            .map(|flight| format!("\n    {}", flight))
            .collect()
    }
}

impl fmt::Display for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} -> {:?} from {:?} to {:?} under ${}",
            self.request.source_airports,
            self.request.destination_airports,
            self.request.leave_dates,
            self.request.return_dates,
            self.request.budget
        )
    }
}

// First priced flight with the lowest price
fn cheapest(flights: &[Flight]) -> Option<&Flight> {
    flights
        .iter()
        .filter(|f| f.is_priced())
        .min_by(|a, b| a.cmp_price(b))
}

// Priced flights only, stable ascending by price
fn sorted_by_price(flights: &[Flight]) -> Vec<&Flight> {
    let mut sorted: Vec<&Flight> = flights.iter().filter(|f| f.is_priced()).collect();
    sorted.sort_by(|a, b| a.cmp_price(b));
    sorted
}

fn stop_at_first_over_budget(
    outbound: &[&Flight],
    inbound: &[&Flight],
    budget: Money,
    limit: usize,
) -> Result<Vec<RoundTrip>, FareError> {
    let mut trips = Vec::new();
    for out in outbound {
        for ret in inbound {
            if out.price_key() + ret.price_key() <= budget && trips.len() < limit {
                trips.push(RoundTrip::new((*out).clone(), (*ret).clone())?);
            } else {
                return Ok(trips);
            }
        }
    }
    Ok(trips)
}

// Candidate pair in the k-smallest-sums merge, ordered by total then position
#[derive(Debug)]
struct PairCandidate {
    total: Money,
    out_idx: usize,
    in_idx: usize,
}

impl PartialEq for PairCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PairCandidate {}

impl PartialOrd for PairCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PairCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total
            .total_cmp(&other.total)
            .then(self.out_idx.cmp(&other.out_idx))
            .then(self.in_idx.cmp(&other.in_idx))
    }
}

// Both inputs sorted ascending. Each outbound leg starts paired with the
// cheapest inbound leg; popping a pair advances that outbound leg to its next
// inbound leg. Only in-budget pairs ever enter the heap.
fn cheapest_pairs(
    outbound: &[&Flight],
    inbound: &[&Flight],
    budget: Money,
    limit: usize,
) -> Result<Vec<RoundTrip>, FareError> {
    let mut trips = Vec::new();
    if limit == 0 {
        return Ok(trips);
    }

    let cheapest_inbound = inbound[0].price_key();
    let mut heap = BinaryHeap::new();
    for (out_idx, out) in outbound.iter().enumerate() {
        let total = out.price_key() + cheapest_inbound;
        if total > budget {
            break;
        }
        heap.push(Reverse(PairCandidate {
            total,
            out_idx,
            in_idx: 0,
        }));
    }

    while let Some(Reverse(pair)) = heap.pop() {
        let out = outbound[pair.out_idx];
        trips.push(RoundTrip::new(out.clone(), inbound[pair.in_idx].clone())?);
        if trips.len() == limit {
            break;
        }

        let next_in = pair.in_idx + 1;
        if let Some(ret) = inbound.get(next_in) {
            let total = out.price_key() + ret.price_key();
            if total <= budget {
                heap.push(Reverse(PairCandidate {
                    total,
                    out_idx: pair.out_idx,
                    in_idx: next_in,
                }));
            }
        }
    }

    Ok(trips)
}
