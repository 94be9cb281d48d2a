use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fare_scout::{Flight, Itinerary, PruningPolicy, TravelRequest};
use rand::{thread_rng, Rng};

// Itinerary with `legs` priced fares in each direction
fn priced_itinerary(legs: usize, budget: f64) -> Itinerary {
    let mut itinerary = Itinerary::new(TravelRequest {
        source_airports: vec!["OAK".to_string(), "SFO".to_string(), "SJC".to_string()],
        destination_airports: vec!["PHX".to_string(), "TUS".to_string()],
        leave_dates: vec!["05/13".to_string(), "05/14".to_string()],
        return_dates: vec!["05/20".to_string(), "05/21".to_string()],
        budget,
    })
    .unwrap();

    let mut rng = thread_rng();
    let outbound = itinerary.generate_outbound_legs();
    let inbound = itinerary.generate_inbound_legs();
    let outbound_fares: Vec<Flight> = (0..legs)
        .map(|i| outbound[i % outbound.len()].with_price(rng.gen_range(40..400) as f64))
        .collect();
    let inbound_fares: Vec<Flight> = (0..legs)
        .map(|i| inbound[i % inbound.len()].with_price(rng.gen_range(40..400) as f64))
        .collect();
    itinerary.add_outbound_flights(outbound_fares);
    itinerary.add_inbound_flights(inbound_fares);
    itinerary
}

pub fn fare_matching_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("roundtrips_in_budget");

    for legs in [10, 100, 1000].iter() {
        let itinerary = priced_itinerary(*legs, 350.0);

        group.bench_with_input(BenchmarkId::new("stop_at_first", legs), legs, |b, _| {
            b.iter(|| {
                black_box(
                    itinerary
                        .roundtrips_in_budget(Some(20), PruningPolicy::StopAtFirstOverBudget)
                        .unwrap(),
                )
            });
        });

        group.bench_with_input(BenchmarkId::new("exhaustive", legs), legs, |b, _| {
            b.iter(|| {
                black_box(
                    itinerary
                        .roundtrips_in_budget(Some(20), PruningPolicy::Exhaustive)
                        .unwrap(),
                )
            });
        });

        group.bench_with_input(BenchmarkId::new("best_roundtrip", legs), legs, |b, _| {
            b.iter(|| black_box(itinerary.best_roundtrip().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, fare_matching_benchmark);
criterion_main!(benches);
