use std::sync::Arc;
use std::time::Duration;

use exloop_core::fanout::gather;
use exloop_core::iob::{HORIZON_COUNT, horizon};
use exloop_core::mocks::InMemorySampleStore;
use exloop_core::{InsulinSums, estimate_iob};
use exloop_traits::{BoxError, ManualClock};
use rstest::rstest;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn ok_fetches(values: [f64; HORIZON_COUNT]) -> [Option<Result<f64, BoxError>>; HORIZON_COUNT] {
    values.map(|v| Some(Ok(v)))
}

#[test]
fn weighted_sum_of_rising_history() {
    let sums = InsulinSums([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert!(approx(estimate_iob(&sums), 3.5));
}

#[rstest]
#[case([0.0; 6], 0.0)]
// Everything in the newest bucket counts fully.
#[case([2.0, 2.0, 2.0, 2.0, 2.0, 2.0], 2.0)]
// Only the oldest bucket: one sixth.
#[case([0.0, 0.0, 0.0, 0.0, 0.0, 3.0], 0.5)]
// Only the 60-90 minute bucket: two thirds.
#[case([0.0, 0.0, 1.5, 1.5, 1.5, 1.5], 1.0)]
fn bucket_weights(#[case] sums: [f64; 6], #[case] expected: f64) {
    assert!(approx(estimate_iob(&InsulinSums(sums)), expected));
}

#[test]
fn failed_horizon_is_substituted_with_zero() {
    let mut fetches = ok_fetches([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    fetches[2] = Some(Err(Box::new(std::io::Error::other("timeout"))));
    let sums = InsulinSums::from_fetches(fetches);
    assert_eq!(sums.0, [1.0, 2.0, 0.0, 4.0, 5.0, 6.0]);

    // 2/3 * (0 - 2) + 1/2 * (4 - 0) replaces 2/3 * 1 + 1/2 * 1.
    let iob = estimate_iob(&sums);
    assert!(approx(iob, 3.0), "iob = {iob}");
    assert!(approx(iob - 3.5, -0.5));
}

#[test]
fn missing_and_non_finite_horizons_are_zero() {
    let mut fetches = ok_fetches([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    fetches[0] = None;
    fetches[5] = Some(Ok(f64::NAN));
    let sums = InsulinSums::from_fetches(fetches);
    assert_eq!(sums.0, [0.0, 2.0, 3.0, 4.0, 5.0, 0.0]);
}

fn store_with_one_unit_per_bucket() -> (ManualClock, Arc<InMemorySampleStore>) {
    let clock = ManualClock::new();
    let store = Arc::new(InMemorySampleStore::new(clock.clone()));
    store.set_glucose(146.4);
    for minutes in [10, 40, 70, 100, 130, 160] {
        store.add_delivery(Duration::from_secs(minutes * 60), 1.0);
    }
    (clock, store)
}

#[test]
fn gather_collects_all_horizons_in_order() {
    let (_clock, store) = store_with_one_unit_per_bucket();
    // Older than three hours: never counted.
    store.add_delivery(Duration::from_secs(200 * 60), 9.0);

    let inputs = gather(store.as_ref());
    assert_eq!(inputs.insulin.0, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let glucose = inputs.glucose.expect("glucose");
    assert_eq!(glucose.mg_dl, 146.0);
}

#[test]
fn gather_fails_open_per_horizon() {
    let (_clock, store) = store_with_one_unit_per_bucket();
    store.fail_lookback(horizon(2));

    let inputs = gather(store.as_ref());
    assert_eq!(inputs.insulin.0, [1.0, 2.0, 0.0, 4.0, 5.0, 6.0]);
    assert!(approx(estimate_iob(&inputs.insulin), 3.0));
    assert!(inputs.glucose.is_ok());
}

#[test]
fn gather_reports_glucose_failure_without_losing_insulin() {
    let (_clock, store) = store_with_one_unit_per_bucket();
    store.fail_glucose(true);

    let inputs = gather(store.as_ref());
    let err = inputs.glucose.expect_err("glucose should fail");
    assert!(err.contains("glucose query failed"));
    assert_eq!(inputs.insulin.get(5), 6.0);
}
