//! Concurrent fetch of one cycle's inputs.
//!
//! The glucose query and the six insulin look-back queries each run on their
//! own scoped thread and report back over a bounded channel. `gather` returns
//! only once every thread has finished, so a cycle never projects from a
//! partial result set.
use crossbeam_channel as xch;
use exloop_traits::{BoxError, GlucoseReading, SampleStore};

use crate::iob::{HORIZON_COUNT, HORIZONS_H, InsulinSums, horizon};

enum Fetched {
    Glucose(Result<GlucoseReading, BoxError>),
    Insulin {
        idx: usize,
        result: Result<f64, BoxError>,
    },
}

/// Everything a projection cycle needs from the sample store.
#[derive(Debug)]
pub struct CycleInputs {
    /// Rounded current glucose, or why it could not be fetched.
    pub glucose: Result<GlucoseReading, String>,
    pub insulin: InsulinSums,
}

pub fn gather<S: SampleStore + ?Sized>(store: &S) -> CycleInputs {
    let (tx, rx) = xch::bounded::<Fetched>(HORIZON_COUNT + 1);

    std::thread::scope(|scope| {
        let glucose_tx = tx.clone();
        scope.spawn(move || {
            // Receiver outlives the scope; send only fails if it was dropped.
            let _ = glucose_tx.send(Fetched::Glucose(store.most_recent_glucose()));
        });
        for idx in 0..HORIZON_COUNT {
            let tx = tx.clone();
            scope.spawn(move || {
                let result = store.cumulative_insulin(horizon(idx));
                tracing::debug!(hours = HORIZONS_H[idx], ok = result.is_ok(), "insulin sum fetched");
                let _ = tx.send(Fetched::Insulin { idx, result });
            });
        }
    });
    drop(tx);

    let mut glucose: Option<Result<GlucoseReading, BoxError>> = None;
    let mut insulin: [Option<Result<f64, BoxError>>; HORIZON_COUNT] = Default::default();
    for msg in rx.iter() {
        match msg {
            Fetched::Glucose(r) => glucose = Some(r),
            Fetched::Insulin { idx, result } => insulin[idx] = Some(result),
        }
    }

    let glucose = match glucose {
        Some(Ok(reading)) if reading.mg_dl.is_finite() => Ok(GlucoseReading {
            mg_dl: reading.mg_dl.round(),
            at: reading.at,
        }),
        Some(Ok(reading)) => Err(format!("non-finite glucose value {}", reading.mg_dl)),
        Some(Err(e)) => Err(e.to_string()),
        None => Err("glucose query never completed".to_string()),
    };

    CycleInputs {
        glucose,
        insulin: InsulinSums::from_fetches(insulin),
    }
}
