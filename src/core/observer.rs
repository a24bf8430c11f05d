use log::{debug, info, warn};

use super::types::SimulationParameters;

/// Receives diagnostics from a simulation run.
///
/// Every method defaults to doing nothing. Trials may run on a thread pool,
/// so `on_progress` can be called concurrently and out of order.
/// `started` is the index of the trial about to run, not a completion count.
pub trait SimulationObserver: Sync {
    fn on_start(&self, _params: &SimulationParameters, _seed: u64) {}

    fn on_progress(&self, _started: u32, _total: u32) {}

    /// Selected scenarios were not ordered pessimistic <= realistic <= optimistic.
    fn on_ordering_anomaly(&self, _pessimistic: f64, _realistic: f64, _optimistic: f64) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SimulationObserver for NoopObserver {}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SimulationObserver for LogObserver {
    fn on_start(&self, params: &SimulationParameters, seed: u64) {
        info!(
            "running {} Monte Carlo simulations over {} months (seed {seed})",
            params.simulations,
            params.months()
        );
    }

    fn on_progress(&self, started: u32, total: u32) {
        debug!("starting simulation {started}/{total}");
    }

    fn on_ordering_anomaly(&self, pessimistic: f64, realistic: f64, optimistic: f64) {
        warn!(
            "scenario ordering validation failed: pessimistic={pessimistic}, \
             realistic={realistic}, optimistic={optimistic}"
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every callback so tests can assert on them.
    #[derive(Debug, Default)]
    pub struct RecordingObserver {
        pub starts: Mutex<Vec<u64>>,
        pub progress: Mutex<Vec<(u32, u32)>>,
        pub anomalies: Mutex<Vec<(f64, f64, f64)>>,
    }

    impl SimulationObserver for RecordingObserver {
        fn on_start(&self, _params: &SimulationParameters, seed: u64) {
            self.starts.lock().unwrap().push(seed);
        }

        fn on_progress(&self, started: u32, total: u32) {
            self.progress.lock().unwrap().push((started, total));
        }

        fn on_ordering_anomaly(&self, pessimistic: f64, realistic: f64, optimistic: f64) {
            self.anomalies
                .lock()
                .unwrap()
                .push((pessimistic, realistic, optimistic));
        }
    }
}
