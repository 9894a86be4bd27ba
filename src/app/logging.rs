//! Progress logging utilities.

use log::info;

use crate::dispatch::{InFlightGauge, RunProgress};

/// Logs progress information about host processing.
///
/// # Arguments
///
/// * `start_time` - The start time of processing
/// * `progress` - Live run counters
/// * `gauge` - In-flight fetch gauge
pub fn log_progress(start_time: std::time::Instant, progress: &RunProgress, gauge: &InFlightGauge) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let completed = progress.completed();
    let failed = progress.failed.load(std::sync::atomic::Ordering::SeqCst);
    let rate = if elapsed_secs > 0.0 {
        completed as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Processed {} hosts ({} failed, {} in flight) in {:.2} seconds (~{:.2} hosts/sec)",
        completed,
        failed,
        gauge.current(),
        elapsed_secs,
        rate
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_log_progress_does_not_panic() {
        let progress = RunProgress::default();
        progress.successful.fetch_add(10, Ordering::SeqCst);
        progress.failed.fetch_add(2, Ordering::SeqCst);
        log_progress(std::time::Instant::now(), &progress, &InFlightGauge::new());
    }
}
