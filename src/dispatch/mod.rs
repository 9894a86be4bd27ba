//! Bounded-concurrency fan-out of fetch tasks.
//!
//! Hosts are pulled lazily from a stream. A semaphore permit is taken before
//! each host is pulled and released when its task ends, so at most
//! `max_concurrency` handshakes (plus their sink appends) are ever in flight
//! and the input is never buffered beyond that.
//!
//! Per-host failures are counted and degrade to an empty chain. Only sink
//! failures end a run early.

mod gauge;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, Stream};
use futures::{FutureExt, StreamExt};
use log::{debug, error, warn};
use rustls::ClientConfig;
use tokio::task::JoinError;

use crate::chain::{extract_chain, ChainExtraction};
use crate::config::Config;
use crate::error_handling::{ErrorType, InfoType, ProcessingStats, SinkError};
use crate::handshake::handshake;
use crate::initialization::init_semaphore;
use crate::models::{ChainResult, FetchTask};
use crate::sink::CertSink;

pub use gauge::{InFlightGauge, InFlightGuard};

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Hosts pulled from the input
    pub total_hosts: usize,
    /// Hosts whose handshake completed
    pub successful: usize,
    /// Hosts that failed (connect, handshake or a panicked task)
    pub failed: usize,
    /// Rows appended to the sink during this run
    pub rows_written: usize,
    /// Highest number of fetches in flight at once
    pub peak_in_flight: usize,
    /// Wall-clock duration of the run
    pub elapsed_seconds: f64,
}

/// Live counters, shared with the progress logger.
#[derive(Debug, Default)]
pub struct RunProgress {
    pub attempted: AtomicUsize,
    pub successful: AtomicUsize,
    pub failed: AtomicUsize,
    pub rows_written: AtomicUsize,
}

impl RunProgress {
    /// Hosts whose outcome has been recorded.
    pub fn completed(&self) -> usize {
        self.successful.load(Ordering::SeqCst) + self.failed.load(Ordering::SeqCst)
    }
}

type TaskOutcome = Result<usize, SinkError>;

/// Drives fetches for a stream of hosts into a shared sink.
pub struct Dispatcher {
    config: Config,
    tls_config: Arc<ClientConfig>,
    stats: Arc<ProcessingStats>,
    gauge: Arc<InFlightGauge>,
    progress: Arc<RunProgress>,
}

impl Dispatcher {
    pub fn new(config: Config, tls_config: Arc<ClientConfig>, stats: Arc<ProcessingStats>) -> Self {
        let mut config = config;
        if config.max_concurrency == 0 {
            warn!("max_concurrency of 0 would never schedule a host; using 1");
            config.max_concurrency = 1;
        }

        Self {
            config,
            tls_config,
            stats,
            gauge: Arc::new(InFlightGauge::new()),
            progress: Arc::new(RunProgress::default()),
        }
    }

    /// Counters updated as tasks finish.
    pub fn progress(&self) -> Arc<RunProgress> {
        Arc::clone(&self.progress)
    }

    pub fn gauge(&self) -> Arc<InFlightGauge> {
        Arc::clone(&self.gauge)
    }

    /// Fetches every host in `hosts` and appends its chain to `sink`.
    ///
    /// Returns once the stream is exhausted and every spawned task has
    /// finished. Each host pulled from the stream produces exactly one
    /// outcome, counted as either successful or failed.
    ///
    /// # Errors
    ///
    /// Returns the first `SinkError`. After it occurs no further hosts are
    /// pulled, and tasks already in flight are allowed to finish.
    pub async fn run<S, W>(&self, hosts: S, sink: Arc<CertSink<W>>) -> Result<RunReport, SinkError>
    where
        S: Stream<Item = String>,
        W: std::io::Write + Send + 'static,
    {
        let start_time = Instant::now();
        let semaphore = init_semaphore(self.config.max_concurrency);
        let mut tasks = FuturesUnordered::new();
        let mut sink_error: Option<SinkError> = None;
        futures::pin_mut!(hosts);

        loop {
            // Settle whatever already finished so a sink failure is seen early
            while let Some(Some(joined)) = tasks.next().now_or_never() {
                self.settle(joined, &mut sink_error);
            }
            if sink_error.is_some() {
                warn!("Output failed; no further hosts will be scheduled");
                break;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Semaphore closed; no further hosts will be scheduled");
                    break;
                }
            };
            let Some(host) = hosts.next().await else {
                break;
            };

            self.progress.attempted.fetch_add(1, Ordering::SeqCst);

            let task = self.config.task_for(host);
            let tls_config = Arc::clone(&self.tls_config);
            let stats = Arc::clone(&self.stats);
            let gauge = Arc::clone(&self.gauge);
            let progress = Arc::clone(&self.progress);
            let sink = Arc::clone(&sink);

            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                let _in_flight = gauge.enter();

                let result = fetch_chain(task, tls_config).await;
                record_outcome(&stats, &result);

                if result.handshake_succeeded() {
                    progress.successful.fetch_add(1, Ordering::SeqCst);
                } else {
                    progress.failed.fetch_add(1, Ordering::SeqCst);
                }

                let rows = sink.append(&result)?;
                progress.rows_written.fetch_add(rows, Ordering::SeqCst);
                Ok::<_, SinkError>(rows)
            }));
        }

        while let Some(joined) = tasks.next().await {
            self.settle(joined, &mut sink_error);
        }

        if let Some(e) = sink_error {
            return Err(e);
        }

        Ok(RunReport {
            total_hosts: self.progress.attempted.load(Ordering::SeqCst),
            successful: self.progress.successful.load(Ordering::SeqCst),
            failed: self.progress.failed.load(Ordering::SeqCst),
            rows_written: self.progress.rows_written.load(Ordering::SeqCst),
            peak_in_flight: self.gauge.peak(),
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }

    fn settle(&self, joined: Result<TaskOutcome, JoinError>, sink_error: &mut Option<SinkError>) {
        match joined {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                error!("Failed to write certificates: {e}");
                if sink_error.is_none() {
                    *sink_error = Some(e);
                }
            }
            Err(e) => {
                // The task never reached its own bookkeeping
                error!("Fetch task aborted: {e}");
                self.stats.increment_error(ErrorType::TaskPanicked);
                self.progress.failed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

/// Handshakes with one host and decodes the chain it presented.
///
/// Never fails: connect and handshake errors are carried in
/// `ChainResult::failure` with no records, and undecodable certificates are
/// skipped and listed in `ChainResult::decode_errors`.
pub async fn fetch_chain(task: FetchTask, tls_config: Arc<ClientConfig>) -> ChainResult {
    match handshake(&task, tls_config).await {
        Ok(session) => {
            let ChainExtraction { records, errors } = extract_chain(session.peer_certificates());
            session.close();

            debug!(
                "{}: {} certificate(s), {} skipped",
                task.host,
                records.len(),
                errors.len()
            );
            let mut result = ChainResult::success(task.host, records);
            result.decode_errors = errors;
            result
        }
        Err(e) => {
            if e.is_connect_error() {
                debug!("{e}");
            } else {
                warn!("{e}");
            }
            ChainResult::failed(task.host, e)
        }
    }
}

fn record_outcome(stats: &ProcessingStats, result: &ChainResult) {
    if let Some(failure) = &result.failure {
        stats.increment_error(failure.error_type());
        return;
    }

    for skipped in &result.decode_errors {
        stats.increment_error(skipped.error_type());
    }

    let shape = match result.records.len() {
        0 => InfoType::EmptyChain,
        1 => InfoType::LeafOnlyChain,
        _ => InfoType::ChainWithIntermediates,
    };
    stats.increment_info(shape);

    for record in &result.records {
        if record.has_inverted_validity() {
            stats.increment_info(InfoType::InvertedValidity);
        }
    }
}
