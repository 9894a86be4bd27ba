//! Error handling and processing statistics.
//!
//! This module provides:
//! - Per-host fetch errors (recovered locally, never raised past a worker)
//! - Sink errors (propagated to the dispatcher's caller)
//! - Processing statistics tracking (error and info metrics)
//!
//! Per-host errors are categorized into:
//! - **Connect**: DNS failure, refused, reset, connect timeout
//! - **Handshake**: handshake timeout, protocol error, unexpected close
//! - **Certificate decode**: a single certificate skipped within a chain

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{ErrorType, FetchError, InfoType, InitializationError, SinkError};

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_processing_stats_initialization() {
        let stats = ProcessingStats::new();
        for error_type in ErrorType::iter() {
            assert_eq!(stats.get_error_count(error_type), 0);
        }
        for info_type in InfoType::iter() {
            assert_eq!(stats.get_info_count(info_type), 0);
        }
    }

    #[test]
    fn test_processing_stats_increment() {
        let stats = ProcessingStats::new();
        stats.increment_error(ErrorType::HandshakeTimeout);
        assert_eq!(stats.get_error_count(ErrorType::HandshakeTimeout), 1);

        stats.increment_info(InfoType::ChainWithIntermediates);
        assert_eq!(stats.get_info_count(InfoType::ChainWithIntermediates), 1);
    }

    #[test]
    fn test_processing_stats_totals() {
        let stats = ProcessingStats::new();
        stats.increment_error(ErrorType::ConnectionRefused);
        stats.increment_error(ErrorType::HandshakeError);
        stats.increment_info(InfoType::LeafOnlyChain);

        assert_eq!(stats.total_errors(), 2);
        assert_eq!(stats.total_info(), 1);
    }

    #[test]
    fn test_processing_stats_concurrent_increments() {
        let stats = std::sync::Arc::new(ProcessingStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = std::sync::Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.increment_error(ErrorType::ConnectTimeout);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread panicked");
        }
        assert_eq!(stats.get_error_count(ErrorType::ConnectTimeout), 8000);
    }
}
