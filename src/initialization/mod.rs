//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources of a run:
//! - Logger
//! - TLS client configuration (verification disabled, SNI enabled)
//! - Concurrency semaphore
//!
//! All initialization functions return proper error types for error handling.

mod logger;
mod tls;

use std::sync::Arc;

use rustls::crypto::{ring::default_provider, CryptoProvider};
use tokio::sync::Semaphore;

// Re-export public API
pub use logger::init_logger_with;
pub use tls::init_tls_config;

/// Initializes a semaphore for controlling concurrency.
///
/// The permit count is the sole global concurrency control of a run: one
/// permit per in-flight fetch.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count))
}

/// Installs `ring` as the process-wide `rustls` crypto provider.
///
/// `init_tls_config` passes its provider explicitly, so this only matters for
/// code that builds configs through `ClientConfig::builder()`.
pub fn init_crypto_provider() {
    // Reinstalling the provider is harmless
    let _ = CryptoProvider::install_default(default_provider());
}
