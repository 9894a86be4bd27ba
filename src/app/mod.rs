//! Application helpers shared by the scan and report commands.
//!
//! Progress logging, graceful shutdown of background tasks and the final
//! statistics printout.

pub mod logging;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use logging::log_progress;
pub use shutdown::shutdown_gracefully;
pub use statistics::{print_country_summary, print_error_statistics, print_run_summary};
