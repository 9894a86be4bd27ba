//! Statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::analysis::CountrySummary;
use crate::dispatch::RunReport;
use crate::error_handling::{ErrorType, InfoType, ProcessingStats};

/// Prints a one-line summary of the run.
///
/// Works with both plain and JSON log formats (log::info! handles formatting).
pub fn print_run_summary(report: &RunReport) {
    info!(
        "Processed {} host{} ({} succeeded, {} failed, {} rows, peak {} in flight) in {:.1}s",
        report.total_hosts,
        if report.total_hosts == 1 { "" } else { "s" },
        report.successful,
        report.failed,
        report.rows_written,
        report.peak_in_flight,
        report.elapsed_seconds
    );
}

/// Prints error and info statistics to the log.
pub fn print_error_statistics(error_stats: &ProcessingStats) {
    let total_errors = error_stats.total_errors();
    let total_info = error_stats.total_info();

    if total_errors > 0 {
        info!("Error Counts ({} total):", total_errors);
        for error_type in ErrorType::iter() {
            let count = error_stats.get_error_count(error_type);
            if count > 0 {
                info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }

    if total_info > 0 {
        info!("Info Counts ({} total):", total_info);
        for info_type in InfoType::iter() {
            let count = error_stats.get_info_count(info_type);
            if count > 0 {
                info!("   {}: {}", info_type.as_str(), count);
            }
        }
    }
}

/// Prints the issuer-country table produced by `country_counts`.
pub fn print_country_summary(summary: &CountrySummary) {
    info!(
        "Issuer countries across {} domain{}:",
        summary.domains,
        if summary.domains == 1 { "" } else { "s" }
    );
    for (country, count) in &summary.counts {
        info!("   {}: {}", country, count);
    }
    if summary.without_country > 0 {
        info!("   (no country): {}", summary.without_country);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_error_statistics_no_errors() {
        let stats = ProcessingStats::new();
        // Should not panic when there are no errors
        print_error_statistics(&stats);
    }

    #[test]
    fn test_print_error_statistics_all_types() {
        let stats = ProcessingStats::new();
        stats.increment_error(ErrorType::HandshakeTimeout);
        stats.increment_error(ErrorType::ConnectionRefused);
        stats.increment_info(InfoType::ChainWithIntermediates);
        print_error_statistics(&stats);
    }

    #[test]
    fn test_print_run_summary() {
        print_run_summary(&RunReport {
            total_hosts: 1,
            successful: 1,
            failed: 0,
            rows_written: 3,
            peak_in_flight: 1,
            elapsed_seconds: 0.5,
        });
    }

    #[test]
    fn test_print_country_summary() {
        print_country_summary(&CountrySummary {
            counts: vec![("US".to_string(), 2)],
            domains: 3,
            without_country: 1,
        });
    }
}
