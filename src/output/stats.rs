//! Run statistics derived from a resolve report
//!
//! This module provides functionality for summarising a finished (or
//! interrupted) resolve and displaying it.

use crate::engine::{ResolveReport, Termination};
use crate::state::Disposition;

/// Resolve statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveStatistics {
    /// Total number of batch items
    pub total_items: usize,

    /// Count of items by disposition, in reporting order
    pub items_by_disposition: Vec<(Disposition, usize)>,

    /// Passes started
    pub passes: u32,

    /// Adapter invocations issued
    pub adapter_calls: u32,

    /// Why the run stopped
    pub termination: Termination,
}

impl ResolveStatistics {
    /// Builds statistics from a report
    ///
    /// # Arguments
    ///
    /// * `report` - The report to summarise
    pub fn from_report(report: &ResolveReport) -> Self {
        let items_by_disposition = Disposition::all()
            .iter()
            .map(|d| (*d, report.counts.get(*d)))
            .collect();

        Self {
            total_items: report.outcomes.len(),
            items_by_disposition,
            passes: report.passes,
            adapter_calls: report.adapter_calls,
            termination: report.termination,
        }
    }

    /// Number of items in one bucket
    pub fn count(&self, disposition: Disposition) -> usize {
        self.items_by_disposition
            .iter()
            .find(|(d, _)| *d == disposition)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Share of items that produced a record, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_items == 0 {
            return 0.0;
        }
        let resolved = self.count(Disposition::CacheHit) + self.count(Disposition::Fetched);
        (resolved as f64 / self.total_items as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ResolveStatistics) {
    println!("=== Resolve Statistics ===\n");

    println!("Overview:");
    println!("  Total items: {}", stats.total_items);
    println!("  Passes run: {}", stats.passes);
    println!("  Adapter calls: {}", stats.adapter_calls);
    println!("  Termination: {}", stats.termination);
    println!();

    println!("Items by Disposition:");
    for (disposition, count) in &stats.items_by_disposition {
        if *count == 0 {
            continue;
        }
        let percentage = if stats.total_items > 0 {
            (*count as f64 / stats.total_items as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", disposition, count, percentage);
    }
    println!();

    let resolved = stats.count(Disposition::CacheHit) + stats.count(Disposition::Fetched);
    println!(
        "Success Rate: {:.1}% ({} / {} items resolved)",
        stats.success_rate(),
        resolved,
        stats.total_items
    );
}
