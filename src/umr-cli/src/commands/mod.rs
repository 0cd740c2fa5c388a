//! Menu action handlers.
//!
//! Each handler prompts for the identifiers its operation needs, calls
//! into the `umr` library, and prints a per-bundle report.

pub mod db;
pub mod restore;
pub mod scene;
pub mod swap;
pub mod texture;

use umr::SwapReport;

/// Print the outcome of an identifier swap
pub fn print_report(report: &SwapReport) {
    for pair in &report.replaced {
        println!(
            "✓ {} <- {} ({} ids patched)",
            pair.target_path, pair.donor_path, pair.occurrences
        );
    }
    for path in &report.skipped {
        println!("⚠ not in metadata index, skipped: {path}");
    }

    if report.replaced.is_empty() {
        println!("✗ Nothing to do: no bundles resolved for this swap");
    } else {
        println!("✓ {} bundle(s) replaced", report.replaced.len());
    }
}
