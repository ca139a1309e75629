//! Console reports for validation results, statistics and generated files

use signal_mgr::{DatabaseStats, ValidationIssue};
use std::path::{Path, PathBuf};

/// Print the validation result of one project; returns `true` if it is clean
pub fn print_validation(project: &Path, issues: &[ValidationIssue]) -> bool {
    if issues.is_empty() {
        println!("✓ {:?}: no issues", project);
        return true;
    }

    println!("✗ {:?}: {} issue(s)", project, issues.len());
    for issue in issues {
        println!("    • {}", issue);
    }
    false
}

pub fn print_stats(project: &Path, stats: &DatabaseStats) {
    println!("\n📊 Signal Database: {:?}", project);
    println!("  Signals:   {}", stats.num_signals);
    println!("  Structs:   {}", stats.num_structs);
    println!("  Arrays:    {}", stats.num_arrays);
    println!("  Notifying: {}", stats.num_notifying);
    println!("  Cores:     {}", stats.num_cores);
}

pub fn print_generated(project: &Path, files: &[PathBuf]) {
    println!("✓ {:?}", project);
    for file in files {
        println!("    → {}", file.display());
    }
}
