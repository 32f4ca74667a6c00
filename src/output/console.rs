//! Console output for run progress
//!
//! Everything the user is meant to read goes to stdout; diagnostics go
//! through `tracing`.

use crate::executor::TestCommand;
use crate::models::{SuiteReport, TargetSet};

/// Headline for a new stage of the run
pub fn announce(text: &str) {
    println!();
    println!("{text}");
    println!("{}", "━".repeat(text.chars().count().max(3)));
}

/// Informational remark
pub fn note(text: &str) {
    println!("  ○ {text}");
}

/// List the targets of an attempt and where they came from
pub fn show_targets(targets: &TargetSet) {
    if targets.is_empty() {
        return;
    }

    println!();
    println!("Features to run (passed by {}):", targets.source());
    println!("──────────────────────────────────────────────────────────────────────");
    for target in targets.iter() {
        println!("  {target}");
    }
    println!("──────────────────────────────────────────────────────────────────────");
}

/// Echo the command about to run
pub fn echo_command(command: &TestCommand) {
    println!();
    println!("{command}");
    println!();
}

/// Final summary of the invocation
pub fn summary(report: &SuiteReport) {
    println!();
    println!("{report}");
    if report.is_success() {
        println!("✓ All required passes succeeded");
    } else {
        println!("✗ At least one required pass failed");
    }
}
