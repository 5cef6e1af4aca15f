//! Pure formatting functions for UI output.
//!
//! This module contains the display/formatting logic for resolved versions.
//! Functions returning `String` have no side effects and are testable.

use crate::domain::{TagRecord, VersionSource};
use crate::resolver::Resolution;
use console::style;
use std::fmt::Write;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Render an explanation of how a version was resolved.
///
/// Shows the final version, the selected source with its (lazily built)
/// provenance and tag commit, the branch rule outcomes, the applied
/// amendments in order, and the candidates that were not selected.
///
/// # Arguments
/// * `resolution` - The resolution to explain
pub fn format_explanation(resolution: &Resolution) -> String {
    let mut out = String::new();

    // writing to a String cannot fail
    let _ = writeln!(out, "Version: {}", resolution.version);
    let _ = writeln!(out, "Selected source: {}", resolution.source);
    let _ = writeln!(out, "  from: {}", resolution.source.explanation().describe());
    if let VersionSource::Tag(tag) = &resolution.source {
        out.push_str(&format_tag_commit(tag.record()));
    }

    let _ = writeln!(
        out,
        "Branch: {} (auto-increment: {})",
        resolution.branch,
        yes_no(resolution.is_auto_increment_branch())
    );
    for (description, matched) in &resolution.branch_rules {
        let _ = writeln!(out, "  - {}: {}", description, yes_no(*matched));
    }

    if resolution.amendments.is_empty() {
        let _ = writeln!(out, "Amendments: none");
    } else {
        let _ = writeln!(out, "Amendments:");
        for (i, amendment) in resolution.amendments.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, amendment);
        }
    }

    if !resolution.alternatives.is_empty() {
        let _ = writeln!(out, "Candidates:");
        for candidate in &resolution.alternatives {
            let _ = writeln!(out, "  - {}", candidate);
        }
    }

    out
}

/// Commit details of a tag, skipping fields the repository did not report
fn format_tag_commit(record: &TagRecord) -> String {
    let mut out = String::new();
    if !record.long_id.is_empty() {
        let _ = writeln!(out, "  commit: {} ({})", record.long_id, record.short_id);
    }
    if let Some(date) = record.commit_date {
        let _ = writeln!(out, "  date: {}", date.to_rfc3339());
    }
    if !record.subject.is_empty() {
        let _ = writeln!(out, "  subject: {}", record.subject);
    }
    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
