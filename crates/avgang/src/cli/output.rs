//! Plain-text rendering for the terminal.

use std::fmt::Write;

use crate::departure::Departure;
use crate::stats::RegistryStats;

const RULE_WIDTH: usize = 86;

/// Render departures as a fixed-width table.
#[must_use]
pub fn render_table(departures: &[Departure]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:<10} {:<10} {:<5} {:<6} {:<8} {:<12} {}",
        "ID", "Unit", "To", "Time", "Gate", "Type", "Status", "Comment"
    );
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    for d in departures {
        let _ = writeln!(
            out,
            "{:<14} {:<10} {:<10} {:<5} {:<6} {:<8} {:<12} {}",
            d.id.to_string(),
            truncate(&d.unit_number, 10),
            d.destination.label(),
            d.departure_time.to_string(),
            truncate(&d.gate, 6),
            d.transport_type.label(),
            d.status.display_label(),
            d.comment.as_deref().unwrap_or("")
        );
    }

    let _ = writeln!(out, "{} departure(s)", departures.len());
    out
}

/// Render counts as labelled sections.
#[must_use]
pub fn render_stats(stats: &RegistryStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Departures: {}", stats.total);
    let _ = writeln!(
        out,
        "Most used destination: {}",
        stats
            .top_destination
            .map_or_else(|| "-".to_string(), |d| d.to_string())
    );

    out.push_str("\n[Type]\n");
    for (transport_type, count) in &stats.by_type {
        let _ = writeln!(out, "  {:<12} {count:>5}", transport_type.label());
    }

    out.push_str("\n[Status]\n");
    for (status, count) in &stats.by_status {
        let _ = writeln!(out, "  {:<12} {count:>5}", status.display_label());
    }

    out.push_str("\n[Destination]\n");
    for (destination, count) in &stats.by_destination {
        let _ = writeln!(out, "  {:<12} {count:>5}", destination.label());
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}
