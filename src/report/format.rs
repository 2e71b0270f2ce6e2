//! Terminal formatting for snapshots and catalog listings.
//!
//! Kept apart from assembly so JSON output never depends on display choices.

use crate::data::DatasetDescriptor;
use crate::report::{ConsumptionSnapshot, ReservoirSnapshot};

/// Format a reservoir snapshot as a region table plus source and note.
pub fn format_reservoir_snapshot(snapshot: &ReservoirSnapshot) -> String {
    let mut out = String::new();

    out.push_str("=== Reservoir storage (EAR) ===\n");
    push_row(
        &mut out,
        format!("{:<22} {:>8} {:>14} {:<10} {:<20}", "region", "level%", "capacity_mwmed", "status", "timestamp"),
    );
    push_row(&mut out, format!("{:-<22} {:-<8} {:-<14} {:-<10} {:-<20}", "", "", "", "", ""));

    for (region, entry) in &snapshot.regions {
        push_row(
            &mut out,
            format!(
                "{:<22} {:>8.1} {:>14} {:<10} {:<20}",
                region.display_name(),
                entry.level_percent,
                entry.capacity_mwmed,
                entry.status.as_str(),
                truncate(&entry.timestamp, 20),
            ),
        );
    }

    push_footer(&mut out, snapshot.data_source.label(), snapshot.provenance.tag(), &snapshot.note);
    out
}

/// Format a consumption snapshot: totals, then per-region load and share.
pub fn format_consumption_snapshot(snapshot: &ConsumptionSnapshot) -> String {
    let mut out = String::new();

    out.push_str("=== Grid load ===\n");
    out.push_str(&format!("Current load : {} MW\n", snapshot.current_load_mw));
    out.push_str(&format!("Forecast load: {} MW\n", snapshot.forecast_load_mw));
    if !snapshot.timestamp.is_empty() {
        out.push_str(&format!("As-of        : {}\n", snapshot.timestamp));
    }
    out.push('\n');

    push_row(&mut out, format!("{:<22} {:>12} {:>8}", "region", "load_mw", "share%"));
    push_row(&mut out, format!("{:-<22} {:-<12} {:-<8}", "", "", ""));
    for (region, load) in &snapshot.regions {
        push_row(
            &mut out,
            format!("{:<22} {:>12.1} {:>8.1}", region.display_name(), load.load_mw, load.percent),
        );
    }

    push_footer(&mut out, snapshot.data_source.label(), snapshot.provenance.tag(), &snapshot.note);
    out
}

/// One line per dataset: identifier and title.
pub fn format_datasets(datasets: &[DatasetDescriptor]) -> String {
    if datasets.is_empty() {
        return "No datasets found.\n".to_string();
    }

    let mut out = String::new();
    for d in datasets {
        let title = d.title.as_deref().unwrap_or("");
        push_row(
            &mut out,
            format!("{:<40} {:>3} {}", truncate(&d.name, 40), d.resources.len(), title),
        );
    }
    out
}

/// Dataset details, including its resources.
pub fn format_dataset_info(dataset: &DatasetDescriptor) -> String {
    let mut out = String::new();
    out.push_str(&format!("Dataset: {}\n", dataset.name));
    if let Some(id) = &dataset.id {
        out.push_str(&format!("Id     : {id}\n"));
    }
    if let Some(title) = &dataset.title {
        out.push_str(&format!("Title  : {title}\n"));
    }
    if let Some(notes) = dataset.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        out.push_str(&format!("Notes  : {}\n", notes.trim()));
    }

    out.push_str(&format!("\nResources ({}):\n", dataset.resources.len()));
    for r in &dataset.resources {
        push_row(
            &mut out,
            format!("- {:<40} {:<6} {}", truncate(&r.name, 40), r.format, r.id.as_deref().unwrap_or("-")),
        );
    }
    out
}

fn push_row(out: &mut String, row: String) {
    out.push_str(row.trim_end());
    out.push('\n');
}

fn push_footer(out: &mut String, source: &str, provenance: &str, note: &str) {
    out.push('\n');
    out.push_str(&format!("Source: {source} ({provenance})\n"));
    out.push_str(&format!("Note  : {note}\n"));
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
