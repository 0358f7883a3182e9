use std::fmt::Write as _;

use crate::domain::record::Record;
use crate::notifications::ChannelState;
use crate::pagination::PageLinks;
use crate::services::ListState;

const COLUMNS: [&str; 5] = ["ID", "Name", "Email", "Telephone", "Address"];
const MAX_CELL: usize = 32;

/// Renders the list screen: status line, messages, record table and page
/// links.
pub fn render(state: &ListState, channel: ChannelState) -> String {
    let mut out = String::new();
    let page = &state.page;

    let mut status = if page.total_pages == 0 {
        format!("{} records", page.total_elements)
    } else {
        format!(
            "Page {} of {} ({} records, {} per page)",
            page.number + 1,
            page.total_pages,
            page.total_elements,
            state.query.page_size
        )
    };
    if let Some(term) = state.query.search_filter() {
        let _ = write!(status, ", search \"{term}\"");
    }
    if channel != ChannelState::Connected {
        let _ = write!(status, ", live updates {}", channel_label(channel));
    }
    let _ = writeln!(out, "{status}");

    if state.loading {
        let _ = writeln!(out, "Loading...");
    }
    if let Some(notice) = &state.notice {
        let _ = writeln!(out, "* {notice}");
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {error}");
    }

    if page.is_empty() {
        let _ = writeln!(out, "No records found.");
    } else {
        let rows: Vec<[String; 5]> = page.content.iter().map(cells).collect();
        let _ = write!(out, "{}", table(&rows));
    }

    let links = PageLinks::for_snapshot(page);
    if !links.pages.is_empty() {
        let _ = writeln!(out, "{}", links.render());
    }

    if let Some(id) = state.pending_delete {
        let _ = writeln!(out, "Delete record {id}? [y/N]");
    }

    out
}

fn channel_label(state: ChannelState) -> &'static str {
    match state {
        ChannelState::Disconnected => "off",
        ChannelState::Connecting => "connecting",
        ChannelState::Connected => "on",
        ChannelState::Reconnecting => "reconnecting",
    }
}

fn cells(record: &Record) -> [String; 5] {
    [
        record.id.map(|id| id.to_string()).unwrap_or_default(),
        clip(&record.name),
        clip(&record.email),
        clip(&record.telephone),
        clip(&record.address),
    ]
}

fn clip(value: &str) -> String {
    match value.char_indices().nth(MAX_CELL) {
        Some((idx, _)) => format!("{}~", &value[..idx]),
        None => value.to_string(),
    }
}

fn table(rows: &[[String; 5]]) -> String {
    let mut widths = COLUMNS.map(|c| c.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[&str]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        format!("{}\n", padded.join(" | ").trim_end())
    };

    let mut out = line(&COLUMNS);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", rule.join("-+-")));
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&line(&cells));
    }
    out
}
