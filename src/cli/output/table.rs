//! Table output formatting for CLI commands
//!
//! Renders query hits and conversation threads with comfy-table.

use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::env;

use crate::adapters::loader::SOURCE_KEY;
use crate::domain::models::{QueryHit, ThreadSummary};

use super::{one_line, truncate};

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self { use_colors, max_width }
    }

    /// Format vector query hits, nearest first.
    pub fn format_hits(&self, hits: &[QueryHit]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["#", "Index", "Distance", "Source", "Passage"]));

        for hit in hits {
            let source = hit
                .metadata
                .get(SOURCE_KEY)
                .map(String::as_str)
                .or_else(|| hit.document_id())
                .unwrap_or("-");
            table.add_row(vec![
                Cell::new(hit.rank + 1),
                Cell::new(hit.index).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.4}", hit.distance)).set_alignment(CellAlignment::Right),
                self.colored(source, Color::Cyan),
                Cell::new(truncate(&one_line(hit.text()), 60)),
            ]);
        }

        table.to_string()
    }

    /// Format stored conversation threads, most recent first.
    pub fn format_threads(&self, threads: &[ThreadSummary]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Thread", "Messages", "Step", "Next", "Updated"]));

        for thread in threads {
            let next = if thread.next_node.is_terminal() {
                self.colored(thread.next_node.as_str(), Color::Green)
            } else {
                self.colored(thread.next_node.as_str(), Color::Yellow)
            };
            table.add_row(vec![
                Cell::new(&thread.thread_id),
                Cell::new(thread.message_count).set_alignment(CellAlignment::Right),
                Cell::new(thread.step).set_alignment(CellAlignment::Right),
                next,
                Cell::new(thread.updated_at.format("%Y-%m-%d %H:%M:%S UTC")),
            ]);
        }

        table.to_string()
    }

    fn colored(&self, text: &str, color: Color) -> Cell {
        if self.use_colors {
            Cell::new(text).fg(color)
        } else {
            Cell::new(text)
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ConversationState, Document};

    #[test]
    fn test_format_hits_shows_source_and_passage() {
        let doc = Document::new("notes.txt#0", "SQL injection\nlets attackers run queries.")
            .with_metadata(SOURCE_KEY, "notes.txt");
        let hit = QueryHit {
            rank: 0,
            index: 4,
            distance: 0.25,
            metadata: doc.hit_metadata(),
        };

        let rendered = TableFormatter::with_config(false, Some(120)).format_hits(&[hit]);
        assert!(rendered.contains("notes.txt"));
        assert!(rendered.contains("0.2500"));
        assert!(rendered.contains("SQL injection lets attackers"));
    }

    #[test]
    fn test_format_threads() {
        let state = ConversationState::new("abc123");
        let rendered =
            TableFormatter::with_config(false, Some(120)).format_threads(&[ThreadSummary::from(&state)]);
        assert!(rendered.contains("abc123"));
        assert!(rendered.contains("end"));
    }
}
