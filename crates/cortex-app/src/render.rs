//! Terminal rendering of dispatcher replies.

use console::style;
use cortex_chat::{Block, NoticeLevel, Reply};
use cortex_core::{display_value, TabularResult};

/// Cells wider than this are truncated with an ellipsis.
const MAX_COLUMN_WIDTH: usize = 40;

/// Render every block of `reply`, separated by blank lines.
pub fn render_reply(reply: &Reply) -> String {
    reply
        .blocks
        .iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_block(block: &Block) -> String {
    match block {
        Block::Heading(text) => style(format!("{}:", text)).bold().to_string(),
        Block::Text(text) => text.clone(),
        Block::Code { language, source } => format!("```{}\n{}\n```", language, source),
        Block::Table(table) => render_table(table),
        Block::Notice { level, message } => render_notice(*level, message),
    }
}

pub fn render_notice(level: NoticeLevel, message: &str) -> String {
    match level {
        NoticeLevel::Success => style(format!("[ok] {}", message)).green().to_string(),
        NoticeLevel::Warning => style(format!("[warning] {}", message)).yellow().to_string(),
        NoticeLevel::Error => style(format!("[error] {}", message)).red().to_string(),
    }
}

/// Draw `table` as a boxed grid.
pub fn render_table(table: &TabularResult) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            (0..table.columns.len())
                .map(|i| row.get(i).map(display_value).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, value) in row.iter().enumerate() {
            widths[i] = widths[i].max(value.chars().count());
        }
    }
    for w in widths.iter_mut() {
        *w = (*w).min(MAX_COLUMN_WIDTH);
    }

    if widths.is_empty() {
        return "(no columns)".to_string();
    }

    let mut out = String::new();
    out.push_str(&border(&widths, '┌', '┬', '┐'));
    out.push_str(&line(&table.columns, &widths));
    out.push_str(&border(&widths, '├', '┼', '┤'));
    for row in &cells {
        out.push_str(&line(row, &widths));
    }
    out.push_str(&border(&widths, '└', '┴', '┘'));
    out
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let mut s = String::new();
    s.push(left);
    for (i, w) in widths.iter().enumerate() {
        s.push_str(&"─".repeat(w + 2));
        s.push(if i == widths.len() - 1 { right } else { mid });
    }
    s.push('\n');
    s
}

fn line(values: &[String], widths: &[usize]) -> String {
    let mut s = String::from("│");
    for (value, width) in values.iter().zip(widths) {
        s.push(' ');
        s.push_str(&format!("{:width$}", truncate(value, *width), width = width));
        s.push_str(" │");
    }
    s.push('\n');
    s
}

fn truncate(value: &str, width: usize) -> String {
    // Newlines would break the grid.
    let flat = value.replace('\n', " ");
    if flat.chars().count() <= width {
        return flat;
    }
    let mut cut: String = flat.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
