// SPDX-License-Identifier: GPL-3.0-only

//! Plain-text table rendering

const COLUMN_GAP: &str = "  ";

/// Render rows under `headers` as left-aligned columns.
///
/// Each column is as wide as its longest cell, a dash rule separates the
/// header from the body, and trailing whitespace is stripped from every line.
pub fn render_table<const N: usize>(headers: &[&str; N], rows: &[[&str; N]]) -> String {
    let mut widths = headers.each_ref().map(|header| header.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = widths.map(|width| "-".repeat(width));
    let rule_cells = rule.each_ref().map(String::as_str);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_line(headers, &widths));
    lines.push(render_line(&rule_cells, &widths));
    for row in rows {
        lines.push(render_line(row, &widths));
    }

    lines.join("\n")
}

fn render_line<const N: usize>(cells: &[&str; N], widths: &[usize; N]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    padded.join(COLUMN_GAP).trim_end().to_string()
}
