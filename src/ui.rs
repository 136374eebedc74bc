//! Box-drawn tables for `status` and `doctor`.
//!
//! Columns are sized to their widest cell and shrunk, widest first, when the
//! terminal is too narrow. Cells may contain ANSI colors.

use colored::*;
use console::{Alignment, measure_text_width, pad_str, truncate_str};

/// Columns never shrink below this many visible characters.
const MIN_COLUMN_WIDTH: usize = 8;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row.iter().map(|c| single_line(c)).collect());
        }
    }

    pub fn print(&self) {
        let (_, term_width) = console::Term::stdout().size();
        for line in self.render(term_width as usize) {
            println!("{}", line);
        }
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|h| measure_text_width(h))
            .collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(measure_text_width(cell));
            }
        }

        // Indent, outer borders and one space of padding around each cell.
        let overhead = 3 + 3 * widths.len();
        let available = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > available {
            let Some(widest) = widths
                .iter_mut()
                .filter(|w| **w > MIN_COLUMN_WIDTH)
                .max_by_key(|w| **w)
            else {
                break;
            };
            *widest -= 1;
        }
        widths
    }

    fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }
        let widths = self.column_widths(max_width);

        let border = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, segments.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| {
            let rendered: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| {
                    let text = truncate_str(cell, width, "...");
                    let padded = pad_str(&text, width, Alignment::Left, None).to_string();
                    if bold {
                        format!(" {} ", padded.bold())
                    } else {
                        format!(" {} ", padded)
                    }
                })
                .collect();
            format!("  │{}│", rendered.join("│"))
        };

        let mut lines = vec![border("┌", "┬", "┐"), line(&self.headers, true)];
        lines.push(border("├", "┼", "┤"));
        lines.extend(self.rows.iter().map(|row| line(row, false)));
        lines.push(border("└", "┴", "┘"));
        lines
    }
}

fn single_line(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect()
}
