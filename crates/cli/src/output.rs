// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render a list of rows either as a simple left-aligned table or as a JSON
/// array, depending on `format`. `headers.len()` must equal each row's
/// length.
pub fn print_table(format: OutputFormat, headers: &[&str], rows: &[Vec<String>]) {
    println!("{}", render_table(format, headers, rows));
}

fn render_table(format: OutputFormat, headers: &[&str], rows: &[Vec<String>]) -> String {
    match format {
        OutputFormat::Text => render_text_table(headers, rows),
        OutputFormat::Json => {
            let objects: Vec<_> = rows
                .iter()
                .map(|row| headers.iter().zip(row).map(|(h, v)| (h.to_string(), serde_json::Value::String(v.clone()))).collect::<serde_json::Map<_, _>>())
                .collect();
            serde_json::to_string_pretty(&objects).unwrap_or_else(|e| format!("failed to serialize output: {e}"))
        }
    }
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "(none)".to_string();
    }
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }
    let header_line: Vec<String> = headers.iter().zip(&widths).map(|(h, w)| format!("{:<width$}", h, width = w)).collect();
    let mut lines = vec![header_line.join("  ")];
    for row in rows {
        let line: Vec<String> = row.iter().zip(&widths).map(|(c, w)| format!("{:<width$}", c, width = w)).collect();
        lines.push(line.join("  "));
    }
    lines.join("\n")
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to serialize output: {e}"),
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
