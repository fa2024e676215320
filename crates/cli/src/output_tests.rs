// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn render_text_table_pads_columns_to_the_widest_cell() {
    let rows = vec![vec!["g1".to_string(), "long-trigger-name".to_string()], vec!["group-two".to_string(), "t".to_string()]];
    let rendered = render_text_table(&["group", "name"], &rows);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("group"));
    assert!(lines[1].starts_with("g1 "));
}

#[test]
fn render_text_table_empty_rows_reports_none() {
    assert_eq!(render_text_table(&["group"], &[]), "(none)");
}

#[test]
fn render_table_json_round_trips_header_keys() {
    let rows = vec![vec!["g1".to_string(), "waiting".to_string()]];
    let rendered = render_table(OutputFormat::Json, &["group", "state"], &rows);
    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed[0]["group"], "g1");
    assert_eq!(parsed[0]["state"], "waiting");
}
