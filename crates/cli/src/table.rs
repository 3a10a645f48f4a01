// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-width text tables for status output.

/// Render a two-column table with a title and header row.
pub fn render(title: &str, headers: (&str, &str), rows: &[(String, String)]) -> String {
    let left_width = rows
        .iter()
        .map(|(l, _)| l.len())
        .chain([headers.0.len()])
        .max()
        .unwrap_or(0);
    let right_width = rows
        .iter()
        .map(|(_, r)| r.len())
        .chain([headers.1.len()])
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&format!(
        "{:<left_width$}  {:<right_width$}\n",
        headers.0, headers.1
    ));
    out.push_str(&format!(
        "{:-<left_width$}  {:-<right_width$}\n",
        "", ""
    ));
    for (left, right) in rows {
        out.push_str(&format!(
            "{:<left_width$}  {:<right_width$}\n",
            left, right
        ));
    }
    out
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
