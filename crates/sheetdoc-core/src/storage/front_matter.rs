//! Front-matter metadata block parsing and serialization.
//!
//! Documents may open with a `---` delimited key/value block. The format
//! only ever uses a small shape: scalar values, flow lists (`[a, b]`),
//! indented `- item` lists and one level of indented maps, so a
//! purpose-built parser covers it. Unknown keys are preserved verbatim for
//! round-tripping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SheetdocError};

/// Metadata carried in a document's front-matter block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    /// `None` means the first body line is the header row.
    pub column_titles: Option<Vec<String>>,
    pub column_types: Option<Vec<String>>,
    pub column_widths: Option<Vec<u32>>,
    pub row_heights: Option<Vec<u32>>,
    pub column_separator: Option<String>,
    pub url_escaped: Option<bool>,
    pub explicit_types: Option<bool>,
    pub constrain_to_defined_columns: Option<bool>,
    pub allowed_types: Option<Vec<String>>,
    /// Label -> address bindings.
    pub labelled_cells: BTreeMap<String, String>,
    /// Unknown keys, preserved verbatim.
    pub extra: BTreeMap<String, String>,
}

impl FrontMatter {
    pub fn is_empty(&self) -> bool {
        *self == FrontMatter::default()
    }
}

fn parse_err(line: usize, message: impl Into<String>) -> SheetdocError {
    SheetdocError::Parse {
        line,
        message: message.into(),
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn parse_bool(value: &str, line: usize) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(parse_err(line, format!("expected a boolean, got `{other}`"))),
    }
}

fn parse_numbers(items: Vec<String>, line: usize) -> Result<Vec<u32>> {
    items
        .into_iter()
        .map(|item| {
            item.parse::<u32>()
                .map_err(|_| parse_err(line, format!("expected a number, got `{item}`")))
        })
        .collect()
}

/// Split a flow list like `[a, b, c]` into its items.
fn parse_flow_list(value: &str) -> Option<Vec<String>> {
    let inner = value.strip_prefix('[')?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }
    Some(inner.split(',').map(|item| unquote(item).to_string()).collect())
}

/// Parse the text between the `---` markers.
pub fn parse(block: &str) -> Result<FrontMatter> {
    let mut fm = FrontMatter::default();
    let mut lines = block.lines().enumerate().peekable();

    while let Some((idx, line)) = lines.next() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if line.starts_with([' ', '\t']) {
            return Err(parse_err(line_no, "unexpected indentation"));
        }
        let Some((key, rest)) = line.split_once(':') else {
            return Err(parse_err(line_no, "expected `key: value`"));
        };
        let key = key.trim();
        let rest = rest.trim();

        if !rest.is_empty() {
            apply_scalar(&mut fm, key, rest, line_no)?;
            continue;
        }

        // Block form: consume the indented lines that follow.
        let mut items: Vec<String> = Vec::new();
        let mut entries: Vec<(String, String)> = Vec::new();
        while let Some(&(next_idx, next)) = lines.peek() {
            let inner = next.trim();
            if inner.is_empty() {
                lines.next();
                continue;
            }
            if !next.starts_with([' ', '\t']) {
                break;
            }
            lines.next();
            if let Some(item) = inner.strip_prefix("- ") {
                items.push(unquote(item).to_string());
            } else if inner == "-" {
                items.push(String::new());
            } else if let Some((sub, value)) = inner.split_once(':') {
                entries.push((sub.trim().to_string(), unquote(value).to_string()));
            } else {
                return Err(parse_err(next_idx + 1, "expected `- item` or `key: value`"));
            }
        }

        if !entries.is_empty() && !items.is_empty() {
            return Err(parse_err(line_no, "mixed list and map entries"));
        }
        if !entries.is_empty() {
            apply_map(&mut fm, key, entries);
        } else {
            apply_list(&mut fm, key, items, line_no)?;
        }
    }

    Ok(fm)
}

fn apply_scalar(fm: &mut FrontMatter, key: &str, value: &str, line: usize) -> Result<()> {
    match key {
        "columnTitles" | "columnTypes" | "allowedTypes" | "columnWidths" | "rowHeights" => {
            let Some(items) = parse_flow_list(value) else {
                return Err(parse_err(line, format!("expected a list for `{key}`")));
            };
            apply_list(fm, key, items, line)
        }
        "columnSeparator" => {
            fm.column_separator = Some(unquote(value).to_string());
            Ok(())
        }
        "urlEscaped" => {
            fm.url_escaped = Some(parse_bool(value, line)?);
            Ok(())
        }
        "explicitTypes" => {
            fm.explicit_types = Some(parse_bool(value, line)?);
            Ok(())
        }
        "constrainToDefinedColumns" => {
            fm.constrain_to_defined_columns = Some(parse_bool(value, line)?);
            Ok(())
        }
        _ => {
            fm.extra
                .insert(key.to_string(), unquote(value).to_string());
            Ok(())
        }
    }
}

fn apply_list(fm: &mut FrontMatter, key: &str, items: Vec<String>, line: usize) -> Result<()> {
    match key {
        "columnTitles" => fm.column_titles = Some(items),
        "columnTypes" => fm.column_types = Some(items),
        "allowedTypes" => fm.allowed_types = Some(items),
        "columnWidths" => fm.column_widths = Some(parse_numbers(items, line)?),
        "rowHeights" => fm.row_heights = Some(parse_numbers(items, line)?),
        _ => {
            fm.extra.insert(
                key.to_string(),
                format!("[{}]", items.join(", ")),
            );
        }
    }
    Ok(())
}

fn apply_map(fm: &mut FrontMatter, key: &str, entries: Vec<(String, String)>) {
    match key {
        "labelledCells" => fm.labelled_cells.extend(entries),
        // Unknown maps flatten to dotted scalar keys.
        _ => {
            for (sub, value) in entries {
                fm.extra.insert(format!("{key}.{sub}"), value);
            }
        }
    }
}

fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.contains(':')
        || value.contains('#')
        || value.starts_with(['-', '[', '"', ' '])
        || value.ends_with(' ');
    if needs_quotes {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

/// Serialize to the block form `parse` accepts. Lists are emitted in
/// block style so items may contain separators.
pub fn serialize(fm: &FrontMatter) -> String {
    let mut out = String::new();

    let mut string_list = |key: &str, items: &[String], out: &mut String| {
        out.push_str(key);
        out.push_str(":\n");
        for item in items {
            out.push_str("  - ");
            out.push_str(&quote_if_needed(item));
            out.push('\n');
        }
    };

    if let Some(titles) = &fm.column_titles {
        string_list("columnTitles", titles, &mut out);
    }
    if let Some(types) = &fm.column_types {
        string_list("columnTypes", types, &mut out);
    }
    if let Some(widths) = &fm.column_widths {
        let items: Vec<String> = widths.iter().map(u32::to_string).collect();
        out.push_str(&format!("columnWidths: [{}]\n", items.join(", ")));
    }
    if let Some(heights) = &fm.row_heights {
        let items: Vec<String> = heights.iter().map(u32::to_string).collect();
        out.push_str(&format!("rowHeights: [{}]\n", items.join(", ")));
    }
    if let Some(separator) = &fm.column_separator {
        out.push_str(&format!("columnSeparator: \"{separator}\"\n"));
    }
    if let Some(escaped) = fm.url_escaped {
        out.push_str(&format!("urlEscaped: {escaped}\n"));
    }
    if let Some(explicit) = fm.explicit_types {
        out.push_str(&format!("explicitTypes: {explicit}\n"));
    }
    if let Some(constrain) = fm.constrain_to_defined_columns {
        out.push_str(&format!("constrainToDefinedColumns: {constrain}\n"));
    }
    if let Some(allowed) = &fm.allowed_types {
        string_list("allowedTypes", allowed, &mut out);
    }
    if !fm.labelled_cells.is_empty() {
        out.push_str("labelledCells:\n");
        for (name, address) in &fm.labelled_cells {
            out.push_str(&format!("  {name}: {address}\n"));
        }
    }
    for (key, value) in &fm.extra {
        out.push_str(&format!("{key}: {}\n", quote_if_needed(value)));
    }

    out
}
