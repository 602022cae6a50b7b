//! Document text parsing and serialization.
//!
//! A document is an optional `---` delimited front-matter block followed by
//! separator-delimited rows. Loading reuses cells by coordinate: a cell
//! whose text changed goes through the normal recording write path so
//! watchers fire and history captures the external edit.

use sheetdoc_engine::{CellRef, DEFAULT_COLUMN_WIDTH, DEFAULT_ROW_HEIGHT};

use super::state::Document;
use crate::error::Result;
use crate::storage::front_matter::{self, FrontMatter};

impl Document {
    /// Replace the document contents from serialized text.
    pub fn set_source(&mut self, text: &str, clear: bool) -> Result<()> {
        if clear {
            self.clear();
        }

        let mut body = text;
        let mut front_matter = FrontMatter::default();
        if let Some(start) = text.find("---\n") {
            let after = start + 4;
            if let Some(offset) = text[after..].find("---\n") {
                let end = after + offset;
                front_matter = front_matter::parse(text[after..end].trim())?;
                body = &text[end + 4..];
            }
        }

        let separator = front_matter.column_separator.clone();
        let url_escaped = front_matter.url_escaped.unwrap_or(false);

        let body = body.trim();
        let mut lines: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(|l| l.trim_end_matches('\r')).collect()
        };

        let mut titles: Vec<String> = match &front_matter.column_titles {
            Some(titles) => titles.clone(),
            None if lines.is_empty() => Vec::new(),
            None => split_fields(lines.remove(0), separator.as_deref())
                .iter()
                .map(|field| decode_field(field, url_escaped))
                .collect(),
        };

        // Overlay the parsed rows, reusing cells by coordinate.
        let mut widths = Vec::with_capacity(lines.len());
        let mut max_cols = titles.len();
        for (row, line) in lines.iter().enumerate() {
            let fields = split_fields(line, separator.as_deref());
            widths.push(fields.len());
            max_cols = max_cols.max(fields.len());
            for (col, field) in fields.iter().enumerate() {
                let value = decode_field(field, url_escaped);
                let cell = CellRef::new(row, col);
                if self.state.grid.contains_key(&cell) {
                    self.write_cell(cell, &value, true);
                } else if !value.is_empty() {
                    self.state.apply_raw(cell, &value);
                }
            }
        }

        // Blank out cells the new data no longer covers, then drop the
        // empty entries from the sparse store.
        let row_count = lines.len();
        let stale: Vec<CellRef> = self
            .state
            .grid
            .iter()
            .map(|entry| *entry.key())
            .filter(|cell| cell.row >= row_count || cell.col >= widths[cell.row])
            .collect();
        for cell in stale {
            self.write_cell(cell, "", true);
        }
        self.state
            .grid
            .retain(|_, cell| !(cell.raw.is_empty() && cell.memo.is_none()));

        // Layout metadata resets to defaults sized to the new dimensions.
        while titles.len() < max_cols {
            titles.push(format!("Column {}", titles.len() + 1));
        }
        {
            let mut props = self.state.props.lock().unwrap();
            let cols = titles.len();
            props.column_titles = titles;
            props.column_types = vec!["raw".to_string(); cols];
            props.column_widths = vec![DEFAULT_COLUMN_WIDTH; cols];
            props.row_heights = vec![DEFAULT_ROW_HEIGHT; row_count];
            props.column_separator = separator;
            props.url_escaped = url_escaped;
            props.labels = front_matter
                .labelled_cells
                .iter()
                .map(|(name, address)| (name.clone(), address.clone()))
                .collect();
        }

        self.front_matter = front_matter;
        self.state.clear_caches();
        self.modified = false;
        Ok(())
    }

    /// Serialize the document back to text.
    pub fn source(&self) -> String {
        let props = self.state.props.lock().unwrap();
        let separator = props
            .column_separator
            .clone()
            .unwrap_or_else(|| ";".to_string());
        let url_escaped = props.url_escaped;
        let cols = props.column_titles.len();
        let rows = props.row_heights.len();

        let mut front_matter = self.front_matter.clone();
        if front_matter.column_titles.is_some() {
            front_matter.column_titles = Some(props.column_titles.clone());
        }
        front_matter.labelled_cells = props
            .labels
            .iter()
            .map(|(name, address)| (name.clone(), address.clone()))
            .collect();

        let mut out = String::new();
        if !front_matter.is_empty() {
            out.push_str("---\n");
            out.push_str(&front_matter::serialize(&front_matter));
            out.push_str("---\n");
        }

        let mut lines = Vec::with_capacity(rows + 1);
        if front_matter.column_titles.is_none() {
            lines.push(
                props
                    .column_titles
                    .iter()
                    .map(|title| encode_field(title, url_escaped))
                    .collect::<Vec<_>>()
                    .join(&separator),
            );
        }
        for row in 0..rows {
            let fields: Vec<String> = (0..cols)
                .map(|col| encode_field(&self.state.raw(CellRef::new(row, col)), url_escaped))
                .collect();
            lines.push(fields.join(&separator));
        }
        out.push_str(&lines.join("\n"));
        out
    }
}

fn split_fields(line: &str, separator: Option<&str>) -> Vec<String> {
    match separator {
        Some(sep) if !sep.is_empty() => line.split(sep).map(str::to_string).collect(),
        _ => line.split([',', ';', '\t']).map(str::to_string).collect(),
    }
}

fn decode_field(field: &str, url_escaped: bool) -> String {
    if url_escaped {
        urlencoding::decode(field)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| field.to_string())
    } else {
        field.to_string()
    }
}

fn encode_field(field: &str, url_escaped: bool) -> String {
    if url_escaped {
        urlencoding::encode(field).into_owned()
    } else {
        field.to_string()
    }
}
