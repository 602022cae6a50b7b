//! Formula preprocessing.
//!
//! Before a formula reaches Rhai, relative column references like `:Price`
//! are rewritten into `col("Price")` calls. References inside string
//! literals are left untouched.

use regex::Regex;
use std::sync::OnceLock;

fn column_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").unwrap())
}

fn rewrite_column_refs(seg: &str) -> String {
    column_ref_re()
        .replace_all(seg, |caps: &regex::Captures| format!("col(\"{}\")", &caps[1]))
        .to_string()
}

/// Rewrite column references in a formula body, skipping string literals.
pub fn preprocess_formula(body: &str) -> String {
    let bytes = body.as_bytes();
    let mut out = String::new();
    let mut seg_start = 0;
    let mut in_string = false;
    let mut backslashes = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                backslashes += 1;
                i += 1;
                continue;
            }
            if b == b'"' && backslashes.is_multiple_of(2) {
                out.push_str(&body[seg_start..=i]);
                in_string = false;
                seg_start = i + 1;
            }
            backslashes = 0;
            i += 1;
            continue;
        }

        if b == b'"' {
            out.push_str(&rewrite_column_refs(&body[seg_start..i]));
            in_string = true;
            seg_start = i;
            backslashes = 0;
            i += 1;
            continue;
        }

        i += 1;
    }

    if seg_start < body.len() {
        if in_string {
            out.push_str(&body[seg_start..]);
        } else {
            out.push_str(&rewrite_column_refs(&body[seg_start..]));
        }
    }

    out
}
