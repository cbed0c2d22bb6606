//! Helpers that keep user-supplied text (home names, cost equations, CSV rows) on a
//! single log line.

use std::fmt::Write;

const MAX_PREVIEW: usize = 300;

/// Escape a string for single-line logging.
///
/// Backslash, `\n`, `\r` and `\t` become their escaped forms and other control characters
/// become `\xNN`. Output is cut off with an ellipsis after `MAX_PREVIEW` characters.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Render a CSV row as `a, b, c` for warnings about skipped records.
pub fn preview_record(row: &csv::StringRecord) -> String {
    let joined = row.iter().collect::<Vec<_>>().join(", ");
    escape_log(&joined)
}
