//! Keeps player-supplied text (names, item arguments, chat lines) on a single
//! log line.

use std::fmt::Write;

/// Longest preview written to the log for one value.
pub const MAX_LOG_PREVIEW: usize = 120;

/// Escape control characters and cap the length at [`MAX_LOG_PREVIEW`] chars.
pub fn escape_log(s: &str) -> String {
    escape_log_with_limit(s, MAX_LOG_PREVIEW)
}

pub fn escape_log_with_limit(s: &str, limit: usize) -> String {
    let mut out = String::with_capacity(s.len().min(limit) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= limit {
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
