// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure `details` construction: keep at most the last `max_lines`
//! lines of a capture truncated to `max_bytes`, marking a dropped prefix
//! with a literal `(...)` line.

/// Build a bounded, human-readable `details` string from raw captured
/// bytes (an HTTP body or a subprocess's combined stdout+stderr).
pub fn build_details(raw: &[u8], max_bytes: usize, max_lines: usize) -> String {
    let truncated = if raw.len() > max_bytes { &raw[raw.len() - max_bytes..] } else { raw };
    let text = String::from_utf8_lossy(truncated);
    let lines: Vec<&str> = text.lines().collect();

    if lines.len() <= max_lines {
        return lines.join("\n");
    }

    let window = &lines[lines.len() - max_lines..];
    let mut out = vec!["(...)"];
    out.extend_from_slice(&window[1..]);
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_short_text_unchanged() {
        assert_eq!(build_details(b"line one\nline two", 512, 5), "line one\nline two");
    }

    #[test]
    fn keeps_last_five_lines_with_marker() {
        let raw = (1..=10).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n");
        let details = build_details(raw.as_bytes(), 512, 5);
        let lines: Vec<&str> = details.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "(...)");
        assert_eq!(lines[1], "line 7");
        assert_eq!(lines[4], "line 10");
    }

    #[test]
    fn truncates_to_byte_bound_before_line_splitting() {
        let raw = "x".repeat(1000);
        let details = build_details(raw.as_bytes(), 512, 5);
        assert!(details.len() <= 512);
    }

    #[test]
    fn respects_a_narrower_bound() {
        let raw = (1..=10).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n");
        let details = build_details(raw.as_bytes(), 512, 2);
        assert_eq!(details.lines().count(), 2);
    }
}
