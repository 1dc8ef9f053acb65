//! Greedy word wrap against measured pixel widths.
//!
//! Lines only break between whitespace-separated words; there is no hyphenation.
//! A word wider than the line is kept whole on a line of its own. The result is
//! never empty: blank input yields a single empty line so callers can always
//! index line 0.

use crate::layout::fonts::TextMeasure;

/// Wraps `text` into lines no wider than `max_width` (except lone oversized words).
pub fn wrap_text<M: TextMeasure + ?Sized>(text: &str, measure: &M, max_width: f32) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if measure.text_width(&candidate) <= max_width {
            current = candidate;
        } else {
            // Current line is full; this word starts the next one.
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Number of lines `text` occupies when wrapped at `max_width`. Always ≥ 1.
pub fn line_count<M: TextMeasure + ?Sized>(text: &str, measure: &M, max_width: f32) -> usize {
    wrap_text(text, measure, max_width).len()
}
