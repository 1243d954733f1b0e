use once_cell::sync::Lazy;
use regex::Regex;

use crate::text_metrics;

use super::Size;

// A run of non-space characters, split after hyphens the way word processors do.
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\s-]+-*|-+").unwrap());

/// Breaks `text` into lines of at most `width` characters. Words are kept whole when
/// they fit, hyphenated words may break after a hyphen and words longer than a line
/// are cut.
pub fn wrap_label(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0usize;
        for found in WORD_RE.find_iter(paragraph) {
            let mut word = found.as_str();
            // a space separates words unless the previous chunk ended in a hyphen
            let joined = current_len > 0 && !current.ends_with('-');
            let word_len = word.chars().count();
            let needed = word_len + usize::from(joined);
            if current_len + needed <= width {
                if joined {
                    current.push(' ');
                }
                current.push_str(word);
                current_len += needed;
                continue;
            }
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
            }
            while word.chars().count() > width {
                let cut = word
                    .char_indices()
                    .nth(width)
                    .map(|(idx, _)| idx)
                    .unwrap_or(word.len());
                lines.push(word[..cut].to_string());
                word = &word[cut..];
            }
            current.push_str(word);
            current_len = word.chars().count();
        }
        if current_len > 0 {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Size of a block of lines drawn with the given font.
pub fn measure_lines(
    lines: &[String],
    font_size: f32,
    font_family: &str,
    line_height: f32,
    fast_metrics: bool,
) -> Size {
    let width = lines
        .iter()
        .map(|line| text_width(line, font_size, font_family, fast_metrics))
        .fold(0.0, f32::max);
    let height = lines.len().max(1) as f32 * font_size * line_height;
    Size::new(width, height)
}

pub fn text_width(text: &str, font_size: f32, font_family: &str, fast_metrics: bool) -> f32 {
    if fast_metrics {
        return fallback_text_width(text, font_size);
    }
    text_metrics::measure_text_width(text, font_size, font_family)
        .unwrap_or_else(|| fallback_text_width(text, font_size))
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(|ch| char_width_factor(ch) * font_size).sum()
}

// Rough advance widths, as a fraction of the font size, for a humanist sans.
fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.3,
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '!' | '|' | '\'' => 0.25,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' => 0.35,
        'm' | 'w' => 0.85,
        'M' | 'W' => 0.95,
        'A'..='Z' => 0.68,
        '0'..='9' => 0.56,
        _ if ch.is_ascii() => 0.55,
        _ => 0.9,
    }
}
