//! Fitting node labels into a fixed width.

use unicode_width::UnicodeWidthStr;

pub const ELLIPSIS: char = '…';

/// Width of rendered text, in world units.
pub trait TextMeasure {
    fn width(&self, text: &str) -> f64;
}

/// Terminal measurement: display cells times a fixed glyph advance.
#[derive(Debug, Clone, Copy)]
pub struct CellMeasure {
    pub advance: f64,
}

impl TextMeasure for CellMeasure {
    fn width(&self, text: &str) -> f64 {
        text.width() as f64 * self.advance
    }
}

fn render(chars: &[char], shown: usize) -> String {
    let mut out: String = chars[..shown].iter().collect();
    if shown < chars.len() {
        out.push(ELLIPSIS);
    }
    out
}

/// Move `current` one character at a time toward the longest prefix of
/// `content` that fits `limit`, adding an ellipsis when truncated.
///
/// Each iteration compares the width of what is rendered now against the
/// limit to pick grow or shrink. The loop is bounded by the label length and
/// a fitted label is returned unchanged.
pub fn fit_label(content: &str, current: &str, limit: f64, measure: &impl TextMeasure) -> String {
    if measure.width(content) <= limit {
        return content.to_string();
    }
    let chars: Vec<char> = content.chars().collect();
    let shown_now = current.strip_suffix(ELLIPSIS).unwrap_or(current);
    let mut shown = shown_now
        .chars()
        .zip(chars.iter())
        .take_while(|(a, b)| a == *b)
        .count()
        .min(chars.len() - 1);

    for _ in 0..=chars.len() {
        if measure.width(&render(&chars, shown)) > limit {
            if shown == 0 {
                break;
            }
            shown -= 1;
        } else if shown + 1 < chars.len() && measure.width(&render(&chars, shown + 1)) <= limit {
            shown += 1;
        } else {
            break;
        }
    }
    render(&chars, shown)
}
