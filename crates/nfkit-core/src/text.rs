/// Pure text transforms used by the corrector and by diagnostics.
///
/// [`strip_diacritics`] removes combining marks after NFD decomposition.
/// [`annotate_diff`] produces the position-wise before/after annotation that
/// front-ends use to highlight what a correction changed.
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// Shown in place of a space inside a changed run, so that removed or added
/// whitespace is visible.
pub const VISIBLE_SPACE: char = '\u{2420}';

/// Display text for a blank value in diagnostics.
pub const BLANK_DISPLAY: &str = "vazio";

/// A standalone `e` conjunction between words, any case.
static CONJUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+e\s+").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| unreachable!("regex engine broken"))
    })
});

/// Removes diacritics: NFD decomposition followed by dropping every code
/// point in the combining-marks block U+0300..=U+036F.
///
/// ```
/// use nfkit_core::text::strip_diacritics;
///
/// assert_eq!(strip_diacritics("Utensílios Açúcar"), "Utensilios Acucar");
/// ```
pub fn strip_diacritics(text: &str) -> String {
    text.nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect()
}

/// NFC form of `text`, used when matching header names.
pub fn nfc(text: &str) -> String {
    text.nfc().collect()
}

/// Compacts a product-group label to `[A-Za-z0-9]+`: diacritics are
/// stripped, ` e ` conjunctions dropped, and every remaining non-alphanumeric
/// character (commas and whitespace included) removed.
pub fn compact_group(text: &str) -> String {
    let stripped = strip_diacritics(text);
    let spaced = CONJUNCTION_RE.replace_all(&stripped, " ");
    spaced.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Returns the first `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Formats a raw value for diagnostics: `"<trimmed>"`, or `vazio` when blank.
pub fn display_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        BLANK_DISPLAY.to_owned()
    } else {
        format!("\"{trimmed}\"")
    }
}

// ---------------------------------------------------------------------------
// Diff annotation
// ---------------------------------------------------------------------------

/// A run of characters that either differs from the other side or does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// The characters of the run.
    pub text: String,
    /// `true` if these positions differ from the other side.
    pub changed: bool,
}

/// One side of a before/after pair, split into changed and unchanged runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AnnotatedText {
    /// Runs in order; adjacent runs never share the same `changed` flag.
    pub segments: Vec<Segment>,
}

impl AnnotatedText {
    fn push(&mut self, c: char, changed: bool) {
        match self.segments.last_mut() {
            Some(last) if last.changed == changed => last.text.push(c),
            Some(_) | None => self.segments.push(Segment {
                text: c.to_string(),
                changed,
            }),
        }
    }

    /// The underlying text without annotations.
    pub fn plain(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Returns `true` if any run is marked as changed.
    pub fn has_changes(&self) -> bool {
        self.segments.iter().any(|s| s.changed)
    }

    /// Renders the text with spaces in changed runs replaced by
    /// [`VISIBLE_SPACE`], and each changed run wrapped in `open`/`close`.
    pub fn render(&self, open: &str, close: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if segment.changed {
                out.push_str(open);
                out.extend(
                    segment
                        .text
                        .chars()
                        .map(|c| if c == ' ' { VISIBLE_SPACE } else { c }),
                );
                out.push_str(close);
            } else {
                out.push_str(&segment.text);
            }
        }
        out
    }
}

/// Compares `before` and `after` character by character at the same
/// positions and marks every position where they differ.
///
/// Positions past the end of the shorter side count as differing on the
/// longer side. The comparison is positional, not an edit-distance
/// alignment: an inserted character marks every following position.
pub fn annotate_diff(before: &str, after: &str) -> (AnnotatedText, AnnotatedText) {
    let mut left = AnnotatedText::default();
    let mut right = AnnotatedText::default();
    let mut b = before.chars();
    let mut a = after.chars();

    loop {
        match (b.next(), a.next()) {
            (None, None) => break,
            (Some(x), Some(y)) => {
                let changed = x != y;
                left.push(x, changed);
                right.push(y, changed);
            }
            (Some(x), None) => left.push(x, true),
            (None, Some(y)) => right.push(y, true),
        }
    }

    (left, right)
}
