//! Text normalization and UTF-16 offset helpers
//!
//! Highlight text is stored normalized: whitespace runs collapsed to a
//! single space, trimmed. Characters are kept as the page wrote them so the
//! stored text still matches the page byte for byte. Node offsets are UTF-16
//! code units so records stay interchangeable with ones written by a browser.

use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

/// Normalize highlight text (collapsed whitespace, trimmed)
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// NFC-composed copy of a string that can map offsets back to the original
#[derive(Debug, Clone)]
pub struct Composed {
    pub text: String,
    /// `(composed byte, original byte)` at each cluster start, plus the ends
    bounds: Vec<(usize, usize)>,
}

impl Composed {
    /// Compose `original` one cluster (a starter and its combining marks) at
    /// a time
    pub fn new(original: &str) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut bounds = Vec::new();
        let mut chars = original.char_indices().peekable();

        while let Some((start, _)) = chars.next() {
            while chars
                .peek()
                .is_some_and(|&(_, c)| canonical_combining_class(c) != 0)
            {
                chars.next();
            }
            let end = chars.peek().map_or(original.len(), |&(i, _)| i);
            bounds.push((text.len(), start));
            text.extend(original[start..end].nfc());
        }
        bounds.push((text.len(), original.len()));

        Self { text, bounds }
    }

    /// Original byte offset for a match starting at `composed`
    pub fn original_start(&self, composed: usize) -> usize {
        self.bounds
            .iter()
            .rev()
            .find(|(c, _)| *c <= composed)
            .map_or(0, |&(_, o)| o)
    }

    /// Original byte offset for a match ending at `composed`
    pub fn original_end(&self, composed: usize) -> usize {
        self.bounds
            .iter()
            .find(|(c, _)| *c >= composed)
            .or(self.bounds.last())
            .map_or(0, |&(_, o)| o)
    }
}

/// Length of a string in UTF-16 code units
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Convert a UTF-16 offset into a byte offset.
///
/// Returns `None` when the offset is past the end or splits a surrogate pair.
pub fn utf16_to_byte(text: &str, offset: usize) -> Option<usize> {
    let mut units = 0;
    for (byte, ch) in text.char_indices() {
        if units == offset {
            return Some(byte);
        }
        units += ch.len_utf16();
        if units > offset {
            return None;
        }
    }
    (units == offset).then_some(text.len())
}

/// Convert a byte offset (on a char boundary) into a UTF-16 offset
pub fn byte_to_utf16(text: &str, byte: usize) -> usize {
    let end = byte.min(text.len());
    text[..end].chars().map(char::len_utf16).sum()
}

/// Slice a string by UTF-16 offsets
pub fn utf16_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    let start = utf16_to_byte(text, start)?;
    let end = utf16_to_byte(text, end)?;
    text.get(start..end)
}

/// Shorten text for display, cutting on a word boundary
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut];
    let head = head
        .rfind(char::is_whitespace)
        .map(|i| &head[..i])
        .unwrap_or(head);

    format!("{}...", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  hello \n\t world  "), "hello world");
        assert_eq!(normalize_text("Cafe\u{301}"), "Cafe\u{301}");
        assert_eq!(normalize_text(" \n "), "");
    }

    #[test]
    fn test_composed_maps_offsets_back() {
        let original = "un cafe\u{301} noir";
        let composed = Composed::new(original);
        assert_eq!(composed.text, "un caf\u{e9} noir");

        let start = composed.text.find("caf\u{e9}").unwrap();
        let end = start + "caf\u{e9}".len();
        let (start, end) = (composed.original_start(start), composed.original_end(end));
        assert_eq!(&original[start..end], "cafe\u{301}");

        let noir = composed.text.find("noir").unwrap();
        assert_eq!(&original[composed.original_start(noir)..], "noir");
    }

    #[test]
    fn test_composed_plain_text_is_identity() {
        let composed = Composed::new("plain");
        assert_eq!(composed.text, "plain");
        assert_eq!(composed.original_start(2), 2);
        assert_eq!(composed.original_end(5), 5);
        assert_eq!(Composed::new("").original_end(0), 0);
    }

    #[test]
    fn test_utf16_offsets() {
        let text = "a\u{1F600}b";
        assert_eq!(utf16_len(text), 4);
        assert_eq!(utf16_to_byte(text, 1), Some(1));
        assert_eq!(utf16_to_byte(text, 2), None);
        assert_eq!(utf16_to_byte(text, 3), Some(5));
        assert_eq!(utf16_to_byte(text, 4), Some(6));
        assert_eq!(utf16_to_byte(text, 5), None);
        assert_eq!(byte_to_utf16(text, 5), 3);
        assert_eq!(utf16_slice(text, 3, 4), Some("b"));
    }

    #[test]
    fn test_excerpt() {
        let text = "This is a long passage that should be shortened for display";
        let short = excerpt(text, 20);
        assert!(short.ends_with("..."));
        assert!(short.len() <= 23);
        assert_eq!(excerpt("short", 20), "short");
    }
}
