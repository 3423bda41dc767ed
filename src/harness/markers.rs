//! Inline position markers in test fixtures.
//!
//! A fixture marks every expected diagnostic location as `[|...|]`.

use std::ops::Range;
use thiserror::Error;

pub const OPEN: &str = "[|";
pub const CLOSE: &str = "|]";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MarkerError {
    #[error("marker opened at byte {0} inside another marker")]
    Nested(usize),
    #[error("marker closed at byte {0} without being opened")]
    Unopened(usize),
    #[error("marker opened at byte {0} is never closed")]
    Unclosed(usize),
}

/// Fixture source with markers stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedSource {
    pub source: String,
    /// Marked byte ranges of `source`, in document order.
    pub markers: Vec<Range<usize>>,
}

/// Strip markers from `text`, recording what they enclosed.
pub fn parse_markers(text: &str) -> Result<MarkedSource, MarkerError> {
    let mut source = String::with_capacity(text.len());
    let mut markers = Vec::new();
    let mut open: Option<(usize, usize)> = None;
    let mut rest = text;
    let mut consumed = 0;

    loop {
        let next_open = rest.find(OPEN);
        let next_close = rest.find(CLOSE);
        let (at, is_open) = match (next_open, next_close) {
            (Some(o), Some(c)) if o < c => (o, true),
            (_, Some(c)) => (c, false),
            (Some(o), None) => (o, true),
            (None, None) => break,
        };

        source.push_str(&rest[..at]);
        let position = consumed + at;
        if is_open {
            if open.is_some() {
                return Err(MarkerError::Nested(position));
            }
            open = Some((source.len(), position));
        } else {
            let (start, _) = open.take().ok_or(MarkerError::Unopened(position))?;
            markers.push(start..source.len());
        }
        rest = &rest[at + 2..];
        consumed = position + 2;
    }
    source.push_str(rest);

    if let Some((_, opened_at)) = open {
        return Err(MarkerError::Unclosed(opened_at));
    }
    Ok(MarkedSource { source, markers })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_markers() {
        let marked = parse_markers("a [|Rec.Modify()|]; b [|x|]").unwrap();
        assert_eq!(marked.source, "a Rec.Modify(); b x");
        assert_eq!(marked.markers, vec![2..14, 18..19]);
        assert_eq!(&marked.source[marked.markers[0].clone()], "Rec.Modify()");
    }

    #[test]
    fn test_unmarked_text() {
        let marked = parse_markers("Rec.Modify(true);").unwrap();
        assert_eq!(marked.source, "Rec.Modify(true);");
        assert!(marked.markers.is_empty());
    }

    #[test]
    fn test_malformed_markers() {
        assert_eq!(parse_markers("[|a[|b|]|]"), Err(MarkerError::Nested(3)));
        assert_eq!(parse_markers("a|]"), Err(MarkerError::Unopened(1)));
        assert_eq!(parse_markers("x[|a"), Err(MarkerError::Unclosed(1)));
    }
}
