//! Client-side narrative submission guard.

use thiserror::Error;

/// Maximum narrative length, in perceived characters.
pub const MAX_NARRATIVE_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrativeError {
    #[error("narrative is empty")]
    Empty,
    #[error("narrative is {count} characters; the limit is {MAX_NARRATIVE_CHARS}")]
    TooLong { count: usize },
}

/// Count characters the way a reader would, not the way UTF-16 would.
///
/// Unicode scalar values, so a CJK ideograph or an accented letter counts
/// as one character regardless of its encoded width.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Validate a narrative before any network call is made.
pub fn validate_narrative(text: &str) -> Result<(), NarrativeError> {
    if text.trim().is_empty() {
        return Err(NarrativeError::Empty);
    }
    let count = char_count(text);
    if count > MAX_NARRATIVE_CHARS {
        return Err(NarrativeError::TooLong { count });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cjk_counts_per_ideograph() {
        // 5 ideographs, 15 UTF-8 bytes, 5 UTF-16 code units; the guard
        // must see 5.
        let text = "情景室报告";
        assert_eq!(char_count(text), 5);
        assert!(validate_narrative(text).is_ok());
    }

    #[test]
    fn astral_plane_counts_one_not_two() {
        // U+1F600 is two UTF-16 code units but one character.
        assert_eq!(char_count("😀"), 1);
    }

    #[test]
    fn boundary_at_one_thousand() {
        let exactly = "德".repeat(MAX_NARRATIVE_CHARS);
        assert!(validate_narrative(&exactly).is_ok());

        let over = "德".repeat(MAX_NARRATIVE_CHARS + 1);
        assert_eq!(
            validate_narrative(&over),
            Err(NarrativeError::TooLong {
                count: MAX_NARRATIVE_CHARS + 1
            })
        );
    }

    #[test]
    fn empty_and_whitespace_rejected() {
        assert_eq!(validate_narrative(""), Err(NarrativeError::Empty));
        assert_eq!(validate_narrative("   \n\t"), Err(NarrativeError::Empty));
    }
}
