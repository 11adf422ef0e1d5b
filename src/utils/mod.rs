//! Utility functions and helpers.

/// Length of a string in UTF-16 code units.
///
/// The delivery transport indexes message text in UTF-16 code units, so
/// entity offsets must be computed with this and never with byte length
/// or `chars().count()`. Characters outside the BMP (emoji among them)
/// occupy two units.
pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_one_unit_per_char() {
        assert_eq!(utf16_len("hello"), 5);
    }

    #[test]
    fn hebrew_is_one_unit_per_char() {
        // Two bytes each in UTF-8, one UTF-16 unit each
        assert_eq!(utf16_len("שלום"), 4);
    }

    #[test]
    fn emoji_is_a_surrogate_pair() {
        assert_eq!(utf16_len("📗"), 2);
        assert_eq!("📗".chars().count(), 1);
    }

    #[test]
    fn mixed_script_counts_compose() {
        assert_eq!(utf16_len("a📗ב"), 1 + 2 + 1);
    }
}
