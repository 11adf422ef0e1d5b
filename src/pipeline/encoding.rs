//! Text encoding detection and normalization.
//!
//! The catalog's download endpoints serve CSV bodies whose declared
//! content-type is not trustworthy, so the charset is detected
//! statistically from the bytes. UTF-8 passes through unchanged; anything
//! else is assumed to be the catalog's legacy Windows-1255 and is decoded
//! to UTF-8 before storage and diffing.

use chardetng::EncodingDetector;
use encoding_rs::{UTF_8, WINDOWS_1255};

use crate::error::{AppError, Result};

/// A buffer normalized to UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Content as UTF-8 text
    pub text: String,
    /// Name of the charset the detector guessed for the input
    pub charset: &'static str,
}

/// Detect the charset of `bytes` and convert the content to UTF-8.
///
/// Conversion producing unmappable bytes fails the resource: a partial or
/// corrupted body must never replace the stored copy.
pub fn normalize(bytes: Vec<u8>) -> Result<Normalized> {
    let mut detector = EncodingDetector::new();
    detector.feed(&bytes, true);
    let guess = detector.guess(None, true);

    if guess == UTF_8 {
        let text = String::from_utf8(bytes)
            .map_err(|e| AppError::encoding(UTF_8.name(), e))?;
        return Ok(Normalized {
            text,
            charset: UTF_8.name(),
        });
    }

    let (text, _, had_errors) = WINDOWS_1255.decode(&bytes);
    if had_errors {
        return Err(AppError::encoding(
            guess.name(),
            "content does not decode cleanly as windows-1255",
        ));
    }

    Ok(Normalized {
        text: text.into_owned(),
        charset: guess.name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_hebrew_passes_through() {
        let content = "שם,עיר\nדנה,חיפה\n";
        let normalized = normalize(content.as_bytes().to_vec()).unwrap();
        assert_eq!(normalized.text, content);
        assert_eq!(normalized.charset, "UTF-8");
    }

    #[test]
    fn windows_1255_is_converted() {
        // "שלום" in Windows-1255
        let legacy = vec![0xF9, 0xEC, 0xE5, 0xED];
        let normalized = normalize(legacy).unwrap();
        assert_eq!(normalized.text, "שלום");
    }

    #[test]
    fn ascii_is_unchanged() {
        let content = "id,name\n1,alpha\n";
        let normalized = normalize(content.as_bytes().to_vec()).unwrap();
        assert_eq!(normalized.text, content);
    }

    #[test]
    fn normalize_is_idempotent() {
        let legacy = vec![0xF9, 0xEC, 0xE5, 0xED, b',', 0xE3, 0xE0, 0xF0, 0xE4];
        let once = normalize(legacy).unwrap();
        let twice = normalize(once.text.as_bytes().to_vec()).unwrap();
        assert_eq!(once.text, twice.text);
    }

    #[test]
    fn idempotent_on_ascii() {
        let content = b"plain,csv\n".to_vec();
        let once = normalize(content).unwrap();
        let twice = normalize(once.text.as_bytes().to_vec()).unwrap();
        assert_eq!(once.text, twice.text);
    }
}
