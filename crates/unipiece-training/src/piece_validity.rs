//! # Piece Validity
//!
//! Splitting rules a candidate piece must respect: whitespace position,
//! a single script class, and no digit / non-digit mixing.

use unicode_general_category::{GeneralCategory, get_general_category};
use unipiece::normalizer::META_SPACE;

use crate::alphabet::{SENTENCE_BOUNDARY, UNK_CHAR};

/// Coarse script classes for piece splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptClass {
    /// Latin letters.
    Latin,
    /// Greek letters.
    Greek,
    /// Cyrillic letters.
    Cyrillic,
    /// Armenian letters.
    Armenian,
    /// Hebrew letters.
    Hebrew,
    /// Arabic letters.
    Arabic,
    /// Devanagari and the other Brahmic blocks.
    Indic,
    /// Thai and Lao.
    Thai,
    /// Georgian letters.
    Georgian,
    /// Hangul syllables and jamo.
    Hangul,
    /// Han, Hiragana and Katakana.
    Cjk,
    /// Letters of any other script.
    OtherLetter,
    /// Decimal digits (only when splitting by number).
    Number,
    /// Combining marks; they take the class of their base.
    Inherited,
    /// Punctuation, symbols, separators and everything else.
    Common,
}

fn letter_class(c: char) -> ScriptClass {
    match c as u32 {
        0x0041..=0x024F | 0x1E00..=0x1EFF | 0x2C60..=0x2C7F | 0xA720..=0xA7FF | 0xFF21..=0xFF5A => {
            ScriptClass::Latin
        }
        0x0370..=0x03FF | 0x1F00..=0x1FFF => ScriptClass::Greek,
        0x0400..=0x052F | 0x2DE0..=0x2DFF | 0xA640..=0xA69F => ScriptClass::Cyrillic,
        0x0530..=0x058F => ScriptClass::Armenian,
        0x0590..=0x05FF => ScriptClass::Hebrew,
        0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF => {
            ScriptClass::Arabic
        }
        0x0900..=0x0DFF => ScriptClass::Indic,
        0x0E00..=0x0EFF => ScriptClass::Thai,
        0x10A0..=0x10FF => ScriptClass::Georgian,
        0x1100..=0x11FF | 0x3130..=0x318F | 0xA960..=0xA97F | 0xAC00..=0xD7FF | 0xFFA0..=0xFFDC => {
            ScriptClass::Hangul
        }
        0x2E80..=0x2FDF
        | 0x3005..=0x3007
        | 0x3021..=0x3029
        | 0x3031..=0x3035
        | 0x3038..=0x303C
        | 0x3040..=0x30FF
        | 0x31F0..=0x31FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xF900..=0xFAFF
        | 0xFF66..=0xFF9F
        | 0x20000..=0x3134F => ScriptClass::Cjk,
        _ => ScriptClass::OtherLetter,
    }
}

/// The script class of a character.
///
/// ## Arguments
/// * `c` - The character.
/// * `split_by_number` - Give decimal digits their own class.
pub fn script_class(
    c: char,
    split_by_number: bool,
) -> ScriptClass {
    use GeneralCategory::*;
    match get_general_category(c) {
        UppercaseLetter | LowercaseLetter | TitlecaseLetter | ModifierLetter | OtherLetter => {
            letter_class(c)
        }
        // Prolonged sound marks and iteration marks are Lm/Lo above; other
        // spacing marks follow their base.
        NonspacingMark | SpacingMark | EnclosingMark => ScriptClass::Inherited,
        DecimalNumber if split_by_number => ScriptClass::Number,
        _ => ScriptClass::Common,
    }
}

fn is_digit(c: char) -> bool {
    matches!(get_general_category(c), GeneralCategory::DecimalNumber)
}

/// Piece splitting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceValidator {
    /// Longest piece, in characters.
    pub max_len: usize,

    /// ``▁`` may only start a piece.
    pub split_by_whitespace: bool,

    /// All characters share one script class.
    pub split_by_unicode_script: bool,

    /// Digits do not mix with other characters.
    pub split_by_number: bool,
}

impl Default for PieceValidator {
    fn default() -> Self {
        Self {
            max_len: 16,
            split_by_whitespace: true,
            split_by_unicode_script: true,
            split_by_number: true,
        }
    }
}

impl PieceValidator {
    /// Is ``piece`` an acceptable piece?
    pub fn is_valid(
        &self,
        piece: &[char],
    ) -> bool {
        if piece.is_empty() || piece.len() > self.max_len {
            return false;
        }

        let mut script: Option<ScriptClass> = None;
        let mut digits: Option<bool> = None;
        for (i, &c) in piece.iter().enumerate() {
            if c == SENTENCE_BOUNDARY || c == UNK_CHAR {
                return false;
            }
            if c == META_SPACE {
                if self.split_by_whitespace && i > 0 {
                    return false;
                }
                continue;
            }

            if self.split_by_number {
                let d = is_digit(c);
                if *digits.get_or_insert(d) != d {
                    return false;
                }
            }

            if self.split_by_unicode_script {
                match script_class(c, self.split_by_number) {
                    ScriptClass::Inherited => {}
                    class => {
                        if *script.get_or_insert(class) != class {
                            return false;
                        }
                    }
                }
            }
        }

        // A run of bare ``▁`` longer than one is never a piece.
        !(piece.len() > 1 && piece.iter().all(|&c| c == META_SPACE))
    }

    /// [`PieceValidator::is_valid`] over a string.
    pub fn is_valid_str(
        &self,
        piece: &str,
    ) -> bool {
        let chars: Vec<char> = piece.chars().collect();
        self.is_valid(&chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_classes() {
        assert_eq!(script_class('a', true), ScriptClass::Latin);
        assert_eq!(script_class('é', true), ScriptClass::Latin);
        assert_eq!(script_class('я', true), ScriptClass::Cyrillic);
        assert_eq!(script_class('漢', true), ScriptClass::Cjk);
        assert_eq!(script_class('か', true), ScriptClass::Cjk);
        assert_eq!(script_class('カ', true), ScriptClass::Cjk);
        assert_eq!(script_class('ー', true), ScriptClass::Cjk);
        assert_eq!(script_class('한', true), ScriptClass::Hangul);
        assert_eq!(script_class('7', true), ScriptClass::Number);
        assert_eq!(script_class('7', false), ScriptClass::Common);
        assert_eq!(script_class(',', true), ScriptClass::Common);
        assert_eq!(script_class('\u{0301}', true), ScriptClass::Inherited);
    }

    #[test]
    fn test_whitespace_rules() {
        let v = PieceValidator::default();
        assert!(v.is_valid_str("▁hello"));
        assert!(v.is_valid_str("▁"));
        assert!(!v.is_valid_str("hello▁"));
        assert!(!v.is_valid_str("▁▁"));

        let v = PieceValidator {
            split_by_whitespace: false,
            ..Default::default()
        };
        assert!(v.is_valid_str("a▁b"));
        assert!(!v.is_valid_str("▁▁"));
    }

    #[test]
    fn test_script_and_number_rules() {
        let v = PieceValidator::default();
        assert!(v.is_valid_str("▁漢字かな"));
        assert!(!v.is_valid_str("ab漢"));
        assert!(!v.is_valid_str("hello,"));
        assert!(!v.is_valid_str("a1"));
        assert!(v.is_valid_str("▁2024"));
        assert!(v.is_valid_str("café"));
        assert!(v.is_valid_str("cafe\u{0301}"));

        let v = PieceValidator {
            split_by_unicode_script: false,
            ..Default::default()
        };
        assert!(v.is_valid_str("hello,"));
        assert!(!v.is_valid_str("a1"));

        let v = PieceValidator {
            split_by_unicode_script: false,
            split_by_number: false,
            ..Default::default()
        };
        assert!(v.is_valid_str("a1"));
    }

    #[test]
    fn test_length_and_markers() {
        let v = PieceValidator {
            max_len: 3,
            ..Default::default()
        };
        assert!(v.is_valid_str("abc"));
        assert!(!v.is_valid_str("abcd"));
        assert!(!v.is_valid_str(""));
        assert!(!v.is_valid_str("a\u{2585}"));
        assert!(!v.is_valid_str("a\0"));
    }
}
