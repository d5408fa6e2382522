//! # Text Normalizer
//!
//! The normalization pipeline, in order:
//! 1. decode input bytes under the [`InvalidCharPolicy`];
//! 2. drop leading whitespace (``remove_extra_whitespaces``);
//! 3. apply the [`CharsMap`];
//! 4. collapse whitespace runs and strip trailing whitespace (``remove_extra_whitespaces``);
//! 5. prepend one space to non-empty output (``add_dummy_prefix``);
//! 6. replace spaces with [`META_SPACE`](crate::normalizer::META_SPACE) (``escape_whitespaces``).

use crate::{
    errors::{UPResult, UnipieceError},
    normalizer::{CharsMap, META_SPACE_STR},
    proto::NormalizerSpec,
};

/// How invalid UTF-8 input is handled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InvalidCharPolicy {
    /// Substitute U+FFFD for each maximal invalid sequence.
    #[default]
    Replace,

    /// Fail with [`UnipieceError::Encoding`].
    Reject,
}

/// Runtime options which are not part of the persisted [`NormalizerSpec`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerOptions {
    /// Invalid UTF-8 handling.
    pub invalid_chars: InvalidCharPolicy,
}

impl NormalizerOptions {
    /// Set the invalid UTF-8 policy.
    pub fn with_invalid_chars(
        self,
        invalid_chars: InvalidCharPolicy,
    ) -> Self {
        Self { invalid_chars }
    }
}

/// A normalization result.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// The normalized text.
    pub text: String,

    /// For each byte of ``text``, the source byte offset it came from;
    /// followed by one final entry holding the source length.
    pub alignment: Vec<usize>,

    /// The number of U+FFFD substitutions made while decoding.
    pub invalid_count: usize,
}

/// A compiled [`NormalizerSpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    chars_map: CharsMap,
    add_dummy_prefix: bool,
    remove_extra_whitespaces: bool,
    escape_whitespaces: bool,
    options: NormalizerOptions,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            chars_map: CharsMap::identity(),
            add_dummy_prefix: true,
            remove_extra_whitespaces: true,
            escape_whitespaces: true,
            options: NormalizerOptions::default(),
        }
    }
}

impl Normalizer {
    /// Compile a normalizer from its spec.
    ///
    /// ``precompiled_charsmap`` takes precedence; when it is empty a
    /// ``normalization_rule_tsv`` is compiled instead.
    ///
    /// ## Arguments
    /// * `spec` - The normalization spec.
    ///
    /// ## Returns
    /// A `UPResult<Normalizer>`; malformed rule data is a parse error.
    pub fn new(spec: &NormalizerSpec) -> UPResult<Self> {
        let chars_map = match (spec.precompiled_charsmap(), spec.normalization_rule_tsv()) {
            (bytes, _) if !bytes.is_empty() => CharsMap::from_bytes(bytes)?,
            (_, tsv) if !tsv.is_empty() => CharsMap::from_rule_tsv(tsv)?,
            _ => CharsMap::identity(),
        };

        Ok(Self {
            chars_map,
            add_dummy_prefix: spec.add_dummy_prefix(),
            remove_extra_whitespaces: spec.remove_extra_whitespaces(),
            escape_whitespaces: spec.escape_whitespaces(),
            options: NormalizerOptions::default(),
        })
    }

    /// Replace the runtime options.
    pub fn with_options(
        self,
        options: NormalizerOptions,
    ) -> Self {
        Self { options, ..self }
    }

    /// The runtime options.
    pub fn options(&self) -> &NormalizerOptions {
        &self.options
    }

    /// The compiled character map.
    pub fn chars_map(&self) -> &CharsMap {
        &self.chars_map
    }

    /// Does this normalizer prepend a dummy space?
    pub fn add_dummy_prefix(&self) -> bool {
        self.add_dummy_prefix
    }

    /// Does this normalizer escape spaces to [`META_SPACE`](crate::normalizer::META_SPACE)?
    pub fn escape_whitespaces(&self) -> bool {
        self.escape_whitespaces
    }

    /// Normalize text.
    pub fn normalize(
        &self,
        text: &str,
    ) -> String {
        self.normalize_str(text, None).text
    }

    /// Normalize text, keeping the source alignment.
    pub fn normalize_with_alignment(
        &self,
        text: &str,
    ) -> Normalized {
        self.normalize_str(text, None)
    }

    /// Normalize raw input bytes.
    ///
    /// ## Arguments
    /// * `input` - Possibly invalid UTF-8.
    ///
    /// ## Returns
    /// The [`Normalized`] result; under [`InvalidCharPolicy::Reject`], an
    /// [`UnipieceError::Encoding`] naming the first invalid byte.
    pub fn normalize_bytes(
        &self,
        input: &[u8],
    ) -> UPResult<Normalized> {
        match std::str::from_utf8(input) {
            Ok(text) => Ok(self.normalize_str(text, None)),
            Err(err) => match self.options.invalid_chars {
                InvalidCharPolicy::Reject => Err(UnipieceError::Encoding {
                    offset: err.valid_up_to(),
                }),
                InvalidCharPolicy::Replace => {
                    let (text, offsets, invalid_count) = decode_lossy(input);
                    let mut result = self.normalize_str(&text, Some(&offsets));
                    result.invalid_count = invalid_count;
                    Ok(result)
                }
            },
        }
    }

    /// Core pipeline over decoded text.
    ///
    /// ``source_offsets`` maps bytes of ``text`` to input offsets
    /// (``text.len() + 1`` entries); identity when absent.
    fn normalize_str(
        &self,
        text: &str,
        source_offsets: Option<&[usize]>,
    ) -> Normalized {
        let source_of = |pos: usize| source_offsets.map_or(pos, |offsets| offsets[pos]);

        let start = if self.remove_extra_whitespaces {
            text.len() - text.trim_start().len()
        } else {
            0
        };

        // Character map stage; every output byte records its source offset.
        let mut mapped = String::with_capacity(text.len() - start);
        let mut mapped_src: Vec<usize> = Vec::with_capacity(text.len() - start);
        self.chars_map
            .rewrite_with(&text[start..], |range, out, verbatim| {
                let base = start + range.start;
                if verbatim {
                    mapped_src.extend((0..out.len()).map(|i| source_of(base + i)));
                } else {
                    mapped_src.extend(std::iter::repeat_n(source_of(base), out.len()));
                }
                mapped.push_str(out);
            });

        let space: &str = if self.escape_whitespaces {
            META_SPACE_STR
        } else {
            " "
        };

        let mut out = String::with_capacity(mapped.len() + space.len() * 2);
        let mut alignment = Vec::with_capacity(mapped.len() + space.len() * 2 + 1);
        let mut push = |s: &str, src: usize, out: &mut String| {
            out.push_str(s);
            alignment.extend(std::iter::repeat_n(src, s.len()));
        };

        let mut started = false;
        let mut pending_space: Option<usize> = None;
        for (pos, c) in mapped.char_indices() {
            let src = mapped_src[pos];

            if self.remove_extra_whitespaces && c.is_whitespace() {
                if started && pending_space.is_none() {
                    pending_space = Some(src);
                }
                continue;
            }

            if !started {
                started = true;
                if self.add_dummy_prefix {
                    push(space, src, &mut out);
                }
            }
            if let Some(ws) = pending_space.take() {
                push(space, ws, &mut out);
            }

            if c == ' ' {
                push(space, src, &mut out);
            } else {
                push(&mapped[pos..pos + c.len_utf8()], src, &mut out);
            }
        }
        // Trailing whitespace in ``pending_space`` is dropped.

        alignment.push(source_of(text.len()));

        Normalized {
            text: out,
            alignment,
            invalid_count: 0,
        }
    }
}

/// Lossy UTF-8 decode with per-byte source offsets.
fn decode_lossy(input: &[u8]) -> (String, Vec<usize>, usize) {
    let mut text = String::with_capacity(input.len() + 8);
    let mut offsets = Vec::with_capacity(input.len() + 8);
    let mut invalid_count = 0;

    let mut pos = 0;
    for chunk in input.utf8_chunks() {
        let valid = chunk.valid();
        text.push_str(valid);
        offsets.extend(pos..pos + valid.len());
        pos += valid.len();

        let invalid = chunk.invalid();
        if !invalid.is_empty() {
            text.push(char::REPLACEMENT_CHARACTER);
            offsets.extend(std::iter::repeat_n(
                pos,
                char::REPLACEMENT_CHARACTER.len_utf8(),
            ));
            pos += invalid.len();
            invalid_count += 1;
        }
    }
    offsets.push(input.len());

    (text, offsets, invalid_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(
        add_dummy_prefix: bool,
        remove_extra_whitespaces: bool,
        escape_whitespaces: bool,
    ) -> NormalizerSpec {
        NormalizerSpec {
            add_dummy_prefix: Some(add_dummy_prefix),
            remove_extra_whitespaces: Some(remove_extra_whitespaces),
            escape_whitespaces: Some(escape_whitespaces),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_pipeline() {
        let normalizer = Normalizer::new(&NormalizerSpec::default()).unwrap();
        assert_eq!(normalizer.normalize("hello world"), "▁hello▁world");
        assert_eq!(normalizer.normalize("  hello \t  world  "), "▁hello▁world");
        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize("   "), "");
    }

    #[test]
    fn test_flags() {
        let normalizer = Normalizer::new(&spec(false, true, true)).unwrap();
        assert_eq!(normalizer.normalize(" a  b "), "a▁b");

        let normalizer = Normalizer::new(&spec(true, false, true)).unwrap();
        assert_eq!(normalizer.normalize(" a  b "), "▁▁a▁▁b▁");

        let normalizer = Normalizer::new(&spec(true, true, false)).unwrap();
        assert_eq!(normalizer.normalize(" a  b "), " a b");
    }

    #[test]
    fn test_chars_map_applied() {
        let map = CharsMap::from_rules([("\u{ff21}", "A"), ("\u{3000}", " ")]).unwrap();
        let spec = NormalizerSpec {
            precompiled_charsmap: Some(map.to_bytes()),
            ..Default::default()
        };
        let normalizer = Normalizer::new(&spec).unwrap();
        assert_eq!(normalizer.normalize("\u{ff21}\u{3000}\u{3000}b"), "▁A▁b");
    }

    #[test]
    fn test_rule_tsv_fallback() {
        let spec = NormalizerSpec {
            normalization_rule_tsv: Some("FF21\t41\n".to_string()),
            ..Default::default()
        };
        let normalizer = Normalizer::new(&spec).unwrap();
        assert_eq!(normalizer.normalize("\u{ff21}"), "▁A");
    }

    #[test]
    fn test_alignment() {
        let normalizer = Normalizer::new(&NormalizerSpec::default()).unwrap();
        let result = normalizer.normalize_with_alignment(" ab  c");
        assert_eq!(result.text, "▁ab▁c");
        assert_eq!(result.alignment.len(), result.text.len() + 1);
        // dummy prefix aligns to the first kept char.
        assert_eq!(&result.alignment[..3], &[1, 1, 1]);
        assert_eq!(result.alignment[3], 1);
        assert_eq!(result.alignment[4], 2);
        // collapsed run aligns to its first whitespace.
        assert_eq!(&result.alignment[5..8], &[3, 3, 3]);
        assert_eq!(result.alignment[8], 5);
        assert_eq!(result.alignment[9], 6);
    }

    #[test]
    fn test_invalid_bytes_replace() {
        let normalizer = Normalizer::default();
        let result = normalizer.normalize_bytes(b"a\xffb\xc3").unwrap();
        assert_eq!(result.text, "▁a\u{fffd}b\u{fffd}");
        assert_eq!(result.invalid_count, 2);
        assert_eq!(*result.alignment.last().unwrap(), 4);
    }

    #[test]
    fn test_invalid_bytes_reject() {
        let normalizer = Normalizer::default()
            .with_options(NormalizerOptions::default().with_invalid_chars(InvalidCharPolicy::Reject));
        assert!(matches!(
            normalizer.normalize_bytes(b"ab\xffc"),
            Err(UnipieceError::Encoding { offset: 2 })
        ));
        assert_eq!(normalizer.normalize_bytes(b"ok").unwrap().text, "▁ok");
    }
}
