//! # Precompiled Character Map
//!
//! A rewrite table applied left to right, taking the longest matching source
//! at each position.
//!
//! The compiled form (``NormalizerSpec.precompiled_charsmap``) is:
//! ```terminaloutput
//! "UPCM" | u32 LE rule count | { u32 LE src len | src | u32 LE dst len | dst }*
//! ```
//! with rules sorted by source.

use core::ops::Range;

use aho_corasick::{AhoCorasick, MatchKind};

use crate::errors::{UPResult, UnipieceError};

const CHARS_MAP_MAGIC: &[u8; 4] = b"UPCM";

/// A compiled longest-match rewrite table.
#[derive(Debug, Clone, Default)]
pub struct CharsMap {
    rules: Vec<(String, String)>,
    automaton: Option<AhoCorasick>,
}

impl PartialEq for CharsMap {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.rules == other.rules
    }
}

impl CharsMap {
    /// The empty (identity) map.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Build a map from ``(source, target)`` rules.
    ///
    /// Duplicate sources with different targets are a conflict.
    pub fn from_rules<I, S, D>(rules: I) -> UPResult<Self>
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<String>,
    {
        let mut rules: Vec<(String, String)> = rules
            .into_iter()
            .map(|(s, d)| (s.into(), d.into()))
            .collect();

        if rules.iter().any(|(src, _)| src.is_empty()) {
            return Err(UnipieceError::Parse(
                "character map rule with empty source".to_string(),
            ));
        }

        rules.sort();
        rules.dedup();
        for window in rules.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(UnipieceError::Parse(format!(
                    "conflicting character map rules for {:?}",
                    window[0].0
                )));
            }
        }

        let automaton = if rules.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(rules.iter().map(|(src, _)| src.as_str()))
                    .map_err(|e| UnipieceError::Parse(e.to_string()))?,
            )
        };

        Ok(Self { rules, automaton })
    }

    /// Compile ``(source, target)`` rules into ``precompiled_charsmap`` bytes.
    pub fn compile<I, S, D>(rules: I) -> UPResult<Vec<u8>>
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<String>,
    {
        Ok(Self::from_rules(rules)?.to_bytes())
    }

    /// Compile a rule table in TSV form.
    ///
    /// Each line is ``<src code points>\t<dst code points>[\t<comment>]``,
    /// code points written as space-separated hex. ``#`` starts a comment line.
    pub fn from_rule_tsv(tsv: &str) -> UPResult<Self> {
        fn parse_code_points(
            field: &str,
            line_no: usize,
        ) -> UPResult<String> {
            field
                .split_whitespace()
                .map(|hex| {
                    u32::from_str_radix(hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| {
                            UnipieceError::Parse(format!(
                                "line {line_no}: invalid code point {hex:?}"
                            ))
                        })
                })
                .collect()
        }

        let mut rules = Vec::new();
        for (idx, line) in tsv.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let src = fields.next().unwrap_or_default();
            let dst = fields.next().ok_or_else(|| {
                UnipieceError::Parse(format!("line {line_no}: expected <src>\\t<dst>"))
            })?;
            rules.push((
                parse_code_points(src, line_no)?,
                parse_code_points(dst, line_no)?,
            ));
        }

        Self::from_rules(rules)
    }

    /// Load a compiled map; empty input is the identity map.
    pub fn from_bytes(buf: &[u8]) -> UPResult<Self> {
        if buf.is_empty() {
            return Ok(Self::identity());
        }

        let mut cursor = buf;
        let magic = read_bytes(&mut cursor, 4)?;
        if magic != CHARS_MAP_MAGIC {
            return Err(UnipieceError::Parse(
                "precompiled_charsmap: bad magic".to_string(),
            ));
        }

        let count = read_u32(&mut cursor)? as usize;
        let mut rules = Vec::with_capacity(count.min(buf.len()));
        for _ in 0..count {
            let src = read_string(&mut cursor)?;
            let dst = read_string(&mut cursor)?;
            rules.push((src, dst));
        }
        if !cursor.is_empty() {
            return Err(UnipieceError::Parse(format!(
                "precompiled_charsmap: {} trailing bytes",
                cursor.len()
            )));
        }

        Self::from_rules(rules)
    }

    /// Serialize to the compiled form; the identity map is empty.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.rules.is_empty() {
            return Vec::new();
        }

        let mut buf = Vec::from(&CHARS_MAP_MAGIC[..]);
        buf.extend_from_slice(&(self.rules.len() as u32).to_le_bytes());
        for (src, dst) in &self.rules {
            for s in [src, dst] {
                buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
        }
        buf
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Is this the identity map?
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite ``text``, reporting each output segment to ``emit``.
    ///
    /// ``emit(source_range, output, verbatim)``; verbatim segments are copied
    /// unchanged from the source.
    pub fn rewrite_with<F>(
        &self,
        text: &str,
        mut emit: F,
    ) where
        F: FnMut(Range<usize>, &str, bool),
    {
        let Some(automaton) = &self.automaton else {
            if !text.is_empty() {
                emit(0..text.len(), text, true);
            }
            return;
        };

        let mut pos = 0;
        for mat in automaton.find_iter(text) {
            if mat.start() > pos {
                emit(pos..mat.start(), &text[pos..mat.start()], true);
            }
            let target = &self.rules[mat.pattern().as_usize()].1;
            emit(mat.start()..mat.end(), target, false);
            pos = mat.end();
        }
        if pos < text.len() {
            emit(pos..text.len(), &text[pos..], true);
        }
    }

    /// Rewrite ``text`` into a new string.
    pub fn apply(
        &self,
        text: &str,
    ) -> String {
        let mut out = String::with_capacity(text.len());
        self.rewrite_with(text, |_, s, _| out.push_str(s));
        out
    }
}

fn read_bytes<'a>(
    cursor: &mut &'a [u8],
    len: usize,
) -> UPResult<&'a [u8]> {
    if cursor.len() < len {
        return Err(UnipieceError::Parse(
            "precompiled_charsmap: truncated".to_string(),
        ));
    }
    let (head, tail) = cursor.split_at(len);
    *cursor = tail;
    Ok(head)
}

fn read_u32(cursor: &mut &[u8]) -> UPResult<u32> {
    let bytes = read_bytes(cursor, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_string(cursor: &mut &[u8]) -> UPResult<String> {
    let len = read_u32(cursor)? as usize;
    let bytes = read_bytes(cursor, len)?;
    String::from_utf8(bytes.to_vec()).map_err(|e| UnipieceError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let map = CharsMap::identity();
        assert!(map.is_empty());
        assert_eq!(map.apply("Hello"), "Hello");
        assert!(map.to_bytes().is_empty());
        assert_eq!(CharsMap::from_bytes(&[]).unwrap(), map);
    }

    #[test]
    fn test_longest_match() {
        let map = CharsMap::from_rules([("a", "x"), ("ab", "Y"), ("\u{ff21}", "A")]).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.apply("abac"), "Yxc");
        assert_eq!(map.apply("\u{ff21}b"), "Ab");
    }

    #[test]
    fn test_rewrite_segments() {
        let map = CharsMap::from_rules([("bb", "")]).unwrap();
        let mut segments = Vec::new();
        map.rewrite_with("abbc", |range, s, verbatim| {
            segments.push((range, s.to_string(), verbatim))
        });
        assert_eq!(
            segments,
            vec![
                (0..1, "a".to_string(), true),
                (1..3, "".to_string(), false),
                (3..4, "c".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_bytes_round_trip() {
        let map = CharsMap::from_rules([("\u{3000}", " "), ("\u{ff41}", "a")]).unwrap();
        let bytes = map.to_bytes();
        assert_eq!(&bytes[..4], b"UPCM");
        let loaded = CharsMap::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, map);
        assert_eq!(loaded.apply("\u{ff41}\u{3000}b"), "a b");

        assert_eq!(
            CharsMap::compile([("\u{ff41}", "a"), ("\u{3000}", " ")]).unwrap(),
            bytes
        );

        assert!(CharsMap::from_bytes(b"NOPE\0\0\0\0").is_err());
        assert!(CharsMap::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_rule_tsv() {
        let tsv = "# full width\nFF21\t41\n3000\t20\tideographic space\n41 42\t\n";
        let map = CharsMap::from_rule_tsv(tsv).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.apply("\u{ff21}\u{3000}ABC"), "A C");

        assert!(CharsMap::from_rule_tsv("ZZZZZZZZ\t41").is_err());
        assert!(CharsMap::from_rule_tsv("41").is_err());
    }

    #[test]
    fn test_conflicting_rules() {
        assert!(CharsMap::from_rules([("a", "b"), ("a", "c")]).is_err());
        assert!(CharsMap::from_rules([("a", "b"), ("a", "b")]).is_ok());
        assert!(CharsMap::from_rules([("", "b")]).is_err());
    }
}
