//! # Prefix Matcher
//!
//! An index-addressed byte trie answering "which pieces are prefixes of
//! this text?"; the lattice builder's only vocabulary query.

/// Node index into [`PrefixMatcher::nodes`].
type NodeIdx = u32;

const ROOT: NodeIdx = 0;

#[derive(Debug, Default, Clone)]
struct TrieNode {
    /// Sorted by byte.
    edges: Vec<(u8, NodeIdx)>,
    value: Option<u32>,
}

impl TrieNode {
    fn child(
        &self,
        byte: u8,
    ) -> Option<NodeIdx> {
        self.edges
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()
            .map(|i| self.edges[i].1)
    }
}

/// A byte trie mapping piece strings to ids.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    nodes: Vec<TrieNode>,
    len: usize,
}

impl Default for PrefixMatcher {
    fn default() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            len: 0,
        }
    }
}

impl<S: AsRef<str>> FromIterator<(S, u32)> for PrefixMatcher {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut matcher = Self::default();
        for (key, id) in iter {
            matcher.insert(key.as_ref(), id);
        }
        matcher
    }
}

impl PrefixMatcher {
    /// Insert a piece; an existing entry for the same key is replaced.
    ///
    /// Empty keys are ignored.
    pub fn insert(
        &mut self,
        key: &str,
        id: u32,
    ) {
        if key.is_empty() {
            return;
        }

        let mut node = ROOT;
        for &byte in key.as_bytes() {
            node = match self.nodes[node as usize].child(byte) {
                Some(next) => next,
                None => {
                    let next = self.nodes.len() as NodeIdx;
                    self.nodes.push(TrieNode::default());
                    let edges = &mut self.nodes[node as usize].edges;
                    let at = edges.partition_point(|&(b, _)| b < byte);
                    edges.insert(at, (byte, next));
                    next
                }
            };
        }

        if self.nodes[node as usize].value.replace(id).is_none() {
            self.len += 1;
        }
    }

    /// Number of stored pieces.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the matcher empty?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exact lookup.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<u32> {
        let mut node = ROOT;
        for &byte in key.as_bytes() {
            node = self.nodes[node as usize].child(byte)?;
        }
        self.nodes[node as usize].value
    }

    /// Iterate the stored pieces which are prefixes of ``text``.
    ///
    /// ## Returns
    /// ``(byte_len, id)`` pairs in increasing length.
    pub fn common_prefix_search<'a>(
        &'a self,
        text: &'a str,
    ) -> PrefixMatches<'a> {
        PrefixMatches {
            matcher: self,
            text: text.as_bytes(),
            node: Some(ROOT),
            pos: 0,
        }
    }
}

/// Iterator returned by [`PrefixMatcher::common_prefix_search`].
#[derive(Debug)]
pub struct PrefixMatches<'a> {
    matcher: &'a PrefixMatcher,
    text: &'a [u8],
    node: Option<NodeIdx>,
    pos: usize,
}

impl Iterator for PrefixMatches<'_> {
    type Item = (usize, u32);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.node {
            if self.pos >= self.text.len() {
                self.node = None;
                return None;
            }
            let next = self.matcher.nodes[node as usize].child(self.text[self.pos]);
            self.node = next;
            self.pos += 1;
            if let Some(next) = next
                && let Some(id) = self.matcher.nodes[next as usize].value
            {
                return Some((self.pos, id));
            }
        }
        None
    }
}
