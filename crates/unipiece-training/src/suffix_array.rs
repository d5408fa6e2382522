//! # Suffix Array
//!
//! SA-IS suffix sorting, Kasai LCP, and the maximal repeats of a text
//! (left-diverse internal nodes of its implicit suffix tree).

const EMPTY: usize = usize::MAX;

/// Suffix array of ``text``, whose symbols are in ``0..alphabet_size``.
///
/// ## Returns
/// ``sa`` with ``text[sa[i]..] < text[sa[i + 1]..]``.
pub fn suffix_array(
    text: &[u32],
    alphabet_size: usize,
) -> Vec<usize> {
    if text.is_empty() {
        return Vec::new();
    }

    // Shift symbols up and append a unique, smallest sentinel.
    let mut t: Vec<u32> = Vec::with_capacity(text.len() + 1);
    t.extend(text.iter().map(|&c| c + 1));
    t.push(0);

    let mut sa = sais(&t, alphabet_size + 1);
    // The sentinel suffix sorts first.
    sa.remove(0);
    sa
}

fn is_lms(
    is_s: &[bool],
    i: usize,
) -> bool {
    i > 0 && is_s[i] && !is_s[i - 1]
}

fn bucket_heads(sizes: &[usize]) -> Vec<usize> {
    let mut sum = 0;
    sizes
        .iter()
        .map(|&s| {
            let head = sum;
            sum += s;
            head
        })
        .collect()
}

fn bucket_tails(sizes: &[usize]) -> Vec<usize> {
    let mut sum = 0;
    sizes
        .iter()
        .map(|&s| {
            sum += s;
            sum
        })
        .collect()
}

/// Place LMS positions, in the given order, at the tails of their buckets.
fn place_lms<I>(
    sa: &mut [usize],
    t: &[u32],
    sizes: &[usize],
    lms: I,
) where
    I: DoubleEndedIterator<Item = usize>,
{
    let mut tails = bucket_tails(sizes);
    for p in lms.rev() {
        let c = t[p] as usize;
        tails[c] -= 1;
        sa[tails[c]] = p;
    }
}

fn induce(
    sa: &mut [usize],
    t: &[u32],
    is_s: &[bool],
    sizes: &[usize],
) {
    let n = t.len();

    let mut heads = bucket_heads(sizes);
    for i in 0..n {
        let j = sa[i];
        if j != EMPTY && j > 0 && !is_s[j - 1] {
            let c = t[j - 1] as usize;
            sa[heads[c]] = j - 1;
            heads[c] += 1;
        }
    }

    let mut tails = bucket_tails(sizes);
    for i in (0..n).rev() {
        let j = sa[i];
        if j != EMPTY && j > 0 && is_s[j - 1] {
            let c = t[j - 1] as usize;
            tails[c] -= 1;
            sa[tails[c]] = j - 1;
        }
    }
}

fn lms_substrings_equal(
    t: &[u32],
    is_s: &[bool],
    a: usize,
    b: usize,
) -> bool {
    let last = t.len() - 1;
    if a == last || b == last {
        return false;
    }
    let mut d = 0;
    loop {
        let (x, y) = (a + d, b + d);
        if t[x] != t[y] || is_s[x] != is_s[y] {
            return false;
        }
        if d > 0 {
            let (lx, ly) = (is_lms(is_s, x), is_lms(is_s, y));
            if lx || ly {
                return lx && ly;
            }
        }
        d += 1;
    }
}

/// SA-IS over ``t``, which ends with a unique smallest symbol 0.
fn sais(
    t: &[u32],
    k: usize,
) -> Vec<usize> {
    let n = t.len();
    let mut sa = vec![EMPTY; n];
    if n == 1 {
        sa[0] = 0;
        return sa;
    }

    let mut is_s = vec![false; n];
    is_s[n - 1] = true;
    for i in (0..n - 1).rev() {
        is_s[i] = t[i] < t[i + 1] || (t[i] == t[i + 1] && is_s[i + 1]);
    }

    let mut sizes = vec![0usize; k];
    for &c in t {
        sizes[c as usize] += 1;
    }

    // Sort LMS substrings.
    let lms: Vec<usize> = (1..n).filter(|&i| is_lms(&is_s, i)).collect();
    place_lms(&mut sa, t, &sizes, lms.iter().copied());
    induce(&mut sa, t, &is_s, &sizes);

    // Name them.
    let sorted_lms: Vec<usize> = sa.iter().copied().filter(|&p| is_lms(&is_s, p)).collect();
    let mut names = vec![EMPTY; n];
    let mut name = 0usize;
    names[sorted_lms[0]] = 0;
    for w in sorted_lms.windows(2) {
        if !lms_substrings_equal(t, &is_s, w[0], w[1]) {
            name += 1;
        }
        names[w[1]] = name;
    }
    let name_count = name + 1;
    let reduced: Vec<u32> = lms.iter().map(|&p| names[p] as u32).collect();

    // Sort LMS suffixes.
    let reduced_sa = if name_count < reduced.len() {
        sais(&reduced, name_count)
    } else {
        let mut rsa = vec![0; reduced.len()];
        for (i, &c) in reduced.iter().enumerate() {
            rsa[c as usize] = i;
        }
        rsa
    };

    sa.fill(EMPTY);
    place_lms(&mut sa, t, &sizes, reduced_sa.iter().map(|&r| lms[r]));
    induce(&mut sa, t, &is_s, &sizes);
    sa
}

/// Kasai's LCP array.
///
/// ## Returns
/// ``lcp[i]`` is the common prefix length of suffixes ``sa[i - 1]`` and
/// ``sa[i]``; ``lcp[0] == 0``.
pub fn lcp_array(
    text: &[u32],
    sa: &[usize],
) -> Vec<usize> {
    let n = text.len();
    let mut rank = vec![0usize; n];
    for (i, &p) in sa.iter().enumerate() {
        rank[p] = i;
    }

    let mut lcp = vec![0usize; n];
    let mut h = 0usize;
    for p in 0..n {
        if rank[p] == 0 {
            h = 0;
            continue;
        }
        let q = sa[rank[p] - 1];
        while p + h < n && q + h < n && text[p + h] == text[q + h] {
            h += 1;
        }
        lcp[rank[p]] = h;
        h = h.saturating_sub(1);
    }
    lcp
}

/// An internal suffix-tree node: the suffixes ``sa[left..right]`` share
/// their first ``depth`` symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatNode {
    /// First suffix-array slot.
    pub left: usize,

    /// One past the last suffix-array slot.
    pub right: usize,

    /// Shared prefix length.
    pub depth: usize,
}

impl RepeatNode {
    /// The number of occurrences.
    pub fn freq(&self) -> usize {
        self.right - self.left
    }
}

/// Enumerate the maximal repeats of ``text``.
///
/// Walks LCP intervals bottom-up with a stack and keeps the left-diverse
/// ones: occurrences not all preceded by the same symbol.
pub fn maximal_repeats(
    text: &[u32],
    sa: &[usize],
    lcp: &[usize],
) -> Vec<RepeatNode> {
    let n = sa.len();
    if n == 0 {
        return Vec::new();
    }

    let bwt: Vec<Option<u32>> = sa
        .iter()
        .map(|&p| if p == 0 { None } else { Some(text[p - 1]) })
        .collect();
    // changes[i]: BWT run boundaries strictly before slot i.
    let mut changes = vec![0usize; n + 1];
    for i in 0..n {
        let boundary = i > 0 && bwt[i] != bwt[i - 1];
        changes[i + 1] = changes[i] + usize::from(boundary);
    }

    let mut nodes = Vec::new();
    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
    for i in 1..=n {
        let cur = if i < n { lcp[i] } else { 0 };
        let mut left = i - 1;
        while let Some(&(top_left, top_depth)) = stack.last() {
            if cur >= top_depth {
                break;
            }
            stack.pop();
            if changes[i] > changes[top_left + 1] {
                nodes.push(RepeatNode {
                    left: top_left,
                    right: i,
                    depth: top_depth,
                });
            }
            left = top_left;
        }
        if stack.last().is_none_or(|&(_, depth)| cur > depth) {
            stack.push((left, cur));
        }
    }
    nodes
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn naive_suffix_array(text: &[u32]) -> Vec<usize> {
        let mut sa: Vec<usize> = (0..text.len()).collect();
        sa.sort_by(|&a, &b| text[a..].cmp(&text[b..]));
        sa
    }

    fn symbols(s: &str) -> Vec<u32> {
        s.bytes().map(|b| (b - b'a') as u32).collect()
    }

    #[test]
    fn test_banana() {
        let text = symbols("banana");
        let sa = suffix_array(&text, 26);
        assert_eq!(sa, vec![5, 3, 1, 0, 4, 2]);
        assert_eq!(lcp_array(&text, &sa), vec![0, 1, 3, 0, 0, 2]);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(suffix_array(&[], 1).is_empty());
        assert_eq!(suffix_array(&[0], 1), vec![0]);
        assert_eq!(suffix_array(&[0, 0, 0, 0], 1), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_maximal_repeats() {
        let text = symbols("abab");
        let sa = suffix_array(&text, 26);
        let lcp = lcp_array(&text, &sa);
        let repeats: Vec<(Vec<u32>, usize)> = maximal_repeats(&text, &sa, &lcp)
            .iter()
            .map(|n| (text[sa[n.left]..sa[n.left] + n.depth].to_vec(), n.freq()))
            .collect();
        // "b" is always preceded by "a", so only "ab" is maximal.
        assert_eq!(repeats, vec![(symbols("ab"), 2)]);
    }

    proptest! {
        #[test]
        fn prop_matches_naive(text in prop::collection::vec(0u32..4, 0..200)) {
            let sa = suffix_array(&text, 4);
            prop_assert_eq!(&sa, &naive_suffix_array(&text));

            let lcp = lcp_array(&text, &sa);
            for i in 1..sa.len() {
                let (a, b) = (&text[sa[i - 1]..], &text[sa[i]..]);
                let common = a.iter().zip(b).take_while(|(x, y)| x == y).count();
                prop_assert_eq!(lcp[i], common);
            }

            for node in maximal_repeats(&text, &sa, &lcp) {
                prop_assert!(node.freq() >= 2);
                let first = &text[sa[node.left]..sa[node.left] + node.depth];
                for slot in node.left..node.right {
                    prop_assert_eq!(&text[sa[slot]..sa[slot] + node.depth], first);
                }
            }
        }
    }
}
