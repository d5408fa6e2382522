//! # Corpus Sampler
//!
//! Parses raw corpus lines into sentences and keeps a bounded,
//! deterministic sample of them.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::index::sample as sample_indices};
use strum::{Display, EnumString};
use unipiece::errors::{UPResult, UnipieceError};

/// How corpus lines are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum InputFormat {
    /// One sentence per line.
    #[default]
    Text,

    /// ``sentence\tfrequency``.
    Tsv,

    /// ``source\ttarget``; each side is a sentence.
    Bilingual,
}

/// A raw (not yet normalized) sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSentence {
    /// The sentence bytes.
    pub bytes: Vec<u8>,

    /// The sentence frequency.
    pub freq: u64,
}

/// Sampling counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerStats {
    /// Sentences parsed from the input.
    pub seen: usize,

    /// Sentences longer than ``max_sentence_length``.
    pub too_long: usize,

    /// Empty sentences.
    pub empty: usize,

    /// Sentences in the final sample.
    pub kept: usize,
}

/// Streams corpus lines into a bounded sample.
#[derive(Debug)]
pub struct CorpusSampler {
    format: InputFormat,
    max_sentence_length: usize,
    limit: usize,
    shuffle: bool,
    rng: StdRng,
    sample: Vec<RawSentence>,
    eligible: usize,
    stats: SamplerStats,
}

impl CorpusSampler {
    /// Create a sampler.
    ///
    /// ## Arguments
    /// * `format` - The line layout.
    /// * `max_sentence_length` - Longest accepted sentence, in bytes.
    /// * `limit` - Sample cap; 0 keeps every sentence.
    /// * `shuffle` - Reservoir-sample when capped, instead of keeping the head.
    /// * `seed` - The RNG seed.
    pub fn new(
        format: InputFormat,
        max_sentence_length: usize,
        limit: usize,
        shuffle: bool,
        seed: u64,
    ) -> Self {
        Self {
            format,
            max_sentence_length,
            limit,
            shuffle,
            rng: StdRng::seed_from_u64(seed),
            sample: Vec::new(),
            eligible: 0,
            stats: SamplerStats::default(),
        }
    }

    /// The counters so far.
    pub fn stats(&self) -> SamplerStats {
        SamplerStats {
            kept: self.sample.len(),
            ..self.stats
        }
    }

    /// Parse one corpus line and offer its sentences to the sample.
    pub fn push_line(
        &mut self,
        line: &[u8],
    ) -> UPResult<()> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        match self.format {
            InputFormat::Text => self.offer(line, 1),
            InputFormat::Tsv => {
                let Some(tab) = line.iter().rposition(|&b| b == b'\t') else {
                    return Err(UnipieceError::Parse(format!(
                        "tsv line has no frequency column: {:?}",
                        String::from_utf8_lossy(line)
                    )));
                };
                let freq = core::str::from_utf8(&line[tab + 1..])
                    .ok()
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .ok_or_else(|| {
                        UnipieceError::Parse(format!(
                            "bad tsv frequency: {:?}",
                            String::from_utf8_lossy(&line[tab + 1..])
                        ))
                    })?;
                self.offer(&line[..tab], freq);
            }
            InputFormat::Bilingual => {
                for side in line.splitn(2, |&b| b == b'\t') {
                    self.offer(side, 1);
                }
            }
        }
        Ok(())
    }

    fn offer(
        &mut self,
        bytes: &[u8],
        freq: u64,
    ) {
        self.stats.seen += 1;
        if bytes.is_empty() || freq == 0 {
            self.stats.empty += 1;
            return;
        }
        if bytes.len() > self.max_sentence_length {
            self.stats.too_long += 1;
            return;
        }

        let sentence = RawSentence {
            bytes: bytes.to_vec(),
            freq,
        };
        self.eligible += 1;

        if self.limit == 0 || self.sample.len() < self.limit {
            self.sample.push(sentence);
        } else if self.shuffle {
            // Reservoir: the n-th eligible sentence replaces a slot with p = limit / n.
            let slot = self.rng.random_range(0..self.eligible);
            if slot < self.limit {
                self.sample[slot] = sentence;
            }
        }
    }

    /// Finish sampling.
    pub fn finish(self) -> (Vec<RawSentence>, SamplerStats) {
        let stats = self.stats();
        (self.sample, stats)
    }
}

/// Draw a bounded subset of items, keeping their original order.
///
/// ## Arguments
/// * `items` - The items to draw from.
/// * `limit` - Subset size; 0 (or anything >= ``items.len()``) keeps all.
/// * `rng` - The random source.
pub fn bounded_subset<T: Clone, R: Rng + ?Sized>(
    items: &[T],
    limit: usize,
    rng: &mut R,
) -> Vec<T> {
    if limit == 0 || limit >= items.len() {
        return items.to_vec();
    }
    let mut picked = sample_indices(rng, items.len(), limit).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| items[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler(
        format: InputFormat,
        limit: usize,
        shuffle: bool,
    ) -> CorpusSampler {
        CorpusSampler::new(format, 16, limit, shuffle, 7)
    }

    #[test]
    fn test_input_format_names() {
        assert_eq!("tsv".parse::<InputFormat>().unwrap(), InputFormat::Tsv);
        assert_eq!("TEXT".parse::<InputFormat>().unwrap(), InputFormat::Text);
        assert_eq!(InputFormat::Bilingual.to_string(), "bilingual");
        assert!("csv".parse::<InputFormat>().is_err());
    }

    #[test]
    fn test_text_lines() {
        let mut s = sampler(InputFormat::Text, 0, false);
        for line in [&b"hello\r"[..], b"", b"a much too long sentence here", b"world"] {
            s.push_line(line).unwrap();
        }
        let (sample, stats) = s.finish();
        assert_eq!(
            sample.iter().map(|r| r.bytes.as_slice()).collect::<Vec<_>>(),
            vec![&b"hello"[..], b"world"]
        );
        assert_eq!(
            stats,
            SamplerStats {
                seen: 4,
                too_long: 1,
                empty: 1,
                kept: 2,
            }
        );
    }

    #[test]
    fn test_tsv_and_bilingual() {
        let mut s = sampler(InputFormat::Tsv, 0, false);
        s.push_line(b"a\tb\t12").unwrap();
        assert!(s.push_line(b"no tab").is_err());
        assert!(s.push_line(b"x\tmany").is_err());
        let (sample, _) = s.finish();
        assert_eq!(sample[0].bytes, b"a\tb");
        assert_eq!(sample[0].freq, 12);

        let mut s = sampler(InputFormat::Bilingual, 0, false);
        s.push_line(b"dog\tchien").unwrap();
        let (sample, stats) = s.finish();
        assert_eq!(sample.len(), 2);
        assert_eq!(sample[1].bytes, b"chien");
        assert_eq!(stats.seen, 2);
    }

    #[test]
    fn test_head_and_reservoir() {
        let lines: Vec<String> = (0..100).map(|i| format!("s{i}")).collect();

        let mut head = sampler(InputFormat::Text, 10, false);
        let mut reservoir = sampler(InputFormat::Text, 10, true);
        let mut again = sampler(InputFormat::Text, 10, true);
        for line in &lines {
            head.push_line(line.as_bytes()).unwrap();
            reservoir.push_line(line.as_bytes()).unwrap();
            again.push_line(line.as_bytes()).unwrap();
        }

        let (head, stats) = head.finish();
        assert_eq!(stats.kept, 10);
        assert_eq!(head[9].bytes, b"s9");

        let (reservoir, _) = reservoir.finish();
        let (again, _) = again.finish();
        assert_eq!(reservoir.len(), 10);
        assert_eq!(reservoir, again);
        assert_ne!(reservoir, head);
    }

    #[test]
    fn test_bounded_subset() {
        let items: Vec<u32> = (0..50).collect();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(bounded_subset(&items, 0, &mut rng), items);
        assert_eq!(bounded_subset(&items, 80, &mut rng), items);

        let subset = bounded_subset(&items, 5, &mut rng);
        assert_eq!(subset.len(), 5);
        assert!(subset.windows(2).all(|w| w[0] < w[1]));
    }
}
