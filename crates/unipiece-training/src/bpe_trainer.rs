//! # BPE Trainer
//!
//! Learns merges over the characters of ▁-prefixed words. Pair counts are
//! kept in a max-heap with lazy refresh; each merge rewrites only the words
//! that contain the pair.

use core::{cmp::Ordering, marker::PhantomData};

use compact_str::CompactString;
use dary_heap::OctonaryHeap;
use unipiece::types::{Pair, UPHashMap, UPHashSet};

use crate::{
    alphabet::Alphabet,
    piece_validity::PieceValidator,
    training_types::{CountType, ScoredPiece, Sentence, StringChunkType},
    utility::{PairIndexMap, PairSpanIndex, SymbolSpanBuf, WordCounter},
};

/// The symbol for characters outside the alphabet; never merged.
const UNK_SYMBOL: u32 = u32::MAX;

/// Options for [`BpeTrainer`].
#[derive(Debug, Clone)]
pub struct BpeTrainerOptions {
    /// The number of NORMAL pieces to produce, alphabet included.
    pub target_size: usize,

    /// Rules every merged piece must satisfy.
    pub validator: PieceValidator,
}

impl BpeTrainerOptions {
    /// Create new options.
    ///
    /// ## Arguments
    /// * `target_size` - The NORMAL piece target.
    /// * `validator` - The piece splitting rules.
    pub fn new(
        target_size: usize,
        validator: PieceValidator,
    ) -> Self {
        Self {
            target_size,
            validator,
        }
    }

    /// Sets the target size.
    pub fn with_target_size(
        self,
        target_size: usize,
    ) -> Self {
        Self {
            target_size,
            ..self
        }
    }

    /// Initializes a [`BpeTrainer`] from these options.
    pub fn init<K, C>(self) -> BpeTrainer<K, C>
    where
        K: StringChunkType,
        C: CountType,
    {
        BpeTrainer::new(self)
    }
}

/// Info about a [`Pair`] that could be merged.
#[derive(Debug, Eq)]
pub struct MergeJob<C: CountType> {
    /// The weighted number of instances of this pair in the corpus.
    pub count: C,

    /// The pair to merge.
    pub pair: Pair<u32>,

    /// Word indices that may contain this pair.
    pub word_indices: UPHashSet<usize>,
}

impl<C: CountType> MergeJob<C> {
    /// The job key.
    ///
    /// Max-heap by count; ties go to the larger pair (deterministic).
    pub fn heap_key(&self) -> (C, Pair<u32>) {
        (self.count, self.pair)
    }
}

impl<C: CountType> PartialEq for MergeJob<C> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.heap_key() == other.heap_key()
    }
}

impl<C: CountType> PartialOrd for MergeJob<C> {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: CountType> Ord for MergeJob<C> {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        self.heap_key().cmp(&other.heap_key())
    }
}

/// Trainer for BPE piece vocabularies.
///
/// # Parameters
/// * `K` - the type used to store words in the word counts.
/// * `C` - the type used to store counts.
pub struct BpeTrainer<K = CompactString, C = u64>
where
    K: StringChunkType,
    C: CountType,
{
    /// Trainer options.
    pub options: BpeTrainerOptions,

    /// The word counter.
    pub word_counter: WordCounter<K, C>,

    marker: PhantomData<(K, C)>,
}

impl<K, C> BpeTrainer<K, C>
where
    K: StringChunkType,
    C: CountType,
{
    /// Initializes a [`BpeTrainer`].
    pub fn new(options: BpeTrainerOptions) -> Self {
        Self {
            options,
            word_counter: WordCounter::default(),
            marker: PhantomData,
        }
    }

    /// Update word counts inplace from normalized sentences.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn update_from_sentences(
        &mut self,
        sentences: &[Sentence],
    ) {
        self.word_counter.update_from_sentences(sentences);
    }

    /// Learn merges.
    ///
    /// ## Arguments
    /// * `alphabet` - The initial symbols.
    ///
    /// ## Returns
    /// Merged pieces scored ``-(merge order)``, then the alphabet scored
    /// below every merge; descending score order.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn train(
        self,
        alphabet: &Alphabet,
    ) -> Vec<ScoredPiece> {
        let mut symbols: Vec<String> = Vec::with_capacity(self.options.target_size);
        let mut symbol_ids: UPHashMap<String, u32> = UPHashMap::default();
        for &(c, _) in alphabet.chars() {
            symbol_ids.insert(c.to_string(), symbols.len() as u32);
            symbols.push(c.to_string());
        }
        let char_symbol = |c: char| {
            let mut buf = [0u8; 4];
            symbol_ids
                .get(c.encode_utf8(&mut buf) as &str)
                .copied()
                .unwrap_or(UNK_SYMBOL)
        };

        let (mut words, word_counts): (Vec<SymbolSpanBuf>, Vec<C>) = self
            .word_counter
            .to_ranked_vec()
            .into_iter()
            .map(|(word, count)| (SymbolSpanBuf::from_chars(word.as_ref(), char_symbol), count))
            .unzip();

        let num_merges = self.options.target_size.saturating_sub(symbols.len());
        log::info!(
            "Starting BPE training: {} words, {} merges to compute",
            words.len(),
            num_merges
        );

        let PairSpanIndex {
            mut pair_counts,
            pair_index,
        } = PairSpanIndex::from_span_count_table(&words, &word_counts, |(a, b)| {
            a != UNK_SYMBOL && b != UNK_SYMBOL
        });

        let zero = C::zero();

        log::info!("Building heap with {} unique pairs", pair_counts.len());
        let mut heap = OctonaryHeap::with_capacity(pair_counts.len());
        for (pair, word_indices) in pair_index {
            let count = *pair_counts.get(&pair).unwrap_or(&zero);
            if count > zero {
                heap.push(MergeJob {
                    pair,
                    count,
                    word_indices,
                });
            }
        }

        let mut merged: Vec<String> = Vec::with_capacity(num_merges);
        let mut last_log_percent = 0;

        while merged.len() < num_merges {
            let Some(mut job) = heap.pop() else {
                break;
            };

            {
                // Lazy refresh the job count.
                let current = *pair_counts.get(&job.pair).unwrap_or(&zero);
                if job.count != current {
                    job.count = current;
                    if job.count > zero {
                        heap.push(job);
                    }
                    continue;
                }
            }

            if job.count == zero {
                break;
            }

            let (a, b) = job.pair;
            let text = format!("{}{}", symbols[a as usize], symbols[b as usize]);
            if !self.options.validator.is_valid_str(&text) {
                continue;
            }

            // Distinct pairs can spell the same piece; they share one symbol.
            let new_symbol = match symbol_ids.get(&text) {
                Some(&id) => id,
                None => {
                    let id = symbols.len() as u32;
                    symbol_ids.insert(text.clone(), id);
                    symbols.push(text.clone());
                    merged.push(text);
                    id
                }
            };

            let mut new_pair_map: PairIndexMap = PairIndexMap::default();
            for &word_idx in &job.word_indices {
                let count = word_counts[word_idx];
                words[word_idx].merge_pair_cb(job.pair, new_symbol, &mut |pair, delta| {
                    // Pairs touching an unknown character are never counted.
                    if pair.0 == UNK_SYMBOL || pair.1 == UNK_SYMBOL {
                        return;
                    }
                    if delta < 0 {
                        *pair_counts.entry(pair).or_default() -= count;
                    }
                    if delta > 0 {
                        *pair_counts.entry(pair).or_default() += count;
                        new_pair_map.entry(pair).or_default().insert(word_idx);
                    }
                });
            }

            for (pair, word_indices) in new_pair_map {
                let count = *pair_counts.get(&pair).unwrap_or(&zero);
                if count > zero {
                    heap.push(MergeJob {
                        pair,
                        count,
                        word_indices,
                    });
                }
            }

            let current_percent = (merged.len() * 100) / num_merges.max(1);
            if current_percent > last_log_percent {
                log::info!(
                    "Progress: {}% ({}/{} merges) - Last merge: {:?} -> {:?} (frequency: {})",
                    current_percent,
                    merged.len(),
                    num_merges,
                    job.pair,
                    symbols[new_symbol as usize],
                    job.count
                );
                last_log_percent = current_percent;
            }
        }

        log::info!("Finished training: {} merges completed", merged.len());

        let num_merged = merged.len();
        let mut pieces: Vec<ScoredPiece> = merged
            .into_iter()
            .enumerate()
            .map(|(order, text)| ScoredPiece::new(text, -(order as f32)))
            .collect();
        pieces.extend(
            alphabet
                .chars()
                .iter()
                .enumerate()
                .map(|(rank, &(c, _))| ScoredPiece::new(c, -((num_merged + rank) as f32))),
        );
        pieces
    }
}
