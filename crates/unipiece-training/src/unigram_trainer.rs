//! # Unigram EM Trainer
//!
//! Fits piece log-probabilities with EM over segmentation lattices, then
//! prunes the pieces whose removal costs the least likelihood, until the
//! vocabulary reaches its target size.
//!
//! Each phase reads one [`PieceTable`] generation and builds the next;
//! the E-step and the pruning Viterbi pass run on a dedicated ``rayon`` pool.

use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use unipiece::errors::{UPResult, UnipieceError};

use crate::{
    alphabet::Alphabet,
    config::TrainerConfig,
    piece_table::PieceTable,
    trainer_options::TrainerOptions,
    training_types::{ScoredPiece, Sentence, sort_by_score},
};

/// Diagnostics for one EM sub-iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainProgress {
    /// The pruning round.
    pub round: usize,

    /// The sub-iteration within the round.
    pub iter: usize,

    /// The number of pieces.
    pub size: usize,

    /// Negative log-likelihood per unit of sentence frequency.
    pub objective: f64,

    /// Tokens in the Viterbi segmentations of the corpus.
    pub num_tokens: u64,
}

impl TrainProgress {
    /// Tokens per piece.
    pub fn tokens_per_piece(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.num_tokens as f64 / self.size as f64
        }
    }
}

/// The output of [`UnigramTrainer::train`].
#[derive(Debug, Clone)]
pub struct UnigramTrainResult {
    /// Final NORMAL pieces, by descending score.
    pub pieces: Vec<ScoredPiece>,

    /// One record per EM sub-iteration.
    pub progress: Vec<TrainProgress>,
}

struct Expectation {
    counts: Vec<f64>,
    objective: f64,
    num_tokens: u64,
}

/// What removing a piece would fall back to.
enum Fallback {
    /// A required character; never removed.
    Required,
    /// The piece is not its own best segmentation.
    Redundant,
    /// No other segmentation exists.
    Irreplaceable,
    /// The second-best segmentation of the piece.
    Split(Vec<usize>),
}

/// Trains UNIGRAM piece scores.
pub struct UnigramTrainer {
    target_size: usize,
    num_sub_iterations: usize,
    shrinking_factor: f64,
    max_rounds: usize,
    objective_tolerance: f64,
    num_threads: usize,
    pool: ThreadPool,
}

impl UnigramTrainer {
    /// Create a trainer.
    ///
    /// ## Arguments
    /// * `config` - The validated trainer configuration.
    /// * `options` - Runtime options.
    pub fn new(
        config: &TrainerConfig,
        options: &TrainerOptions,
    ) -> UPResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(|i| format!("unipiece-em-{i}"))
            .build()
            .map_err(|err| UnipieceError::config(format!("cannot start training threads: {err}")))?;
        Ok(Self {
            target_size: config.normal_target(),
            num_sub_iterations: config.num_sub_iterations,
            shrinking_factor: config.shrinking_factor,
            max_rounds: options.max_rounds.max(1),
            objective_tolerance: options.objective_tolerance,
            num_threads: config.num_threads,
            pool,
        })
    }

    /// The NORMAL piece target.
    pub fn with_target_size(
        self,
        target_size: usize,
    ) -> Self {
        Self {
            target_size,
            ..self
        }
    }

    /// Run EM and pruning.
    ///
    /// ## Arguments
    /// * `seeds` - Seed pieces with initial log-probabilities.
    /// * `alphabet` - Required characters; exempt from pruning.
    /// * `sentences` - The training sentences.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn train(
        &self,
        seeds: Vec<ScoredPiece>,
        alphabet: &Alphabet,
        sentences: &[Sentence],
    ) -> UnigramTrainResult {
        let is_required = |piece: &str| {
            let mut chars = piece.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if alphabet.contains(c))
        };
        let mut table = Arc::new(PieceTable::new(seeds, is_required));
        let mut progress = Vec::new();

        log::info!(
            "unigram training: {} seed pieces, target {}, {} sentences",
            table.len(),
            self.target_size,
            sentences.len()
        );

        for round in 0..self.max_rounds {
            let mut stable = table.clone();
            let mut previous: Option<f64> = None;

            for iter in 0..self.num_sub_iterations {
                let expectation = self.expectation(&table, sentences);
                let record = TrainProgress {
                    round,
                    iter,
                    size: table.len(),
                    objective: expectation.objective,
                    num_tokens: expectation.num_tokens,
                };
                progress.push(record);
                log::info!(
                    "EM round={} iter={} size={} objective={:.6} num_tokens={} num_tokens/piece={:.4}",
                    record.round,
                    record.iter,
                    record.size,
                    record.objective,
                    record.num_tokens,
                    record.tokens_per_piece()
                );

                if let Some(prev) = previous
                    && expectation.objective > prev + prev.abs() * self.objective_tolerance
                {
                    log::warn!(
                        "EM objective rose from {prev:.9} to {:.9} in round {round}; keeping the previous table",
                        expectation.objective
                    );
                    table = stable;
                    break;
                }

                previous = Some(expectation.objective);
                stable = table.clone();
                table = Arc::new(self.maximization(&table, &expectation.counts));
            }

            if table.len() <= self.target_size {
                break;
            }

            let pruned = self.prune(&table, sentences);
            log::debug!("round {round}: pruned {} -> {} pieces", table.len(), pruned.len());
            if pruned.len() == table.len() {
                log::warn!("pruning removed nothing at size {}; stopping", table.len());
                break;
            }
            table = Arc::new(pruned);

            if round + 1 == self.max_rounds {
                log::warn!(
                    "stopping after {} rounds with {} pieces (target {})",
                    self.max_rounds,
                    table.len(),
                    self.target_size
                );
            }
        }

        UnigramTrainResult {
            pieces: self.finalize(&table),
            progress,
        }
    }

    /// E-step: expected piece counts, objective and Viterbi token count.
    fn expectation(
        &self,
        table: &PieceTable,
        sentences: &[Sentence],
    ) -> Expectation {
        let size = table.len();
        let chunk_size = sentences.len().div_ceil(self.num_threads).max(1);

        let (counts, log_likelihood, num_tokens) = self.pool.install(|| {
            sentences
                .par_chunks(chunk_size)
                .map(|chunk| {
                    let mut counts = vec![0.0f64; size];
                    let mut log_likelihood = 0.0f64;
                    let mut num_tokens = 0u64;
                    for sentence in chunk {
                        let lattice = table.lattice(&sentence.text);
                        let freq = sentence.freq as f64;
                        log_likelihood += freq * lattice.populate_marginal(freq, &mut counts);
                        num_tokens += lattice.viterbi().0.len() as u64;
                    }
                    (counts, log_likelihood, num_tokens)
                })
                .reduce(
                    || (vec![0.0f64; size], 0.0, 0),
                    |(mut a, la, ta), (b, lb, tb)| {
                        for (x, y) in a.iter_mut().zip(&b) {
                            *x += y;
                        }
                        (a, la + lb, ta + tb)
                    },
                )
        });

        let total_freq: f64 = sentences.iter().map(|s| s.freq as f64).sum();
        let objective = if total_freq > 0.0 {
            -log_likelihood / total_freq
        } else {
            0.0
        };
        Expectation {
            counts,
            objective,
            num_tokens,
        }
    }

    /// M-step: maximum-likelihood log-probabilities.
    fn maximization(
        &self,
        table: &PieceTable,
        counts: &[f64],
    ) -> PieceTable {
        let sum: f64 = counts.iter().sum();
        let log_sum = if sum > 0.0 { sum.ln() } else { 0.0 };
        let scores: Vec<f32> = counts
            .iter()
            .map(|&c| (c.max(f64::MIN_POSITIVE).ln() - log_sum) as f32)
            .collect();
        table.rescored(&scores)
    }

    fn fallbacks(
        &self,
        table: &PieceTable,
    ) -> Vec<Fallback> {
        self.pool.install(|| {
            (0..table.len())
                .into_par_iter()
                .map(|id| {
                    if table.is_required(id) {
                        return Fallback::Required;
                    }
                    let lattice = table.lattice(&table.pieces()[id].text);
                    let nbest = lattice.nbest(2);
                    let ids = |path: &[usize]| -> Vec<usize> {
                        path.iter().map(|&i| lattice.nodes()[i].id as usize).collect()
                    };
                    match nbest.as_slice() {
                        [(best, _), rest @ ..] if ids(best) == [id] => match rest.first() {
                            Some((second, _)) => {
                                let alternative = ids(second);
                                if alternative.iter().any(|&a| a >= table.len()) {
                                    Fallback::Irreplaceable
                                } else {
                                    Fallback::Split(alternative)
                                }
                            }
                            None => Fallback::Irreplaceable,
                        },
                        _ => Fallback::Redundant,
                    }
                })
                .collect()
        })
    }

    /// Viterbi token frequencies and per-piece sentence frequencies.
    fn viterbi_frequencies(
        &self,
        table: &PieceTable,
        sentences: &[Sentence],
    ) -> (Vec<f64>, Vec<f64>) {
        let size = table.len();
        let chunk_size = sentences.len().div_ceil(self.num_threads).max(1);
        self.pool.install(|| {
            sentences
                .par_chunks(chunk_size)
                .map(|chunk| {
                    let mut freq = vec![0.0f64; size];
                    let mut sentence_freq = vec![0.0f64; size];
                    let mut seen: Vec<usize> = Vec::new();
                    for sentence in chunk {
                        let lattice = table.lattice(&sentence.text);
                        let f = sentence.freq as f64;
                        seen.clear();
                        for idx in lattice.viterbi().0 {
                            let id = lattice.nodes()[idx].id as usize;
                            if id < size {
                                freq[id] += f;
                                seen.push(id);
                            }
                        }
                        seen.sort_unstable();
                        seen.dedup();
                        for &id in &seen {
                            sentence_freq[id] += f;
                        }
                    }
                    (freq, sentence_freq)
                })
                .reduce(
                    || (vec![0.0f64; size], vec![0.0f64; size]),
                    |(mut fa, mut sa), (fb, sb)| {
                        for (x, y) in fa.iter_mut().zip(&fb) {
                            *x += y;
                        }
                        for (x, y) in sa.iter_mut().zip(&sb) {
                            *x += y;
                        }
                        (fa, sa)
                    },
                )
        })
    }

    /// Drop the pieces whose removal loses the least likelihood.
    fn prune(
        &self,
        table: &PieceTable,
        sentences: &[Sentence],
    ) -> PieceTable {
        let fallbacks = self.fallbacks(table);
        let (freq, sentence_freq) = self.viterbi_frequencies(table, sentences);

        let sum: f64 = freq.iter().sum();
        let log_sum = sum.ln();
        let total_sentence_freq: f64 = sentences.iter().map(|s| s.freq as f64).sum::<f64>().max(1.0);

        let mut keep = vec![false; table.len()];
        let mut candidates: Vec<(usize, f64)> = Vec::new();
        for (id, fallback) in fallbacks.iter().enumerate() {
            match fallback {
                Fallback::Required | Fallback::Irreplaceable => keep[id] = true,
                _ if freq[id] == 0.0 => candidates.push((id, f64::NEG_INFINITY)),
                Fallback::Redundant => candidates.push((id, f64::NEG_INFINITY)),
                Fallback::Split(alternatives) => {
                    let f = freq[id];
                    let logprob_piece = f.ln() - log_sum;
                    let log_sum_alt = (sum + f * (alternatives.len() as f64 - 1.0)).ln();
                    let logprob_alt: f64 = alternatives
                        .iter()
                        .map(|&a| (freq[a] + f).ln() - log_sum_alt)
                        .sum();
                    let share = sentence_freq[id] / total_sentence_freq;
                    candidates.push((id, share * (logprob_piece - logprob_alt)));
                }
            }
        }

        let kept = keep.iter().filter(|&&k| k).count();
        let shrunk = (table.len() as f64 * self.shrinking_factor).floor() as usize;
        let room = self.target_size.max(shrunk).saturating_sub(kept);

        let pieces = table.pieces();
        candidates.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| pieces[a.0].text.cmp(&pieces[b.0].text))
        });
        for &(id, _) in candidates.iter().take(room) {
            keep[id] = true;
        }

        table.retain(&keep)
    }

    /// Keep every required piece, fill to the target by score, and sort.
    fn finalize(
        &self,
        table: &PieceTable,
    ) -> Vec<ScoredPiece> {
        let mut required = Vec::new();
        let mut others = Vec::new();
        for (id, piece) in table.pieces().iter().enumerate() {
            if table.is_required(id) {
                required.push(piece.clone());
            } else {
                others.push(piece.clone());
            }
        }
        sort_by_score(&mut others);
        others.truncate(self.target_size.saturating_sub(required.len()));

        let mut pieces = required;
        pieces.extend(others);
        sort_by_score(&mut pieces);
        pieces
    }
}
