//! Three-stage scoring pipeline for large local batches.
//!
//! Candidates flow decode -> average -> distance over rendezvous channels, so
//! at most one decoded buffer per decode worker is alive at any time. Each
//! stage has its own worker budget.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::thread;

use crossbeam_channel::{bounded, unbounded};
use image::RgbaImage;

use super::{PipelineError, ScoredCandidate, Scorer, collect, run_fetch};
use crate::color::{Color, average_color};
use crate::platform::thread::spawn_named_scoped;
use crate::source::{Candidate, CandidateRef, FetchError};

/// Number of workers per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerBudget {
    pub decode: usize,
    pub average: usize,
    pub distance: usize,
}

impl WorkerBudget {
    /// Splits `parallelism` across the stages.
    ///
    /// A quarter goes to averaging, one worker to distances and the rest to
    /// decoding. Every stage gets at least one worker.
    #[must_use]
    pub fn for_parallelism(parallelism: usize) -> Self {
        let average = (parallelism / 4).max(1);
        let distance = 1;
        let decode = parallelism.saturating_sub(average + distance).max(1);
        Self { decode, average, distance }
    }

    /// Budget derived from the parallelism available to this process.
    #[must_use]
    pub fn detect() -> Self {
        Self::for_parallelism(thread::available_parallelism().map_or(1, NonZeroUsize::get))
    }

    /// Replaces stage sizes with the given overrides. Zero is ignored.
    #[must_use]
    pub fn with_overrides(
        self,
        decode: Option<usize>,
        average: Option<usize>,
        distance: Option<usize>,
    ) -> Self {
        let pick = |value: Option<usize>, fallback: usize| value.filter(|&n| n > 0).unwrap_or(fallback);
        Self {
            decode: pick(decode, self.decode),
            average: pick(average, self.average),
            distance: pick(distance, self.distance),
        }
    }
}

impl Default for WorkerBudget {
    fn default() -> Self { Self::detect() }
}

type Decoded = (usize, CandidateRef, Result<RgbaImage, FetchError>);
type Averaged = (usize, CandidateRef, Option<Color>);

/// Staged scorer with an optional shared progress counter.
#[derive(Debug, Clone, Default)]
pub struct StagedPipeline {
    budget: WorkerBudget,
    progress: Option<Arc<AtomicUsize>>,
}

impl StagedPipeline {
    #[must_use]
    pub const fn new(budget: WorkerBudget) -> Self { Self { budget, progress: None } }

    /// Counts finished candidates into `progress` as results arrive.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<AtomicUsize>) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub const fn budget(&self) -> WorkerBudget { self.budget }
}

impl Scorer for StagedPipeline {
    fn score(
        &self,
        batch: Vec<Candidate>,
        target: Color,
    ) -> Result<Vec<ScoredCandidate>, PipelineError> {
        let expected = batch.len();
        if expected == 0 {
            return Ok(Vec::new());
        }

        tracing::debug!(
            candidates = expected,
            decode = self.budget.decode,
            average = self.budget.average,
            distance = self.budget.distance,
            "starting staged scoring"
        );

        thread::scope(|scope| -> Result<Vec<ScoredCandidate>, PipelineError> {
            let (feed_tx, feed_rx) = bounded::<(usize, Candidate)>(0);
            let (decoded_tx, decoded_rx) = bounded::<Decoded>(0);
            let (averaged_tx, averaged_rx) = bounded::<Averaged>(0);
            let (result_tx, result_rx) = unbounded::<ScoredCandidate>();

            for i in 0..self.budget.decode {
                let (rx, tx) = (feed_rx.clone(), decoded_tx.clone());
                spawn_named_scoped(scope, &format!("decode-{i}"), move || {
                    for (position, candidate) in rx {
                        let (info, fetch) = candidate.into_parts();
                        let pixels = run_fetch(&info, fetch);
                        if tx.send((position, info, pixels)).is_err() {
                            break;
                        }
                    }
                })?;
            }

            for i in 0..self.budget.average {
                let (rx, tx) = (decoded_rx.clone(), averaged_tx.clone());
                spawn_named_scoped(scope, &format!("average-{i}"), move || {
                    for (position, info, pixels) in rx {
                        let avg = pixels.ok().map(|pixels| average_color(&pixels));
                        if tx.send((position, info, avg)).is_err() {
                            break;
                        }
                    }
                })?;
            }

            for i in 0..self.budget.distance {
                let (rx, tx) = (averaged_rx.clone(), result_tx.clone());
                spawn_named_scoped(scope, &format!("distance-{i}"), move || {
                    for (position, info, avg) in rx {
                        let scored = match avg {
                            Some(avg) => ScoredCandidate::scored(info, position, avg, target),
                            None => ScoredCandidate::failed(info, position),
                        };
                        if tx.send(scored).is_err() {
                            break;
                        }
                    }
                })?;
            }

            // Only workers hold channel ends from here on, so a dead stage
            // disconnects the collector instead of hanging it.
            drop((feed_rx, decoded_tx, decoded_rx, averaged_tx, averaged_rx, result_tx));

            spawn_named_scoped(scope, "feed", move || {
                for item in batch.into_iter().enumerate() {
                    if feed_tx.send(item).is_err() {
                        break;
                    }
                }
            })?;

            collect(&result_rx, expected, self.progress.as_deref())
        })
    }
}
