//! One-task-per-candidate scoring for remote result pages.
//!
//! Pages are small and every task waits on the network, so each candidate
//! gets its own task on a pool sized to the batch.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use crossbeam_channel::unbounded;
use rayon::ThreadPoolBuilder;

use super::{PipelineError, ScoredCandidate, Scorer, collect, score_one};
use crate::color::Color;
use crate::platform::thread::thread_name;
use crate::source::Candidate;

/// Upper bound on concurrent fetches, whatever the page size.
pub const MAX_FAN_OUT: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct FanOutPipeline {
    progress: Option<Arc<AtomicUsize>>,
}

impl FanOutPipeline {
    #[must_use]
    pub const fn new() -> Self { Self { progress: None } }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<AtomicUsize>) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl Scorer for FanOutPipeline {
    fn score(
        &self,
        batch: Vec<Candidate>,
        target: Color,
    ) -> Result<Vec<ScoredCandidate>, PipelineError> {
        let expected = batch.len();
        if expected == 0 {
            return Ok(Vec::new());
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(expected.min(MAX_FAN_OUT))
            .thread_name(|i| thread_name(&format!("fetch-{i}")))
            .build()
            .map_err(|err| PipelineError::Pool(err.to_string()))?;

        tracing::debug!(candidates = expected, "starting fan-out scoring");

        let (result_tx, result_rx) = unbounded::<ScoredCandidate>();

        // The scope body runs on this thread, so results are counted as the
        // pool produces them.
        pool.in_place_scope(|scope| {
            for (position, candidate) in batch.into_iter().enumerate() {
                let tx = result_tx.clone();
                scope.spawn(move |_| {
                    let _ = tx.send(score_one(candidate, position, target));
                });
            }
            drop(result_tx);

            collect(&result_rx, expected, self.progress.as_deref())
        })
    }
}
