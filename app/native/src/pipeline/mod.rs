//! Concurrent scoring of candidate batches.
//!
//! Two strategies implement [`Scorer`]:
//!
//! - [`StagedPipeline`]: decode, average and distance stages with separate
//!   worker budgets, used for the local directory batch
//! - [`FanOutPipeline`]: one task per candidate, used for remote pages
//!
//! Both emit exactly one [`ScoredCandidate`] per input candidate. A candidate
//! whose fetch fails is scored with [`MAX_DISTANCE`] instead of being dropped.

pub mod fanout;
pub mod staged;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::Receiver;
use image::RgbaImage;

pub use fanout::FanOutPipeline;
pub use staged::{StagedPipeline, WorkerBudget};

use crate::color::{Color, MAX_DISTANCE, average_color};
use crate::source::{Candidate, CandidateRef, Fetch, FetchError};

/// Result of scoring one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: CandidateRef,
    /// Average color, or `None` when fetching or decoding failed.
    pub avg_color: Option<Color>,
    pub distance: f64,
    /// Index of the candidate within its batch.
    pub position: usize,
}

impl ScoredCandidate {
    #[must_use]
    pub fn scored(candidate: CandidateRef, position: usize, avg_color: Color, target: Color) -> Self {
        Self {
            candidate,
            avg_color: Some(avg_color),
            distance: avg_color.distance(target),
            position,
        }
    }

    /// Worst-case result standing in for a candidate that could not be read.
    #[must_use]
    pub const fn failed(candidate: CandidateRef, position: usize) -> Self {
        Self { candidate, avg_color: None, distance: MAX_DISTANCE, position }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool { self.avg_color.is_none() }
}

/// Scores every candidate of a batch against a target color.
pub trait Scorer {
    /// Returns one result per candidate, ordered by batch position.
    ///
    /// # Errors
    ///
    /// Returns an error if workers cannot be started or results go missing.
    fn score(
        &self,
        batch: Vec<Candidate>,
        target: Color,
    ) -> Result<Vec<ScoredCandidate>, PipelineError>;
}

/// Failure of the scoring machinery itself. Fatal to the run.
#[derive(Debug)]
pub enum PipelineError {
    /// A worker thread could not be created.
    Spawn(std::io::Error),
    /// A thread pool could not be built.
    Pool(String),
    /// The result channel closed before every candidate reported.
    Incomplete { expected: usize, received: usize },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to spawn scoring worker: {err}"),
            Self::Pool(msg) => write!(f, "failed to build scoring pool: {msg}"),
            Self::Incomplete { expected, received } => {
                write!(f, "scoring stopped early: {received} of {expected} results")
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            Self::Pool(_) | Self::Incomplete { .. } => None,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self { Self::Spawn(err) }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs a candidate's fetch, turning a panic into an error.
///
/// Failures are logged here so every strategy reports them the same way.
pub(crate) fn run_fetch(info: &CandidateRef, fetch: Fetch) -> Result<RgbaImage, FetchError> {
    let result = panic::catch_unwind(AssertUnwindSafe(fetch))
        .unwrap_or_else(|payload| Err(FetchError::Panicked(panic_message(payload.as_ref()))));

    if let Err(err) = &result {
        tracing::warn!(candidate = %info.id, error = %err, "failed to read candidate, scoring it as worst");
    }
    result
}

/// Fetches, averages and measures one candidate in the calling thread.
pub(crate) fn score_one(candidate: Candidate, position: usize, target: Color) -> ScoredCandidate {
    let (info, fetch) = candidate.into_parts();
    match run_fetch(&info, fetch) {
        Ok(pixels) => {
            let avg = average_color(&pixels);
            drop(pixels);
            ScoredCandidate::scored(info, position, avg, target)
        }
        Err(_) => ScoredCandidate::failed(info, position),
    }
}

/// Drains exactly `expected` results, then orders them by batch position.
///
/// # Errors
///
/// Returns [`PipelineError::Incomplete`] if every sender is gone early.
pub(crate) fn collect(
    results: &Receiver<ScoredCandidate>,
    expected: usize,
    progress: Option<&AtomicUsize>,
) -> Result<Vec<ScoredCandidate>, PipelineError> {
    let mut collected = Vec::with_capacity(expected);

    while collected.len() < expected {
        let Ok(result) = results.recv() else {
            tracing::error!(expected, received = collected.len(), "result channel closed early");
            return Err(PipelineError::Incomplete { expected, received: collected.len() });
        };
        collected.push(result);
        if let Some(progress) = progress {
            progress.fetch_add(1, Ordering::Relaxed);
        }
    }

    collected.sort_by_key(|scored| scored.position);
    Ok(collected)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::{Rgba, RgbaImage};

    use crate::color::Color;
    use crate::source::{Candidate, CandidateRef, FetchError};

    /// Candidate whose pixels are a uniform 4x4 block of `color`.
    pub fn solid(id: &str, color: Color, fetches: &Arc<AtomicUsize>) -> Candidate {
        let fetches = Arc::clone(fetches);
        Candidate::new(CandidateRef::new(id), move || {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok(RgbaImage::from_pixel(4, 4, Rgba([color.r, color.g, color.b, color.a])))
        })
    }

    /// Candidate whose fetch always fails.
    pub fn broken(id: &str) -> Candidate {
        Candidate::new(CandidateRef::new(id), || {
            Err(FetchError::Http("HTTP 404 Not Found".to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossbeam_channel::unbounded;

    use super::test_support::{broken, solid};
    use super::*;

    #[test]
    fn test_failed_candidate_has_worst_distance() {
        let failed = ScoredCandidate::failed(CandidateRef::new("x"), 3);
        assert!(failed.is_failure());
        assert!((failed.distance - MAX_DISTANCE).abs() < f64::EPSILON);
        assert_eq!(failed.position, 3);
    }

    #[test]
    fn test_score_one_measures_distance() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let target = Color::opaque(0, 0, 0);
        let scored = score_one(solid("a", Color::opaque(3, 4, 0), &fetches), 0, target);
        assert_eq!(scored.avg_color, Some(Color::opaque(3, 4, 0)));
        assert!((scored.distance - 5.0).abs() < f64::EPSILON);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_score_one_turns_error_into_worst_case() {
        let scored = score_one(broken("b"), 1, Color::opaque(0, 0, 0));
        assert!(scored.is_failure());
        assert_eq!(scored.candidate.id, "b");
    }

    #[test]
    fn test_score_one_contains_panics() {
        let candidate = Candidate::new(CandidateRef::new("boom"), || panic!("decoder exploded"));
        let scored = score_one(candidate, 0, Color::opaque(0, 0, 0));
        assert!(scored.is_failure());
    }

    #[test]
    fn test_collect_orders_by_position() {
        let (tx, rx) = unbounded();
        for position in [2, 0, 1] {
            tx.send(ScoredCandidate::failed(CandidateRef::new(position.to_string()), position))
                .unwrap();
        }
        let progress = AtomicUsize::new(0);
        let results = collect(&rx, 3, Some(&progress)).unwrap();
        let positions: Vec<_> = results.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(progress.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_collect_reports_missing_results() {
        let (tx, rx) = unbounded();
        tx.send(ScoredCandidate::failed(CandidateRef::new("a"), 0)).unwrap();
        drop(tx);
        let result = collect(&rx, 2, None);
        assert!(matches!(result, Err(PipelineError::Incomplete { expected: 2, received: 1 })));
    }
}
