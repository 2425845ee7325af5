//! Selection policy: turns scored batches into a single chosen candidate.
//!
//! A policy is built once per run with its [`Mode`] and consumed by
//! [`SelectionPolicy::run`], so a finished search can never resume.

use std::fmt;

use rand::Rng;

use crate::color::Color;
use crate::pipeline::{PipelineError, ScoredCandidate, Scorer};
use crate::source::{Batch, CandidateRef, CandidateSource, SourceError};

/// How the candidate is chosen, fixed at run start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    /// Uniformly random candidate of the first batch, without scoring.
    Random,
    /// First candidate of the first batch, without scoring.
    First,
    /// Closest candidate of the first batch.
    BestOfBatch { target: Color },
    /// Pages through batches until one has a candidate within `threshold`,
    /// falling back to the closest seen once `max_pages` is exhausted.
    Threshold { target: Color, threshold: f64, max_pages: Option<u32> },
}

impl Mode {
    #[must_use]
    pub const fn target(&self) -> Option<Color> {
        match self {
            Self::Random | Self::First => None,
            Self::BestOfBatch { target } | Self::Threshold { target, .. } => Some(*target),
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Chosen without scoring.
    Picked(CandidateRef),
    /// Closest candidate of a single batch.
    Best(ScoredCandidate),
    /// First page whose closest candidate met the threshold.
    WithinThreshold { scored: ScoredCandidate, page: u32 },
    /// Page budget exhausted; closest candidate across every page scanned.
    Fallback { scored: ScoredCandidate, pages: u32 },
    /// The source had no candidates at all.
    Empty,
}

impl Selection {
    #[must_use]
    pub const fn candidate(&self) -> Option<&CandidateRef> {
        match self {
            Self::Picked(candidate) => Some(candidate),
            Self::Best(scored)
            | Self::WithinThreshold { scored, .. }
            | Self::Fallback { scored, .. } => Some(&scored.candidate),
            Self::Empty => None,
        }
    }

    #[must_use]
    pub const fn scored(&self) -> Option<&ScoredCandidate> {
        match self {
            Self::Best(scored)
            | Self::WithinThreshold { scored, .. }
            | Self::Fallback { scored, .. } => Some(scored),
            Self::Picked(_) | Self::Empty => None,
        }
    }
}

/// Progress notifications emitted while searching.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// The first batch arrived.
    FirstBatch { size: usize, target: Option<Color> },
    /// A page missed the threshold and the search moves on.
    Advance { distance: f64, threshold: f64, next_page: u32, total_pages: Option<u32> },
    /// The page budget ran out without meeting the threshold.
    Fallback,
}

pub trait SearchObserver {
    fn on_event(&self, _event: &SearchEvent) {}
}

impl SearchObserver for () {}

#[derive(Debug)]
pub enum PolicyError {
    Source(SourceError),
    Pipeline(PipelineError),
    /// Every scored candidate failed to load.
    NothingScored,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(err) => write!(f, "{err}"),
            Self::Pipeline(err) => write!(f, "{err}"),
            Self::NothingScored => write!(f, "none of the candidate images could be read"),
        }
    }
}

impl std::error::Error for PolicyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Pipeline(err) => Some(err),
            Self::NothingScored => None,
        }
    }
}

impl From<SourceError> for PolicyError {
    fn from(err: SourceError) -> Self { Self::Source(err) }
}

impl From<PipelineError> for PolicyError {
    fn from(err: PipelineError) -> Self { Self::Pipeline(err) }
}

/// Whether `a` strictly beats `b`. Any readable candidate beats any failure,
/// whatever the distances.
fn beats(a: &ScoredCandidate, b: &ScoredCandidate) -> bool {
    match (a.is_failure(), b.is_failure()) {
        (false, true) => true,
        (true, false) => false,
        _ => a.distance < b.distance,
    }
}

/// Closest result, keeping the earliest on ties. Failures rank last.
#[must_use]
pub fn best_of(results: &[ScoredCandidate]) -> Option<&ScoredCandidate> {
    results.iter().fold(None, |best, scored| match best {
        Some(best) if !beats(scored, best) => Some(best),
        _ => Some(scored),
    })
}

/// Replaces `best` with `candidate` only when it strictly beats it.
fn fold_best(best: &mut Option<ScoredCandidate>, candidate: &ScoredCandidate) {
    if best.as_ref().is_none_or(|best| beats(candidate, best)) {
        *best = Some(candidate.clone());
    }
}

fn usable(scored: ScoredCandidate) -> Result<ScoredCandidate, PolicyError> {
    if scored.is_failure() { Err(PolicyError::NothingScored) } else { Ok(scored) }
}

/// Pagination state of a threshold search.
#[derive(Debug, Default)]
struct SearchState {
    page: u32,
    total_pages: Option<u32>,
    best_so_far: Option<ScoredCandidate>,
}

impl SearchState {
    fn new() -> Self { Self { page: 1, ..Self::default() } }

    /// Last page to scan: the smaller of the reported total and the budget.
    fn limit(&self, max_pages: Option<u32>) -> Option<u32> {
        match (self.total_pages, max_pages) {
            (Some(total), Some(max)) => Some(total.min(max)),
            (total, max) => total.or(max),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SelectionPolicy {
    mode: Mode,
}

impl SelectionPolicy {
    #[must_use]
    pub const fn new(mode: Mode) -> Self { Self { mode } }

    #[must_use]
    pub const fn mode(&self) -> Mode { self.mode }

    /// Runs the search to completion.
    ///
    /// Batches are requested one at a time; a new batch is only requested
    /// after the previous one is fully scored.
    ///
    /// # Errors
    ///
    /// Returns an error if a batch cannot be obtained, the scorer fails, or no
    /// candidate could be read.
    pub fn run<S, C, R, O>(
        self,
        source: &mut S,
        scorer: &C,
        rng: &mut R,
        observer: &O,
    ) -> Result<Selection, PolicyError>
    where
        S: CandidateSource + ?Sized,
        C: Scorer + ?Sized,
        R: Rng,
        O: SearchObserver + ?Sized,
    {
        let Some(batch) = source.next_batch()? else {
            return Ok(Selection::Empty);
        };
        if batch.is_empty() {
            return Ok(Selection::Empty);
        }

        observer.on_event(&SearchEvent::FirstBatch { size: batch.len(), target: self.mode.target() });

        match self.mode {
            Mode::Random => {
                let index = rng.random_range(0..batch.len());
                Ok(Self::pick(batch, index))
            }
            Mode::First => Ok(Self::pick(batch, 0)),
            Mode::BestOfBatch { target } => {
                let results = scorer.score(batch.candidates, target)?;
                let best = best_of(&results).cloned().ok_or(PolicyError::NothingScored)?;
                Ok(Selection::Best(usable(best)?))
            }
            Mode::Threshold { target, threshold, max_pages } => {
                Self::search(batch, source, scorer, observer, target, threshold, max_pages)
            }
        }
    }

    fn pick(batch: Batch, index: usize) -> Selection {
        batch
            .candidates
            .into_iter()
            .nth(index)
            .map_or(Selection::Empty, |candidate| Selection::Picked(candidate.into_info()))
    }

    fn search<S, C, O>(
        first: Batch,
        source: &mut S,
        scorer: &C,
        observer: &O,
        target: Color,
        threshold: f64,
        max_pages: Option<u32>,
    ) -> Result<Selection, PolicyError>
    where
        S: CandidateSource + ?Sized,
        C: Scorer + ?Sized,
        O: SearchObserver + ?Sized,
    {
        let mut state = SearchState::new();
        let mut next = Some(first);

        loop {
            let batch = match next.take() {
                Some(batch) if !batch.is_empty() => batch,
                _ => {
                    tracing::debug!(page = state.page, "source exhausted");
                    observer.on_event(&SearchEvent::Fallback);
                    let scored = state.best_so_far.ok_or(PolicyError::NothingScored)?;
                    return Ok(Selection::Fallback { scored: usable(scored)?, pages: state.page - 1 });
                }
            };

            if let Some(meta) = batch.meta {
                state.total_pages = Some(meta.total);
            }

            let results = scorer.score(batch.candidates, target)?;
            let Some(page_best) = best_of(&results) else {
                return Err(PolicyError::NothingScored);
            };
            fold_best(&mut state.best_so_far, page_best);

            tracing::debug!(page = state.page, distance = page_best.distance, threshold, "scored page");

            if !page_best.is_failure() && page_best.distance <= threshold {
                return Ok(Selection::WithinThreshold {
                    scored: page_best.clone(),
                    page: state.page,
                });
            }

            let distance = page_best.distance;
            state.page += 1;

            if state.limit(max_pages).is_some_and(|limit| state.page > limit) {
                observer.on_event(&SearchEvent::Fallback);
                let scored = state.best_so_far.ok_or(PolicyError::NothingScored)?;
                return Ok(Selection::Fallback { scored: usable(scored)?, pages: state.page - 1 });
            }

            observer.on_event(&SearchEvent::Advance {
                distance,
                threshold,
                next_page: state.page,
                total_pages: state.total_pages,
            });

            next = source.next_batch()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::pipeline::FanOutPipeline;
    use crate::pipeline::test_support::{broken, solid};
    use crate::source::{Candidate, PageMeta};

    const BLACK: Color = Color::opaque(0, 0, 0);

    /// Source serving prepared pages and counting requests.
    struct Pages {
        pages: VecDeque<Batch>,
        requested: usize,
    }

    impl Pages {
        fn new(pages: Vec<Batch>) -> Self { Self { pages: pages.into(), requested: 0 } }
    }

    impl CandidateSource for Pages {
        fn next_batch(&mut self) -> Result<Option<Batch>, SourceError> {
            self.requested += 1;
            Ok(self.pages.pop_front())
        }
    }

    #[derive(Default)]
    struct Recorder(RefCell<Vec<SearchEvent>>);

    impl SearchObserver for Recorder {
        fn on_event(&self, event: &SearchEvent) { self.0.borrow_mut().push(event.clone()); }
    }

    fn gray(id: &str, level: u8, fetches: &Arc<AtomicUsize>) -> Candidate {
        solid(id, Color::opaque(level, level, level), fetches)
    }

    /// Candidate at exactly `distance` from black along the red axis.
    fn at(id: &str, distance: u8, fetches: &Arc<AtomicUsize>) -> Candidate {
        solid(id, Color::opaque(distance, 0, 0), fetches)
    }

    fn page(candidates: Vec<Candidate>, total: Option<u32>) -> Batch {
        Batch::new(candidates).with_meta(total.map(|total| PageMeta { current: 0, total }))
    }

    fn run(mode: Mode, source: &mut Pages, observer: &Recorder) -> Result<Selection, PolicyError> {
        let mut rng = StdRng::seed_from_u64(3);
        SelectionPolicy::new(mode).run(source, &FanOutPipeline::new(), &mut rng, observer)
    }

    // ========================================================================
    // Folding tests
    // ========================================================================

    #[test]
    fn test_best_of_keeps_first_on_tie() {
        let a = ScoredCandidate::scored(CandidateRef::new("a"), 0, Color::opaque(5, 0, 0), BLACK);
        let b = ScoredCandidate::scored(CandidateRef::new("b"), 1, Color::opaque(0, 5, 0), BLACK);
        let results = [a, b];
        assert_eq!(best_of(&results).unwrap().candidate.id, "a");
    }

    #[test]
    fn test_best_of_ranks_failure_after_equal_distance() {
        let failed = ScoredCandidate::failed(CandidateRef::new("bad"), 0);
        let white = Color::opaque(0xff, 0xff, 0xff);
        let clear =
            ScoredCandidate::scored(CandidateRef::new("clear"), 1, Color::new(0, 0, 0, 0), white);
        assert!((clear.distance - failed.distance).abs() < f64::EPSILON);

        let results = [failed, clear];
        assert_eq!(best_of(&results).unwrap().candidate.id, "clear");
    }

    #[test]
    fn test_best_of_empty_is_none() { assert!(best_of(&[]).is_none()); }

    // ========================================================================
    // Unscored mode tests
    // ========================================================================

    #[test]
    fn test_random_never_fetches_and_picks_member() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let ids: Vec<String> = (0..20).map(|i| format!("r{i}")).collect();
        let mut source =
            Pages::new(vec![Batch::new(ids.iter().map(|id| gray(id, 1, &fetches)).collect())]);

        let selection = run(Mode::Random, &mut source, &Recorder::default()).unwrap();

        let Selection::Picked(picked) = selection else { panic!("expected a picked candidate") };
        assert!(ids.contains(&picked.id));
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_first_picks_index_zero() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut source =
            Pages::new(vec![Batch::new(vec![gray("a", 1, &fetches), gray("b", 2, &fetches)])]);
        let selection = run(Mode::First, &mut source, &Recorder::default()).unwrap();
        assert_eq!(selection.candidate().unwrap().id, "a");
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_source_is_empty_selection() {
        let mut source = Pages::new(vec![Batch::default()]);
        let mode = Mode::BestOfBatch { target: BLACK };
        assert_eq!(run(mode, &mut source, &Recorder::default()).unwrap(), Selection::Empty);
    }

    // ========================================================================
    // Best-of-batch tests
    // ========================================================================

    #[test]
    fn test_best_of_batch_picks_minimum() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut source = Pages::new(vec![Batch::new(vec![
            at("far", 90, &fetches),
            at("near", 7, &fetches),
            at("mid", 30, &fetches),
        ])]);

        let selection =
            run(Mode::BestOfBatch { target: BLACK }, &mut source, &Recorder::default()).unwrap();

        let scored = selection.scored().unwrap();
        assert_eq!(scored.candidate.id, "near");
        assert!((scored.distance - 7.0).abs() < f64::EPSILON);
        assert_eq!(source.requested, 1);
    }

    #[test]
    fn test_one_failure_out_of_five_is_never_chosen() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut source = Pages::new(vec![Batch::new(vec![
            at("a", 40, &fetches),
            broken("broken"),
            at("b", 12, &fetches),
            at("c", 90, &fetches),
            at("d", 33, &fetches),
        ])]);

        let selection =
            run(Mode::BestOfBatch { target: BLACK }, &mut source, &Recorder::default()).unwrap();
        assert_eq!(selection.candidate().unwrap().id, "b");
    }

    #[test]
    fn test_readable_candidate_at_max_distance_beats_failure() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut source = Pages::new(vec![Batch::new(vec![
            broken("bad"),
            solid("transparent", Color::new(0, 0, 0, 0), &fetches),
        ])]);

        let target = Color::opaque(0xff, 0xff, 0xff);
        let selection =
            run(Mode::BestOfBatch { target }, &mut source, &Recorder::default()).unwrap();
        assert_eq!(selection.candidate().unwrap().id, "transparent");
    }

    #[test]
    fn test_failed_first_page_is_replaced_by_later_max_distance_candidate() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let white = Color::opaque(0xff, 0xff, 0xff);
        let mut source = Pages::new(vec![
            page(vec![broken("bad")], None),
            page(vec![solid("transparent", Color::new(0, 0, 0, 0), &fetches)], Some(2)),
        ]);

        let mode = Mode::Threshold { target: white, threshold: 1.0, max_pages: None };
        let selection = run(mode, &mut source, &Recorder::default()).unwrap();

        assert!(matches!(&selection, Selection::Fallback { pages: 2, .. }));
        assert_eq!(selection.candidate().unwrap().id, "transparent");
    }

    #[test]
    fn test_all_failures_is_error() {
        let mut source = Pages::new(vec![Batch::new(vec![broken("x"), broken("y")])]);
        let result = run(Mode::BestOfBatch { target: BLACK }, &mut source, &Recorder::default());
        assert!(matches!(result, Err(PolicyError::NothingScored)));
    }

    // ========================================================================
    // Threshold search tests
    // ========================================================================

    fn threshold(threshold: f64, max_pages: Option<u32>) -> Mode {
        Mode::Threshold { target: BLACK, threshold, max_pages }
    }

    #[test]
    fn test_stops_after_first_page_within_threshold() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut source = Pages::new(vec![
            page(vec![at("p1", 5, &fetches), at("p1b", 50, &fetches)], None),
            page(vec![at("p2", 0, &fetches)], Some(3)),
        ]);

        let selection = run(threshold(10.0, None), &mut source, &Recorder::default()).unwrap();

        assert!(matches!(&selection, Selection::WithinThreshold { page: 1, .. }));
        assert_eq!(selection.candidate().unwrap().id, "p1");
        assert_eq!(source.requested, 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fallback_picks_global_minimum() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut source = Pages::new(vec![
            page(vec![at("p1", 40, &fetches)], None),
            page(vec![at("p2", 25, &fetches)], Some(10)),
            page(vec![at("p3", 60, &fetches)], Some(10)),
            page(vec![at("p4", 0, &fetches)], Some(10)),
        ]);
        let observer = Recorder::default();

        let selection = run(threshold(10.0, Some(3)), &mut source, &observer).unwrap();

        let Selection::Fallback { scored, pages } = selection else { panic!("expected fallback") };
        assert_eq!(scored.candidate.id, "p2");
        assert!((scored.distance - 25.0).abs() < f64::EPSILON);
        assert_eq!(pages, 3);
        assert_eq!(source.requested, 3);

        let events = observer.0.borrow();
        assert!(matches!(events[0], SearchEvent::FirstBatch { size: 1, target: Some(_) }));
        assert!(matches!(events[1], SearchEvent::Advance { next_page: 2, total_pages: None, .. }));
        assert!(matches!(events[2], SearchEvent::Advance { next_page: 3, total_pages: Some(10), .. }));
        assert_eq!(events[3], SearchEvent::Fallback);
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_reported_total_limits_pages() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut source = Pages::new(vec![
            page(vec![at("p1", 80, &fetches)], None),
            page(vec![at("p2", 70, &fetches)], Some(2)),
            page(vec![at("p3", 0, &fetches)], Some(2)),
        ]);

        let selection = run(threshold(10.0, Some(50)), &mut source, &Recorder::default()).unwrap();

        assert!(matches!(&selection, Selection::Fallback { pages: 2, .. }));
        assert_eq!(selection.candidate().unwrap().id, "p2");
        assert_eq!(source.requested, 2);
    }

    #[test]
    fn test_meets_threshold_on_later_page() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut source = Pages::new(vec![
            page(vec![at("p1", 80, &fetches)], None),
            page(vec![at("p2", 9, &fetches), at("p2b", 3, &fetches)], Some(5)),
        ]);

        let selection = run(threshold(10.0, None), &mut source, &Recorder::default()).unwrap();

        assert!(matches!(&selection, Selection::WithinThreshold { page: 2, .. }));
        assert_eq!(selection.candidate().unwrap().id, "p2b");
    }

    #[test]
    fn test_exhausted_source_falls_back() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut source = Pages::new(vec![
            page(vec![at("p1", 30, &fetches)], None),
            page(vec![at("p2", 20, &fetches)], None),
        ]);

        let observer = Recorder::default();
        let selection = run(threshold(10.0, None), &mut source, &observer).unwrap();

        assert!(matches!(&selection, Selection::Fallback { pages: 2, .. }));
        assert_eq!(selection.candidate().unwrap().id, "p2");
        assert_eq!(observer.0.borrow().last(), Some(&SearchEvent::Fallback));
    }

    #[test]
    fn test_failed_page_does_not_meet_max_threshold() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut source = Pages::new(vec![
            page(vec![broken("bad")], None),
            page(vec![at("good", 100, &fetches)], Some(2)),
        ]);

        let selection =
            run(threshold(crate::color::MAX_DISTANCE, None), &mut source, &Recorder::default())
                .unwrap();
        assert_eq!(selection.candidate().unwrap().id, "good");
    }
}
