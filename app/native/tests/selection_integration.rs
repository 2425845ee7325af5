//! Integration tests for candidate selection.
//!
//! These tests drive the public selection API end to end: real image files in
//! a temporary directory for the local source, and scripted sources for the
//! paging behavior of the threshold search.
//!
//! ```bash
//! cargo test -p huewall --test selection_integration
//! ```

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use huewall_lib::color::{Color, MAX_DISTANCE};
use huewall_lib::pipeline::{FanOutPipeline, StagedPipeline, WorkerBudget};
use huewall_lib::policy::{Mode, Selection, SelectionPolicy};
use huewall_lib::source::{
    Batch, Candidate, CandidateRef, CandidateSource, FetchError, LocalSource, PageMeta,
    SourceError,
};
use image::{Rgba, RgbaImage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn write_png(dir: &Path, name: &str, color: Color) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    RgbaImage::from_pixel(8, 8, Rgba([color.r, color.g, color.b, 0xff])).save(&path).unwrap();
}

fn staged() -> StagedPipeline { StagedPipeline::new(WorkerBudget::for_parallelism(4)) }

fn rng() -> StdRng { StdRng::seed_from_u64(7) }

/// Scripted remote-like source: one batch of solid colors per page.
struct Pages {
    pages: VecDeque<Vec<Option<Color>>>,
    total: u32,
    served: u32,
    fetches: Arc<AtomicUsize>,
}

impl Pages {
    fn new(pages: Vec<Vec<Option<Color>>>, fetches: &Arc<AtomicUsize>) -> Self {
        let total = u32::try_from(pages.len()).unwrap();
        Self { pages: pages.into(), total, served: 0, fetches: Arc::clone(fetches) }
    }
}

impl CandidateSource for Pages {
    fn next_batch(&mut self) -> Result<Option<Batch>, SourceError> {
        let Some(colors) = self.pages.pop_front() else {
            return Ok(None);
        };
        self.served += 1;
        let page = self.served;

        let candidates = colors
            .into_iter()
            .enumerate()
            .map(|(index, color)| {
                let fetches = Arc::clone(&self.fetches);
                let info = CandidateRef::new(format!("p{page}-{index}"))
                    .with_preview(format!("https://example.com/w/p{page}-{index}"));
                Candidate::new(info, move || {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    color
                        .map(|c| RgbaImage::from_pixel(2, 2, Rgba([c.r, c.g, c.b, 0xff])))
                        .ok_or_else(|| FetchError::Http("HTTP 404 Not Found".to_string()))
                })
            })
            .collect();

        // Metadata only shows up from the second page on.
        let meta = (page > 1).then_some(PageMeta { current: page, total: self.total });
        Ok(Some(Batch::new(candidates).with_meta(meta)))
    }
}

fn gray(level: u8) -> Option<Color> { Some(Color::opaque(level, level, level)) }

// ============================================================================
// Local directory tests
// ============================================================================

#[test]
fn test_local_best_of_batch_picks_closest_file() {
    let temp = TempDir::new().unwrap();
    write_png(temp.path(), "red.png", Color::opaque(250, 10, 10));
    write_png(temp.path(), "nested/green.png", Color::opaque(10, 240, 10));
    write_png(temp.path(), "nested/deeper/blue.PNG", Color::opaque(10, 10, 230));
    fs::write(temp.path().join("notes.txt"), "not an image").unwrap();

    let target: Color = "#0000ff".parse().unwrap();
    let mut source = LocalSource::new(temp.path(), None);
    let selection = SelectionPolicy::new(Mode::BestOfBatch { target })
        .run(&mut source, &staged(), &mut rng(), &())
        .unwrap();

    let Selection::Best(scored) = selection else { panic!("expected best-of-batch result") };
    assert!(scored.candidate.id.ends_with("blue.PNG"));
    assert_eq!(scored.avg_color, Some(Color::opaque(10, 10, 230)));
}

#[test]
fn test_local_corrupt_file_is_scored_worst() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("broken.png"), b"definitely not a png").unwrap();
    write_png(temp.path(), "white.png", Color::opaque(255, 255, 255));

    // A far-off image still beats an unreadable one.
    let target = Color::opaque(0, 0, 0);
    let mut source = LocalSource::new(temp.path(), None);
    let selection = SelectionPolicy::new(Mode::BestOfBatch { target })
        .run(&mut source, &staged(), &mut rng(), &())
        .unwrap();

    let scored = selection.scored().unwrap();
    assert!(scored.candidate.id.ends_with("white.png"));
    assert!(scored.distance < MAX_DISTANCE);
}

#[test]
fn test_local_empty_directory_is_empty_selection() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("readme.md"), "# walls").unwrap();

    let mut source = LocalSource::new(temp.path(), None);
    let selection = SelectionPolicy::new(Mode::BestOfBatch { target: Color::opaque(1, 2, 3) })
        .run(&mut source, &staged(), &mut rng(), &())
        .unwrap();
    assert_eq!(selection, Selection::Empty);
}

#[test]
fn test_local_random_picks_an_existing_file() {
    let temp = TempDir::new().unwrap();
    for (index, level) in [10u8, 90, 170, 250].into_iter().enumerate() {
        write_png(temp.path(), &format!("{index}.png"), Color::opaque(level, level, level));
    }

    let mut source = LocalSource::new(temp.path(), None);
    let selection =
        SelectionPolicy::new(Mode::Random).run(&mut source, &staged(), &mut rng(), &()).unwrap();

    let Selection::Picked(candidate) = selection else { panic!("expected random pick") };
    assert!(Path::new(&candidate.id).exists());
}

#[test]
fn test_local_max_items_limits_scored_files() {
    let temp = TempDir::new().unwrap();
    for index in 0..10u8 {
        write_png(temp.path(), &format!("{index}.png"), Color::opaque(index * 20, 0, 0));
    }

    let progress = Arc::new(AtomicUsize::new(0));
    let pipeline = staged().with_progress(Arc::clone(&progress));
    let mut source = LocalSource::new(temp.path(), Some(3));
    SelectionPolicy::new(Mode::BestOfBatch { target: Color::opaque(0, 0, 0) })
        .run(&mut source, &pipeline, &mut rng(), &())
        .unwrap();

    assert_eq!(progress.load(Ordering::SeqCst), 3);
}

// ============================================================================
// Threshold search tests
// ============================================================================

#[test]
fn test_threshold_met_on_second_page() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let mut source = Pages::new(vec![vec![gray(100), gray(200)], vec![gray(5), gray(60)], vec![gray(0)]], &fetches);

    let mode = Mode::Threshold { target: Color::opaque(0, 0, 0), threshold: 10.0, max_pages: None };
    let selection =
        SelectionPolicy::new(mode).run(&mut source, &FanOutPipeline::new(), &mut rng(), &()).unwrap();

    let Selection::WithinThreshold { scored, page } = selection else { panic!("expected threshold hit") };
    assert_eq!(page, 2);
    assert_eq!(scored.candidate.id, "p2-0");
    // The third page is never requested.
    assert_eq!(fetches.load(Ordering::SeqCst), 4);
}

#[test]
fn test_threshold_falls_back_to_closest_seen() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let mut source = Pages::new(
        vec![vec![gray(40)], vec![gray(25)], vec![gray(60)], vec![gray(0)]],
        &fetches,
    );

    let mode =
        Mode::Threshold { target: Color::opaque(0, 0, 0), threshold: 1.0, max_pages: Some(3) };
    let selection =
        SelectionPolicy::new(mode).run(&mut source, &FanOutPipeline::new(), &mut rng(), &()).unwrap();

    let Selection::Fallback { scored, pages } = selection else { panic!("expected fallback") };
    assert_eq!(pages, 3);
    assert_eq!(scored.candidate.id, "p2-0");
    assert_eq!(scored.candidate.preview.as_deref(), Some("https://example.com/w/p2-0"));
}

#[test]
fn test_threshold_failed_thumb_does_not_win() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let mut source =
        Pages::new(vec![vec![None, gray(2), gray(80), gray(90), gray(100)]], &fetches);

    let mode = Mode::Threshold { target: Color::opaque(0, 0, 0), threshold: 50.0, max_pages: None };
    let selection =
        SelectionPolicy::new(mode).run(&mut source, &FanOutPipeline::new(), &mut rng(), &()).unwrap();

    assert_eq!(selection.candidate().map(|c| c.id.as_str()), Some("p1-1"));
    assert_eq!(fetches.load(Ordering::SeqCst), 5);
}

#[test]
fn test_first_mode_never_fetches_pixels() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let mut source = Pages::new(vec![vec![gray(1), gray(2), gray(3)]], &fetches);

    let selection =
        SelectionPolicy::new(Mode::First).run(&mut source, &FanOutPipeline::new(), &mut rng(), &()).unwrap();

    assert_eq!(selection.candidate().map(|c| c.id.as_str()), Some("p1-0"));
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}
