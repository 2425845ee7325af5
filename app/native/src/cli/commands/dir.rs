//! `huewall dir`: pick a wallpaper from a local directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use clap::Args;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::Context;
use super::types::resolve_target;
use crate::cli::output::{self, DirObserver};
use crate::color::Color;
use crate::error::HuewallError;
use crate::pipeline::{StagedPipeline, WorkerBudget};
use crate::policy::{Mode, Selection, SelectionPolicy};
use crate::source::LocalSource;

#[derive(Args, Debug)]
pub struct DirArgs {
    /// Directory searched recursively for png and jpeg images.
    #[arg(long, short, value_name = "DIR")]
    pub dir: PathBuf,

    /// Pick a random image instead of matching a color.
    #[arg(long, short)]
    pub random: bool,

    /// Score at most this many randomly sampled images. 0 means all.
    #[arg(long, short, value_name = "MAX")]
    pub max: Option<usize>,

    /// Target color as 'rrggbb' or '#rrggbb'.
    #[arg(value_name = "COLOR")]
    pub color: Option<Color>,
}

fn check_dir(dir: &Path) -> Result<(), HuewallError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(HuewallError::InvalidArguments(format!("{} is not a directory", dir.display())))
    }
}

/// Runs directory mode.
///
/// # Errors
///
/// Returns an error for invalid arguments, an unreadable directory, or a
/// failing wallpaper setter. An empty directory is not an error.
pub fn execute(args: &DirArgs, ctx: &Context) -> Result<(), HuewallError> {
    check_dir(&args.dir)?;
    let target = resolve_target(args.random, args.color)?;
    let sink = ctx.sink()?;

    let mode = target.map_or(Mode::Random, |target| Mode::BestOfBatch { target });

    let workers = ctx.loaded.config.workers;
    let budget = WorkerBudget::detect().with_overrides(workers.decode, workers.average, workers.distance);
    tracing::debug!(?budget, "worker budget");

    let progress = Arc::new(AtomicUsize::new(0));
    let pipeline = StagedPipeline::new(budget).with_progress(Arc::clone(&progress));
    let observer = DirObserver::new(progress);

    let mut rng = StdRng::from_rng(&mut rand::rng());
    let mut source = LocalSource::new(&args.dir, args.max);
    let result = SelectionPolicy::new(mode).run(&mut source, &pipeline, &mut rng, &observer);
    observer.finish();

    let image = match result? {
        Selection::Empty => {
            println!("There are no image files in directory {:?}.", args.dir.display().to_string());
            return Ok(());
        }
        Selection::Picked(candidate) => {
            println!("{}", candidate.id);
            candidate.id
        }
        Selection::Best(scored)
        | Selection::WithinThreshold { scored, .. }
        | Selection::Fallback { scored, .. } => {
            println!("{}", output::file_result_line(&scored.candidate.id, scored.distance));
            scored.candidate.id
        }
    };

    sink.apply_local(Path::new(&image))?;
    Ok(())
}
