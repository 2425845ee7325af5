//! `huewall remote`: search the wallpaper site, download and set the match.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::Context;
use super::types::{Threshold, resolve_target};
use crate::cli::output::RemoteObserver;
use crate::color::Color;
use crate::error::HuewallError;
use crate::pipeline::FanOutPipeline;
use crate::policy::{Mode, Selection, SelectionPolicy};
use crate::remote::search::random_seed;
use crate::remote::{HttpClient, SearchQuery, resolve_full_image};
use crate::sink::{ScreenSize, download, screen};
use crate::source::RemoteSource;

#[derive(Args, Debug)]
pub struct RemoteArgs {
    /// Take the first result instead of matching a color.
    #[arg(long, short)]
    pub random: bool,

    /// Stop at the first page whose closest thumbnail is within this distance.
    /// Without it only the first page is scanned.
    #[arg(long, short, value_name = "THRESHOLD")]
    pub threshold: Option<Threshold>,

    /// Last page to scan before accepting the closest thumbnail seen.
    #[arg(long, short, value_name = "PAGE", value_parser = clap::value_parser!(u32).range(1..))]
    pub last_page: Option<u32>,

    /// Target color as 'rrggbb' or '#rrggbb'.
    #[arg(value_name = "COLOR")]
    pub color: Option<Color>,
}

impl RemoteArgs {
    /// Policy mode for these arguments and the resolved target.
    #[must_use]
    pub fn mode(&self, target: Option<Color>) -> Mode {
        match (target, self.threshold) {
            (None, _) => Mode::First,
            (Some(target), None) => Mode::BestOfBatch { target },
            (Some(target), Some(threshold)) => {
                Mode::Threshold { target, threshold: threshold.get(), max_pages: self.last_page }
            }
        }
    }
}

fn images_dir(ctx: &Context, resolution: ScreenSize) -> Result<PathBuf, HuewallError> {
    ctx.configured_images_dir()
        .or_else(|| download::default_images_dir(resolution))
        .ok_or_else(|| HuewallError::ConfigError("cannot determine the images directory".to_string()))
}

/// Runs remote mode.
///
/// # Errors
///
/// Returns an error for invalid arguments, unreachable or empty result
/// pages, or a failing download or setter.
pub fn execute(args: &RemoteArgs, ctx: &Context) -> Result<(), HuewallError> {
    let target = resolve_target(args.random, args.color)?;
    let mode = args.mode(target);
    let sink = ctx.sink()?;

    let resolution = screen::resolve(ctx.configured_resolution()?);
    let images_dir = images_dir(ctx, resolution)?;
    tracing::debug!(%resolution, images_dir = %images_dir.display(), "remote settings");

    let config = &ctx.loaded.config;
    let mut rng = StdRng::from_rng(&mut rand::rng());
    let query = SearchQuery {
        base_url: config.base_url.clone(),
        categories: config.categories.clone(),
        purity: config.purity.clone(),
        sorting: config.sorting.clone(),
        resolution: resolution.to_string(),
        seed: random_seed(&mut rng),
    };

    let client = Arc::new(HttpClient::new(&config.user_agent)?);
    let mut source = RemoteSource::new(Arc::clone(&client), query);
    let selection = SelectionPolicy::new(mode).run(
        &mut source,
        &FanOutPipeline::new(),
        &mut rng,
        &RemoteObserver,
    )?;

    if let Some(scored) = selection.scored()
        && let Some(avg) = scored.avg_color
    {
        println!("Result: average color {avg}, distance {:.2}", scored.distance);
    }

    let preview = match selection {
        Selection::Empty => return Err(HuewallError::SourceError("Could not find thumbs".to_string())),
        other => other.candidate().and_then(|candidate| candidate.preview.clone()),
    }
    .ok_or_else(|| HuewallError::RemoteError("Could not find thumb's preview link".to_string()))?;

    let src = resolve_full_image(&client, &preview)?;
    println!("{src}");

    if let Some(path) = sink.apply_remote(&client, &src, &images_dir)? {
        println!("{}", path.display());
    }
    Ok(())
}
