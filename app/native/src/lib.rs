//! Huewall - pick a wallpaper whose average color is closest to a target color.
//!
//! Candidates come from a local directory tree or from the search pages of a
//! wallpaper site. Each candidate is scored by the distance between its
//! average color and the target, and the chosen image is handed to a
//! wallpaper setter.

pub mod cli;
pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod pipeline;
pub mod platform;
pub mod policy;
pub mod remote;
pub mod sink;
pub mod source;
