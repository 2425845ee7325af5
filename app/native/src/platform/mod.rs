//! Operating system helpers.
//!
//! - [`command`]: locating external executables
//! - [`path`]: tilde expansion and relative path resolution
//! - [`thread`]: named worker threads

pub mod command;
pub mod path;
pub mod thread;
