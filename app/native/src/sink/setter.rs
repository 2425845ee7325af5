//! Applying a local image as the desktop wallpaper.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::SinkError;
use crate::platform::command::resolve_binary;

/// How the wallpaper is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setter {
    /// External program; the image path is appended to `args`.
    Command { program: PathBuf, args: Vec<String> },
    /// The desktop environment's own mechanism.
    Native,
}

impl Setter {
    /// Builds a setter from a configured command line, or [`Setter::Native`]
    /// when none is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured program cannot be found.
    pub fn from_command(command: &[String]) -> Result<Self, SinkError> {
        let Some((program, args)) = command.split_first() else {
            return Ok(Self::Native);
        };
        let program = resolve_binary(program).map_err(SinkError::Setter)?;
        Ok(Self::Command { program, args: args.to_vec() })
    }

    /// Sets `image` as the wallpaper. Failures are reported, not retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the setter fails.
    pub fn apply(&self, image: &Path) -> Result<(), SinkError> {
        match self {
            Self::Command { program, args } => {
                let status = Command::new(program)
                    .args(args)
                    .arg(image)
                    .status()
                    .map_err(|err| SinkError::Setter(format!("{}: {err}", program.display())))?;
                if !status.success() {
                    return Err(SinkError::Setter(format!("{} exited with {status}", program.display())));
                }
            }
            Self::Native => {
                let path = image
                    .to_str()
                    .ok_or_else(|| SinkError::Setter(format!("non UTF-8 path {}", image.display())))?;
                wallpaper::set_from_path(path).map_err(|err| SinkError::Setter(err.to_string()))?;
            }
        }

        tracing::info!(path = %image.display(), "wallpaper set");
        Ok(())
    }
}
