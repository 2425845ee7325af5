//! CLI command definitions using Clap.
//!
//! - `dir` - pick a wallpaper from a local directory
//! - `remote` - search the wallpaper site
//! - `types` - argument types shared by both

use std::io;
use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::config::{self, LoadedConfig};
use crate::constants::APP_NAME;
use crate::error::HuewallError;
use crate::platform::path;
use crate::sink::{ScreenSize, Setter, Sink, SinkConfig};

pub mod dir;
pub mod remote;
pub mod types;

pub use dir::DirArgs;
pub use remote::RemoteArgs;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Huewall - pick a wallpaper whose average color is closest to a target color.
#[derive(Parser, Debug)]
#[command(name = "huewall")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Select and print the result without downloading or setting it.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Pick an image from a local directory.
    ///
    /// Scans the directory recursively and sets the image whose average color
    /// is closest to COLOR, or a random one with --random.
    Dir(DirArgs),

    /// Pick a wallpaper from the wallpaper site.
    ///
    /// Scans search result pages for the thumbnail closest to COLOR, then
    /// downloads and sets the full image.
    Remote(RemoteArgs),

    /// Output huewall configuration JSON Schema.
    Schema,

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(huewall completions --shell zsh)"
    ///   huewall completions --shell fish > ~/.config/fish/completions/huewall.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

/// Per-run settings shared by the selection commands.
#[derive(Debug)]
pub struct Context {
    pub loaded: LoadedConfig,
    pub dry_run: bool,
}

impl Context {
    /// Builds the sink from the configured setter.
    ///
    /// # Errors
    ///
    /// Returns an error if the setter program cannot be found.
    pub fn sink(&self) -> Result<Sink, HuewallError> {
        let setter = if self.dry_run {
            Setter::Native
        } else {
            Setter::from_command(&self.loaded.config.setter)?
        };
        Ok(Sink::new(SinkConfig { setter, dry_run: self.dry_run }))
    }

    /// Configured images directory, expanded and resolved against the config
    /// file's directory.
    #[must_use]
    pub fn configured_images_dir(&self) -> Option<PathBuf> {
        let raw = self.loaded.config.images_dir.as_deref()?;
        Some(self.loaded.base_dir().map_or_else(
            || path::expand(raw),
            |base| path::expand_and_resolve(raw, base),
        ))
    }

    /// Configured screen resolution, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value is not `WIDTHxHEIGHT`.
    pub fn configured_resolution(&self) -> Result<Option<ScreenSize>, HuewallError> {
        self.loaded
            .config
            .resolution
            .as_deref()
            .map(|raw| {
                raw.parse::<ScreenSize>().map_err(HuewallError::ConfigError)
            })
            .transpose()
    }
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), HuewallError> {
        match &self.command {
            Commands::Dir(args) => dir::execute(args, &self.context()?),
            Commands::Remote(args) => remote::execute(args, &self.context()?),

            Commands::Schema => {
                println!("{}", config::schema::generate_schema_json());
                Ok(())
            }

            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    fn context(&self) -> Result<Context, HuewallError> {
        if let Some(path) = &self.config
            && !path.exists()
        {
            return Err(HuewallError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let loaded = config::load(self.config.as_deref())?;
        Ok(Context { loaded, dry_run: self.dry_run })
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, APP_NAME, &mut io::stdout());
    }
}
