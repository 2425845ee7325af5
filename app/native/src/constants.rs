//! Application-wide constants.

/// Name used for the config directory, thread names and CLI output.
pub const APP_NAME: &str = "huewall";

/// Wallpaper site searched in remote mode.
pub const DEFAULT_BASE_URL: &str = "https://wallhaven.cc";

/// Search categories: general on, anime off, people off.
pub const DEFAULT_CATEGORIES: &str = "100";

/// Search purity: safe for work only.
pub const DEFAULT_PURITY: &str = "100";

pub const DEFAULT_SORTING: &str = "random";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
