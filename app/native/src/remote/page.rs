//! Extraction of thumbnails and pagination from search result pages, and of
//! the full image URL from a preview page.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::source::PageMeta;

/// One search result: a small thumbnail and the page of the full image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumb {
    pub thumbnail: String,
    pub preview: String,
}

/// Everything extracted from one search results page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub thumbs: Vec<Thumb>,
    /// Present only when the page carries a `current / total` header.
    pub meta: Option<PageMeta>,
}

/// Errors raised while extracting data from HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The built-in extraction patterns failed to compile.
    Patterns,
    /// The preview page has no full image element.
    MissingWallpaper,
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patterns => write!(f, "page extraction patterns are invalid"),
            Self::MissingWallpaper => write!(f, "could not find the wallpaper image on the page"),
        }
    }
}

impl std::error::Error for PageError {}

struct Patterns {
    figure: Regex,
    data_src: Regex,
    preview_anchor: Regex,
    href: Regex,
    header: Regex,
    tag: Regex,
    page_numbers: Regex,
    wallpaper_img: Regex,
    src: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            figure: Regex::new(
                r#"(?s)<figure[^>]*class="(?:[^"]* )?thumb(?: [^"]*)?"[^>]*>(.*?)</figure>"#,
            )?,
            data_src: Regex::new(r#"<img[^>]*[ \t\r\n]data-src="([^"]+)""#)?,
            preview_anchor: Regex::new(r#"<a[^>]*class="(?:[^"]* )?preview(?: [^"]*)?"[^>]*>"#)?,
            href: Regex::new(r#"[ \t\r\n]href="([^"]+)""#)?,
            header: Regex::new(
                r#"(?s)class="(?:[^"]* )?thumb-listing-page-header(?: [^"]*)?"[^>]*>(.*?)</(?:header|div)>"#,
            )?,
            tag: Regex::new(r"<[^>]*>")?,
            page_numbers: Regex::new(r"([0-9]+)[ \t\r\n]*/[ \t\r\n]*([0-9]+)")?,
            wallpaper_img: Regex::new(r#"<img[^>]*[ \t\r\n]id="wallpaper"[^>]*>"#)?,
            src: Regex::new(r#"[ \t\r\n]src="([^"]+)""#)?,
        })
    }
}

static PATTERNS: LazyLock<Option<Patterns>> = LazyLock::new(|| {
    Patterns::compile()
        .map_err(|err| tracing::error!(error = %err, "failed to compile page patterns"))
        .ok()
});

fn patterns() -> Result<&'static Patterns, PageError> {
    PATTERNS.as_ref().ok_or(PageError::Patterns)
}

/// Decodes the entities that appear in attribute values.
fn unescape(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Extracts thumbnails and pagination from a search results page.
///
/// Results missing either the thumbnail or the preview link are skipped with
/// a warning.
///
/// # Errors
///
/// Returns [`PageError::Patterns`] if the extraction patterns are unavailable.
pub fn parse_search_page(html: &str) -> Result<SearchPage, PageError> {
    let p = patterns()?;
    let mut thumbs = Vec::new();

    for (index, figure) in p.figure.captures_iter(html).enumerate() {
        let body = figure.get(1).map_or("", |m| m.as_str());
        let thumbnail = p.data_src.captures(body).and_then(|c| c.get(1)).map(|m| unescape(m.as_str()));
        let preview = p
            .preview_anchor
            .find(body)
            .and_then(|anchor| p.href.captures(anchor.as_str()))
            .and_then(|c| c.get(1))
            .map(|m| unescape(m.as_str()));

        match (thumbnail, preview) {
            (Some(thumbnail), Some(preview)) => thumbs.push(Thumb { thumbnail, preview }),
            _ => tracing::warn!(index, "skipping thumb without image or preview link"),
        }
    }

    Ok(SearchPage { thumbs, meta: parse_page_meta(p, html) })
}

fn parse_page_meta(p: &Patterns, html: &str) -> Option<PageMeta> {
    let header = p.header.captures(html)?.get(1)?.as_str();
    let text = p.tag.replace_all(header, "");
    let numbers = p.page_numbers.captures(&text)?;
    let current = numbers.get(1)?.as_str().parse().ok()?;
    let total = numbers.get(2)?.as_str().parse().ok()?;
    Some(PageMeta { current, total })
}

/// Extracts the full image URL from a preview page.
///
/// Protocol-relative and scheme-less sources are prefixed with `https:`.
///
/// # Errors
///
/// Returns [`PageError::MissingWallpaper`] if the page has no wallpaper image.
pub fn parse_wallpaper_src(html: &str) -> Result<String, PageError> {
    let p = patterns()?;
    let src = p
        .wallpaper_img
        .find(html)
        .and_then(|img| p.src.captures(img.as_str()))
        .and_then(|c| c.get(1))
        .map(|m| unescape(m.as_str()))
        .ok_or(PageError::MissingWallpaper)?;

    if src.starts_with("http") { Ok(src) } else { Ok(format!("https:{src}")) }
}
