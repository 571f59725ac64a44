pub mod content;
pub mod related;
pub mod toc;

use std::sync::LazyLock;

use scraper::Selector;

/// Page files on the documentation site.
pub const PAGE_EXTENSION: &str = ".htm";

pub(crate) static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Last path segment of an href, as written in the markup.
pub fn basename(href: &str) -> &str {
    href.rsplit('/').next().unwrap_or(href)
}
