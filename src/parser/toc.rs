use std::sync::LazyLock;

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::{basename, PAGE_EXTENSION};

static MARKER_OR_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img, a").unwrap());

const CATEGORY_MARKER: &str = "p4.gif";
const SUBCATEGORY_MARKER: &str = "p3.gif";
const TOC_ITEM_CLASS: &str = "clsTOCItem";
const DEFAULT_CATEGORY: &str = "Main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    pub url: String,
    pub title: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryEntry {
    pub subcategories: IndexMap<String, Vec<PageDescriptor>>,
    pub pages: Vec<PageDescriptor>,
}

/// Category name → entry, in first-seen order.
pub type Hierarchy = IndexMap<String, CategoryEntry>;

#[derive(Debug, Clone, Default)]
pub struct Toc {
    pub pages: Vec<PageDescriptor>,
    pub hierarchy: Hierarchy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocEvent {
    CategoryStart(String),
    SubcategoryStart(String),
    PageLink { href: String, title: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Category,
    Subcategory,
}

/// Parse a table-of-contents document into the flat page list and the hierarchy.
pub fn parse_toc(html: &str, base_url: &Url) -> Toc {
    fold_events(scan_events(html), base_url)
}

/// Walk `img` and `a` elements in document order and classify them.
///
/// A marker image names the anchor that immediately follows it; any other
/// element in between cancels the marker.
pub fn scan_events(html: &str) -> Vec<TocEvent> {
    let document = Html::parse_document(html);
    let mut events = Vec::new();
    let mut armed: Option<Marker> = None;

    for element in document.select(&MARKER_OR_LINK) {
        let pending = armed.take();
        let node = element.value();

        if node.name() == "img" {
            let src = node.attr("src").unwrap_or_default();
            if src.contains(CATEGORY_MARKER) {
                armed = Some(Marker::Category);
            } else if src.contains(SUBCATEGORY_MARKER) {
                armed = Some(Marker::Subcategory);
            }
            continue;
        }

        match pending {
            Some(Marker::Category) => events.push(TocEvent::CategoryStart(display_title(element))),
            Some(Marker::Subcategory) => {
                events.push(TocEvent::SubcategoryStart(display_title(element)))
            }
            None => {}
        }

        if !node.classes().eq([TOC_ITEM_CLASS]) {
            continue;
        }
        match node.attr("href") {
            Some(href) if href.ends_with(PAGE_EXTENSION) => events.push(TocEvent::PageLink {
                href: href.to_string(),
                title: display_title(element),
            }),
            Some(href) => debug!("Skipping non-page TOC link {}", href),
            None => {}
        }
    }

    events
}

/// Reduce the event stream into a [`Toc`].
///
/// Links that cannot be resolved against the base URL are logged and left out.
pub fn fold_events(events: Vec<TocEvent>, base_url: &Url) -> Toc {
    let mut builder = TocBuilder::new(base_url);
    for event in events {
        builder.apply(event);
    }
    builder.toc
}

/// Accumulator for [`fold_events`]: the table so far plus the current position in it.
struct TocBuilder<'a> {
    base_url: &'a Url,
    toc: Toc,
    category: String,
    subcategory: Option<String>,
}

impl<'a> TocBuilder<'a> {
    fn new(base_url: &'a Url) -> Self {
        TocBuilder {
            base_url,
            toc: Toc::default(),
            category: DEFAULT_CATEGORY.to_string(),
            subcategory: None,
        }
    }

    fn apply(&mut self, event: TocEvent) {
        match event {
            TocEvent::CategoryStart(name) => {
                self.toc.hierarchy.entry(name.clone()).or_default();
                self.category = name;
                self.subcategory = None;
            }
            TocEvent::SubcategoryStart(name) => {
                if let Some(entry) = self.toc.hierarchy.get_mut(&self.category) {
                    entry.subcategories.entry(name.clone()).or_default();
                }
                self.subcategory = Some(name);
            }
            TocEvent::PageLink { href, title } => {
                let url = match self.base_url.join(&href) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("Skipping TOC entry {:?} ({}): {}", title, href, e);
                        return;
                    }
                };
                let page = PageDescriptor {
                    url: url.to_string(),
                    title,
                    category: self.category.clone(),
                    subcategory: self.subcategory.clone(),
                    filename: basename(&href).to_string(),
                };
                self.place(&page);
                self.toc.pages.push(page);
            }
        }
    }

    /// Pages of an unregistered category stay out of the hierarchy; pages of an
    /// unregistered subcategory go to the category's own list.
    fn place(&mut self, page: &PageDescriptor) {
        let Some(entry) = self.toc.hierarchy.get_mut(&self.category) else {
            return;
        };
        let registered = self
            .subcategory
            .as_ref()
            .and_then(|sub| entry.subcategories.get_mut(sub));
        match registered {
            Some(pages) => pages.push(page.clone()),
            None => entry.pages.push(page.clone()),
        }
    }
}

/// Non-empty `title` attribute, else the link text.
fn display_title(element: ElementRef<'_>) -> String {
    match element.value().attr("title").map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => element.text().collect::<String>().trim().to_string(),
    }
}

// ── Tests ──
