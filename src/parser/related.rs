use std::collections::{HashMap, HashSet};

use scraper::Html;
use tracing::debug;
use url::Url;

use super::toc::PageDescriptor;
use super::{basename, ANCHOR_SELECTOR, PAGE_EXTENSION};

pub const NO_RELATED: &str = "- None";

/// Markdown link lines to other known pages this page links to, in document order.
pub fn related_pages(html: &str, pages: &[PageDescriptor], current_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(current_url) else {
        debug!("Cannot resolve links against {}", current_url);
        return vec![NO_RELATED.to_string()];
    };

    let mut by_url: HashMap<&str, &PageDescriptor> = HashMap::with_capacity(pages.len());
    for page in pages {
        by_url.entry(page.url.as_str()).or_insert(page);
    }

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut related = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.ends_with(PAGE_EXTENSION) {
            continue;
        }
        let target = match base.join(href) {
            Ok(url) => url,
            Err(e) => {
                debug!("Skipping link {:?} on {}: {}", href, current_url, e);
                continue;
            }
        };
        if target.as_str() == current_url {
            continue;
        }
        if let Some(page) = by_url.get(target.as_str()) {
            let line = format!("- [{}]({})", page.title, basename(href));
            if seen.insert(line.clone()) {
                related.push(line);
            }
        }
    }

    if related.is_empty() {
        related.push(NO_RELATED.to_string());
    }
    related
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://zorro-project.com/manual/";

    fn descriptor(file: &str, title: &str) -> PageDescriptor {
        PageDescriptor {
            url: format!("{BASE}{file}"),
            title: title.into(),
            category: "Cat".into(),
            subcategory: None,
            filename: file.into(),
        }
    }

    fn known() -> Vec<PageDescriptor> {
        vec![
            descriptor("started.htm", "Getting Started"),
            descriptor("buylong.htm", "enterLong, enterShort"),
            descriptor("selllong.htm", "exitLong, exitShort"),
        ]
    }

    #[test]
    fn fixture_links_resolved_without_self() {
        let html = std::fs::read_to_string("tests/fixtures/page.htm").unwrap();
        let current = format!("{BASE}buylong.htm");
        let related = related_pages(&html, &known(), &current);
        assert_eq!(
            related,
            vec![
                "- [exitLong, exitShort](selllong.htm)".to_string(),
                "- [Getting Started](started.htm)".to_string(),
            ]
        );
    }

    #[test]
    fn self_link_only_gives_none() {
        let html = r#"<a href="buylong.htm">me</a><a href="./buylong.htm">me again</a>"#;
        let related = related_pages(html, &known(), &format!("{BASE}buylong.htm"));
        assert_eq!(related, vec![NO_RELATED.to_string()]);
    }

    #[test]
    fn unknown_and_non_page_links_ignored() {
        let html = r#"
            <a href="missing.htm">x</a>
            <a href="started.html">y</a>
            <a href="https://example.com/started.htm">z</a>
            <a href="../manual/started.htm">ok</a>"#;
        let related = related_pages(html, &known(), &format!("{BASE}buylong.htm"));
        assert_eq!(related, vec!["- [Getting Started](started.htm)".to_string()]);
    }

    #[test]
    fn first_matching_descriptor_wins() {
        let mut pages = known();
        pages.push(descriptor("started.htm", "Duplicate"));
        let html = r#"<a href="started.htm">s</a>"#;
        let related = related_pages(html, &pages, &format!("{BASE}buylong.htm"));
        assert_eq!(related, vec!["- [Getting Started](started.htm)".to_string()]);
    }
}
