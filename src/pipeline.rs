use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::settings::Settings;
use crate::error::ExtractError;
use crate::fetch::Fetch;
use crate::output::front_matter::front_matter;
use crate::output::{index, layout, write_file};
use crate::parser::content::convert;
use crate::parser::related::related_pages;
use crate::parser::toc::{parse_toc, PageDescriptor};

/// Counts returned after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Fetch the TOC, write one Markdown file per page, then the indexes.
pub async fn run<F: Fetch>(settings: &Settings, fetcher: &F) -> Result<RunStats> {
    let toc_url = settings.toc_url()?;
    let base_url = settings.base_url()?;
    let root = PathBuf::from(&settings.output_dir);

    println!("Getting documentation structure...");
    let toc_html = fetcher
        .fetch(toc_url.as_str())
        .await
        .context("Failed to fetch table of contents")?;
    let toc = parse_toc(&toc_html, &base_url);
    println!("Found {} documentation pages", toc.pages.len());

    layout::check_collisions(&toc)?;
    layout::create_dirs(&root, &toc)?;

    let selected = match settings.limit {
        Some(n) => &toc.pages[..n.min(toc.pages.len())],
        None => &toc.pages[..],
    };
    let total = selected.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut stats = RunStats {
        total,
        ..RunStats::default()
    };

    for (i, page) in selected.iter().enumerate() {
        if i > 0 && !settings.delay().is_zero() {
            tokio::time::sleep(settings.delay()).await;
        }
        pb.suspend(|| println!("Processing {}/{}: {}", i + 1, total, page.title));

        match process_page(fetcher, &root, page, &toc.pages).await {
            Ok(path) => {
                stats.ok += 1;
                info!("Saved {}", path.display());
            }
            Err(e) => {
                stats.errors += 1;
                pb.suspend(|| warn!("Error processing {}: {}", page.url, e));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!("Generating index files...");
    index::write_indexes(&root, &toc.hierarchy).context("Failed to write index files")?;

    println!(
        "Documentation extraction complete! Files saved to {} ({} ok, {} errors)",
        root.display(),
        stats.ok,
        stats.errors
    );
    Ok(stats)
}

/// Fetch → convert → related pages → header → write, for one page.
async fn process_page<F: Fetch>(
    fetcher: &F,
    root: &Path,
    page: &PageDescriptor,
    all_pages: &[PageDescriptor],
) -> Result<PathBuf, ExtractError> {
    let html = fetcher.fetch(&page.url).await?;
    let doc = convert(&html)?;
    let related = related_pages(&html, all_pages, &page.url);

    let mut contents = front_matter(
        &doc.title,
        &page.url,
        &page.category,
        page.subcategory.as_deref(),
        &related,
    );
    contents.push_str(&doc.markdown);

    let path = layout::page_path(root, page);
    write_file(&path, &contents)?;
    Ok(path)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const BASE: &str = "https://zorro-project.com/manual/";

    /// Serves canned pages; anything else is a 404.
    struct StaticSite {
        pages: HashMap<String, String>,
    }

    impl StaticSite {
        fn new(pages: &[(&str, &str)]) -> Self {
            StaticSite {
                pages: pages
                    .iter()
                    .map(|(path, html)| (format!("{BASE}{path}"), html.to_string()))
                    .collect(),
            }
        }
    }

    impl Fetch for StaticSite {
        async fn fetch(&self, url: &str) -> Result<String, ExtractError> {
            self.pages.get(url).cloned().ok_or_else(|| ExtractError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
        }
    }

    fn settings(root: &Path) -> Settings {
        Settings {
            output_dir: root.join("zorro_docs").to_string_lossy().into_owned(),
            delay_ms: 0,
            ..Settings::default()
        }
    }

    const BASICS_TOC: &str = r#"<html><body>
        <img src="p4.gif"><a href="basics.htm">Basics</a>
        <a class="clsTOCItem" href="intro.htm">Intro</a>
        </body></html>"#;

    #[tokio::test]
    async fn basics_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let site = StaticSite::new(&[
            ("ht_contents.htm", BASICS_TOC),
            (
                "intro.htm",
                "<html><head><title>Intro</title></head><body><p>Hello</p><pre>int x = 1;</pre></body></html>",
            ),
        ]);

        let stats = run(&settings(tmp.path()), &site).await.unwrap();
        assert_eq!(stats, RunStats { total: 1, ok: 1, errors: 0 });

        let root = tmp.path().join("zorro_docs");
        assert!(root.join("index.md").is_file());
        assert!(root.join("Basics/index.md").is_file());

        let intro = std::fs::read_to_string(root.join("Basics/intro.md")).unwrap();
        assert!(intro.starts_with("---\ntitle: Intro\nurl: https://zorro-project.com/manual/intro.htm\n"));
        assert!(intro.contains("\ncategory: Basics\n"));
        assert!(intro.contains("\nsubcategory: None\n"));
        assert!(intro.contains("related_pages:\n- None\n---\n\n# Intro\n\n"));
        assert!(intro.contains("```c\nint x = 1;\n```"));

        let root_index = std::fs::read_to_string(root.join("index.md")).unwrap();
        assert!(root_index.contains("- [Intro](Basics/intro.md)"));
    }

    #[tokio::test]
    async fn failed_page_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let toc = r#"<html><body>
            <img src="p4.gif"><a href="x.htm">Cat</a>
            <img src="p3.gif"><a href="y.htm">Sub One</a>
            <a class="clsTOCItem" href="gone.htm">Gone</a>
            <a class="clsTOCItem" href="here.htm">Here</a>
            </body></html>"#;
        let site = StaticSite::new(&[
            ("ht_contents.htm", toc),
            (
                "here.htm",
                r#"<html><head><title>Here</title></head><body><a href="gone.htm">g</a></body></html>"#,
            ),
        ]);

        let stats = run(&settings(tmp.path()), &site).await.unwrap();
        assert_eq!(stats, RunStats { total: 2, ok: 1, errors: 1 });

        let root = tmp.path().join("zorro_docs");
        let here = std::fs::read_to_string(root.join("Cat/Sub_One/here.md")).unwrap();
        assert!(here.contains("\nsubcategory: Sub One\n"));
        assert!(here.contains("related_pages:\n- [Gone](gone.htm)\n---"));
        assert!(!root.join("Cat/Sub_One/gone.md").exists());
        // Indexes still list every page from the TOC.
        assert!(root.join("Cat/Sub_One/index.md").is_file());
    }

    #[tokio::test]
    async fn limit_caps_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let toc = r#"<html><body>
            <img src="p4.gif"><a href="x.htm">Cat</a>
            <a class="clsTOCItem" href="a.htm">A</a>
            <a class="clsTOCItem" href="b.htm">B</a>
            </body></html>"#;
        let site = StaticSite::new(&[
            ("ht_contents.htm", toc),
            ("a.htm", "<html><body>a</body></html>"),
            ("b.htm", "<html><body>b</body></html>"),
        ]);
        let settings = Settings {
            limit: Some(1),
            ..settings(tmp.path())
        };

        let stats = run(&settings, &site).await.unwrap();
        assert_eq!(stats.total, 1);
        let root = tmp.path().join("zorro_docs");
        assert!(root.join("Cat/a.md").is_file());
        assert!(!root.join("Cat/b.md").exists());
    }

    #[tokio::test]
    async fn missing_toc_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let site = StaticSite::new(&[]);
        assert!(run(&settings(tmp.path()), &site).await.is_err());
        assert!(!tmp.path().join("zorro_docs").exists());
    }

    #[tokio::test]
    async fn collision_is_fatal_before_downloads() {
        let tmp = tempfile::tempdir().unwrap();
        let toc = r#"<html><body>
            <img src="p4.gif"><a href="x.htm">A B</a>
            <a class="clsTOCItem" href="a.htm">A</a>
            <img src="p4.gif"><a href="y.htm">A:B</a>
            <a class="clsTOCItem" href="b.htm">B</a>
            </body></html>"#;
        let site = StaticSite::new(&[("ht_contents.htm", toc)]);
        let err = run(&settings(tmp.path()), &site).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExtractError>(),
            Some(ExtractError::PathCollision { .. })
        ));
    }
}
