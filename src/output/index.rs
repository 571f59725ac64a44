use std::fmt::Write;
use std::path::Path;

use tracing::info;

use super::layout::{category_dir, markdown_filename, sanitize, subcategory_dir};
use super::write_file;
use crate::error::ExtractError;
use crate::parser::toc::{CategoryEntry, Hierarchy, PageDescriptor};

pub const INDEX_FILE: &str = "index.md";
const ROOT_HEADING: &str = "# Zorro Documentation Index";

/// Write the root index, one index per category, and one per non-empty subcategory.
pub fn write_indexes(root: &Path, hierarchy: &Hierarchy) -> Result<(), ExtractError> {
    write_file(&root.join(INDEX_FILE), &render_root_index(hierarchy))?;

    for (category, entry) in hierarchy {
        for (subcategory, pages) in &entry.subcategories {
            if pages.is_empty() {
                continue;
            }
            let path = subcategory_dir(root, category, subcategory).join(INDEX_FILE);
            write_file(&path, &render_subcategory_index(category, subcategory, pages))?;
        }
        let path = category_dir(root, category).join(INDEX_FILE);
        write_file(&path, &render_category_index(category, entry))?;
    }

    info!("Wrote indexes for {} categories", hierarchy.len());
    Ok(())
}

pub fn render_root_index(hierarchy: &Hierarchy) -> String {
    let mut out = format!("{ROOT_HEADING}\n\n");

    for (category, entry) in hierarchy {
        let cat_dir = sanitize(category);
        let _ = writeln!(out, "## {category}\n");
        push_links(&mut out, &entry.pages, &format!("{cat_dir}/"));

        for (subcategory, pages) in &entry.subcategories {
            if pages.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n### {subcategory}\n");
            push_links(&mut out, pages, &format!("{cat_dir}/{}/", sanitize(subcategory)));
        }
        out.push('\n');
    }

    out
}

pub fn render_category_index(category: &str, entry: &CategoryEntry) -> String {
    let mut out = format!("# {category}\n\n");

    if !entry.pages.is_empty() {
        out.push_str("## Pages\n\n");
        push_links(&mut out, &entry.pages, "");
        out.push('\n');
    }

    if !entry.subcategories.is_empty() {
        out.push_str("## Subcategories\n\n");
        for (subcategory, pages) in &entry.subcategories {
            let _ = writeln!(out, "### {subcategory}\n");
            push_links(&mut out, pages, &format!("{}/", sanitize(subcategory)));
            out.push('\n');
        }
    }

    out
}

pub fn render_subcategory_index(
    category: &str,
    subcategory: &str,
    pages: &[PageDescriptor],
) -> String {
    let mut out =
        format!("# {subcategory}\n\nPart of [{category}](../{INDEX_FILE})\n\n## Pages\n\n");
    push_links(&mut out, pages, "");
    out
}

fn push_links(out: &mut String, pages: &[PageDescriptor], prefix: &str) {
    for page in pages {
        let _ = writeln!(
            out,
            "- [{}]({prefix}{})",
            page.title,
            markdown_filename(&page.filename)
        );
    }
}

// ── Tests ──
