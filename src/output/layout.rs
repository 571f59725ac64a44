use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use super::index::INDEX_FILE;
use crate::error::ExtractError;
use crate::parser::toc::{PageDescriptor, Toc};

const UNSAFE_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|', ' '];

/// Make a name usable as a single path segment.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Output file name for a page file: `foo.htm` → `foo.md`, sanitized.
pub fn markdown_filename(filename: &str) -> String {
    sanitize(&filename.replace(".htm", ".md"))
}

pub fn category_dir(root: &Path, category: &str) -> PathBuf {
    root.join(sanitize(category))
}

pub fn subcategory_dir(root: &Path, category: &str, subcategory: &str) -> PathBuf {
    category_dir(root, category).join(sanitize(subcategory))
}

/// `<root>/<category>/[<subcategory>/]<file>.md`
pub fn page_path(root: &Path, page: &PageDescriptor) -> PathBuf {
    let dir = match &page.subcategory {
        Some(sub) => subcategory_dir(root, &page.category, sub),
        None => category_dir(root, &page.category),
    };
    dir.join(markdown_filename(&page.filename))
}

/// Reject distinct sibling names that would share a directory.
pub fn check_collisions(toc: &Toc) -> Result<(), ExtractError> {
    let mut tree: IndexMap<&str, Vec<&str>> = IndexMap::new();
    for (category, entry) in &toc.hierarchy {
        tree.entry(category.as_str())
            .or_default()
            .extend(entry.subcategories.keys().map(String::as_str));
    }
    for page in &toc.pages {
        let subs = tree.entry(page.category.as_str()).or_default();
        subs.extend(page.subcategory.as_deref());
    }

    check_siblings("<root>", tree.keys().copied())?;
    for (category, subs) in &tree {
        check_siblings(category, subs.iter().copied())?;
    }
    check_index_files(toc)
}

/// Indexed directories get a generated `index.md`; no page may claim that name.
fn check_index_files(toc: &Toc) -> Result<(), ExtractError> {
    for (category, entry) in &toc.hierarchy {
        let indexed = entry
            .pages
            .iter()
            .map(|page| (category.clone(), page))
            .chain(entry.subcategories.iter().flat_map(|(sub, pages)| {
                pages.iter().map(move |page| (format!("{category}/{sub}"), page))
            }));
        for (parent, page) in indexed {
            if markdown_filename(&page.filename) == INDEX_FILE {
                return Err(ExtractError::PathCollision {
                    parent,
                    first: page.filename.clone(),
                    second: "generated index".to_string(),
                    sanitized: INDEX_FILE.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn check_siblings<'a>(
    parent: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ExtractError> {
    let mut claimed: HashMap<String, &str> = HashMap::new();
    for name in names {
        let sanitized = sanitize(name);
        match claimed.get(&sanitized) {
            Some(first) if *first != name => {
                return Err(ExtractError::PathCollision {
                    parent: parent.to_string(),
                    first: first.to_string(),
                    second: name.to_string(),
                    sanitized,
                });
            }
            Some(_) => {}
            None => {
                claimed.insert(sanitized, name);
            }
        }
    }
    Ok(())
}

/// Output root, every category directory, and every subcategory that has pages.
pub fn create_dirs(root: &Path, toc: &Toc) -> Result<(), ExtractError> {
    fs::create_dir_all(root).map_err(|e| ExtractError::io(root, e))?;
    for (category, entry) in &toc.hierarchy {
        let dir = category_dir(root, category);
        fs::create_dir_all(&dir).map_err(|e| ExtractError::io(&dir, e))?;
        for (subcategory, pages) in &entry.subcategories {
            if pages.is_empty() {
                continue;
            }
            let dir = subcategory_dir(root, category, subcategory);
            fs::create_dir_all(&dir).map_err(|e| ExtractError::io(&dir, e))?;
        }
    }
    Ok(())
}

// ── Tests ──
