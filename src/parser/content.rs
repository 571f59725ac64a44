//! Page markup → Markdown.
//!
//! Code regions are lifted out of the document before the generic converter
//! runs and put back afterwards by id, so their text survives untouched.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::LazyLock;

use ego_tree::{NodeId, NodeRef};
use htmd::HtmlToMarkdown;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::ExtractError;

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static CODE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("pre, code, .wp_codebox").unwrap());
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

const UNTITLED: &str = "Untitled";
const DEFAULT_LANGUAGE: &str = "c";
const TOKEN_STEM: &str = "ZDOCCODE";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDocument {
    pub title: String,
    pub markdown: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: &'static str,
    pub text: String,
}

impl CodeBlock {
    fn fenced(&self) -> String {
        format!("```{}\n{}\n```", self.language, self.text.trim())
    }
}

/// Convert one documentation page to Markdown.
pub fn convert(html: &str) -> Result<ConvertedDocument, ExtractError> {
    convert_with(html, |stripped| converter().convert(stripped))
}

fn convert_with<F>(html: &str, to_markdown: F) -> Result<ConvertedDocument, ExtractError>
where
    F: FnOnce(&str) -> io::Result<String>,
{
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let blocks = extract_code_blocks(&document);
    let prefix = token_prefix(&decoded_haystack(html, &document));

    let mut tokens = HashMap::with_capacity(blocks.len());
    for (index, (id, _)) in blocks.iter().enumerate() {
        tokens.insert(*id, format!("{prefix}{index}E"));
    }
    let mut stripped = String::with_capacity(html.len());
    serialize(document.tree.root(), &tokens, &mut stripped);

    let converted = to_markdown(&stripped).map_err(ExtractError::Convert)?;
    let code: Vec<CodeBlock> = blocks.into_iter().map(|(_, block)| block).collect();
    let restored = restore_code_blocks(&converted, &prefix, &code);

    Ok(ConvertedDocument {
        title,
        markdown: BLANK_RUNS.replace_all(&restored, "\n\n").into_owned(),
    })
}

fn converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .skip_tags(vec!["head", "script", "style"])
        .build()
}

/// Outermost code regions in document order. A `code` nested in a `pre`
/// belongs to the `pre`.
fn extract_code_blocks(document: &Html) -> Vec<(NodeId, CodeBlock)> {
    let regions: Vec<ElementRef<'_>> = document.select(&CODE_SELECTOR).collect();
    let ids: HashSet<NodeId> = regions.iter().map(|r| r.id()).collect();

    regions
        .into_iter()
        .filter(|region| !region.ancestors().any(|a| ids.contains(&a.id())))
        .map(|region| {
            let block = CodeBlock {
                language: detect_language(region),
                text: region.text().collect(),
            };
            (region.id(), block)
        })
        .collect()
}

/// Language from the region's class list; the manual's scripts are C by default.
pub fn detect_language(region: ElementRef<'_>) -> &'static str {
    let classes = region
        .value()
        .classes()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if classes.contains("python") {
        "python"
    } else if classes.contains("javascript") || classes.contains("js") {
        "javascript"
    } else if classes.contains("rsplus") {
        "r"
    } else {
        DEFAULT_LANGUAGE
    }
}

/// Raw markup, then every text node run together, then every attribute value:
/// whatever the converter may emit is covered once references are decoded.
fn decoded_haystack(html: &str, document: &Html) -> String {
    let mut haystack = String::with_capacity(html.len() * 2);
    haystack.push_str(html);
    haystack.push('\n');
    haystack.extend(document.root_element().text());
    for node in document.tree.values() {
        if let Node::Element(element) = node {
            for (_, value) in element.attrs() {
                haystack.push('\n');
                haystack.push_str(value);
            }
        }
    }
    haystack
}

/// A placeholder stem that does not occur anywhere in `haystack`, so every
/// match after conversion is one of ours.
fn token_prefix(haystack: &str) -> String {
    (0u32..)
        .map(|nonce| format!("{TOKEN_STEM}{nonce}X"))
        .find(|prefix| !haystack.contains(prefix.as_str()))
        .unwrap_or_else(|| TOKEN_STEM.to_string())
}

fn restore_code_blocks(markdown: &str, prefix: &str, blocks: &[CodeBlock]) -> String {
    let pattern = Regex::new(&format!(r"{}(\d+)E", regex::escape(prefix)))
        .expect("escaped token prefix is a valid pattern");
    pattern
        .replace_all(markdown, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| blocks.get(i))
                .map(CodeBlock::fenced)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Re-emit the parsed tree as HTML, swapping each code region for its token.
fn serialize(node: NodeRef<'_, Node>, tokens: &HashMap<NodeId, String>, out: &mut String) {
    if let Some(token) = tokens.get(&node.id()) {
        out.push_str("<p>");
        out.push_str(token);
        out.push_str("</p>");
        return;
    }

    match node.value() {
        Node::Text(text) => out.push_str(&html_escape::encode_text(&**text)),
        Node::Element(element) => {
            let name = element.name();
            out.push('<');
            out.push_str(name);
            for (key, value) in element.attrs() {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(value));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&name) {
                return;
            }
            for child in node.children() {
                serialize(child, tokens, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                serialize(child, tokens, out);
            }
        }
        _ => {}
    }
}

// ── Tests ──
