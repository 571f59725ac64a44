/// Front-matter block plus the title heading, ready to be prepended to a page body.
pub fn front_matter(
    title: &str,
    url: &str,
    category: &str,
    subcategory: Option<&str>,
    related: &[String],
) -> String {
    format!(
        "---\ntitle: {title}\nurl: {url}\ncategory: {category}\nsubcategory: {}\nrelated_pages:\n{}\n---\n\n# {title}\n\n",
        subcategory.unwrap_or("None"),
        related.join("\n"),
    )
}
