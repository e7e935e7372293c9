// src/crawl/extract.rs
// =============================================================================
// This module pulls crawlable links out of a fetched page.
//
// Steps:
// 1. Parse the body with scraper (html5ever underneath)
// 2. Collect every <a href="..."> value
// 3. Resolve each href against the page URL (relative, protocol-relative,
//    fragment-only...) the same way a browser does; only fragment-only
//    hrefs lose their fragment
// 4. Keep only URLs that pass the UrlFilter and aren't visited yet
//
// Step 4's visited check is only a pre-filter: the frontier re-checks before
// enqueueing because other pages in the same batch may find the same URL.
// =============================================================================

use std::collections::HashSet;
use std::sync::OnceLock;

use scraper::{Html, Selector};
use url::Url;

use super::scope::UrlFilter;

fn anchor_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    // "a[href]" is a constant, known-valid selector
    SELECTOR.get_or_init(|| Selector::parse("a[href]").unwrap())
}

// Extracts new, in-scope links from a page body
//
// Parameters:
//   body: the HTML text returned by the fetcher
//   base_url: the URL the body was fetched from
//   filter: same-domain + extension predicate
//   visited: the crawl's visited set as of this batch (read-only)
//
// Returns: absolute URLs, de-duplicated
//
// Example:
//   body = "<a href='/a.html'>A</a><a href='https://other.com/b.html'>B</a>"
//   base_url = "https://example.com/"
//   result = {"https://example.com/a.html"}
pub fn extract_links(
    body: &str,
    base_url: &str,
    filter: &UrlFilter,
    visited: &HashSet<String>,
) -> HashSet<String> {
    let base = match Url::parse(base_url) {
        Ok(url) => url,
        Err(_) => return HashSet::new(),
    };

    let document = Html::parse_document(body);

    document
        .select(anchor_selector())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_href(&base, href))
        .filter(|url| filter.should_process(url) && !visited.contains(url))
        .collect()
}

// Resolves an href against the page it was found on
//
// A fragment-only href ("#top") is the page itself, so it resolves to the
// base without a fragment. Any other href keeps its fragment: URLs compare
// as raw strings, and "/b.html#x" is not "/b.html".
//
// Examples:
//   base = "https://example.com/docs/page.html"
//   "intro.html"               -> "https://example.com/docs/intro.html"
//   "../about"                 -> "https://example.com/about"
//   "//example.com/x.html"     -> "https://example.com/x.html"
//   "#section"                 -> "https://example.com/docs/page.html"
//   "/b.html#x"                -> "https://example.com/b.html#x"
fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    let mut url = base.join(href).ok()?;
    if href.starts_with('#') {
        url.set_fragment(None);
    }
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::scope::HostScope;

    fn filter() -> UrlFilter {
        let scope = HostScope::from_seed("https://example.com/").unwrap();
        UrlFilter::new(scope, ["", ".htm", ".html"])
    }

    #[test]
    fn test_resolves_relative_links() {
        let html = r#"
            <a href="intro.html">Intro</a>
            <a href="../about">About</a>
            <a href="/contact.htm">Contact</a>
        "#;
        let links = extract_links(
            html,
            "https://example.com/docs/page.html",
            &filter(),
            &HashSet::new(),
        );

        assert_eq!(links.len(), 3);
        assert!(links.contains("https://example.com/docs/intro.html"));
        assert!(links.contains("https://example.com/about"));
        assert!(links.contains("https://example.com/contact.htm"));
    }

    #[test]
    fn test_protocol_relative_and_fragment_links() {
        let html = r##"
            <a href="//example.com/x.html">X</a>
            <a href="#section">Same page</a>
        "##;
        let links = extract_links(
            html,
            "https://example.com/docs/page.html",
            &filter(),
            &HashSet::new(),
        );

        assert!(links.contains("https://example.com/x.html"));
        assert!(links.contains("https://example.com/docs/page.html"));
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_fragment_on_other_page_is_kept() {
        let html = r##"
            <a href="/b.html#x">B, section x</a>
            <a href="/b.html">B</a>
        "##;
        let links = extract_links(html, "https://example.com/a.html", &filter(), &HashSet::new());

        let expected: HashSet<String> = [
            "https://example.com/b.html#x".to_string(),
            "https://example.com/b.html".to_string(),
        ]
        .into();
        assert_eq!(links, expected);
    }

    #[test]
    fn test_fragment_link_to_visited_page_is_dropped() {
        let html = r##"<a href="#top">Top</a>"##;
        let visited: HashSet<String> = ["https://example.com/a.html".to_string()].into();
        let links = extract_links(html, "https://example.com/a.html", &filter(), &visited);
        assert!(links.is_empty());
    }

    #[test]
    fn test_filters_out_of_scope_and_non_html() {
        let html = r#"
            <a href="https://example.com/a.html">A</a>
            <a href="https://other.com/b.html">B</a>
            <a href="/logo.png">Logo</a>
            <a href="mailto:hi@example.com">Mail</a>
            <a href="javascript:void(0)">JS</a>
            <a>No href</a>
        "#;
        let links = extract_links(html, "https://example.com/", &filter(), &HashSet::new());

        let expected: HashSet<String> = ["https://example.com/a.html".to_string()].into();
        assert_eq!(links, expected);
    }

    #[test]
    fn test_skips_visited_and_dedupes() {
        let html = r#"
            <a href="/a.html">A</a>
            <a href="/a.html">A again</a>
            <a href="/b.html">B</a>
        "#;
        let visited: HashSet<String> = ["https://example.com/b.html".to_string()].into();
        let links = extract_links(html, "https://example.com/", &filter(), &visited);

        let expected: HashSet<String> = ["https://example.com/a.html".to_string()].into();
        assert_eq!(links, expected);
    }

    #[test]
    fn test_invalid_base_url_yields_nothing() {
        let html = r#"<a href="/a.html">A</a>"#;
        let links = extract_links(html, "not a url", &filter(), &HashSet::new());
        assert!(links.is_empty());
    }
}
