// src/pairs/page.rs
// =============================================================================
// Turns one article page into Vietnamese/English sentence pairs.
//
// Bilingual articles alternate paragraphs inside the post body:
//   <div class="entry-content">
//     <p>Xin chào.</p>   <p>Hello.</p>
//     <p>Cảm ơn.</p>     <p>Thank you.</p>
//   </div>
//
// We walk consecutive paragraphs and keep every neighbour pair where one side
// is Vietnamese and the other English.
// =============================================================================

use std::sync::OnceLock;

use scraper::{ElementRef, Html, Selector};

use super::lang::{Lang, LanguageDetector};

/// (vietnamese, english)
pub type Pair = (String, String);

fn content_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("div.entry-content").unwrap())
}

fn paragraph_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("p").unwrap())
}

// Paragraph texts of the first `div.entry-content`, in document order
//
// A page without that container has no article body and yields nothing.
pub fn paragraphs(body: &str) -> Vec<String> {
    let document = Html::parse_document(body);

    let Some(content) = document.select(content_selector()).next() else {
        return Vec::new();
    };

    content
        .select(paragraph_selector())
        .map(|p| clean_text(&paragraph_text(p)))
        .collect()
}

// Every text node trimmed, then glued together without separators
fn paragraph_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

// Drops non-breaking and zero-width spaces left over from the CMS
fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\u{a0}' && *c != '\u{200b}')
        .collect()
}

// Pairs up neighbouring paragraphs
//
// Every adjacent (i, i+1) is checked, so in a vi/en/vi run the middle
// paragraph pairs with both of its neighbours.
pub fn pair_paragraphs(paragraphs: &[String], detector: &LanguageDetector) -> Vec<Pair> {
    paragraphs
        .windows(2)
        .filter_map(|window| classify(&window[0], &window[1], detector))
        .collect()
}

fn classify(first: &str, second: &str, detector: &LanguageDetector) -> Option<Pair> {
    if first.is_empty() || second.is_empty() {
        return None;
    }

    match (detector.detect(first)?, detector.detect(second)?) {
        (Lang::Vietnamese, Lang::English) => Some((first.to_string(), second.to_string())),
        (Lang::English, Lang::Vietnamese) => Some((second.to_string(), first.to_string())),
        _ => None,
    }
}
