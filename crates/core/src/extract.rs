//! Selector-fallback extraction over parsed HTML.
//!
//! The source website changes its markup often, so every lookup is an
//! ordered list of selectors tried in priority order; the first tier
//! that clears its content-length gate wins.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Containers that have historically held one search result each.
const RESULT_ITEM_SELECTORS: &[&str] = &[
    ".card",
    ".card-body",
    ".search-result",
    ".search-result-item",
    ".row .col-md-12",
];

/// Title anchors inside a result container, most specific first.
const TITLE_SELECTORS: &[&str] = &[
    "h3.fw-bold.text-gray-800.mb-5 a",
    "h3 a",
    ".fw-bold.text-gray-800 a",
    r#"a[href*="/Home/Detail/"]"#,
    "a",
];

/// Main-content regions on a detail page.
const CONTENT_SELECTORS: &[&str] = &[
    ".card-body",
    "main .container",
    ".document-content",
    ".content",
    "article",
    "#mainContent",
    ".detail-content",
];

const META_SELECTORS: &[&str] = &[
    ".text-gray-600 span, .text-muted span, small, .card-text small",
    ".search-result-item-meta span",
];

const PREVIEW_SELECTORS: &[&str] = &[".card-text", ".search-result-item-preview"];

const PAGINATION_SELECTORS: &[&str] = &[
    ".pagination .next:not(.disabled)",
    ".pagination .page-item:not(.active):not(.disabled) .page-link",
];

const DETAIL_ANCHOR_SELECTOR: &str = r#"a[href*="/Home/Detail/"]"#;

/// Tier-1 gate: a named content region shorter than this is treated as
/// a false positive.
const MIN_REGION_CHARS: usize = 100;

/// Overall gate: detail-page content below this is "no content" and the
/// caller falls through to the PDF route.
pub const MIN_CONTENT_CHARS: usize = 200;

/// One entry on a search-results page, already resolved to an absolute
/// detail-page link.
#[derive(Debug, Clone)]
pub struct ResultItem {
    pub title: String,
    pub link: Url,
    pub doc_type: String,
    pub date: String,
    pub preview: String,
}

#[derive(Debug, Clone)]
pub struct SearchPage {
    pub items: Vec<ResultItem>,
    pub has_next: bool,
}

/// A `.pdf`-suffixed anchor found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLink {
    pub url: String,
    pub text: String,
    pub source_page: String,
}

fn parse_selector(raw: &str) -> Option<Selector> {
    Selector::parse(raw).ok()
}

/// Text of an element: trimmed text nodes joined with newlines,
/// matching the original site's line-oriented content.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_detail_href(href: &str) -> bool {
    href.contains("/Home/Detail/") || href.contains("/Details/")
}

/// First-success-wins over a selector list: the text of the first
/// element matched by the first selector that matches anything, gated
/// on a minimum trimmed length.
pub fn select_first_text(document: &Html, selectors: &[&str], min_chars: usize) -> Option<String> {
    for raw in selectors {
        let Some(selector) = parse_selector(raw) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = element_text(element);
            if text.chars().count() >= min_chars {
                debug!(selector = raw, chars = text.len(), "selector matched");
                return Some(text);
            }
        }
    }
    None
}

fn first_nonempty_selection<'a>(document: &'a Html, selectors: &[&str]) -> Vec<ElementRef<'a>> {
    for raw in selectors {
        let Some(selector) = parse_selector(raw) else {
            continue;
        };
        let matches: Vec<_> = document.select(&selector).collect();
        if !matches.is_empty() {
            debug!(selector = raw, count = matches.len(), "result items located");
            return matches;
        }
    }
    Vec::new()
}

fn title_anchor<'a>(container: ElementRef<'a>) -> Option<ElementRef<'a>> {
    for raw in TITLE_SELECTORS {
        let selector = parse_selector(raw)?;
        for candidate in container.select(&selector) {
            if candidate
                .value()
                .attr("href")
                .is_some_and(is_detail_href)
            {
                return Some(candidate);
            }
        }
    }
    None
}

fn item_metadata(container: ElementRef<'_>) -> (String, String, String) {
    let mut doc_type = "Unknown Type".to_string();
    let mut date = "Unknown Date".to_string();
    let mut preview = String::new();

    for raw in META_SELECTORS {
        let Some(selector) = parse_selector(raw) else {
            continue;
        };
        let spans: Vec<_> = container.select(&selector).collect();
        if spans.is_empty() {
            continue;
        }
        if let Some(first) = spans.first() {
            doc_type = element_text(*first);
        }
        if let Some(second) = spans.get(1) {
            date = element_text(*second);
        }
        break;
    }

    let small = parse_selector("small");
    for raw in PREVIEW_SELECTORS {
        let Some(selector) = parse_selector(raw) else {
            continue;
        };
        let found = container.select(&selector).find(|element| {
            // skip meta blocks that only wrap <small> annotations
            small
                .as_ref()
                .map(|sel| element.select(sel).next().is_none())
                .unwrap_or(true)
        });
        if let Some(element) = found {
            preview = element_text(element);
            break;
        }
    }

    (doc_type, date, preview)
}

fn item_from_anchor(anchor: ElementRef<'_>, base: &Url) -> Option<ResultItem> {
    let href = anchor.value().attr("href")?;
    let link = base.join(href).ok()?;
    let title = element_text(anchor);
    if title.is_empty() {
        return None;
    }
    Some(ResultItem {
        title,
        link,
        doc_type: "Unknown Type".to_string(),
        date: "Unknown Date".to_string(),
        preview: String::new(),
    })
}

fn item_from_container(container: ElementRef<'_>, base: &Url) -> Option<ResultItem> {
    let anchor = title_anchor(container)?;
    let href = anchor.value().attr("href")?;
    let link = base.join(href).ok()?;
    let title = element_text(anchor);
    if title.is_empty() {
        return None;
    }

    let (doc_type, date, preview) = item_metadata(container);
    Some(ResultItem {
        title,
        link,
        doc_type,
        date,
        preview,
    })
}

/// Parse one search-results page: locate result containers through the
/// cascade, fall back to bare Detail anchors wrapped as synthetic items,
/// and probe the pagination control for a next page.
pub fn parse_search_page(html: &str, base: &Url) -> SearchPage {
    let document = Html::parse_document(html);

    let containers = first_nonempty_selection(&document, RESULT_ITEM_SELECTORS);
    let mut items: Vec<ResultItem> = containers
        .into_iter()
        .filter_map(|container| item_from_container(container, base))
        .collect();

    if items.is_empty() {
        if let Some(selector) = parse_selector(DETAIL_ANCHOR_SELECTOR) {
            items = document
                .select(&selector)
                .filter_map(|anchor| item_from_anchor(anchor, base))
                .collect();
            if !items.is_empty() {
                debug!(count = items.len(), "result items built from detail anchors");
            }
        }
    }

    let has_next = PAGINATION_SELECTORS.iter().any(|raw| {
        parse_selector(raw)
            .map(|selector| document.select(&selector).next().is_some())
            .unwrap_or(false)
    });

    SearchPage { items, has_next }
}

/// Three-tier content extraction from a detail page: named regions,
/// then paragraph concatenation, then whole-body text minus scripts and
/// styles. Anything under [`MIN_CONTENT_CHARS`] is rejected.
pub fn extract_main_content(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let mut content =
        select_first_text(&document, CONTENT_SELECTORS, MIN_REGION_CHARS).unwrap_or_default();

    if content.chars().count() < MIN_CONTENT_CHARS {
        if let Some(paragraphs) = paragraph_content(&document) {
            content = paragraphs;
        }
    }

    if content.chars().count() < MIN_CONTENT_CHARS {
        content = body_text(&document);
    }

    if content.chars().count() >= MIN_CONTENT_CHARS {
        Some(content)
    } else {
        None
    }
}

fn paragraph_content(document: &Html) -> Option<String> {
    for raw in ["p", ".card-text", "div > div"] {
        let selector = parse_selector(raw)?;
        let paragraphs: Vec<String> = document
            .select(&selector)
            .map(element_text)
            .filter(|text| text.chars().count() > 20)
            .collect();
        if !paragraphs.is_empty() {
            return Some(paragraphs.join("\n\n"));
        }
    }
    None
}

/// All body text, skipping script and style subtrees.
fn body_text(document: &Html) -> String {
    let Some(selector) = parse_selector("body") else {
        return String::new();
    };
    let Some(body) = document.select(&selector).next() else {
        return String::new();
    };

    let mut out = String::new();
    collect_text_excluding(body, &["script", "style"], &mut out);
    out.trim_end().to_string()
}

fn collect_text_excluding(element: ElementRef<'_>, skip: &[&str], out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if skip.contains(&child_element.value().name()) {
                continue;
            }
            collect_text_excluding(child_element, skip, out);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(trimmed);
            }
        }
    }
}

/// Every `.pdf`-suffixed anchor on a page, resolved to absolute URLs and
/// labelled with the anchor text (or the file name when the anchor is
/// empty).
pub fn find_pdf_links(html: &str, page_url: &Url) -> Vec<PdfLink> {
    let document = Html::parse_document(html);
    let Some(selector) = parse_selector("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.to_lowercase().ends_with(".pdf") {
            continue;
        }

        let absolute = if href.starts_with("http") {
            href.to_string()
        } else {
            match page_url.join(href) {
                Ok(url) => url.to_string(),
                Err(_) => continue,
            }
        };

        let text = element_text(anchor);
        let text = if text.is_empty() {
            absolute
                .rsplit('/')
                .next()
                .unwrap_or(&absolute)
                .to_string()
        } else {
            text
        };

        links.push(PdfLink {
            url: absolute,
            text,
            source_page: page_url.to_string(),
        });
    }

    links
}
