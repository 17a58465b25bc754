// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTML -> `{title, markdown, links}` extraction (§4.J step 3).

use scraper::{Html, Selector};
use url::Url;

pub struct ExtractedPage {
    pub title: String,
    pub markdown: String,
    pub content_size: usize,
    pub links: Vec<String>,
}

/// Parses `html`, resolving relative links against `base_url`. Unparseable
/// selectors or a malformed base URL degrade to empty results rather than
/// failing the whole extraction.
pub fn extract(base_url: &str, html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);
    let title = select_text(&document, "title").unwrap_or_default();
    let markdown = select_text(&document, "body").unwrap_or_default();
    let base = Url::parse(base_url).ok();
    let links = extract_links(&document, base.as_ref());
    ExtractedPage { content_size: markdown.len(), title, markdown, links }
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let text: String = document.select(&selector).next()?.text().collect::<Vec<_>>().join(" ");
    Some(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn extract_links(document: &Html, base: Option<&Url>) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else { return Vec::new() };
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| resolve(href, base))
        .collect()
}

fn resolve(href: &str, base: Option<&Url>) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(|u| u.to_string()),
        None => Url::parse(href).ok().map(|u| u.to_string()),
    }
}
