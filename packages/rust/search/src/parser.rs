//! Result extraction for the DuckDuckGo HTML endpoint.
//!
//! Each organic hit is a `.result` block holding a `.result__a` title link and
//! a `.result__snippet`. Sponsored blocks carry `.result--ad` and are skipped.

use std::sync::LazyLock;

use edugen_shared::SearchResult;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static RESULT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.result").expect("valid selector"));
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("valid selector"));
static SNIPPET_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result__snippet").expect("valid selector"));

/// Parse up to `max_results` organic results, preserving page order.
pub(crate) fn parse_results(html: &str, max_results: usize) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);

    doc.select(&RESULT_SEL)
        .filter(|el| !is_ad(el))
        .filter_map(|el| parse_result(&el))
        .take(max_results)
        .collect()
}

fn is_ad(el: &ElementRef<'_>) -> bool {
    el.value().classes().any(|c| c == "result--ad")
}

fn parse_result(el: &ElementRef<'_>) -> Option<SearchResult> {
    let link = el.select(&TITLE_SEL).next()?;
    let title = collapse_whitespace(&link.text().collect::<String>());
    if title.is_empty() {
        return None;
    }

    let snippet = el
        .select(&SNIPPET_SEL)
        .next()
        .map(|s| collapse_whitespace(&s.text().collect::<String>()))
        .unwrap_or_default();

    let url = link.value().attr("href").and_then(resolve_href);

    Some(SearchResult {
        title,
        snippet,
        url,
    })
}

/// Turn a result href into the destination URL.
///
/// Organic links are usually wrapped as `//duckduckgo.com/l/?uddg=<target>`.
pub(crate) fn resolve_href(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;

    let is_redirect = parsed
        .host_str()
        .is_some_and(|h| h.ends_with("duckduckgo.com"))
        && parsed.path() == "/l/";

    if is_redirect {
        return parsed
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned());
    }

    Some(parsed.to_string())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
