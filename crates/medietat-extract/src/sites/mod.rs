//! Bespoke extractors for sources whose markup defeats the declarative
//! configs. Each site is an ordered list of strategy functions tried until
//! one yields candidates.

use medietat_core::JobCandidate;
use scraper::{ElementRef, Html};

use crate::generic::{dedupe_by_base_url, element_text, select_all, select_first};
use crate::SourceMeta;

pub mod copernicus;
pub mod oipip_gdansk;
pub mod szpitale_pomorskie;
pub mod uck;

pub use copernicus::CopernicusExtractor;
pub use oipip_gdansk::OipipGdanskExtractor;
pub use szpitale_pomorskie::SzpitalePomorskieExtractor;
pub use uck::UckExtractor;

pub(crate) type Strategy = fn(&Html, &SourceMeta) -> Vec<JobCandidate>;

pub(crate) fn run_strategies(
    document: &Html,
    meta: &SourceMeta,
    strategies: &[Strategy],
) -> Vec<JobCandidate> {
    for strategy in strategies {
        let found = strategy(document, meta);
        if !found.is_empty() {
            return dedupe_by_base_url(found);
        }
    }
    Vec::new()
}

/// Nearest ancestor that acts as the listing block around an inline element.
pub(crate) fn parent_block<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| {
            matches!(
                ancestor.value().name(),
                "article" | "div" | "li" | "section" | "tr" | "td" | "p"
            )
        })
}

pub(crate) fn heading_text(scope: ElementRef<'_>) -> Option<String> {
    select_first(scope, "h1, h2, h3, h4, h5, strong, b")
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Description text near a listing block: an element whose class hints at a
/// summary, else the first paragraph.
pub(crate) fn description_text(scope: ElementRef<'_>) -> Option<String> {
    let hinted = select_all(scope, "p, div").into_iter().find(|el| {
        el.value().attr("class").is_some_and(|class| {
            let class = class.to_ascii_lowercase();
            ["desc", "excerpt", "summary", "content", "text"]
                .iter()
                .any(|kw| class.contains(kw))
        })
    });
    hinted
        .or_else(|| select_first(scope, "p"))
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Elements among `tags` whose class attribute contains one of `keywords`.
pub(crate) fn elements_with_class_keyword<'a>(
    root: ElementRef<'a>,
    tags: &str,
    keywords: &[&str],
) -> Vec<ElementRef<'a>> {
    select_all(root, tags)
        .into_iter()
        .filter(|el| {
            el.value().attr("class").is_some_and(|class| {
                let class = class.to_ascii_lowercase();
                keywords.iter().any(|kw| class.contains(kw))
            })
        })
        .collect()
}

pub(crate) fn href_has_keyword(href: &str, keywords: &[&str]) -> bool {
    let lowered = href.to_ascii_lowercase();
    keywords.iter().any(|kw| lowered.contains(kw))
}
