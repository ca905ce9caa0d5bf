//! Config-driven extraction plus the candidate-assembly rules shared with the
//! bespoke site extractors: visible-text collection, title filtering, URL
//! synthesis, and batch-level URL dedup.

use std::collections::HashSet;

use medietat_core::{fragment_stripped, JobCandidate};
use scraper::{ElementRef, Html, Node, Selector};
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use crate::config::SourceConfig;
use crate::{classify, normalize, Extractor, SourceMeta};

const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Link texts that mark a hyperlink as a probable job posting.
pub(crate) const LINK_KEYWORDS: &[&str] = &[
    "oferta",
    "praca",
    "zatrudnienie",
    "rekrutacja",
    "kariera",
    "pielęgniarka",
    "lekarz",
    "położna",
];

const EXCLUDED_TITLE_KEYWORDS: &[&str] = &[
    "rekrutacje",
    "menu",
    "kontakt",
    "o nas",
    "dla pacjenta",
    "aktualne oferty",
    "dołącz do zespołu",
    "klauzula",
    "polityka prywatności",
    "ochrona danych",
];

const UNRELATED_TITLE_KEYWORDS: &[&str] = &[
    "programista",
    "developer",
    "informatyk",
    "przetarg",
    "zamówienie publiczne",
    "załącznik",
];

const JOB_TITLE_KEYWORDS: &[&str] = &[
    "lekarz",
    "fizjoterapeuta",
    "specjalista",
    "pielęgniarka",
    "pielęgniarz",
    "położna",
    "położny",
    "anestezjolog",
    "okulista",
    "kardiolog",
    "radiolog",
    "gastroenterolog",
    "ortopeda",
    "internista",
    "ratownik",
    "młodszy",
    "starszy",
    "koordynator",
];

/// A selector that fails to parse selects nothing; a broken declarative
/// config degrades to the fallback chain instead of erroring.
pub(crate) fn try_selector(input: &str) -> Option<Selector> {
    match Selector::parse(input) {
        Ok(selector) => Some(selector),
        Err(err) => {
            debug!(selector = input, error = %err, "unparseable selector, skipping");
            None
        }
    }
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("aria-hidden") == Some("true") {
        return true;
    }
    value.classes().any(|class| {
        let class = class.to_ascii_lowercase();
        class == "sr-only" || class == "screen-reader-text" || class.contains("visually-hidden")
    })
}

/// Visible text of an element, whitespace-normalized, with screen-reader-only
/// and `aria-hidden` subtrees stripped so hidden duplicates never reach the
/// title.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_visible_text(element, &mut out);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    if is_hidden(element) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_visible_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}

pub(crate) fn select_first<'a>(scope: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let selector = try_selector(selector)?;
    scope.select(&selector).next()
}

pub(crate) fn select_all<'a>(scope: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match try_selector(selector) {
        Some(selector) => scope.select(&selector).collect(),
        None => Vec::new(),
    }
}

pub(crate) fn href(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn absolutize(base_url: &str, link: &str) -> Option<String> {
    if link.starts_with("http://") || link.starts_with("https://") {
        return Some(link.to_string());
    }
    Url::parse(base_url)
        .ok()?
        .join(link)
        .ok()
        .map(|url| url.to_string())
}

/// Stable URL for a text-only listing: base URL plus a short title-hash
/// fragment, collision-free for distinct titles from the same page.
pub(crate) fn synthesized_url(base_url: &str, title: &str) -> String {
    let digest = Sha256::digest(title.as_bytes());
    let hash = hex::encode(digest);
    format!("{}#{}", base_url.trim_end_matches('/'), &hash[..8])
}

pub(crate) fn should_reject_title(raw_title: &str) -> bool {
    let title = raw_title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        return true;
    }
    let lowered = title.to_lowercase();

    if EXCLUDED_TITLE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return true;
    }
    if lowered.contains('@') || lowered.contains("mailto:") {
        return true;
    }
    if [".pdf", ".doc", ".docx"].iter().any(|ext| lowered.ends_with(ext))
        || UNRELATED_TITLE_KEYWORDS.iter().any(|kw| lowered.contains(kw))
    {
        return true;
    }

    // Without any job keyword a title must at least look like a heading of
    // plausible length.
    if !JOB_TITLE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        let chars = lowered.chars().count();
        if chars < 20 || chars > 150 {
            return true;
        }
    }
    false
}

/// Turns one raw extracted item into a cleaned, classified candidate; `None`
/// when the title fails the shared rejection rules.
pub(crate) fn finish_candidate(
    meta: &SourceMeta,
    raw_title: &str,
    facility_override: Option<String>,
    link: Option<String>,
    description: Option<String>,
) -> Option<JobCandidate> {
    if should_reject_title(raw_title) {
        return None;
    }
    let title = normalize::clean_title(raw_title);
    if title.is_empty() {
        return None;
    }

    let source_url = match link {
        Some(link) => {
            let absolute = absolutize(&meta.base_url, &link)?;
            if absolute.trim_end_matches('/') == meta.base_url.trim_end_matches('/') {
                synthesized_url(&meta.base_url, raw_title)
            } else {
                absolute
            }
        }
        None => synthesized_url(&meta.base_url, raw_title),
    };

    let facility_raw = facility_override
        .or_else(|| normalize::facility_from_title(raw_title))
        .unwrap_or_default();
    let facility_name = normalize::clean_facility_name(&facility_raw, &meta.facility_name);

    let description = description
        .map(|d| d.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|d| !d.is_empty())
        .map(|d| d.chars().take(MAX_DESCRIPTION_CHARS).collect::<String>());

    let city = classify::extract_city(raw_title)
        .or_else(|| description.as_deref().and_then(classify::extract_city))
        .map(ToString::to_string)
        .unwrap_or_else(|| meta.city.clone());

    Some(JobCandidate {
        role: classify::detect_role(raw_title),
        title,
        facility_name,
        city,
        description,
        source_url,
        external_job_url: None,
    })
}

/// Batch-level dedup on fragment-stripped URL, keeping the first occurrence.
pub(crate) fn dedupe_by_base_url(candidates: Vec<JobCandidate>) -> Vec<JobCandidate> {
    let mut seen: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(fragment_stripped(&candidate.source_url).to_string()))
        .collect()
}

/// Hyperlinks whose visible text carries a job keyword, the last-resort item
/// source for both the declarative and bespoke extractors.
pub(crate) fn keyword_links(scope: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    select_all(scope, "a[href]")
        .into_iter()
        .filter(|link| {
            let text = element_text(*link).to_lowercase();
            LINK_KEYWORDS.iter().any(|kw| text.contains(kw))
        })
        .collect()
}

/// Extractor driven entirely by a [`SourceConfig`]: container-scoped item
/// selection, whole-document fallback, then keyword-link scanning.
pub struct ConfigExtractor {
    meta: SourceMeta,
    config: SourceConfig,
}

impl ConfigExtractor {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            meta: config.meta(),
            config,
        }
    }

    fn extract_item(&self, item: ElementRef<'_>) -> Option<JobCandidate> {
        let selectors = &self.config.selectors;

        let raw_title = selectors
            .title
            .as_deref()
            .and_then(|sel| select_first(item, sel))
            .or_else(|| select_first(item, "h1, h2, h3, h4, h5"))
            .map(element_text)
            .filter(|t| !t.is_empty())
            .or_else(|| select_first(item, "a").map(element_text).filter(|t| !t.is_empty()))
            .unwrap_or_else(|| element_text(item));

        let link = if item.value().name() == "a" {
            href(item)
        } else {
            selectors
                .link
                .as_deref()
                .and_then(|sel| select_first(item, sel))
                .and_then(href)
                .or_else(|| select_first(item, "a[href]").and_then(href))
        };
        let link = match (link, self.config.link_is_absolute) {
            (Some(link), true) if !link.starts_with("http") => None,
            (link, _) => link,
        };

        let description = selectors
            .description
            .as_deref()
            .and_then(|sel| select_first(item, sel))
            .or_else(|| select_first(item, "p"))
            .map(element_text)
            .filter(|d| !d.is_empty());

        finish_candidate(&self.meta, &raw_title, None, link, description)
    }
}

impl Extractor for ConfigExtractor {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    fn extract(&self, document: &Html) -> Vec<JobCandidate> {
        let root = document.root_element();

        // A container selector matching exactly one element scopes the item
        // search; zero or several matches fall back to the whole document.
        let scope = match self.config.selectors.container.as_deref() {
            Some(selector) => {
                let containers = select_all(root, selector);
                if containers.len() == 1 {
                    containers[0]
                } else {
                    root
                }
            }
            None => root,
        };

        let mut items: Vec<ElementRef<'_>> = Vec::new();
        if let Some(selector) = self.config.selectors.item.as_deref() {
            items = select_all(scope, selector);
            if items.is_empty() {
                items = select_all(root, selector);
            }
        }
        if items.is_empty() {
            items = keyword_links(scope);
        }

        let candidates = items
            .into_iter()
            .filter_map(|item| self.extract_item(item))
            .collect();
        dedupe_by_base_url(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceSelectors;
    use medietat_core::MedicalRole;

    fn job_item_config() -> SourceConfig {
        SourceConfig {
            source_id: "przychodnia_przykladowa".to_string(),
            base_url: "https://example-przychodnia.pl/kariera".to_string(),
            facility_name: "Przychodnia Przykładowa".to_string(),
            city: "Gdańsk".to_string(),
            needs_rendering: false,
            wait_selector: None,
            link_is_absolute: false,
            selectors: SourceSelectors {
                container: None,
                item: Some(".job-item".to_string()),
                title: Some(".job-item h3".to_string()),
                link: Some(".job-item a".to_string()),
                description: None,
            },
        }
    }

    #[test]
    fn fixture_page_yields_two_candidates_excluding_privacy_clause() {
        let html = Html::parse_document(
            r#"
            <div class="jobs">
              <div class="job-item">
                <h3>Pielęgniarka anestezjologiczna</h3>
                <a href="/oferta/1">czytaj więcej</a>
                <p>Praca na bloku operacyjnym w pełnym wymiarze godzin.</p>
              </div>
              <div class="job-item">
                <h3>Lekarz internista</h3>
                <a href="/oferta/2">czytaj więcej</a>
              </div>
              <div class="job-item">
                <h3>Klauzula informacyjna dla kandydatów do pracy</h3>
                <a href="/rodo">czytaj więcej</a>
              </div>
            </div>
            "#,
        );
        let extractor = ConfigExtractor::new(job_item_config());
        let candidates = extractor.extract(&html);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "Pielęgniarka anestezjologiczna");
        assert_eq!(candidates[0].role, MedicalRole::Pielegniarka);
        assert_eq!(
            candidates[0].source_url,
            "https://example-przychodnia.pl/oferta/1"
        );
        assert_eq!(candidates[1].role, MedicalRole::Lekarz);
        assert_eq!(
            candidates[1].source_url,
            "https://example-przychodnia.pl/oferta/2"
        );
    }

    #[test]
    fn screen_reader_duplicate_text_is_stripped() {
        let html = Html::parse_document(
            r#"
            <div class="job-item">
              <h3><span class="sr-only">Pielęgniarka oddziałowa</span>Pielęgniarka oddziałowa</h3>
              <a href="/oferta/3">czytaj</a>
            </div>
            "#,
        );
        let extractor = ConfigExtractor::new(job_item_config());
        let candidates = extractor.extract(&html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Pielęgniarka oddziałowa");
    }

    #[test]
    fn linkless_item_gets_a_synthesized_fragment_url() {
        let html = Html::parse_document(
            r#"<div><div class="job-item"><h3>Pielęgniarka operacyjna</h3></div></div>"#,
        );
        let extractor = ConfigExtractor::new(job_item_config());
        let candidates = extractor.extract(&html);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0]
            .source_url
            .starts_with("https://example-przychodnia.pl/kariera#"));
    }

    #[test]
    fn synthesized_urls_differ_per_title() {
        let base = "https://example-przychodnia.pl/kariera";
        let a = synthesized_url(base, "Pielęgniarka operacyjna");
        let b = synthesized_url(base, "Położna na blok porodowy");
        assert_ne!(a, b);
        assert_eq!(fragment_stripped(&a), base);
    }

    #[test]
    fn same_base_page_candidates_collapse_to_one() {
        let meta = job_item_config().meta();
        let a = finish_candidate(&meta, "Pielęgniarka operacyjna", None, Some("/oferty#a".into()), None)
            .unwrap();
        let b = finish_candidate(&meta, "Pielęgniarka zabiegowa", None, Some("/oferty#b".into()), None)
            .unwrap();
        let deduped = dedupe_by_base_url(vec![a, b]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].title, "Pielęgniarka operacyjna");
    }

    #[test]
    fn keyword_link_fallback_finds_job_links() {
        let html = Html::parse_document(
            r#"
            <ul>
              <li><a href="/oferty/pielegniarka">Oferta pracy: pielęgniarka środowiskowa</a></li>
              <li><a href="/kontakt">Kontakt</a></li>
            </ul>
            "#,
        );
        let mut config = job_item_config();
        config.selectors.item = Some(".does-not-match".to_string());
        let extractor = ConfigExtractor::new(config);
        let candidates = extractor.extract(&html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0].source_url,
            "https://example-przychodnia.pl/oferty/pielegniarka"
        );
    }

    #[test]
    fn email_and_attachment_titles_are_rejected() {
        assert!(should_reject_title("rekrutacja@szpital.pl"));
        assert!(should_reject_title("Ogłoszenie o pracę lekarza.pdf"));
        assert!(should_reject_title("Przetarg na dostawę sprzętu medycznego"));
        assert!(should_reject_title("Menu"));
        assert!(!should_reject_title("Pielęgniarka anestezjologiczna"));
    }
}
