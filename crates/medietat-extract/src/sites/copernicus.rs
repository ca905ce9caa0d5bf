//! Copernicus career board. The page is built client-side, so it always goes
//! through the render service; an almost-empty rendered document is treated
//! as a failed render rather than an empty board.

use medietat_core::JobCandidate;
use scraper::Html;

use super::{
    description_text, elements_with_class_keyword, heading_text, href_has_keyword, parent_block,
    run_strategies, Strategy,
};
use crate::generic::{element_text, finish_candidate, href, select_all, select_first, LINK_KEYWORDS};
use crate::normalize;
use crate::{Extractor, SourceMeta};

const HREF_KEYWORDS: &[&str] = &["oferta", "praca", "kariera", "job", "rekrutacja"];
const MIN_RENDERED_TEXT_CHARS: usize = 100;

pub struct CopernicusExtractor {
    meta: SourceMeta,
}

impl CopernicusExtractor {
    pub fn new() -> Self {
        Self {
            meta: SourceMeta {
                source_id: "copernicus".to_string(),
                base_url: "https://copernicus.gda.pl/ogloszenia/kariera".to_string(),
                facility_name: "COPERNICUS Podmiot Leczniczy Sp. z o.o.".to_string(),
                city: "Gdańsk".to_string(),
                needs_rendering: true,
                wait_selector: Some("body".to_string()),
            },
        }
    }
}

impl Default for CopernicusExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for CopernicusExtractor {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    fn extract(&self, document: &Html) -> Vec<JobCandidate> {
        let page_text = element_text(document.root_element());
        if page_text.chars().count() < MIN_RENDERED_TEXT_CHARS {
            return Vec::new();
        }
        let strategies: [Strategy; 3] = [class_containers, plain_articles, job_links];
        run_strategies(document, &self.meta, &strategies)
    }
}

fn candidate_from_container(
    container: scraper::ElementRef<'_>,
    meta: &SourceMeta,
) -> Option<JobCandidate> {
    let link = select_first(container, "a[href]")?;
    let title = Some(element_text(link))
        .filter(|t| !t.is_empty())
        .or_else(|| heading_text(container))?;
    let facility = normalize::facility_from_title(&title);
    finish_candidate(meta, &title, facility, href(link), description_text(container))
}

fn class_containers(document: &Html, meta: &SourceMeta) -> Vec<JobCandidate> {
    elements_with_class_keyword(
        document.root_element(),
        "article, div, li",
        &["job", "oferta", "praca", "kariera", "post", "entry", "position"],
    )
    .into_iter()
    .filter_map(|container| candidate_from_container(container, meta))
    .collect()
}

fn plain_articles(document: &Html, meta: &SourceMeta) -> Vec<JobCandidate> {
    select_all(document.root_element(), "article")
        .into_iter()
        .filter_map(|container| candidate_from_container(container, meta))
        .collect()
}

fn job_links(document: &Html, meta: &SourceMeta) -> Vec<JobCandidate> {
    select_all(document.root_element(), "a[href]")
        .into_iter()
        .filter_map(|link| {
            let text = element_text(link);
            let text_lower = text.to_lowercase();
            let link_href = href(link)?;
            let looks_like_job = LINK_KEYWORDS.iter().any(|kw| text_lower.contains(kw))
                || href_has_keyword(&link_href, HREF_KEYWORDS);
            if !looks_like_job {
                return None;
            }
            let block = parent_block(link)?;
            let title = Some(text)
                .filter(|t| !t.is_empty())
                .or_else(|| heading_text(block))?;
            let facility = normalize::facility_from_title(&title);
            finish_candidate(meta, &title, facility, Some(link_href), description_text(block))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use medietat_core::MedicalRole;

    const FILLER: &str = "Uniwersytecki podmiot leczniczy zaprasza do zapoznania się z \
                          aktualnymi ogłoszeniami o zatrudnieniu w naszych placówkach.";

    #[test]
    fn nearly_empty_rendered_page_yields_no_candidates() {
        let html = Html::parse_document("<html><body><div>Loading...</div></body></html>");
        let extractor = CopernicusExtractor::new();
        assert!(extractor.extract(&html).is_empty());
    }

    #[test]
    fn rendered_job_containers_are_extracted() {
        let html = Html::parse_document(&format!(
            r#"
            <body>
              <p>{FILLER}</p>
              <div class="job-listing">
                <a href="/ogloszenia/kariera/ratownik-medyczny">Ratownik medyczny</a>
                <p>Praca w zespole wyjazdowym.</p>
              </div>
            </body>
            "#
        ));
        let extractor = CopernicusExtractor::new();
        let candidates = extractor.extract(&html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].role, MedicalRole::Ratownik);
        assert_eq!(
            candidates[0].source_url,
            "https://copernicus.gda.pl/ogloszenia/kariera/ratownik-medyczny"
        );
    }
}
