//! Szpitale Pomorskie career archive: a WordPress category page of post
//! entries, one article per posting.

use medietat_core::JobCandidate;
use scraper::Html;

use super::{
    description_text, elements_with_class_keyword, heading_text, parent_block, run_strategies,
    Strategy,
};
use crate::generic::{element_text, finish_candidate, href, keyword_links, select_all, select_first};
use crate::normalize;
use crate::{Extractor, SourceMeta};

pub struct SzpitalePomorskieExtractor {
    meta: SourceMeta,
}

impl SzpitalePomorskieExtractor {
    pub fn new() -> Self {
        Self {
            meta: SourceMeta {
                source_id: "szpitalepomorskie".to_string(),
                base_url: "https://www.szpitalepomorskie.eu/category/oferty-pracy/".to_string(),
                facility_name: "Szpitale Pomorskie".to_string(),
                city: "Gdańsk".to_string(),
                needs_rendering: false,
                wait_selector: None,
            },
        }
    }
}

impl Default for SzpitalePomorskieExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for SzpitalePomorskieExtractor {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    fn extract(&self, document: &Html) -> Vec<JobCandidate> {
        let strategies: [Strategy; 3] = [post_entries, plain_articles, job_links];
        run_strategies(document, &self.meta, &strategies)
    }
}

fn candidate_from_entry(
    entry: scraper::ElementRef<'_>,
    meta: &SourceMeta,
) -> Option<JobCandidate> {
    let link = select_first(entry, "a[href]")?;
    let title = Some(element_text(link))
        .filter(|t| !t.is_empty())
        .or_else(|| heading_text(entry))?;
    let facility = normalize::facility_from_title(&title);
    finish_candidate(meta, &title, facility, href(link), description_text(entry))
}

fn post_entries(document: &Html, meta: &SourceMeta) -> Vec<JobCandidate> {
    elements_with_class_keyword(
        document.root_element(),
        "article, div",
        &["post", "entry", "job", "oferta"],
    )
    .into_iter()
    .filter_map(|entry| candidate_from_entry(entry, meta))
    .collect()
}

fn plain_articles(document: &Html, meta: &SourceMeta) -> Vec<JobCandidate> {
    select_all(document.root_element(), "article")
        .into_iter()
        .filter_map(|entry| candidate_from_entry(entry, meta))
        .collect()
}

fn job_links(document: &Html, meta: &SourceMeta) -> Vec<JobCandidate> {
    keyword_links(document.root_element())
        .into_iter()
        .filter_map(|link| {
            let block = parent_block(link)?;
            let title = Some(element_text(link))
                .filter(|t| !t.is_empty())
                .or_else(|| heading_text(block))?;
            let facility = normalize::facility_from_title(&title);
            finish_candidate(meta, &title, facility, href(link), description_text(block))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use medietat_core::MedicalRole;

    #[test]
    fn wordpress_post_entries_are_extracted_with_excerpts() {
        let html = Html::parse_document(
            r#"
            <main>
              <article class="post type-post">
                <h2><a href="https://www.szpitalepomorskie.eu/pielegniarka-oddzial-kardiologii/">
                  Pielęgniarka – oddział kardiologii</a></h2>
                <div class="entry-excerpt">Zatrudnimy pielęgniarkę na oddziale kardiologii. Miejsce pracy: Gdynia.</div>
              </article>
              <article class="post type-post">
                <h2><a href="https://www.szpitalepomorskie.eu/lekarz-sor/">Lekarz – SOR</a></h2>
              </article>
            </main>
            "#,
        );
        let extractor = SzpitalePomorskieExtractor::new();
        let candidates = extractor.extract(&html);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].role, MedicalRole::Pielegniarka);
        assert_eq!(candidates[0].city, "Gdynia");
        assert!(candidates[0].description.as_deref().unwrap().contains("kardiologii"));
        assert_eq!(
            candidates[1].source_url,
            "https://www.szpitalepomorskie.eu/lekarz-sor/"
        );
    }

    #[test]
    fn falls_back_to_job_links_when_no_entries_exist() {
        let html = Html::parse_document(
            r#"<div><p><a href="/oferta-pracy-polozna/">Oferta pracy: położna</a></p></div>"#,
        );
        let extractor = SzpitalePomorskieExtractor::new();
        let candidates = extractor.extract(&html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].role, MedicalRole::Polozna);
    }
}
