//! Nursing-chamber job board (OIPiP Gdańsk). Postings are announcement links
//! labelled "oferta pracy" or "czytaj", with `Facility – City – Role` titles.

use medietat_core::JobCandidate;
use scraper::Html;

use super::{description_text, heading_text, parent_block, run_strategies, Strategy};
use crate::generic::{element_text, finish_candidate, href, select_all};
use crate::normalize;
use crate::{Extractor, SourceMeta};

pub struct OipipGdanskExtractor {
    meta: SourceMeta,
}

impl OipipGdanskExtractor {
    pub fn new() -> Self {
        Self {
            meta: SourceMeta {
                source_id: "oipip_gdansk".to_string(),
                base_url: "https://praca.oipip.gda.pl/".to_string(),
                facility_name: "Okręgowa Izba Pielęgniarek i Położnych w Gdańsku".to_string(),
                city: "Gdańsk".to_string(),
                needs_rendering: false,
                wait_selector: None,
            },
        }
    }
}

impl Default for OipipGdanskExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for OipipGdanskExtractor {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    fn extract(&self, document: &Html) -> Vec<JobCandidate> {
        let strategies: [Strategy; 1] = [offer_links];
        run_strategies(document, &self.meta, &strategies)
    }
}

fn offer_links(document: &Html, meta: &SourceMeta) -> Vec<JobCandidate> {
    let mut candidates = Vec::new();
    for link in select_all(document.root_element(), "a[href]") {
        let link_text = element_text(link);
        let lowered = link_text.to_lowercase();
        if !lowered.contains("oferta pracy") && !lowered.contains("czytaj") {
            continue;
        }
        let Some(block) = parent_block(link) else {
            continue;
        };
        let title = heading_text(block).unwrap_or(link_text);
        if title.is_empty() {
            continue;
        }
        let facility = normalize::facility_from_title(&title);
        if let Some(candidate) =
            finish_candidate(meta, &title, facility, href(link), description_text(block))
        {
            candidates.push(candidate);
        }
    }
    candidates
}
