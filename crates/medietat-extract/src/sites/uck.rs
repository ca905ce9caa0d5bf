//! UCK career listings. The markup has shifted between plain lists, class-keyed
//! containers and text-only announcements, so this site carries the longest
//! strategy chain. Titles that name a clinic or ward get the department folded
//! into the facility name.

use medietat_core::JobCandidate;
use scraper::Html;

use super::{
    description_text, elements_with_class_keyword, heading_text, href_has_keyword, parent_block,
    run_strategies, Strategy,
};
use crate::classify;
use crate::generic::{element_text, finish_candidate, href, select_all, LINK_KEYWORDS};
use crate::{Extractor, SourceMeta};

const FACILITY: &str = "Uniwersyteckie Centrum Kliniczne";
const DEPARTMENT_KEYWORDS: &[&str] = &["klinika", "zakład", "pracownia", "oddział"];
const HREF_KEYWORDS: &[&str] = &["oferta", "praca", "kariera", "rekrutacja", "job"];
const TEXT_LISTING_MARKERS: &[&str] = &["oferta pracy", "zatrudnienie", "rekrutacja"];

pub struct UckExtractor {
    meta: SourceMeta,
}

impl UckExtractor {
    pub fn new() -> Self {
        Self {
            meta: SourceMeta {
                source_id: "uck".to_string(),
                base_url: "https://uck.pl/kariera/oferty.html".to_string(),
                facility_name: FACILITY.to_string(),
                city: "Gdańsk".to_string(),
                needs_rendering: false,
                wait_selector: None,
            },
        }
    }
}

impl Default for UckExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for UckExtractor {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    fn extract(&self, document: &Html) -> Vec<JobCandidate> {
        let strategies: [Strategy; 5] = [
            class_containers,
            plain_articles,
            career_sections,
            job_links,
            text_listings,
        ];
        run_strategies(document, &self.meta, &strategies)
    }
}

/// "Pielęgniarka – Klinika Kardiologii" carries its ward in the title; fold it
/// into the facility so offers from different wards stay distinguishable.
pub(crate) fn uck_facility(title: &str) -> Option<String> {
    let lowered = title.to_lowercase();
    if !DEPARTMENT_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return None;
    }
    title
        .replace('–', "-")
        .split('-')
        .map(str::trim)
        .find(|part| {
            let part = part.to_lowercase();
            DEPARTMENT_KEYWORDS.iter().any(|kw| part.contains(kw))
        })
        .filter(|part| !part.is_empty())
        .map(|department| format!("{FACILITY} – {department}"))
}

fn candidate_from_container(
    container: scraper::ElementRef<'_>,
    meta: &SourceMeta,
) -> Option<JobCandidate> {
    let link = select_all(container, "a[href]")
        .into_iter()
        .find(|l| href(*l).is_some_and(|h| href_has_keyword(&h, HREF_KEYWORDS)))?;
    let title = Some(element_text(link))
        .filter(|t| !t.is_empty())
        .or_else(|| heading_text(container))?;
    finish_candidate(
        meta,
        &title,
        uck_facility(&title),
        href(link),
        description_text(container),
    )
}

fn class_containers(document: &Html, meta: &SourceMeta) -> Vec<JobCandidate> {
    elements_with_class_keyword(
        document.root_element(),
        "article, div, li",
        &["job", "oferta", "praca", "kariera", "position", "vacancy"],
    )
    .into_iter()
    .filter_map(|container| candidate_from_container(container, meta))
    .collect()
}

fn plain_articles(document: &Html, meta: &SourceMeta) -> Vec<JobCandidate> {
    select_all(document.root_element(), "article")
        .into_iter()
        .filter_map(|container| {
            let link = select_all(container, "a[href]").into_iter().next()?;
            let title = Some(element_text(link))
                .filter(|t| !t.is_empty())
                .or_else(|| heading_text(container))?;
            finish_candidate(
                meta,
                &title,
                uck_facility(&title),
                href(link),
                description_text(container),
            )
        })
        .collect()
}

/// Listing items nested inside a career-flagged section of the page.
fn career_sections(document: &Html, meta: &SourceMeta) -> Vec<JobCandidate> {
    elements_with_class_keyword(document.root_element(), "section, div", &["kariera", "oferty"])
        .into_iter()
        .flat_map(|section| {
            select_all(section, "li, article, div")
                .into_iter()
                .filter_map(|item| {
                    let link = select_all(item, "a[href]").into_iter().next()?;
                    let title = Some(element_text(link))
                        .filter(|t| !t.is_empty())
                        .or_else(|| heading_text(item))?;
                    finish_candidate(
                        meta,
                        &title,
                        uck_facility(&title),
                        href(link),
                        description_text(item),
                    )
                })
                .collect::<Vec<_>>()
        })
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
            let block = parent_block(link);
            let title = Some(text)
                .filter(|t| !t.is_empty())
                .or_else(|| block.and_then(heading_text))
                .or_else(|| {
                    block
                        .map(element_text)
                        .filter(|t| !t.is_empty() && t.chars().count() <= 100)
                })?;
            finish_candidate(
                meta,
                &title,
                uck_facility(&title),
                Some(link_href),
                block.and_then(description_text),
            )
        })
        .collect()
}

/// Last resort for announcement pages with no links at all: blocks whose text
/// both mentions a posting and names a medical role. Candidates without a link
/// end up with a synthesized fragment URL.
fn text_listings(document: &Html, meta: &SourceMeta) -> Vec<JobCandidate> {
    select_all(document.root_element(), "h1, h2, h3, h4, h5, p, div, li")
        .into_iter()
        .filter_map(|element| {
            let text = element_text(element);
            let lowered = text.to_lowercase();
            let is_listing = TEXT_LISTING_MARKERS.iter().any(|kw| lowered.contains(kw))
                && classify::contains_role_keyword(&lowered);
            if !is_listing {
                return None;
            }
            let link = select_all(element, "a[href]")
                .into_iter()
                .next()
                .or_else(|| {
                    parent_block(element)
                        .and_then(|block| select_all(block, "a[href]").into_iter().next())
                });
            finish_candidate(
                meta,
                &text,
                uck_facility(&text),
                link.and_then(href),
                None,
            )
        })
        .collect()
}
