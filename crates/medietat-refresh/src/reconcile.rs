//! Reconciles one source's extracted candidates against the offer store:
//! batch dedup, historical duplicate cleanup, insert/update/skip, and
//! inactivation of offers that disappeared from the page.
//!
//! Runs against the same store must not overlap: the inactivation boundary is
//! the run's start time, and a concurrent run could revive rows this one is
//! about to inactivate. Callers serialize runs.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use medietat_core::{fragment_stripped, JobCandidate, JobOffer, OfferId, OfferStatus, SourceCounts};
use medietat_extract::summary::generate_summary;
use medietat_store::{NewOffer, OfferChangeSet, OfferStore, StoreError};
use tracing::{debug, info};
use url::Url;

/// Applies one source's candidate batch to the store and returns the counts
/// for the run report. An empty batch is treated as a failed or empty page
/// and touches nothing, so a source that breaks overnight does not wipe its
/// own offers.
pub async fn reconcile_source(
    store: &dyn OfferStore,
    source_id: &str,
    base_url: &str,
    candidates: Vec<JobCandidate>,
    refresh_started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<SourceCounts, StoreError> {
    let candidates = dedupe_batch(candidates);
    if candidates.is_empty() {
        info!(source_id, "empty candidate batch, leaving stored offers untouched");
        return Ok(SourceCounts::default());
    }

    prune_historical_duplicates(store, source_id).await?;

    let mut counts = SourceCounts::default();
    let mut changes = OfferChangeSet::default();
    let mut batch_urls: HashSet<String> = HashSet::new();

    for candidate in candidates {
        batch_urls.insert(candidate.source_url.clone());
        match store.find_by_source_url(&candidate.source_url).await? {
            None => {
                changes.inserts.push(new_offer(source_id, candidate, now));
                counts.new += 1;
            }
            Some(existing) => {
                let mut offer = existing;
                let mut changed = false;

                // Title or description changes invalidate the summary.
                let content_changed = offer.title != candidate.title
                    || offer.description != candidate.description;

                if offer.title != candidate.title {
                    offer.title = candidate.title.clone();
                }
                if offer.description != candidate.description {
                    offer.description = candidate.description.clone();
                }
                if offer.facility_name != candidate.facility_name {
                    offer.facility_name = candidate.facility_name.clone();
                    changed = true;
                }
                if offer.city != candidate.city {
                    offer.city = candidate.city.clone();
                    changed = true;
                }
                if offer.role != candidate.role {
                    offer.role = candidate.role;
                    changed = true;
                }
                // Only a newly supplied application link replaces the stored
                // one; a candidate without one must not clear it.
                if candidate.external_job_url.is_some()
                    && offer.external_job_url != candidate.external_job_url
                {
                    offer.external_job_url = candidate.external_job_url.clone();
                    changed = true;
                }
                if offer.status == OfferStatus::Inactive {
                    // The posting came back; a reactivation counts as an update.
                    offer.status = OfferStatus::Active;
                    changed = true;
                }
                if content_changed {
                    offer.summary = Some(generate_summary(
                        &candidate.title,
                        candidate.description.as_deref(),
                        &candidate.facility_name,
                        &candidate.city,
                    ));
                }
                // Rows persisted before sources carried an id get it backfilled.
                if offer.source_id.is_none() {
                    offer.source_id = Some(source_id.to_string());
                }

                offer.last_seen_at = now;
                offer.scraped_at = now;

                if changed || content_changed {
                    counts.updated += 1;
                } else {
                    counts.skipped += 1;
                }
                changes.updates.push(offer);
            }
        }
    }

    for stale in store.stale_active_offers(refresh_started_at).await? {
        if !belongs_to_source(&stale, source_id, base_url) {
            continue;
        }
        if batch_urls.contains(&stale.source_url) {
            continue;
        }
        debug!(source_id, offer_id = stale.id, url = %stale.source_url, "inactivating vanished offer");
        changes.inactivate.push(stale.id);
        counts.inactivated += 1;
    }

    store.apply(changes).await?;
    Ok(counts)
}

/// Collapses candidates that differ only in their URL fragment, keeping the
/// first. Text-only listings synthesize fragment URLs on the same base page,
/// so without this one page would yield a row per paragraph.
fn dedupe_batch(candidates: Vec<JobCandidate>) -> Vec<JobCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(fragment_stripped(&candidate.source_url).to_string()))
        .collect()
}

/// Deletes stored active duplicates sharing a fragment-stripped URL, keeping
/// the lowest id. Committed before the batch is applied so the per-candidate
/// URL lookups see a clean slate.
async fn prune_historical_duplicates(
    store: &dyn OfferStore,
    source_id: &str,
) -> Result<(), StoreError> {
    let mut by_base: HashMap<String, Vec<OfferId>> = HashMap::new();
    for offer in store.active_offers_for_source(source_id).await? {
        by_base
            .entry(fragment_stripped(&offer.source_url).to_string())
            .or_default()
            .push(offer.id);
    }

    let mut doomed = Vec::new();
    for (base, mut ids) in by_base {
        if ids.len() < 2 {
            continue;
        }
        ids.sort_unstable();
        info!(source_id, base_url = %base, duplicates = ids.len() - 1, "pruning historical duplicates");
        doomed.extend(ids.into_iter().skip(1));
    }

    if !doomed.is_empty() {
        store.delete_offers(&doomed).await?;
    }
    Ok(())
}

/// Whether a stored offer belongs to this source. Rows that predate the
/// `source_id` column are matched by their URL's origin against the source's
/// base URL, best effort.
fn belongs_to_source(offer: &JobOffer, source_id: &str, base_url: &str) -> bool {
    match offer.source_id.as_deref() {
        Some(id) => id == source_id,
        None => same_origin(&offer.source_url, base_url),
    }
}

fn same_origin(url: &str, base_url: &str) -> bool {
    match (Url::parse(url), Url::parse(base_url)) {
        (Ok(a), Ok(b)) => a.scheme() == b.scheme() && a.host_str() == b.host_str(),
        _ => false,
    }
}

fn new_offer(source_id: &str, candidate: JobCandidate, now: DateTime<Utc>) -> NewOffer {
    let summary = generate_summary(
        &candidate.title,
        candidate.description.as_deref(),
        &candidate.facility_name,
        &candidate.city,
    );
    NewOffer {
        title: candidate.title,
        facility_name: candidate.facility_name,
        city: candidate.city,
        role: candidate.role,
        description: candidate.description,
        summary: Some(summary),
        source_url: candidate.source_url,
        source_id: Some(source_id.to_string()),
        external_job_url: candidate.external_job_url,
        first_seen_at: now,
        last_seen_at: now,
        scraped_at: now,
        created_at: now,
        status: OfferStatus::Active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use medietat_core::MedicalRole;
    use medietat_store::MemoryOfferStore;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 24, hour, 0, 0).single().unwrap()
    }

    fn candidate(title: &str, url: &str) -> JobCandidate {
        JobCandidate {
            title: title.to_string(),
            facility_name: "Szpital Morski".to_string(),
            city: "Gdynia".to_string(),
            role: MedicalRole::Pielegniarka,
            description: None,
            source_url: url.to_string(),
            external_job_url: None,
        }
    }

    const SOURCE: &str = "szpital_morski";
    const BASE: &str = "https://szpital-morski.example/oferty";

    async fn run(
        store: &MemoryOfferStore,
        candidates: Vec<JobCandidate>,
        started_hour: u32,
        now_hour: u32,
    ) -> SourceCounts {
        reconcile_source(store, SOURCE, BASE, candidates, ts(started_hour), ts(now_hour))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn first_run_inserts_second_run_skips() {
        let store = MemoryOfferStore::new();
        let batch = vec![
            candidate("Pielęgniarka", "https://szpital-morski.example/oferty/1"),
            candidate("Lekarz SOR", "https://szpital-morski.example/oferty/2"),
        ];

        let first = run(&store, batch.clone(), 6, 6).await;
        assert_eq!(first.new, 2);

        let second = run(&store, batch, 7, 7).await;
        assert_eq!(second.new, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(second.inactivated, 0);

        let offers = store.snapshot().await;
        assert_eq!(offers.len(), 2);
        // skipped offers still advance last_seen_at
        assert!(offers.iter().all(|o| o.last_seen_at == ts(7)));
        assert!(offers.iter().all(|o| o.first_seen_at == ts(6)));
    }

    #[tokio::test]
    async fn candidates_differing_only_in_fragment_collapse_to_one_offer() {
        let store = MemoryOfferStore::new();
        let counts = run(
            &store,
            vec![
                candidate("Pielęgniarka", "http://x/page#abc"),
                candidate("Położna", "http://x/page#def"),
            ],
            6,
            6,
        )
        .await;

        assert_eq!(counts.new, 1);
        let offers = store.snapshot().await;
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].title, "Pielęgniarka");
    }

    #[tokio::test]
    async fn vanished_offers_are_inactivated_and_kept() {
        let store = MemoryOfferStore::new();
        run(
            &store,
            vec![
                candidate("A", "https://szpital-morski.example/oferty/a"),
                candidate("B", "https://szpital-morski.example/oferty/b"),
                candidate("C", "https://szpital-morski.example/oferty/c"),
            ],
            6,
            6,
        )
        .await;

        let counts = run(
            &store,
            vec![
                candidate("A", "https://szpital-morski.example/oferty/a"),
                candidate("B", "https://szpital-morski.example/oferty/b"),
            ],
            8,
            8,
        )
        .await;

        assert_eq!(counts.skipped, 2);
        assert_eq!(counts.inactivated, 1);

        let offers = store.snapshot().await;
        let c = offers.iter().find(|o| o.title == "C").unwrap();
        assert_eq!(c.status, OfferStatus::Inactive);
        assert_eq!(c.last_seen_at, ts(6));
        assert!(offers
            .iter()
            .filter(|o| o.title != "C")
            .all(|o| o.status == OfferStatus::Active && o.last_seen_at == ts(8)));
    }

    #[tokio::test]
    async fn empty_batch_never_inactivates() {
        let store = MemoryOfferStore::new();
        run(
            &store,
            vec![candidate("A", "https://szpital-morski.example/oferty/a")],
            6,
            6,
        )
        .await;

        let counts = run(&store, Vec::new(), 8, 8).await;
        assert_eq!(counts, SourceCounts::default());

        let offers = store.snapshot().await;
        assert_eq!(offers[0].status, OfferStatus::Active);
        assert_eq!(offers[0].last_seen_at, ts(6));
    }

    #[tokio::test]
    async fn reactivation_counts_as_update() {
        let store = MemoryOfferStore::new();
        run(
            &store,
            vec![candidate("A", "https://szpital-morski.example/oferty/a")],
            6,
            6,
        )
        .await;
        run(&store, vec![candidate("B", "https://szpital-morski.example/oferty/b")], 8, 8).await;
        assert_eq!(store.snapshot().await[0].status, OfferStatus::Inactive);

        let counts = run(
            &store,
            vec![
                candidate("A", "https://szpital-morski.example/oferty/a"),
                candidate("B", "https://szpital-morski.example/oferty/b"),
            ],
            10,
            10,
        )
        .await;
        assert_eq!(counts.updated, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(store.snapshot().await[0].status, OfferStatus::Active);
    }

    #[tokio::test]
    async fn content_change_regenerates_the_summary() {
        let store = MemoryOfferStore::new();
        let url = "https://szpital-morski.example/oferty/a";
        run(&store, vec![candidate("Pielęgniarka", url)], 6, 6).await;
        let before = store.snapshot().await[0].summary.clone();

        let mut changed = candidate("Pielęgniarka anestezjologiczna", url);
        changed.description = Some(
            "Szukamy pielęgniarki anestezjologicznej z doświadczeniem na bloku operacyjnym. \
             Oferujemy pracę w systemie zmianowym."
                .to_string(),
        );
        let counts = run(&store, vec![changed], 8, 8).await;
        assert_eq!(counts.updated, 1);

        let offer = &store.snapshot().await[0];
        assert_eq!(offer.title, "Pielęgniarka anestezjologiczna");
        assert_ne!(offer.summary, before);
        assert!(offer.summary.as_deref().unwrap().contains("anestezjologicznej"));
    }

    #[tokio::test]
    async fn missing_external_link_does_not_clear_the_stored_one() {
        let store = MemoryOfferStore::new();
        let url = "https://szpital-morski.example/oferty/a";
        let mut with_link = candidate("A", url);
        with_link.external_job_url = Some("https://praca.example/ogloszenie/1".to_string());
        run(&store, vec![with_link], 6, 6).await;

        // The extractor stops finding the link; the stored one survives and
        // the row counts as skipped.
        let counts = run(&store, vec![candidate("A", url)], 8, 8).await;
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.updated, 0);
        assert_eq!(
            store.snapshot().await[0].external_job_url.as_deref(),
            Some("https://praca.example/ogloszenie/1")
        );

        let mut moved = candidate("A", url);
        moved.external_job_url = Some("https://praca.example/ogloszenie/2".to_string());
        let counts = run(&store, vec![moved], 10, 10).await;
        assert_eq!(counts.updated, 1);
        assert_eq!(
            store.snapshot().await[0].external_job_url.as_deref(),
            Some("https://praca.example/ogloszenie/2")
        );
    }

    #[tokio::test]
    async fn legacy_rows_without_source_id_get_backfilled_and_inactivated_by_origin() {
        let store = MemoryOfferStore::new();
        store
            .apply(OfferChangeSet {
                inserts: vec![
                    NewOffer {
                        source_id: None,
                        ..new_offer(
                            SOURCE,
                            candidate("Stara oferta", "https://szpital-morski.example/oferty/old"),
                            ts(2),
                        )
                    },
                    NewOffer {
                        source_id: None,
                        ..new_offer(
                            SOURCE,
                            candidate("Cudza oferta", "https://inny-szpital.example/oferty/x"),
                            ts(2),
                        )
                    },
                ],
                ..Default::default()
            })
            .await
            .unwrap();

        // The legacy row for this origin vanishes from the page; the foreign
        // origin must be left alone.
        let counts = run(
            &store,
            vec![candidate("Nowa", "https://szpital-morski.example/oferty/new")],
            6,
            6,
        )
        .await;
        assert_eq!(counts.new, 1);
        assert_eq!(counts.inactivated, 1);

        let offers = store.snapshot().await;
        let old = offers.iter().find(|o| o.title == "Stara oferta").unwrap();
        assert_eq!(old.status, OfferStatus::Inactive);
        let foreign = offers.iter().find(|o| o.title == "Cudza oferta").unwrap();
        assert_eq!(foreign.status, OfferStatus::Active);

        // Rediscovering the legacy row backfills its source id.
        run(
            &store,
            vec![candidate("Stara oferta", "https://szpital-morski.example/oferty/old")],
            8,
            8,
        )
        .await;
        let offers = store.snapshot().await;
        let old = offers.iter().find(|o| o.title == "Stara oferta").unwrap();
        assert_eq!(old.source_id.as_deref(), Some(SOURCE));
        assert_eq!(old.status, OfferStatus::Active);
    }

    #[tokio::test]
    async fn historical_duplicates_are_pruned_keeping_the_lowest_id() {
        let store = MemoryOfferStore::new();
        store
            .apply(OfferChangeSet {
                inserts: vec![
                    new_offer(SOURCE, candidate("A", "http://x/page#abc"), ts(2)),
                    new_offer(SOURCE, candidate("A kopia", "http://x/page#def"), ts(3)),
                ],
                ..Default::default()
            })
            .await
            .unwrap();

        let counts = run(&store, vec![candidate("A", "http://x/page#abc")], 6, 6).await;
        assert_eq!(counts.skipped, 1);

        let offers = store.snapshot().await;
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].id, 1);
    }
}
