//! Offer store contract shared by the reconciliation engine and the read API,
//! plus the in-memory implementation used by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medietat_core::{JobOffer, MedicalRole, OfferId, OfferStatus};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Message(String),
}

/// Insertable offer: a [`JobOffer`] without its store-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    pub title: String,
    pub facility_name: String,
    pub city: String,
    pub role: MedicalRole,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub source_url: String,
    pub source_id: Option<String>,
    pub external_job_url: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub scraped_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub status: OfferStatus,
}

/// One source's reconciliation outcome, applied in a single transaction so a
/// crash mid-batch cannot corrupt other sources' state.
#[derive(Debug, Clone, Default)]
pub struct OfferChangeSet {
    pub inserts: Vec<NewOffer>,
    pub updates: Vec<JobOffer>,
    pub inactivate: Vec<OfferId>,
}

impl OfferChangeSet {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.inactivate.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    pub role: Option<MedicalRole>,
    pub status: Option<OfferStatus>,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Default)]
pub struct OfferPage {
    pub total: usize,
    pub results: Vec<JobOffer>,
}

#[async_trait]
pub trait OfferStore: Send + Sync {
    async fn find_by_source_url(&self, source_url: &str)
        -> Result<Option<JobOffer>, StoreError>;

    /// All `active` offers persisted for one source, used by the historical
    /// duplicate pre-pass.
    async fn active_offers_for_source(
        &self,
        source_id: &str,
    ) -> Result<Vec<JobOffer>, StoreError>;

    /// All `active` offers whose `last_seen_at` predates the refresh start
    /// boundary; the engine filters these down to one source's rows.
    async fn stale_active_offers(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<JobOffer>, StoreError>;

    /// Hard-deletes historical duplicate rows. Committed before new data is
    /// applied, matching the pre-pass ordering of the reconciliation
    /// algorithm.
    async fn delete_offers(&self, ids: &[OfferId]) -> Result<(), StoreError>;

    /// Applies one source's change set atomically.
    async fn apply(&self, changes: OfferChangeSet) -> Result<(), StoreError>;

    async fn list_offers(&self, filter: &OfferFilter) -> Result<OfferPage, StoreError>;

    async fn get_offer(&self, id: OfferId) -> Result<Option<JobOffer>, StoreError>;
}

/// In-memory store. Backs the reconciliation-engine unit tests and any
/// environment without Postgres; id assignment is sequential like the
/// database's serial column.
#[derive(Debug, Default)]
pub struct MemoryOfferStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: OfferId,
    offers: HashMap<OfferId, JobOffer>,
}

impl MemoryOfferStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                next_id: 1,
                offers: HashMap::new(),
            }),
        }
    }

    /// Test helper: current snapshot ordered by id.
    pub async fn snapshot(&self) -> Vec<JobOffer> {
        let inner = self.inner.lock().await;
        let mut offers: Vec<JobOffer> = inner.offers.values().cloned().collect();
        offers.sort_by_key(|offer| offer.id);
        offers
    }
}

#[async_trait]
impl OfferStore for MemoryOfferStore {
    async fn find_by_source_url(
        &self,
        source_url: &str,
    ) -> Result<Option<JobOffer>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .offers
            .values()
            .find(|offer| offer.source_url == source_url)
            .cloned())
    }

    async fn active_offers_for_source(
        &self,
        source_id: &str,
    ) -> Result<Vec<JobOffer>, StoreError> {
        let inner = self.inner.lock().await;
        let mut offers: Vec<JobOffer> = inner
            .offers
            .values()
            .filter(|offer| {
                offer.status == OfferStatus::Active
                    && offer.source_id.as_deref() == Some(source_id)
            })
            .cloned()
            .collect();
        offers.sort_by_key(|offer| offer.id);
        Ok(offers)
    }

    async fn stale_active_offers(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<JobOffer>, StoreError> {
        let inner = self.inner.lock().await;
        let mut offers: Vec<JobOffer> = inner
            .offers
            .values()
            .filter(|offer| offer.status == OfferStatus::Active && offer.last_seen_at < before)
            .cloned()
            .collect();
        offers.sort_by_key(|offer| offer.id);
        Ok(offers)
    }

    async fn delete_offers(&self, ids: &[OfferId]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        for id in ids {
            inner.offers.remove(id);
        }
        Ok(())
    }

    async fn apply(&self, changes: OfferChangeSet) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        for new_offer in changes.inserts {
            let id = inner.next_id;
            inner.next_id += 1;
            inner.offers.insert(
                id,
                JobOffer {
                    id,
                    title: new_offer.title,
                    facility_name: new_offer.facility_name,
                    city: new_offer.city,
                    role: new_offer.role,
                    description: new_offer.description,
                    summary: new_offer.summary,
                    source_url: new_offer.source_url,
                    source_id: new_offer.source_id,
                    external_job_url: new_offer.external_job_url,
                    first_seen_at: new_offer.first_seen_at,
                    last_seen_at: new_offer.last_seen_at,
                    scraped_at: new_offer.scraped_at,
                    created_at: new_offer.created_at,
                    status: new_offer.status,
                },
            );
        }
        for updated in changes.updates {
            inner.offers.insert(updated.id, updated);
        }
        for id in changes.inactivate {
            if let Some(offer) = inner.offers.get_mut(&id) {
                offer.status = OfferStatus::Inactive;
            }
        }
        Ok(())
    }

    async fn list_offers(&self, filter: &OfferFilter) -> Result<OfferPage, StoreError> {
        let inner = self.inner.lock().await;
        let mut matching: Vec<JobOffer> = inner
            .offers
            .values()
            .filter(|offer| {
                filter.status.map_or(true, |status| offer.status == status)
                    && filter.role.map_or(true, |role| offer.role == role)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = matching.len();
        let results = matching
            .into_iter()
            .skip(filter.offset)
            .take(if filter.limit == 0 { usize::MAX } else { filter.limit })
            .collect();
        Ok(OfferPage { total, results })
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<JobOffer>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.offers.get(&id).cloned())
    }
}
