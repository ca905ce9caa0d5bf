//! Postgres-backed offer store. Queries use runtime binding and manual row
//! mapping; role and status are stored as their text labels.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medietat_core::{JobOffer, MedicalRole, OfferId, OfferStatus};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::offers::{OfferChangeSet, OfferFilter, OfferPage, OfferStore, StoreError};

#[derive(Debug, Clone)]
pub struct PgOfferStore {
    pool: PgPool,
}

impl PgOfferStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const OFFER_COLUMNS: &str = "id, title, facility_name, city, role, description, summary, \
     source_url, source_id, external_job_url, first_seen_at, last_seen_at, \
     scraped_at, created_at, status";

fn offer_from_row(row: &PgRow) -> Result<JobOffer, StoreError> {
    let role_label: String = row.try_get("role")?;
    let role = MedicalRole::parse(&role_label)
        .ok_or_else(|| StoreError::Message(format!("unknown role label: {role_label}")))?;
    let status_label: String = row.try_get("status")?;
    let status = OfferStatus::parse(&status_label)
        .ok_or_else(|| StoreError::Message(format!("unknown status: {status_label}")))?;
    Ok(JobOffer {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        facility_name: row.try_get("facility_name")?,
        city: row.try_get("city")?,
        role,
        description: row.try_get("description")?,
        summary: row.try_get("summary")?,
        source_url: row.try_get("source_url")?,
        source_id: row.try_get("source_id")?,
        external_job_url: row.try_get("external_job_url")?,
        first_seen_at: row.try_get("first_seen_at")?,
        last_seen_at: row.try_get("last_seen_at")?,
        scraped_at: row.try_get("scraped_at")?,
        created_at: row.try_get("created_at")?,
        status,
    })
}

#[async_trait]
impl OfferStore for PgOfferStore {
    async fn find_by_source_url(
        &self,
        source_url: &str,
    ) -> Result<Option<JobOffer>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {OFFER_COLUMNS} FROM job_offers WHERE source_url = $1"
        ))
        .bind(source_url)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(offer_from_row).transpose()
    }

    async fn active_offers_for_source(
        &self,
        source_id: &str,
    ) -> Result<Vec<JobOffer>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {OFFER_COLUMNS} FROM job_offers \
             WHERE source_id = $1 AND status = 'active' ORDER BY id"
        ))
        .bind(source_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(offer_from_row).collect()
    }

    async fn stale_active_offers(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<JobOffer>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {OFFER_COLUMNS} FROM job_offers \
             WHERE status = 'active' AND last_seen_at < $1 ORDER BY id"
        ))
        .bind(before)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(offer_from_row).collect()
    }

    async fn delete_offers(&self, ids: &[OfferId]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        sqlx::query("DELETE FROM job_offers WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn apply(&self, changes: OfferChangeSet) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;

        for offer in &changes.inserts {
            sqlx::query(
                "INSERT INTO job_offers \
                 (title, facility_name, city, role, description, summary, source_url, \
                  source_id, external_job_url, first_seen_at, last_seen_at, scraped_at, \
                  created_at, status) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            )
            .bind(&offer.title)
            .bind(&offer.facility_name)
            .bind(&offer.city)
            .bind(offer.role.label())
            .bind(&offer.description)
            .bind(&offer.summary)
            .bind(&offer.source_url)
            .bind(&offer.source_id)
            .bind(&offer.external_job_url)
            .bind(offer.first_seen_at)
            .bind(offer.last_seen_at)
            .bind(offer.scraped_at)
            .bind(offer.created_at)
            .bind(offer.status.as_str())
            .execute(&mut *tx)
            .await?;
        }

        for offer in &changes.updates {
            sqlx::query(
                "UPDATE job_offers SET title = $2, facility_name = $3, city = $4, \
                 role = $5, description = $6, summary = $7, source_id = $8, \
                 external_job_url = $9, first_seen_at = $10, last_seen_at = $11, \
                 scraped_at = $12, status = $13 \
                 WHERE id = $1",
            )
            .bind(offer.id)
            .bind(&offer.title)
            .bind(&offer.facility_name)
            .bind(&offer.city)
            .bind(offer.role.label())
            .bind(&offer.description)
            .bind(&offer.summary)
            .bind(&offer.source_id)
            .bind(&offer.external_job_url)
            .bind(offer.first_seen_at)
            .bind(offer.last_seen_at)
            .bind(offer.scraped_at)
            .bind(offer.status.as_str())
            .execute(&mut *tx)
            .await?;
        }

        if !changes.inactivate.is_empty() {
            sqlx::query("UPDATE job_offers SET status = 'inactive' WHERE id = ANY($1)")
                .bind(&changes.inactivate)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_offers(&self, filter: &OfferFilter) -> Result<OfferPage, StoreError> {
        let mut conditions = Vec::new();
        if filter.status.is_some() {
            conditions.push("status = $1");
        }
        if filter.role.is_some() {
            conditions.push(if filter.status.is_some() {
                "role = $2"
            } else {
                "role = $1"
            });
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) AS total FROM job_offers{where_clause}");
        let mut count_query = sqlx::query(&count_sql);
        if let Some(status) = filter.status {
            count_query = count_query.bind(status.as_str());
        }
        if let Some(role) = filter.role {
            count_query = count_query.bind(role.label());
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?.try_get("total")?;

        let limit = if filter.limit == 0 { i64::MAX } else { filter.limit as i64 };
        let bind_base = conditions.len();
        let list_sql = format!(
            "SELECT {OFFER_COLUMNS} FROM job_offers{where_clause} \
             ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
            bind_base + 1,
            bind_base + 2
        );
        let mut list_query = sqlx::query(&list_sql);
        if let Some(status) = filter.status {
            list_query = list_query.bind(status.as_str());
        }
        if let Some(role) = filter.role {
            list_query = list_query.bind(role.label());
        }
        let rows = list_query
            .bind(limit)
            .bind(filter.offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(OfferPage {
            total: total as usize,
            results: rows.iter().map(offer_from_row).collect::<Result<_, _>>()?,
        })
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<JobOffer>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {OFFER_COLUMNS} FROM job_offers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(offer_from_row).transpose()
    }
}
