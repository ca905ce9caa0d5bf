//! Core domain model for Medietat: job offers, the medical-role taxonomy,
//! and refresh-run reporting types shared by every other crate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CRATE_NAME: &str = "medietat-core";

/// Fixed taxonomy of medical roles. Display labels are the Polish forms the
/// public API has always exposed, so serde carries them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MedicalRole {
    #[serde(rename = "Lekarz")]
    Lekarz,
    #[serde(rename = "Pielęgniarka / Pielęgniarz")]
    Pielegniarka,
    #[serde(rename = "Położna")]
    Polozna,
    #[serde(rename = "Ratownik medyczny")]
    Ratownik,
    #[serde(rename = "Inny personel medyczny")]
    Inny,
}

impl MedicalRole {
    pub fn label(&self) -> &'static str {
        match self {
            MedicalRole::Lekarz => "Lekarz",
            MedicalRole::Pielegniarka => "Pielęgniarka / Pielęgniarz",
            MedicalRole::Polozna => "Położna",
            MedicalRole::Ratownik => "Ratownik medyczny",
            MedicalRole::Inny => "Inny personel medyczny",
        }
    }

    /// Parses either the display label or the short identifier used in query
    /// strings (`lekarz`, `pielegniarka`, ...).
    pub fn parse(input: &str) -> Option<Self> {
        let lowered = input.trim().to_lowercase();
        match lowered.as_str() {
            "lekarz" => Some(MedicalRole::Lekarz),
            "pielegniarka" | "pielęgniarka" | "pielęgniarka / pielęgniarz" => {
                Some(MedicalRole::Pielegniarka)
            }
            "polozna" | "położna" => Some(MedicalRole::Polozna),
            "ratownik" | "ratownik medyczny" => Some(MedicalRole::Ratownik),
            "inny" | "inny personel medyczny" => Some(MedicalRole::Inny),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Active,
    Inactive,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Active => "active",
            OfferStatus::Inactive => "inactive",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "active" => Some(OfferStatus::Active),
            "inactive" => Some(OfferStatus::Inactive),
            _ => None,
        }
    }
}

/// Store-assigned offer identity.
pub type OfferId = i64;

/// Persisted job offer. `source_url` is the sole deduplication key; the same
/// posting mirrored on two sites is two rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOffer {
    pub id: OfferId,
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

/// Cleaned, classified record extracted from one source page, ready for
/// reconciliation against the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCandidate {
    pub title: String,
    pub facility_name: String,
    pub city: String,
    pub role: MedicalRole,
    pub description: Option<String>,
    pub source_url: String,
    pub external_job_url: Option<String>,
}

/// Strips a trailing `#fragment`, the URL identity used for batch-level and
/// historical deduplication. Synthesized text-only listings differ only in
/// their fragment, so two candidates for the same base page collapse to one.
pub fn fragment_stripped(url: &str) -> &str {
    match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub new: usize,
    pub updated: usize,
    pub skipped: usize,
    pub inactivated: usize,
}

/// Per-source outcome within one refresh run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub new: usize,
    pub updated: usize,
    pub skipped: usize,
    pub inactivated: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn from_counts(counts: SourceCounts) -> Self {
        Self {
            new: counts.new,
            updated: counts.updated,
            skipped: counts.skipped,
            inactivated: counts.inactivated,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceError {
    pub source: String,
    pub message: String,
}

/// Aggregate report for one refresh run over all configured sources. Always
/// returned, never thrown past the top level; callers decide on alerting
/// thresholds based on `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub sources_processed: usize,
    pub sources_failed: usize,
    pub new_offers: usize,
    pub updated_offers: usize,
    pub inactivated_offers: usize,
    pub errors: Vec<SourceError>,
    pub source_results: BTreeMap<String, SourceOutcome>,
}

impl RunReport {
    pub fn begin(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: started_at,
            status: RunStatus::Success,
            sources_processed: 0,
            sources_failed: 0,
            new_offers: 0,
            updated_offers: 0,
            inactivated_offers: 0,
            errors: Vec::new(),
            source_results: BTreeMap::new(),
        }
    }

    pub fn record_source(&mut self, source_id: &str, outcome: SourceOutcome) {
        self.sources_processed += 1;
        self.new_offers += outcome.new;
        self.updated_offers += outcome.updated;
        self.inactivated_offers += outcome.inactivated;
        if let Some(message) = &outcome.error {
            self.sources_failed += 1;
            self.errors.push(SourceError {
                source: source_id.to_string(),
                message: message.clone(),
            });
        }
        self.source_results.insert(source_id.to_string(), outcome);
    }

    /// `failed` only when every source errored; `partial` when some did.
    pub fn finish(&mut self, finished_at: DateTime<Utc>) {
        self.finished_at = finished_at;
        self.status = if self.sources_failed == 0 {
            RunStatus::Success
        } else if self.sources_failed < self.sources_processed {
            RunStatus::Partial
        } else {
            RunStatus::Failed
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn role_serde_uses_display_labels() {
        let json = serde_json::to_string(&MedicalRole::Pielegniarka).unwrap();
        assert_eq!(json, "\"Pielęgniarka / Pielęgniarz\"");
        let back: MedicalRole = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MedicalRole::Pielegniarka);
    }

    #[test]
    fn role_parse_accepts_short_identifiers() {
        assert_eq!(MedicalRole::parse("lekarz"), Some(MedicalRole::Lekarz));
        assert_eq!(MedicalRole::parse("Położna"), Some(MedicalRole::Polozna));
        assert_eq!(MedicalRole::parse("unknown"), None);
    }

    #[test]
    fn fragment_stripping_keeps_base_url() {
        assert_eq!(fragment_stripped("http://x/page#abc"), "http://x/page");
        assert_eq!(fragment_stripped("http://x/page"), "http://x/page");
        assert_eq!(fragment_stripped("http://x/#a#b"), "http://x/");
    }

    #[test]
    fn run_report_status_rolls_up_per_source_outcomes() {
        let started = Utc.with_ymd_and_hms(2026, 2, 24, 6, 0, 0).single().unwrap();
        let mut report = RunReport::begin(Uuid::new_v4(), started);
        report.record_source(
            "oipip_gdansk",
            SourceOutcome::from_counts(SourceCounts {
                new: 3,
                updated: 1,
                skipped: 2,
                inactivated: 1,
            }),
        );
        report.record_source("uck", SourceOutcome::failed("fetch timed out"));
        report.finish(started);

        assert_eq!(report.status, RunStatus::Partial);
        assert_eq!(report.sources_processed, 2);
        assert_eq!(report.sources_failed, 1);
        assert_eq!(report.new_offers, 3);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].source, "uck");
    }

    #[test]
    fn run_report_failed_when_all_sources_error() {
        let started = Utc.with_ymd_and_hms(2026, 2, 24, 6, 0, 0).single().unwrap();
        let mut report = RunReport::begin(Uuid::new_v4(), started);
        report.record_source("uck", SourceOutcome::failed("boom"));
        report.finish(started);
        assert_eq!(report.status, RunStatus::Failed);
    }
}
