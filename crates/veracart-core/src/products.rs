use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// One raw record as emitted by a search backend: an opaque key/value
/// mapping. No two backends are guaranteed to use the same keys.
pub type RawItem = serde_json::Map<String, serde_json::Value>;

/// Why a candidate was dropped from the batch.
///
/// Policy rejections (`Blacklisted`, `ForeignOrigin`, `NotProductPage`,
/// `LowRelevance`) and faults (`Unreachable`, `Malformed`) are both terminal
/// for the single candidate and never abort the batch.
#[derive(Debug, Clone, Error)]
pub enum RejectReason {
    #[error("seller domain is blacklisted: {0}")]
    Blacklisted(String),

    #[error("link is not reachable: {0}")]
    Unreachable(String),

    #[error("page content indicates foreign seller origin: {0}")]
    ForeignOrigin(String),

    #[error("link does not point at a product page: {0}")]
    NotProductPage(String),

    #[error("title is not relevant to the query: {0}")]
    LowRelevance(String),

    #[error("record is malformed: {0}")]
    Malformed(String),
}

impl RejectReason {
    /// Stable machine-readable label for tallies and report output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RejectReason::Blacklisted(_) => "blacklisted",
            RejectReason::Unreachable(_) => "unreachable",
            RejectReason::ForeignOrigin(_) => "foreign_origin",
            RejectReason::NotProductPage(_) => "not_product_page",
            RejectReason::LowRelevance(_) => "low_relevance",
            RejectReason::Malformed(_) => "malformed",
        }
    }
}

/// A parsed, not-yet-validated product record derived from one [`RawItem`].
///
/// Immutable once built, except `link`, which the accessibility check may
/// rewrite to the final post-redirect URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    /// Price exactly as the backend displayed it, e.g. `"$599.00"`.
    pub price_text: String,
    /// Parsed numeric price. Always `> 0` and below the configured ceiling
    /// for any candidate that survives ingestion.
    pub price: f64,
    /// Store/merchant name as reported by the backend.
    pub source: String,
    /// Absolute URL of the candidate listing.
    pub link: String,
    pub rating: Option<String>,
    pub review_count: Option<String>,
    pub image_url: Option<String>,
}

/// Whether a result came from live validation or the curated fallback catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Live,
    Fallback,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Live => write!(f, "live"),
            SourceType::Fallback => write!(f, "fallback"),
        }
    }
}

/// A candidate that passed the full validation chain, or a curated fallback
/// record. Immutable once created; only these appear in the final result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedProduct {
    pub title: String,
    /// Display price string, e.g. `"$599.00"`.
    pub price: String,
    pub price_value: f64,
    pub source: String,
    /// Final link after redirects were followed.
    pub link: String,
    pub rating: Option<String>,
    pub review_count: Option<String>,
    pub image_url: Option<String>,
    /// `true` when the seller domain is on the trusted-retailer whitelist.
    pub trusted_domain: bool,
    /// `true` only for records that passed live validation.
    pub verified: bool,
    pub source_type: SourceType,
    /// Non-fatal notes collected during validation, e.g. an ambiguous
    /// product page with no commerce indicators.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

impl ValidatedProduct {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source_type == SourceType::Fallback
    }
}

/// One rejected candidate in a [`SearchReport`], flattened for output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub title: String,
    pub link: String,
    /// Machine-readable reason label, one of the [`RejectReason`] kinds.
    pub reason: String,
    /// Human-readable detail.
    pub detail: String,
}

impl Rejection {
    #[must_use]
    pub fn new(title: &str, link: &str, reason: &RejectReason) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
            reason: reason.kind().to_string(),
            detail: reason.to_string(),
        }
    }
}

/// Everything one pipeline run produced: the ranked result set plus the
/// per-candidate rejection ledger. Rebuilt from scratch on every search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub run_id: Uuid,
    pub query: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Number of raw items received from the backend.
    pub candidates_seen: usize,
    pub rejections: Vec<Rejection>,
    /// Deduplicated, price-ascending, capped result set. Never empty: an
    /// all-rejected batch is replaced by the fallback catalog.
    pub results: Vec<ValidatedProduct>,
}

impl SearchReport {
    /// Count of rejections with the given [`RejectReason::kind`] label.
    #[must_use]
    pub fn rejected_count(&self, kind: &str) -> usize {
        self.rejections.iter().filter(|r| r.reason == kind).count()
    }

    /// `true` when the result set is the fallback catalog rather than
    /// live-validated records.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.results.iter().all(ValidatedProduct::is_fallback)
    }
}
