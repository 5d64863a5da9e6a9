//! The validation-and-reconciliation orchestrator.
//!
//! Runs every raw backend item through the per-candidate chain
//! (ingest → structural check → accessibility → origin → relevance), then
//! reconciles the survivors: dedupe, price-ascending sort, cap, and the
//! curated fallback when nothing survived. A stage failure is terminal for
//! that candidate only; the batch itself never aborts.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use uuid::Uuid;

use veracart_core::{
    AppConfig, Candidate, RawItem, RejectReason, Rejection, RuleSet, SearchReport, SourceType,
    ValidatedProduct,
};

use crate::access::AccessChecker;
use crate::dedupe::dedupe;
use crate::error::PipelineError;
use crate::fallback::fallback_results;
use crate::ingest::candidate_from_raw;
use crate::origin::{classify_domain, host_of, DomainTrust};
use crate::patterns::validate_structure;
use crate::relevance::{is_relevant, relevance_score};

/// Outcome of processing a single raw item.
enum CandidateOutcome {
    Accepted(ValidatedProduct),
    Rejected(Rejection),
}

/// One search's worth of validation, configured once and reusable across
/// runs. Holds the shared HTTP checker and the immutable rule tables; no
/// state survives between [`ValidationPipeline::run`] calls.
pub struct ValidationPipeline {
    checker: AccessChecker,
    rules: Arc<RuleSet>,
    relevance_floor: f64,
    price_ceiling: f64,
    max_results: usize,
    max_concurrent_checks: usize,
    inter_request_delay_ms: u64,
}

impl ValidationPipeline {
    /// Builds a pipeline from the app configuration and compiled rules.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Http`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: &AppConfig, rules: Arc<RuleSet>) -> Result<Self, PipelineError> {
        let checker = AccessChecker::new(config.request_timeout_secs, &config.user_agent)?;
        Ok(Self {
            checker,
            rules,
            relevance_floor: config.relevance_floor,
            price_ceiling: config.price_ceiling,
            max_results: config.max_results,
            max_concurrent_checks: config.max_concurrent_checks.max(1),
            inter_request_delay_ms: config.inter_request_delay_ms,
        })
    }

    /// Validates a batch of raw backend items against `query` and returns
    /// the ranked, deduplicated result set plus the rejection ledger.
    ///
    /// Accessibility checks run through a bounded pool of
    /// `max_concurrent_checks` workers; every other stage is pure
    /// computation. The result set is never empty — an all-rejected batch
    /// is answered with the curated fallback catalog, marked as such.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyQuery`] for a blank query. Individual
    /// item failures never propagate.
    pub async fn run(
        &self,
        query: &str,
        raw_items: &[RawItem],
    ) -> Result<SearchReport, PipelineError> {
        if query.trim().is_empty() {
            return Err(PipelineError::EmptyQuery);
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(
            %run_id,
            query,
            items = raw_items.len(),
            "starting validation run"
        );

        let outcomes: Vec<CandidateOutcome> = stream::iter(raw_items.iter().enumerate())
            .map(|(idx, raw)| self.process_item(query, idx, raw))
            .buffer_unordered(self.max_concurrent_checks)
            .collect()
            .await;

        let mut accepted: Vec<ValidatedProduct> = Vec::new();
        let mut rejections: Vec<Rejection> = Vec::new();
        for outcome in outcomes {
            match outcome {
                CandidateOutcome::Accepted(product) => accepted.push(product),
                CandidateOutcome::Rejected(rejection) => rejections.push(rejection),
            }
        }

        let accepted_before_dedupe = accepted.len();
        let mut results = dedupe(accepted);
        results.sort_by(|a, b| {
            a.price_value
                .partial_cmp(&b.price_value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(self.max_results);

        if results.is_empty() {
            tracing::warn!(
                %run_id,
                rejected = rejections.len(),
                "no candidates survived validation; serving fallback catalog"
            );
            results = fallback_results(query, &self.rules, self.max_results);
        }

        tracing::info!(
            %run_id,
            accepted = accepted_before_dedupe,
            returned = results.len(),
            rejected = rejections.len(),
            fallback = results.iter().all(|p| p.source_type == SourceType::Fallback),
            "validation run complete"
        );

        Ok(SearchReport {
            run_id,
            query: query.to_string(),
            started_at,
            completed_at: Utc::now(),
            candidates_seen: raw_items.len(),
            rejections,
            results,
        })
    }

    /// Runs the full chain for one raw item and folds the result into a
    /// [`CandidateOutcome`]. Never fails.
    async fn process_item(&self, query: &str, idx: usize, raw: &RawItem) -> CandidateOutcome {
        // Sequential configuration: pace requests instead of fanning out.
        if self.max_concurrent_checks == 1 && self.inter_request_delay_ms > 0 && idx > 0 {
            tokio::time::sleep(Duration::from_millis(self.inter_request_delay_ms)).await;
        }

        match self.validate_item(query, raw).await {
            Ok(product) => CandidateOutcome::Accepted(product),
            Err((title, link, reason)) => {
                tracing::debug!(
                    title = %title,
                    link = %link,
                    reason = reason.kind(),
                    detail = %reason,
                    "candidate rejected"
                );
                CandidateOutcome::Rejected(Rejection::new(&title, &link, &reason))
            }
        }
    }

    /// The per-candidate state machine. Each stage either passes the
    /// candidate along or ends it with a typed reason.
    async fn validate_item(
        &self,
        query: &str,
        raw: &RawItem,
    ) -> Result<ValidatedProduct, (String, String, RejectReason)> {
        let candidate = candidate_from_raw(raw, self.price_ceiling)
            .map_err(|reason| (raw_text(raw, "title"), raw_link_guess(raw), reason))?;

        let fail = |candidate: &Candidate, reason: RejectReason| {
            (candidate.title.clone(), candidate.link.clone(), reason)
        };

        // Stage: domain trust. A blacklist hit is authoritative and ends the
        // chain before any other check, network included.
        let host = host_of(&candidate.link);
        if classify_domain(&host, &self.rules) == DomainTrust::Blacklisted {
            return Err(fail(
                &candidate,
                RejectReason::Blacklisted(format!("host '{host}' is a blocked marketplace")),
            ));
        }

        // Stage: structural URL shape.
        validate_structure(&candidate.link, &self.rules)
            .map_err(|reason| fail(&candidate, reason))?;

        // Stage: accessibility (the only network stage).
        let report = self.checker.check(&candidate.link, &self.rules).await;
        if !report.reachable {
            let detail = match (report.error, report.status) {
                (Some(kind), _) => kind.to_string(),
                (None, Some(status)) => format!("HTTP {status}"),
                (None, None) => "no response".to_string(),
            };
            return Err(fail(&candidate, RejectReason::Unreachable(detail)));
        }

        // Stage: origin. Redirects may have moved the candidate onto a
        // different host, so trust is re-derived from the final URL.
        let final_host = host_of(&report.final_url);
        if classify_domain(&final_host, &self.rules) == DomainTrust::Blacklisted {
            return Err(fail(
                &candidate,
                RejectReason::Blacklisted(format!(
                    "redirected to blocked marketplace host '{final_host}'"
                )),
            ));
        }
        if let Some(keyword) = &report.origin_keyword {
            return Err(fail(
                &candidate,
                RejectReason::ForeignOrigin(format!("page contains '{keyword}'")),
            ));
        }

        // Stage: relevance.
        if !is_relevant(&candidate.title, query, self.relevance_floor) {
            let score = relevance_score(&candidate.title, query);
            return Err(fail(
                &candidate,
                RejectReason::LowRelevance(format!(
                    "score {score:.2} below floor {:.2}",
                    self.relevance_floor
                )),
            ));
        }

        let mut warnings = Vec::new();
        if !report.looks_like_product_page {
            warnings.push("page has no commerce indicators; may not be a product page".to_string());
        }

        Ok(ValidatedProduct {
            title: candidate.title,
            price: candidate.price_text,
            price_value: candidate.price,
            source: candidate.source,
            link: report.final_url,
            rating: candidate.rating,
            review_count: candidate.review_count,
            image_url: candidate.image_url,
            trusted_domain: classify_domain(&final_host, &self.rules) == DomainTrust::Trusted,
            verified: true,
            source_type: SourceType::Live,
            warnings,
            checked_at: Utc::now(),
        })
    }
}

/// Best-effort string lookup on a raw item, for labeling rejections of
/// records that never became candidates.
fn raw_text(raw: &RawItem, key: &str) -> String {
    raw.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn raw_link_guess(raw: &RawItem) -> String {
    crate::ingest::LINK_KEYS
        .iter()
        .map(|key| raw_text(raw, key))
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}
