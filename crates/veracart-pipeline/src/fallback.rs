//! Curated fallback catalog served when live validation accepts nothing.

use chrono::Utc;

use veracart_core::{RuleSet, SourceType, ValidatedProduct};

use crate::origin::{classify_domain, host_of, DomainTrust};

/// Builds the fallback result set for a query.
///
/// Entries come straight from the rules file — never scraped — with
/// `{query}` in titles substituted. Records are marked
/// `source_type = "fallback"` and `verified = false` so callers can
/// distinguish them from live-validated data. Capped at `max` entries.
#[must_use]
pub fn fallback_results(query: &str, rules: &RuleSet, max: usize) -> Vec<ValidatedProduct> {
    let checked_at = Utc::now();
    rules
        .fallback()
        .iter()
        .take(max)
        .map(|entry| {
            let trusted =
                classify_domain(&host_of(&entry.link), rules) == DomainTrust::Trusted;
            ValidatedProduct {
                title: entry.title.replace("{query}", query),
                price: entry.price_text.clone(),
                price_value: entry.price,
                source: entry.source.clone(),
                link: entry.link.clone(),
                rating: None,
                review_count: None,
                image_url: None,
                trusted_domain: trusted,
                verified: false,
                source_type: SourceType::Fallback,
                warnings: vec![],
                checked_at,
            }
        })
        .collect()
}
