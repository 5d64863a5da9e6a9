//! Seller-origin classification: domain trust tables and page-content
//! origin keyword scanning.

use veracart_core::RuleSet;

/// Trust classification of a seller domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainTrust {
    /// Domain is on the disallowed-marketplace table. Authoritative;
    /// short-circuits the rest of the validation chain.
    Blacklisted,
    /// Domain is on the trusted domestic-retailer table.
    Trusted,
    Unknown,
}

/// `true` when `domain` equals `entry` or is a subdomain of it
/// (`sub.aliexpress.com` matches `aliexpress.com`). Both sides are expected
/// pre-lowercased; table entries are lowercased at compile time.
fn domain_matches(domain: &str, entry: &str) -> bool {
    domain == entry || domain.ends_with(&format!(".{entry}"))
}

/// Suffix-match `domain` against a table of entries.
pub(crate) fn domain_matches_any(domain: &str, entries: &[String]) -> bool {
    entries.iter().any(|e| domain_matches(domain, e))
}

/// Classifies a domain against the blacklist and whitelist tables.
///
/// The blacklist is checked first: a domain somehow present on both tables
/// is blacklisted.
#[must_use]
pub fn classify_domain(domain: &str, rules: &RuleSet) -> DomainTrust {
    let lower = domain.to_lowercase();
    if domain_matches_any(&lower, rules.blacklist()) {
        return DomainTrust::Blacklisted;
    }
    if domain_matches_any(&lower, rules.whitelist()) {
        return DomainTrust::Trusted;
    }
    DomainTrust::Unknown
}

/// Returns the first origin-indicator phrase found in `body`
/// (case-insensitive), or `None`. A hit means the seller ships from a
/// foreign origin even when the domain itself is trusted.
#[must_use]
pub fn find_origin_keyword<'r>(body: &str, rules: &'r RuleSet) -> Option<&'r str> {
    let lowered = body.to_lowercase();
    rules
        .origin_keywords()
        .iter()
        .find(|kw| lowered.contains(kw.as_str()))
        .map(String::as_str)
}

/// Extracts the host from an absolute URL, lowercased. Empty string when
/// the URL does not parse.
#[must_use]
pub fn host_of(link: &str) -> String {
    reqwest::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default()
}
