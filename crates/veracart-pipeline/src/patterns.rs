//! Structural link classification: product page vs search/listing page.
//!
//! All matching is table-driven from [`RuleSet`] — retailer path shapes,
//! search indicators, and the domain whitelist are data, so onboarding a new
//! retailer is a rules-file edit.

use veracart_core::{RejectReason, RuleSet};

use crate::origin::domain_matches_any;

/// Structural classification of a candidate link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkClass {
    /// The URL carries a search/listing indicator. Hard veto.
    pub search_page: bool,
    /// The path matches a retailer product pattern, or the host is a
    /// whitelisted retailer.
    pub product_page: bool,
    /// Which pattern-table retailer matched, when one did.
    pub matched_retailer: Option<String>,
}

/// Classifies a link's URL shape without any network traffic.
///
/// The search-indicator check runs first and is authoritative: a matching
/// link is a search page even when a product pattern would also match and
/// even when the host is whitelisted.
#[must_use]
pub fn classify_link(link: &str, rules: &RuleSet) -> LinkClass {
    let lower = link.to_lowercase();

    if let Some(indicator) = rules
        .search_indicators()
        .iter()
        .find(|ind| lower.contains(ind.as_str()))
    {
        tracing::debug!(link, indicator = %indicator, "link matched search indicator");
        return LinkClass {
            search_page: true,
            product_page: false,
            matched_retailer: None,
        };
    }

    let (host, path) = match reqwest::Url::parse(link) {
        Ok(url) => (
            url.host_str().unwrap_or("").to_lowercase(),
            url.path().to_string(),
        ),
        Err(_) => (String::new(), String::new()),
    };

    let matched_retailer = rules
        .product_patterns()
        .iter()
        .find(|(_, re)| re.is_match(&path))
        .map(|(retailer, _)| retailer.clone());

    let whitelisted = domain_matches_any(&host, rules.whitelist());

    LinkClass {
        search_page: false,
        product_page: matched_retailer.is_some() || whitelisted,
        matched_retailer,
    }
}

/// Full structural validation of a candidate link.
///
/// Passes only when the link is a well-formed absolute http(s) URL with a
/// non-empty host and a path longer than 3 characters, is not a search
/// page, and either matches a product pattern or sits on a whitelisted
/// retailer host.
///
/// # Errors
///
/// - [`RejectReason::Malformed`] — unparseable URL, non-http scheme, or
///   empty host.
/// - [`RejectReason::NotProductPage`] — search indicator hit, short path,
///   or no pattern/whitelist match.
pub fn validate_structure(link: &str, rules: &RuleSet) -> Result<(), RejectReason> {
    let url = reqwest::Url::parse(link)
        .map_err(|e| RejectReason::Malformed(format!("link is not an absolute URL: {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(RejectReason::Malformed(format!(
            "unsupported link scheme '{}'",
            url.scheme()
        )));
    }

    let host = url.host_str().unwrap_or("");
    if host.is_empty() {
        return Err(RejectReason::Malformed("link has no host".to_string()));
    }

    if url.path().len() <= 3 {
        return Err(RejectReason::NotProductPage(
            "path too short to identify a product".to_string(),
        ));
    }

    let class = classify_link(link, rules);
    if class.search_page {
        return Err(RejectReason::NotProductPage(
            "URL is a search or listing page".to_string(),
        ));
    }
    if !class.product_page {
        return Err(RejectReason::NotProductPage(
            "no product path pattern or whitelisted retailer matched".to_string(),
        ));
    }

    Ok(())
}
