//! Network accessibility checking for candidate links.
//!
//! One outbound GET per candidate, redirects followed, with the page body
//! scanned for origin and commerce signals. Transport failures are typed
//! and reported in the [`AccessReport`] — they never propagate as errors,
//! because an unreachable link is an ordinary per-candidate rejection.

use std::time::Duration;

use reqwest::Client;

use veracart_core::RuleSet;

use crate::error::PipelineError;
use crate::origin::find_origin_keyword;

/// Cap on redirect hops before a link is treated as failed.
const MAX_REDIRECTS: usize = 10;

/// What went wrong at the transport layer, when anything did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessErrorKind {
    Timeout,
    ConnectFailed,
    RequestFailed,
    Unexpected,
}

impl std::fmt::Display for AccessErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessErrorKind::Timeout => write!(f, "timeout"),
            AccessErrorKind::ConnectFailed => write!(f, "connection failed"),
            AccessErrorKind::RequestFailed => write!(f, "request failed"),
            AccessErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Outcome of one accessibility check.
#[derive(Debug, Clone)]
pub struct AccessReport {
    /// `true` only on HTTP 200.
    pub reachable: bool,
    /// HTTP status when a response was received at all.
    pub status: Option<u16>,
    /// URL after redirects; equals the request URL when none occurred or
    /// the request never completed.
    pub final_url: String,
    /// Contents of the `<title>` element, best-effort.
    pub page_title: Option<String>,
    /// First origin-indicator phrase found in the body, if any.
    pub origin_keyword: Option<String>,
    /// At least one generic commerce indicator was found in the body.
    pub looks_like_product_page: bool,
    /// Set iff the request failed at the transport layer.
    pub error: Option<AccessErrorKind>,
}

impl AccessReport {
    fn unreachable(url: &str, status: Option<u16>, error: Option<AccessErrorKind>) -> Self {
        Self {
            reachable: false,
            status,
            final_url: url.to_string(),
            page_title: None,
            origin_keyword: None,
            looks_like_product_page: false,
            error,
        }
    }
}

/// HTTP checker for candidate product links.
///
/// Holds one shared `reqwest::Client` with the configured timeout,
/// `User-Agent`, and a capped redirect policy. Cheap to clone per task.
#[derive(Debug, Clone)]
pub struct AccessChecker {
    client: Client,
}

impl AccessChecker {
    /// Creates an `AccessChecker` with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }

    /// Fetches `url` once, following redirects, and reports reachability
    /// plus content-derived signals.
    ///
    /// Never returns an error: timeouts, refused connections, redirect
    /// loops, and unreadable bodies all come back as an unreachable
    /// [`AccessReport`] with a typed [`AccessErrorKind`].
    pub async fn check(&self, url: &str, rules: &RuleSet) -> AccessReport {
        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let kind = classify_transport_error(&e);
                tracing::debug!(url, error = %e, kind = %kind, "accessibility check failed");
                return AccessReport::unreachable(url, None, Some(kind));
            }
        };

        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        if status != 200 {
            tracing::debug!(url, status, "non-200 response; treating link as unreachable");
            return AccessReport::unreachable(&final_url, Some(status), None);
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(url, error = %e, "failed to read response body");
                return AccessReport::unreachable(
                    &final_url,
                    Some(status),
                    Some(AccessErrorKind::RequestFailed),
                );
            }
        };

        let lowered = body.to_lowercase();
        let looks_like_product_page = rules
            .commerce_indicators()
            .iter()
            .any(|ind| lowered.contains(ind.as_str()));

        AccessReport {
            reachable: true,
            status: Some(status),
            final_url,
            page_title: extract_title(&body),
            origin_keyword: find_origin_keyword(&body, rules).map(str::to_string),
            looks_like_product_page,
            error: None,
        }
    }
}

/// Maps a `reqwest` failure onto the access error taxonomy.
fn classify_transport_error(e: &reqwest::Error) -> AccessErrorKind {
    if e.is_timeout() {
        AccessErrorKind::Timeout
    } else if e.is_connect() {
        AccessErrorKind::ConnectFailed
    } else if e.is_request() || e.is_redirect() || e.is_body() || e.is_decode() {
        AccessErrorKind::RequestFailed
    } else {
        AccessErrorKind::Unexpected
    }
}

/// Extracts the text of the first `<title>` element, trimmed.
///
/// Tolerates attributes on the tag and mixed case. Returns `None` when no
/// complete element exists or the title is empty.
fn extract_title(body: &str) -> Option<String> {
    let lowered = body.to_lowercase();
    let open = lowered.find("<title")?;
    let content_start = open + lowered[open..].find('>')? + 1;
    let content_end = content_start + lowered[content_start..].find("</title")?;
    let title = body.get(content_start..content_end)?.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
