use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub rules_path: PathBuf,
    /// API key for the upstream shopping-search backend. The backend itself
    /// is an external collaborator; only the credential passes through here.
    pub search_api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Hard upper bound on concurrent outbound accessibility checks.
    pub max_concurrent_checks: usize,
    /// Pause between checks when running with a single worker. Ignored when
    /// `max_concurrent_checks > 1` — the bounded pool is the rate limiter then.
    pub inter_request_delay_ms: u64,
    /// Minimum token-overlap score a candidate title must reach against the query.
    pub relevance_floor: f64,
    pub max_results: usize,
    /// Upper sanity bound on parsed prices; anything above is treated as unparseable.
    pub price_ceiling: f64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("rules_path", &self.rules_path)
            .field(
                "search_api_key",
                &self.search_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_concurrent_checks", &self.max_concurrent_checks)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("relevance_floor", &self.relevance_floor)
            .field("max_results", &self.max_results)
            .field("price_ceiling", &self.price_ceiling)
            .finish()
    }
}
