use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One entry in the product-path pattern table: a retailer label and the
/// path regex that identifies a concrete product page on that retailer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPattern {
    pub retailer: String,
    pub pattern: String,
}

/// A curated known-good product record served when live validation yields
/// nothing. Never scraped; `{query}` in the title is substituted at serve time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackEntry {
    pub title: String,
    pub price_text: String,
    pub price: f64,
    pub source: String,
    pub link: String,
}

/// Domain trust tables: disallowed marketplaces/origins and trusted
/// domestic retailers. Matching is exact or suffix (`.` + entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainTables {
    pub blacklist: Vec<String>,
    pub whitelist: Vec<String>,
}

/// On-disk schema of `config/rules.yaml`.
///
/// All validation tables live here as data so that adding a retailer,
/// pattern, or keyword is a config change, not a code change.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesFile {
    pub domains: DomainTables,
    /// Substrings that mark a URL as a search/listing page. Hard veto.
    pub search_indicators: Vec<String>,
    pub product_patterns: Vec<ProductPattern>,
    /// Page-content phrases indicating foreign seller origin.
    pub origin_keywords: Vec<String>,
    /// Page-content phrases expected on a purchasable product page.
    pub commerce_indicators: Vec<String>,
    pub fallback: Vec<FallbackEntry>,
}

/// Compiled, immutable rule tables shared by reference across the pipeline.
///
/// Built once at startup from a validated [`RulesFile`]; never mutated at
/// runtime, so concurrent reads need no synchronization.
#[derive(Debug)]
pub struct RuleSet {
    blacklist: Vec<String>,
    whitelist: Vec<String>,
    search_indicators: Vec<String>,
    product_patterns: Vec<(String, Regex)>,
    origin_keywords: Vec<String>,
    commerce_indicators: Vec<String>,
    fallback: Vec<FallbackEntry>,
}

impl RuleSet {
    pub fn blacklist(&self) -> &[String] {
        &self.blacklist
    }

    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    pub fn search_indicators(&self) -> &[String] {
        &self.search_indicators
    }

    /// `(retailer, compiled path regex)` pairs, in file order.
    pub fn product_patterns(&self) -> &[(String, Regex)] {
        &self.product_patterns
    }

    pub fn origin_keywords(&self) -> &[String] {
        &self.origin_keywords
    }

    pub fn commerce_indicators(&self) -> &[String] {
        &self.commerce_indicators
    }

    pub fn fallback(&self) -> &[FallbackEntry] {
        &self.fallback
    }
}

impl RulesFile {
    /// Compile the raw tables into a [`RuleSet`]: lower-case every matching
    /// table and compile the product-path regexes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] for an uncompilable regex.
    pub fn compile(&self) -> Result<RuleSet, ConfigError> {
        let product_patterns = self
            .product_patterns
            .iter()
            .map(|p| {
                Regex::new(&p.pattern)
                    .map(|re| (p.retailer.clone(), re))
                    .map_err(|e| ConfigError::InvalidPattern {
                        pattern: p.pattern.clone(),
                        source: e,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let lower = |v: &[String]| v.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>();

        Ok(RuleSet {
            blacklist: lower(&self.domains.blacklist),
            whitelist: lower(&self.domains.whitelist),
            search_indicators: lower(&self.search_indicators),
            product_patterns,
            origin_keywords: lower(&self.origin_keywords),
            commerce_indicators: lower(&self.commerce_indicators),
            fallback: self.fallback.clone(),
        })
    }
}

/// Load, validate, and compile the rules configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_rules(path: &Path) -> Result<RuleSet, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RulesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let rules_file: RulesFile = serde_yaml::from_str(&content)?;

    validate_rules(&rules_file)?;

    rules_file.compile()
}

fn validate_domain_list(label: &str, entries: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for entry in entries {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Validation(format!(
                "{label} contains an empty domain entry"
            )));
        }
        if trimmed.contains('/') || trimmed.contains(' ') {
            return Err(ConfigError::Validation(format!(
                "{label} entry '{trimmed}' must be a bare domain, not a URL"
            )));
        }
        if !seen.insert(trimmed.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate {label} entry: '{trimmed}'"
            )));
        }
    }
    Ok(())
}

fn validate_rules(rules: &RulesFile) -> Result<(), ConfigError> {
    validate_domain_list("blacklist", &rules.domains.blacklist)?;
    validate_domain_list("whitelist", &rules.domains.whitelist)?;

    let overlap: Vec<&String> = rules
        .domains
        .blacklist
        .iter()
        .filter(|d| {
            rules
                .domains
                .whitelist
                .iter()
                .any(|w| w.eq_ignore_ascii_case(d))
        })
        .collect();
    if let Some(domain) = overlap.first() {
        return Err(ConfigError::Validation(format!(
            "domain '{domain}' appears in both blacklist and whitelist"
        )));
    }

    if rules.search_indicators.is_empty() {
        return Err(ConfigError::Validation(
            "search_indicators must not be empty".to_string(),
        ));
    }

    if rules.product_patterns.is_empty() {
        return Err(ConfigError::Validation(
            "product_patterns must not be empty".to_string(),
        ));
    }

    // The fallback catalog is the guarantee that a search never returns an
    // empty response, so an empty table is a configuration error.
    if rules.fallback.is_empty() {
        return Err(ConfigError::Validation(
            "fallback catalog must contain at least one entry".to_string(),
        ));
    }

    for entry in &rules.fallback {
        if entry.title.trim().is_empty() {
            return Err(ConfigError::Validation(
                "fallback entry has an empty title".to_string(),
            ));
        }
        if !(entry.price > 0.0 && entry.price.is_finite()) {
            return Err(ConfigError::Validation(format!(
                "fallback entry '{}' has non-positive price {}",
                entry.title, entry.price
            )));
        }
        if !entry.link.starts_with("https://") && !entry.link.starts_with("http://") {
            return Err(ConfigError::Validation(format!(
                "fallback entry '{}' has a non-absolute link '{}'",
                entry.title, entry.link
            )));
        }
    }

    Ok(())
}
