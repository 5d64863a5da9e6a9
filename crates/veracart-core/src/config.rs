use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("must be a non-negative finite number, got {raw}"),
            });
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("VERACART_ENV", "development"));
    let log_level = or_default("VERACART_LOG_LEVEL", "info");
    let rules_path = PathBuf::from(or_default("VERACART_RULES_PATH", "./config/rules.yaml"));
    let search_api_key = lookup("VERACART_SEARCH_API_KEY").ok();

    let request_timeout_secs = parse_u64("VERACART_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("VERACART_USER_AGENT", "veracart/0.1 (listing-verification)");
    let max_concurrent_checks = parse_usize("VERACART_MAX_CONCURRENT_CHECKS", "4")?;
    let inter_request_delay_ms = parse_u64("VERACART_INTER_REQUEST_DELAY_MS", "0")?;
    let relevance_floor = parse_f64("VERACART_RELEVANCE_FLOOR", "0.15")?;
    let max_results = parse_usize("VERACART_MAX_RESULTS", "20")?;
    let price_ceiling = parse_f64("VERACART_PRICE_CEILING", "3000.0")?;

    if max_concurrent_checks == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "VERACART_MAX_CONCURRENT_CHECKS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if price_ceiling <= 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "VERACART_PRICE_CEILING".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        log_level,
        rules_path,
        search_api_key,
        request_timeout_secs,
        user_agent,
        max_concurrent_checks,
        inter_request_delay_ms,
        relevance_floor,
        max_results,
        price_ceiling,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
