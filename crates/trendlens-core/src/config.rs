use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Default chunk ceiling: keeps a chunk of typical product documents well
/// under a 1 MB storage-unit limit.
pub const DEFAULT_CHUNK_SIZE: usize = 450;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function,
/// so the parsing rules can be tested against a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        let value = raw
            .trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("TRENDLENS_ENV", "development"))?;
    let log_level = or_default("TRENDLENS_LOG_LEVEL", "info");
    let store_path = PathBuf::from(or_default("TRENDLENS_STORE_PATH", "./data/catalog.json"));
    let chunk_size = parse_positive_usize("TRENDLENS_CHUNK_SIZE", &DEFAULT_CHUNK_SIZE.to_string())?;
    let extra_excluded_keywords =
        parse_keyword_list(&or_default("TRENDLENS_EXTRA_EXCLUDED_KEYWORDS", ""));

    Ok(AppConfig {
        env,
        log_level,
        store_path,
        chunk_size,
        extra_excluded_keywords,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TRENDLENS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Splits a comma-separated keyword list, lowercasing and dropping blanks.
fn parse_keyword_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
