use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_port() -> u16 {
    3000
}

fn default_environment() -> String {
    "dev".to_string()
}

impl Config {
    /// Loads `configuration.*` (optional), then `APP__*` variables, then the
    /// bare `PORT` / `ENVIRONMENT` variables, later sources winning.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .set_override_option("port", env::var("PORT").ok())?
            .set_override_option("environment", env::var("ENVIRONMENT").ok())?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn is_prod(&self) -> bool {
        self.environment == "prod"
    }
}

/// Read an environment variable.
///
/// In production every variable is mandatory. Elsewhere `default` is used
/// when the variable is unset, and a missing variable without a default is an
/// error.
pub fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Like [`get_env`], but parses the value and falls back to `default` when it
/// does not parse.
pub fn get_env_parsed<T>(key: &str, default: T, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr + ToString,
{
    let raw = get_env(key, Some(&default.to_string()), is_prod)?;
    Ok(raw.trim().parse().unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_uses_default_outside_prod() {
        let value = get_env("SERVICE_CORE_TEST_UNSET_A", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn missing_variable_without_default_is_an_error() {
        let err = get_env("SERVICE_CORE_TEST_UNSET_B", None, false).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(err.to_string().contains("SERVICE_CORE_TEST_UNSET_B"));
    }

    #[test]
    fn prod_ignores_defaults() {
        let err = get_env("SERVICE_CORE_TEST_UNSET_C", Some("fallback"), true).unwrap_err();
        assert!(err.to_string().contains("required in production"));
    }

    #[test]
    fn parsed_variable_falls_back_to_default() {
        let value: u64 = get_env_parsed("SERVICE_CORE_TEST_UNSET_D", 120, false).unwrap();
        assert_eq!(value, 120);
    }
}
