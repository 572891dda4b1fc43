//! Environment-sourced configuration

use crate::commerce::DEFAULT_BASE_URL;
use reqwest::Url;
use std::collections::HashMap;
use std::fmt::Display;
use std::io;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("cannot read .env file: {0}")]
    DotEnv(String),
}

/// How screens are laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontSettings {
    pub page_size: NonZeroUsize,
    /// Quantities offered as add-to-cart buttons, filtered by stock
    pub quantity_options: Vec<u32>,
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        Self {
            page_size: NonZeroUsize::new(8).unwrap_or(NonZeroUsize::MIN),
            quantity_options: vec![1, 5, 10],
        }
    }
}

pub struct Config {
    pub bot_token: String,
    pub proxy: Option<String>,
    pub commerce_client_id: String,
    pub commerce_base_url: String,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_password: Option<String>,
    pub storefront: StorefrontSettings,
    pub http_timeout: Duration,
    /// `None` keeps sessions forever
    pub session_ttl_secs: Option<u64>,
    pub conversation_idle: Duration,
}

impl Config {
    /// Process environment, falling back to a `.env` file in the working directory
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = match std::fs::File::open(".env") {
            Ok(file) => dotenv_entries(file)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(ConfigError::DotEnv(e.to_string())),
        };
        Self::from_lookup(|var| std::env::var(var).ok().or_else(|| file.get(var).cloned()))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let page_size: usize = env.parsed("CATALOG_PAGE_SIZE", 8)?;
        let page_size = NonZeroUsize::new(page_size).ok_or(ConfigError::Invalid {
            var: "CATALOG_PAGE_SIZE",
            reason: "must be greater than zero".to_string(),
        })?;

        let http_timeout: u64 = env.parsed("HTTP_TIMEOUT_SECS", 10)?;
        if http_timeout == 0 {
            return Err(ConfigError::Invalid {
                var: "HTTP_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let idle: u64 = env.parsed("CONVERSATION_IDLE_SECS", 300)?;
        if idle == 0 {
            return Err(ConfigError::Invalid {
                var: "CONVERSATION_IDLE_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let session_ttl: u64 = env.parsed("SESSION_TTL_SECS", 30 * 24 * 60 * 60)?;

        Ok(Self {
            bot_token: env.required("TG_BOT_TOKEN")?,
            proxy: env.optional("PROXY"),
            commerce_client_id: env.required("ELASTICPATH_CLIENT_ID")?,
            commerce_base_url: env
                .optional("ELASTICPATH_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            redis_host: env.required("REDIS_DB_ADDRESS")?,
            redis_port: env.parsed("REDIS_DB_PORT", 6379)?,
            redis_password: env.optional("REDIS_DB_PASSWORD"),
            storefront: StorefrontSettings {
                page_size,
                quantity_options: env.quantities("QUANTITY_BUTTONS")?,
            },
            http_timeout: Duration::from_secs(http_timeout),
            session_ttl_secs: (session_ttl > 0).then_some(session_ttl),
            conversation_idle: Duration::from_secs(idle),
        })
    }

    /// Connection URL for the session store
    pub fn redis_url(&self) -> Result<String, ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid {
            var: "REDIS_DB_ADDRESS",
            reason,
        };

        let mut url = Url::parse("redis://localhost").map_err(|e| invalid(e.to_string()))?;
        url.set_host(Some(self.redis_host.as_str()))
            .map_err(|e| invalid(e.to_string()))?;
        url.set_port(Some(self.redis_port))
            .map_err(|()| invalid("cannot carry a port".to_string()))?;
        if let Some(password) = &self.redis_password {
            url.set_password(Some(password.as_str()))
                .map_err(|()| invalid("cannot carry a password".to_string()))?;
        }
        Ok(url.into())
    }
}

fn dotenv_entries<R: io::Read>(reader: R) -> Result<HashMap<String, String>, ConfigError> {
    dotenvy::from_read_iter(reader)
        .collect::<Result<_, _>>()
        .map_err(|e| ConfigError::DotEnv(e.to_string()))
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-empty value of `var`
    fn optional(&self, var: &str) -> Option<String> {
        (self.0)(var)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, var: &'static str) -> Result<String, ConfigError> {
        self.optional(var).ok_or(ConfigError::Missing(var))
    }

    fn parsed<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(value) = self.optional(var) else {
            return Ok(default);
        };
        value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: format!("{value:?}: {e}"),
        })
    }

    /// Comma-separated positive integers
    fn quantities(&self, var: &'static str) -> Result<Vec<u32>, ConfigError> {
        let Some(value) = self.optional(var) else {
            return Ok(StorefrontSettings::default().quantity_options);
        };

        let invalid = |reason: String| ConfigError::Invalid { var, reason };
        value
            .split(',')
            .map(str::trim)
            .map(|item| match item.parse::<u32>() {
                Ok(0) => Err(invalid("quantities must be positive".to_string())),
                Ok(quantity) => Ok(quantity),
                Err(e) => Err(invalid(format!("{item:?}: {e}"))),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let mut env: HashMap<String, String> = [
            ("TG_BOT_TOKEN", "123:abc"),
            ("ELASTICPATH_CLIENT_ID", "client-1"),
            ("REDIS_DB_ADDRESS", "redis.internal"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in vars {
            env.insert((*k).to_string(), (*v).to_string());
        }
        Config::from_lookup(|var| env.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.commerce_base_url, "https://api.moltin.com");
        assert_eq!(config.redis_port, 6379);
        assert_eq!(config.proxy, None);
        assert_eq!(config.storefront, StorefrontSettings::default());
        assert_eq!(config.storefront.page_size.get(), 8);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.session_ttl_secs, Some(2_592_000));
        assert_eq!(config.conversation_idle, Duration::from_secs(300));
    }

    #[test]
    fn test_missing_token_is_named() {
        let err = Config::from_lookup(|_| None).err().unwrap();
        assert_eq!(err, ConfigError::Missing("TG_BOT_TOKEN"));
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let err = config(&[("CATALOG_PAGE_SIZE", "0")]).err().unwrap();
        assert!(matches!(err, ConfigError::Invalid { var: "CATALOG_PAGE_SIZE", .. }));
    }

    #[test]
    fn test_malformed_port_is_rejected() {
        let err = config(&[("REDIS_DB_PORT", "redis")]).err().unwrap();
        assert!(matches!(err, ConfigError::Invalid { var: "REDIS_DB_PORT", .. }));
    }

    #[test]
    fn test_quantity_list() {
        let parsed = config(&[("QUANTITY_BUTTONS", "2, 4,8")]).unwrap();
        assert_eq!(parsed.storefront.quantity_options, vec![2, 4, 8]);

        for bad in ["1,,5", "1,0", "one"] {
            let err = config(&[("QUANTITY_BUTTONS", bad)]).err().unwrap();
            assert!(matches!(err, ConfigError::Invalid { var: "QUANTITY_BUTTONS", .. }), "{bad}");
        }
    }

    #[test]
    fn test_zero_ttl_disables_expiry() {
        let config = config(&[("SESSION_TTL_SECS", "0")]).unwrap();
        assert_eq!(config.session_ttl_secs, None);
    }

    #[test]
    fn test_redis_url_carries_password() {
        let config = config(&[("REDIS_DB_PORT", "16379"), ("REDIS_DB_PASSWORD", "s3cret")]).unwrap();
        assert_eq!(
            config.redis_url().unwrap(),
            "redis://:s3cret@redis.internal:16379"
        );
    }

    #[test]
    fn test_dotenv_file_supplies_unset_variables() {
        let file = dotenv_entries(
            "# local settings\nTG_BOT_TOKEN=123:abc\nELASTICPATH_CLIENT_ID=\"client-1\"\nREDIS_DB_ADDRESS=redis.internal\nREDIS_DB_PORT=16379\n"
                .as_bytes(),
        )
        .unwrap();
        let process: HashMap<&str, &str> = [("REDIS_DB_PORT", "6380")].into_iter().collect();

        let parsed = Config::from_lookup(|var| {
            process
                .get(var)
                .map(|v| (*v).to_string())
                .or_else(|| file.get(var).cloned())
        })
        .unwrap();
        assert_eq!(parsed.bot_token, "123:abc");
        assert_eq!(parsed.commerce_client_id, "client-1");
        assert_eq!(parsed.redis_port, 6380);
    }

    #[test]
    fn test_malformed_dotenv_file_is_rejected() {
        let err = dotenv_entries("TG_BOT_TOKEN 123:abc\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::DotEnv(_)));
    }

    #[test]
    fn test_redis_url_without_password() {
        assert_eq!(
            config(&[]).unwrap().redis_url().unwrap(),
            "redis://redis.internal:6379"
        );
    }
}
