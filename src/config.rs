//! Harness settings, read from the environment (after `.env` is loaded by the binary).

use std::sync::Arc;

use config::{Config, Environment, Map};
use serde::Deserialize;

use crate::client::{ApiKeyAuth, AuthStrategy, PublicKeyAuth};
use crate::error::ConfigError;

/// Which credential header the deployment expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    #[default]
    ApiKey,
    PublicKey,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HarnessConfig {
    /// `ORDERBOOK_HOST`
    pub orderbook_host: String,
    /// `AUTH_MODE`: `api-key` or `public-key`
    pub auth_mode: AuthMode,
    /// `API_KEY`
    pub api_key: String,
    /// `PUB_KEY`, base64 DER
    #[serde(default)]
    pub pub_key: Option<String>,
    /// `SYMBOL`
    pub symbol: String,
    /// `DEPTH_LIMIT`: levels per side requested from the depth endpoint
    pub depth_limit: u32,
    /// `METRICS_PORT`
    pub metrics_port: u16,
}

impl HarnessConfig {
    pub const MAX_DEPTH_LIMIT: u32 = 1000;

    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::default())
    }

    /// Same as `load`, but reads the given variables instead of the process environment.
    pub fn from_vars(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::from_environment(Environment::default().source(Some(vars)))
    }

    fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        let mut cfg: HarnessConfig = Config::builder()
            .set_default("orderbook_host", "http://localhost:8080")?
            .set_default("auth_mode", "api-key")?
            .set_default("api_key", "abcdef12345")?
            .set_default("symbol", "ETH-USD")?
            .set_default("depth_limit", 20)?
            .set_default("metrics_port", 9000)?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        cfg.orderbook_host = cfg.orderbook_host.trim().trim_end_matches('/').to_string();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.orderbook_host.is_empty() {
            return Err(ConfigError::Invalid("ORDERBOOK_HOST is empty".into()));
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("SYMBOL is empty".into()));
        }
        if self.depth_limit == 0 || self.depth_limit > Self::MAX_DEPTH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "DEPTH_LIMIT must be between 1 and {}, got {}",
                Self::MAX_DEPTH_LIMIT,
                self.depth_limit
            )));
        }
        if self.auth_mode == AuthMode::PublicKey && self.pub_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid("AUTH_MODE=public-key requires PUB_KEY".into()));
        }
        Ok(())
    }

    /// Every seeded level has to fit in one depth read.
    pub fn check_ladder_depth(&self, ladder_depth: u32) -> Result<(), ConfigError> {
        if ladder_depth == 0 {
            return Err(ConfigError::Invalid("ladder depth must be at least 1".into()));
        }
        if ladder_depth > self.depth_limit {
            return Err(ConfigError::Invalid(format!(
                "ladder depth {} exceeds DEPTH_LIMIT {}; raise --limit",
                ladder_depth, self.depth_limit
            )));
        }
        Ok(())
    }

    /// Credential strategy for the configured deployment.
    pub fn credentials(&self) -> Result<Arc<dyn AuthStrategy>, ConfigError> {
        let strategy: Arc<dyn AuthStrategy> = match self.auth_mode {
            AuthMode::ApiKey => Arc::new(ApiKeyAuth::new(&self.api_key)?),
            AuthMode::PublicKey => Arc::new(PublicKeyAuth::new(self.pub_key.as_deref().unwrap_or_default())?),
        };
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let cfg = HarnessConfig::from_vars(Map::new()).unwrap();
        assert_eq!(cfg.orderbook_host, "http://localhost:8080");
        assert_eq!(cfg.auth_mode, AuthMode::ApiKey);
        assert_eq!(cfg.symbol, "ETH-USD");
        assert_eq!(cfg.depth_limit, 20);
        assert_eq!(cfg.credentials().unwrap().scheme(), "api-key");
    }

    #[test]
    fn test_environment_overrides() {
        let cfg = HarnessConfig::from_vars(vars(&[
            ("ORDERBOOK_HOST", "http://orderbook:8080/"),
            ("DEPTH_LIMIT", "50"),
            ("SYMBOL", "BTC-USD"),
        ]))
        .unwrap();
        assert_eq!(cfg.orderbook_host, "http://orderbook:8080");
        assert_eq!(cfg.depth_limit, 50);
        assert_eq!(cfg.symbol, "BTC-USD");
    }

    #[test]
    fn test_public_key_mode() {
        let cfg = HarnessConfig::from_vars(vars(&[
            ("AUTH_MODE", "public-key"),
            ("PUB_KEY", "MFYwEAYHKoZIzj0CAQYFK4EEAAoDQgAE"),
        ]))
        .unwrap();
        assert_eq!(cfg.credentials().unwrap().scheme(), "public-key");
    }

    #[test]
    fn test_public_key_mode_requires_key() {
        let err = HarnessConfig::from_vars(vars(&[("AUTH_MODE", "public-key")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_ladder_must_fit_in_depth_limit() {
        let cfg = HarnessConfig::from_vars(vars(&[("DEPTH_LIMIT", "20")])).unwrap();
        assert!(cfg.check_ladder_depth(3).is_ok());
        assert!(cfg.check_ladder_depth(20).is_ok());
        assert!(matches!(cfg.check_ladder_depth(25), Err(ConfigError::Invalid(_))));
        assert!(matches!(cfg.check_ladder_depth(0), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_depth_limit_bounds() {
        let err = HarnessConfig::from_vars(vars(&[("DEPTH_LIMIT", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
