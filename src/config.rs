//! Configuration Module
//!
//! All settings are read once at startup and never re-read. Sources, lowest
//! precedence first:
//! 1. built-in defaults (a local development network)
//! 2. an optional TOML file named by `PRODUCER_CONFIG`
//! 3. environment variables
//!
//! `TORII_URL` is the only value without a default.
//!
//! # Example TOML
//! ```toml
//! torii_url = "http://127.0.0.1:8080"
//! chain = "00000000-0000-0000-0000-000000000000"
//!
//! [producer]
//! batch_size = 20
//! push_delay_ms = 100
//! nonce_range = 100000
//! verify = false
//!
//! [client]
//! request_timeout_ms = 10000
//! ```

use crate::client::ClientConfig;
use crate::crypto::{AccountId, PrivateKey};
use crate::error::ConfigError;
use crate::producer::ProducerSettings;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::num::{NonZeroU32, NonZeroUsize};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_CHAIN: &str = "00000000-0000-0000-0000-000000000000";
pub const DEFAULT_ACCOUNT: &str =
    "ed0120CE7FA46C9DCE7EA4B125E2E36BDB63EA33073E7590AC92816AE1E861B7048B03@wonderland";
pub const DEFAULT_PRIVATE_KEY: &str =
    "802620CCF31D85E3B32A4BEA59987CE0C78E3B8E2DB93881468AB2435FE45D5C9DCD53";

/// Main configuration structure
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the node's Torii endpoint (required)
    pub torii_url: Option<Url>,
    /// Chain identifier
    pub chain: String,
    /// Authority account, `<public key multihash>@<domain>`
    pub account: String,
    /// Authority private key, multihash hex
    pub private_key: String,
    pub producer: ProducerConfig,
    pub client: TransportConfig,
}

/// Load shape
///
/// # Fields
/// - `batch_size`: Transactions submitted concurrently per batch
/// - `push_delay_ms`: Pause between the end of one batch and the start of the next
/// - `nonce_range`: Nonces are drawn uniformly from `1..=nonce_range`
/// - `verify`: Wait for commit confirmation on every submission
/// - `max_batches`: Stop after this many batches (runs forever when unset)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub batch_size: NonZeroUsize,
    pub push_delay_ms: u64,
    pub nonce_range: NonZeroU32,
    pub verify: bool,
    pub max_batches: Option<u64>,
}

/// HTTP timeouts of the ledger client
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub request_timeout_ms: u64,
    pub verify_timeout_ms: u64,
    pub verify_poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            torii_url: None,
            chain: DEFAULT_CHAIN.to_string(),
            account: DEFAULT_ACCOUNT.to_string(),
            private_key: DEFAULT_PRIVATE_KEY.to_string(),
            producer: ProducerConfig::default(),
            client: TransportConfig::default(),
        }
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            batch_size: NonZeroUsize::new(20).unwrap_or(NonZeroUsize::MIN),
            push_delay_ms: 100,
            nonce_range: crate::builder::DEFAULT_NONCE_RANGE,
            verify: false,
            max_batches: None,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            verify_timeout_ms: 30_000,
            verify_poll_interval_ms: 500,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("torii_url", &self.torii_url.as_ref().map(Url::as_str))
            .field("chain", &self.chain)
            .field("account", &self.account)
            .field("private_key", &"<redacted>")
            .field("producer", &self.producer)
            .field("client", &self.client)
            .finish()
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing keys fall back to their defaults.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = match lookup("PRODUCER_CONFIG") {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };

        if let Some(url) = lookup("TORII_URL") {
            config.torii_url = Some(parse_value("TORII_URL", &url)?);
        }
        if let Some(chain) = lookup("PRODUCER_CHAIN") {
            config.chain = chain;
        }
        if let Some(account) = lookup("PRODUCER_ACCOUNT") {
            config.account = account;
        }
        if let Some(key) = lookup("PRODUCER_PRIVATE_KEY") {
            config.private_key = key;
        }

        let producer = &mut config.producer;
        override_with(&lookup, "PRODUCER_BATCH_SIZE", &mut producer.batch_size)?;
        override_with(&lookup, "PRODUCER_PUSH_DELAY_MS", &mut producer.push_delay_ms)?;
        override_with(&lookup, "PRODUCER_NONCE_RANGE", &mut producer.nonce_range)?;
        if let Some(verify) = lookup("PRODUCER_VERIFY") {
            producer.verify = parse_bool("PRODUCER_VERIFY", &verify)?;
        }
        if let Some(max) = lookup("PRODUCER_MAX_BATCHES") {
            producer.max_batches = Some(parse_value("PRODUCER_MAX_BATCHES", &max)?);
        }

        let client = &mut config.client;
        override_with(&lookup, "PRODUCER_REQUEST_TIMEOUT_MS", &mut client.request_timeout_ms)?;
        override_with(&lookup, "PRODUCER_VERIFY_TIMEOUT_MS", &mut client.verify_timeout_ms)?;
        override_with(
            &lookup,
            "PRODUCER_VERIFY_POLL_INTERVAL_MS",
            &mut client.verify_poll_interval_ms,
        )?;

        config.validate()?;
        Ok(config)
    }

    /// Checks everything that cannot be expressed in the field types
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.torii_url.as_ref().ok_or(ConfigError::Missing("TORII_URL"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "TORII_URL",
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        if self.chain.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "PRODUCER_CHAIN",
                reason: "chain id must not be empty".to_string(),
            });
        }
        // A zero timeout fails every request; a zero poll interval spins
        let durations = [
            ("PRODUCER_REQUEST_TIMEOUT_MS", self.client.request_timeout_ms),
            ("PRODUCER_VERIFY_TIMEOUT_MS", self.client.verify_timeout_ms),
            ("PRODUCER_VERIFY_POLL_INTERVAL_MS", self.client.verify_poll_interval_ms),
        ];
        for (key, millis) in durations {
            if millis == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Loop settings for the production driver
    pub fn producer_settings(&self) -> ProducerSettings {
        ProducerSettings {
            batch_size: self.producer.batch_size,
            pacing: Duration::from_millis(self.producer.push_delay_ms),
        }
    }

    /// Parses keys and assembles the ledger client configuration
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let torii_url = self.torii_url.clone().ok_or(ConfigError::Missing("TORII_URL"))?;
        let authority: AccountId = self.account.parse()?;
        let private_key = PrivateKey::from_multihash(&self.private_key)?;

        Ok(ClientConfig::new(self.chain.clone(), authority, private_key, torii_url)
            .with_request_timeout(Duration::from_millis(self.client.request_timeout_ms))
            .with_verify_timeout(Duration::from_millis(self.client.verify_timeout_ms))
            .with_verify_poll_interval(Duration::from_millis(self.client.verify_poll_interval_ms)))
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: format!("`{raw}`: {e}"),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            reason: format!("`{raw}` is not a boolean"),
        }),
    }
}

fn override_with<T, F>(lookup: &F, key: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *slot = parse_value(key, &raw)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_torii_url_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TORII_URL")));
        assert_eq!(err.to_string(), "Please set TORII_URL env var");
    }

    #[test]
    fn test_empty_torii_url_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[("TORII_URL", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TORII_URL")));
    }

    #[test]
    fn test_defaults_match_dev_network() {
        let config = Config::from_lookup(lookup_from(&[("TORII_URL", "http://127.0.0.1:8080")])).unwrap();

        assert_eq!(config.chain, DEFAULT_CHAIN);
        assert_eq!(config.producer.batch_size.get(), 20);
        assert_eq!(config.producer.push_delay_ms, 100);
        assert_eq!(config.producer.nonce_range.get(), 100_000);
        assert!(!config.producer.verify);
        assert_eq!(config.producer.max_batches, None);

        let settings = config.producer_settings();
        assert_eq!(settings.pacing, Duration::from_millis(100));

        let client = config.client_config().unwrap();
        assert_eq!(client.authority.to_string(), DEFAULT_ACCOUNT);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("TORII_URL", "https://node.example:8080/"),
            ("PRODUCER_CHAIN", "dev-chain"),
            ("PRODUCER_BATCH_SIZE", "5"),
            ("PRODUCER_PUSH_DELAY_MS", "250"),
            ("PRODUCER_NONCE_RANGE", "1000"),
            ("PRODUCER_VERIFY", "yes"),
            ("PRODUCER_MAX_BATCHES", "3"),
            ("PRODUCER_REQUEST_TIMEOUT_MS", "1500"),
        ]))
        .unwrap();

        assert_eq!(config.chain, "dev-chain");
        assert_eq!(config.producer.batch_size.get(), 5);
        assert_eq!(config.producer.push_delay_ms, 250);
        assert_eq!(config.producer.nonce_range.get(), 1000);
        assert!(config.producer.verify);
        assert_eq!(config.producer.max_batches, Some(3));
        assert_eq!(config.client.request_timeout_ms, 1500);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cases = [
            ("PRODUCER_BATCH_SIZE", "0"),
            ("PRODUCER_BATCH_SIZE", "many"),
            ("PRODUCER_NONCE_RANGE", "0"),
            ("PRODUCER_VERIFY", "maybe"),
            ("PRODUCER_PUSH_DELAY_MS", "-1"),
            ("PRODUCER_REQUEST_TIMEOUT_MS", "0"),
            ("PRODUCER_VERIFY_TIMEOUT_MS", "0"),
            ("PRODUCER_VERIFY_POLL_INTERVAL_MS", "0"),
        ];

        for (key, value) in cases {
            let err = Config::from_lookup(lookup_from(&[("TORII_URL", "http://127.0.0.1:8080"), (key, value)]))
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { key: k, .. } if k == key),
                "{key}={value} gave {err}"
            );
        }
    }

    #[test]
    fn test_zero_durations_in_file_are_rejected() {
        let mut config = Config::load("config/producer.example.toml").unwrap();
        config.client.verify_poll_interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PRODUCER_VERIFY_POLL_INTERVAL_MS", .. }));

        config.client.verify_poll_interval_ms = 20;
        config.client.request_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PRODUCER_REQUEST_TIMEOUT_MS", .. }));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = Config::from_lookup(lookup_from(&[("TORII_URL", "ftp://127.0.0.1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TORII_URL", .. }));

        let err = Config::from_lookup(lookup_from(&[("TORII_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TORII_URL", .. }));
    }

    #[test]
    fn test_bad_key_fails_client_config() {
        let config = Config::from_lookup(lookup_from(&[
            ("TORII_URL", "http://127.0.0.1:8080"),
            ("PRODUCER_PRIVATE_KEY", "nope"),
        ]))
        .unwrap();
        assert!(matches!(config.client_config(), Err(ConfigError::Key(_))));
    }

    #[test]
    fn test_toml_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
torii_url = "http://10.0.0.1:8080"

[producer]
batch_size = 7
push_delay_ms = 40
"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = Config::from_lookup(lookup_from(&[
            ("PRODUCER_CONFIG", path.as_str()),
            ("PRODUCER_PUSH_DELAY_MS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.torii_url.as_ref().unwrap().as_str(), "http://10.0.0.1:8080/");
        assert_eq!(config.producer.batch_size.get(), 7);
        assert_eq!(config.producer.push_delay_ms, 60);
        assert_eq!(config.producer.nonce_range.get(), 100_000);
    }

    #[test]
    fn test_example_file_parses() {
        let config = Config::load("config/producer.example.toml").unwrap();
        config.validate().unwrap();
        assert_eq!(config.producer.batch_size.get(), 20);
        assert_eq!(config.client.verify_poll_interval_ms, 500);
        config.client_config().unwrap();
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let rendered = format!("{:?}", Config::default());
        assert!(!rendered.contains("CCF31D85"));
        assert!(rendered.contains("<redacted>"));
    }
}
