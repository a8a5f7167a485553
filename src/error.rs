//! Error Types
//!
//! Startup errors (`ConfigError`, `KeyError`, `ClientError`) are fatal and
//! abort the process before the production loop starts. `SubmitError` is
//! local to a single submission and never escalates past its batch slot.

use crate::types::NameError;
use thiserror::Error;

/// Invalid or missing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Please set {0} env var")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Malformed account identifier or private key
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("account id `{0}` has no `@domain` part")]
    MissingDomain(String),

    #[error("unsupported key algorithm prefix in `{0}`, only ed25519 is supported")]
    UnsupportedAlgorithm(String),

    #[error("invalid hex in key: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("key material must be 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid ed25519 public key: {0}")]
    InvalidPublicKey(#[from] ed25519_dalek::SignatureError),

    #[error("invalid account domain: {0}")]
    InvalidDomain(#[from] NameError),

    #[error("private key does not belong to account {0}")]
    Mismatch(String),
}

/// Failure to construct the ledger client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid torii url: {0}")]
    Url(#[from] url::ParseError),
}

/// Failure of one transaction submission
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to encode transaction: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("node rejected transaction with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The status endpoint failed or answered with something unreadable
    #[error("status query failed with {status}: {body}")]
    StatusQuery { status: u16, body: String },

    #[error("transaction {hash} was not committed: {reason}")]
    NotCommitted { hash: String, reason: String },

    #[error("transaction {hash} not confirmed within {timeout_ms}ms")]
    VerifyTimeout { hash: String, timeout_ms: u64 },

    #[error("{0}")]
    Other(String),
}
