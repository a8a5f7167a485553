//! Torii Client Module
//!
//! Signs transactions with the authority's ed25519 key and posts them to the
//! node's HTTP endpoint.
//!
//! # Wire Format
//! - `POST {torii}/transaction` with `{ "payload": .., "signature": "<hex>" }`
//! - `GET {torii}/transaction/{hash}` answers `{"status": "Pending" | "Committed" | "Rejected"}`
//!   and is only polled when verification is requested

use super::LedgerClient;
use crate::crypto::{AccountId, PrivateKey};
use crate::error::{ClientError, SubmitError};
use crate::types::{Executable, Metadata, SubmitOptions, TransactionRequest, TxHash};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, trace};
use url::Url;

/// Everything needed to talk to one node as one authority
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Chain identifier the node expects in every payload
    pub chain: String,
    /// Account the transactions are issued by
    pub authority: AccountId,
    /// Key signing on behalf of `authority`
    pub private_key: PrivateKey,
    /// Base URL of the node's Torii endpoint
    pub torii_url: Url,
    /// Timeout of a single HTTP request
    pub request_timeout: Duration,
    /// How long to wait for a commit when verification is requested
    pub verify_timeout: Duration,
    /// Delay between two status polls
    pub verify_poll_interval: Duration,
}

impl ClientConfig {
    pub fn new(chain: String, authority: AccountId, private_key: PrivateKey, torii_url: Url) -> Self {
        Self {
            chain,
            authority,
            private_key,
            torii_url,
            request_timeout: Duration::from_secs(10),
            verify_timeout: Duration::from_secs(30),
            verify_poll_interval: Duration::from_millis(500),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_verify_timeout(mut self, verify_timeout: Duration) -> Self {
        self.verify_timeout = verify_timeout;
        self
    }

    pub fn with_verify_poll_interval(mut self, interval: Duration) -> Self {
        self.verify_poll_interval = interval;
        self
    }
}

/// The signed part of a transaction
#[derive(Debug, Clone, Serialize)]
pub struct TransactionPayload {
    pub chain: String,
    pub authority: AccountId,
    pub creation_time_ms: u64,
    pub instructions: Executable,
    pub nonce: NonZeroU32,
    pub metadata: Metadata,
}

/// Request body of `POST /transaction`
#[derive(Debug, Clone, Serialize)]
pub struct SignedTransaction {
    pub payload: TransactionPayload,
    /// Hex-encoded ed25519 signature over the JSON-encoded payload
    pub signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status")]
enum StatusResponse {
    Pending,
    Committed,
    Rejected {
        #[serde(default)]
        reason: String,
    },
}

/// HTTP client for a node's Torii endpoint
pub struct ToriiClient {
    config: ClientConfig,
    http: reqwest::Client,
    transaction_url: Url,
}

impl std::fmt::Debug for ToriiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToriiClient")
            .field("torii_url", &self.config.torii_url.as_str())
            .field("authority", &self.config.authority)
            .finish_non_exhaustive()
    }
}

impl ToriiClient {
    /// Creates a client
    ///
    /// # Errors
    /// Fails if the private key does not belong to the authority or the HTTP
    /// client cannot be constructed. Both are fatal at startup.
    pub fn new(mut config: ClientConfig) -> Result<Self, ClientError> {
        config.private_key.ensure_owns(&config.authority)?;

        // Without a trailing slash `Url::join` would replace the last path segment
        if !config.torii_url.path().ends_with('/') {
            let path = format!("{}/", config.torii_url.path());
            config.torii_url.set_path(&path);
        }
        let transaction_url = config.torii_url.join("transaction")?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            config,
            http,
            transaction_url,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Wraps `request` into a signed transaction and returns it with its hash
    pub fn sign(&self, request: TransactionRequest) -> Result<(TxHash, SignedTransaction), SubmitError> {
        let payload = TransactionPayload {
            chain: self.config.chain.clone(),
            authority: self.config.authority.clone(),
            creation_time_ms: u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default(),
            instructions: request.executable,
            nonce: request.nonce,
            metadata: request.metadata,
        };

        let bytes = serde_json::to_vec(&payload)?;
        let hash = TxHash(hex::encode(Sha256::digest(&bytes)));
        let signature = hex::encode(self.config.private_key.sign(&bytes));

        Ok((hash, SignedTransaction { payload, signature }))
    }

    /// Polls the status endpoint until the node commits or rejects `hash`
    async fn wait_committed(&self, hash: &TxHash) -> Result<(), SubmitError> {
        let url = self
            .config
            .torii_url
            .join(&format!("transaction/{hash}"))
            .map_err(|e| SubmitError::Other(e.to_string()))?;

        loop {
            let response = self.http.get(url.clone()).send().await?;
            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                trace!(%hash, "Transaction not visible yet");
            } else if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SubmitError::StatusQuery {
                    status: status.as_u16(),
                    body,
                });
            } else {
                let body = response.text().await?;
                let parsed = serde_json::from_str::<StatusResponse>(&body).map_err(|_| {
                    SubmitError::StatusQuery {
                        status: status.as_u16(),
                        body: body.clone(),
                    }
                })?;
                match parsed {
                    StatusResponse::Committed => return Ok(()),
                    StatusResponse::Rejected { reason } => {
                        return Err(SubmitError::NotCommitted {
                            hash: hash.to_string(),
                            reason,
                        });
                    }
                    StatusResponse::Pending => trace!(%hash, "Transaction pending"),
                }
            }

            sleep(self.config.verify_poll_interval).await;
        }
    }
}

#[async_trait]
impl LedgerClient for ToriiClient {
    async fn submit(
        &self,
        request: TransactionRequest,
        options: SubmitOptions,
    ) -> Result<TxHash, SubmitError> {
        let (hash, signed) = self.sign(request)?;

        let response = self
            .http
            .post(self.transaction_url.clone())
            .json(&signed)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!(%hash, nonce = signed.payload.nonce.get(), "Transaction accepted");

        if options.verify {
            let limit = self.config.verify_timeout;
            timeout(limit, self.wait_committed(&hash))
                .await
                .map_err(|_| SubmitError::VerifyTimeout {
                    hash: hash.to_string(),
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })??;
        }

        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransactionBuilder;
    use ed25519_dalek::{Signature, Verifier};

    const ACCOUNT: &str =
        "ed0120CE7FA46C9DCE7EA4B125E2E36BDB63EA33073E7590AC92816AE1E861B7048B03@wonderland";
    const PRIVATE_KEY: &str = "802620CCF31D85E3B32A4BEA59987CE0C78E3B8E2DB93881468AB2435FE45D5C9DCD53";

    fn client_config(url: &str) -> ClientConfig {
        ClientConfig::new(
            "00000000-0000-0000-0000-000000000000".to_string(),
            ACCOUNT.parse().unwrap(),
            PrivateKey::from_multihash(PRIVATE_KEY).unwrap(),
            url.parse().unwrap(),
        )
    }

    #[test]
    fn test_transaction_url_keeps_base_path() {
        let client = ToriiClient::new(client_config("http://127.0.0.1:8080/api")).unwrap();
        assert_eq!(client.transaction_url.as_str(), "http://127.0.0.1:8080/api/transaction");

        let client = ToriiClient::new(client_config("http://127.0.0.1:8080")).unwrap();
        assert_eq!(client.transaction_url.as_str(), "http://127.0.0.1:8080/transaction");
    }

    #[test]
    fn test_rejects_foreign_key() {
        let mut config = client_config("http://127.0.0.1:8080");
        config.private_key = PrivateKey::from_multihash(
            "8026200000000000000000000000000000000000000000000000000000000000000000",
        )
        .unwrap();
        assert!(matches!(ToriiClient::new(config), Err(ClientError::Key(_))));
    }

    #[test]
    fn test_signature_covers_payload() {
        let client = ToriiClient::new(client_config("http://127.0.0.1:8080")).unwrap();
        let request = TransactionBuilder::default().build();
        let nonce = request.nonce;

        let (hash, signed) = client.sign(request).unwrap();
        let bytes = serde_json::to_vec(&signed.payload).unwrap();

        assert_eq!(hash.0, hex::encode(Sha256::digest(&bytes)));
        assert_eq!(signed.payload.nonce, nonce);

        let raw: [u8; 64] = hex::decode(&signed.signature).unwrap().try_into().unwrap();
        let signature = Signature::from_bytes(&raw);
        let public_key = client.config().private_key.public_key();
        assert!(public_key.verify(&bytes, &signature).is_ok());
    }

    #[test]
    fn test_payload_json_shape() {
        let client = ToriiClient::new(client_config("http://127.0.0.1:8080")).unwrap();
        let (_, signed) = client.sign(TransactionBuilder::default().build()).unwrap();
        let value = serde_json::to_value(&signed).unwrap();

        assert_eq!(value["payload"]["authority"], ACCOUNT);
        assert_eq!(value["payload"]["chain"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(value["payload"]["instructions"]["Instructions"][0]["Log"]["level"], "INFO");
        assert!(value["payload"]["nonce"].as_u64().unwrap() >= 1);
        assert_eq!(value["signature"].as_str().unwrap().len(), 128);
    }
}
