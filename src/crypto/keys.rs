use crate::error::KeyError;
use crate::types::Name;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Multihash prefix of an ed25519 public key (code 0xed, 32 bytes)
const ED25519_PUBLIC_PREFIX: &str = "ed0120";
/// Multihash prefix of an ed25519 private key (code 0x1300, 32 bytes)
const ED25519_PRIVATE_PREFIX: &str = "802620";

/// Account identifier in `<public key multihash>@<domain>` form
#[derive(Clone, PartialEq, Eq)]
pub struct AccountId {
    public_key: VerifyingKey,
    domain: Name,
}

impl AccountId {
    pub fn public_key(&self) -> &VerifyingKey {
        &self.public_key
    }

    pub fn domain(&self) -> &Name {
        &self.domain
    }
}

impl FromStr for AccountId {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, domain) = s
            .rsplit_once('@')
            .ok_or_else(|| KeyError::MissingDomain(s.to_string()))?;

        let bytes = strip_multihash(key, ED25519_PUBLIC_PREFIX)?;
        let public_key = VerifyingKey::from_bytes(&bytes)?;
        let domain = domain.parse()?;

        Ok(Self { public_key, domain })
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}@{}",
            ED25519_PUBLIC_PREFIX,
            hex::encode_upper(self.public_key.as_bytes()),
            self.domain
        )
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({self})")
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Signing credential of the transaction authority
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Parses an ed25519 private key from its multihash hex form
    pub fn from_multihash(s: &str) -> Result<Self, KeyError> {
        let seed = strip_multihash(s, ED25519_PRIVATE_PREFIX)?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Checks that this key can sign on behalf of `account`
    pub fn ensure_owns(&self, account: &AccountId) -> Result<(), KeyError> {
        if self.public_key() != *account.public_key() {
            return Err(KeyError::Mismatch(account.to_string()));
        }
        Ok(())
    }

    /// Returns the raw 64-byte ed25519 signature over `message`
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &hex::encode_upper(self.public_key().as_bytes()))
            .finish_non_exhaustive()
    }
}

/// Strips an algorithm prefix (case-insensitive) and decodes the 32-byte body
fn strip_multihash(s: &str, prefix: &str) -> Result<[u8; 32], KeyError> {
    let head = s.get(..prefix.len()).unwrap_or_default();
    if !head.eq_ignore_ascii_case(prefix) {
        return Err(KeyError::UnsupportedAlgorithm(s.to_string()));
    }

    let body = hex::decode(&s[prefix.len()..])?;
    let len = body.len();
    body.try_into().map_err(|_| KeyError::InvalidLength(len))
}
