use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use thiserror::Error;

/// Log level carried by a `Log` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// A single ledger instruction
///
/// Only the instructions this producer emits are modelled; the node accepts
/// a much larger grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Ask the node to write `msg` to its own log at `level`
    Log { level: Level, msg: String },
}

/// What a transaction executes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Executable {
    Instructions(Vec<Instruction>),
}

/// Identifier accepted by the ledger as a metadata key or domain name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name must not be empty")]
    Empty,
    #[error("name `{name}` contains forbidden character {found:?}")]
    ForbiddenChar { name: String, found: char },
}

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(NameError::Empty);
        }
        // '@', '#' and '$' are separators in account/asset identifiers
        if let Some(found) = s.chars().find(|c| c.is_whitespace() || matches!(c, '@' | '#' | '$')) {
            return Err(NameError::ForbiddenChar {
                name: s.to_string(),
                found,
            });
        }
        Ok(Name(s.to_string()))
    }
}

impl TryFrom<String> for Name {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key/value metadata attached to a transaction; values are arbitrary JSON
pub type Metadata = BTreeMap<Name, Value>;

/// Logical payload handed to the ledger client
///
/// Built right before submission and dropped once the submit call returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub executable: Executable,
    pub nonce: NonZeroU32,
    pub metadata: Metadata,
}

/// Hex-encoded hash identifying a signed transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-call submission options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Wait until the node reports the transaction committed
    ///
    /// `false` returns as soon as the node accepted the transaction into its
    /// queue.
    pub verify: bool,
}

/// Result slot of one submission inside a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure { reason: String },
    /// The submission was cut short by shutdown
    Abandoned,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_rejects_separators() {
        assert_eq!("".parse::<Name>(), Err(NameError::Empty));
        assert!("wonder land".parse::<Name>().is_err());
        assert!("alice@wonderland".parse::<Name>().is_err());
        assert!("rose#wonderland".parse::<Name>().is_err());
        assert!("a$b".parse::<Name>().is_err());
        assert_eq!("foo".parse::<Name>().unwrap().as_str(), "foo");
    }

    #[test]
    fn test_name_deserialize_validates() {
        let bad: Result<Name, _> = serde_json::from_value(json!("has space"));
        assert!(bad.is_err());
        let good: Name = serde_json::from_value(json!("wonderland")).unwrap();
        assert_eq!(good.to_string(), "wonderland");
    }

    #[test]
    fn test_instruction_wire_shape() {
        let executable = Executable::Instructions(vec![Instruction::Log {
            level: Level::Info,
            msg: "Hello, world!".to_string(),
        }]);

        let encoded = serde_json::to_value(&executable).unwrap();
        assert_eq!(
            encoded,
            json!({ "Instructions": [{ "Log": { "level": "INFO", "msg": "Hello, world!" } }] })
        );
    }
}
