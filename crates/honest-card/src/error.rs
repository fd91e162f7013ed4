//! Error taxonomy shared by every client action.
//!
//! Errors fall into three groups: bad user input ([`ValidationError`]),
//! missing wallet or relayer handles ([`Readiness`]) and failures reported
//! by the chain, the relayer or the wallet ([`RemoteError`]). Every action
//! boundary turns one of these into a single notification with
//! [`Error::user_message`].

use thiserror::Error;

use crate::codec::FieldKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotReady(#[from] Readiness),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Text shown to the user for this error. Remote failures surface the
    /// underlying message verbatim when there is one, otherwise the
    /// action-specific `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Remote(err) => {
                let message = err.to_string();
                if message.trim().is_empty() {
                    fallback.to_string()
                } else {
                    message
                }
            }
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Surname is required")]
    MissingSurname,
    #[error("Full Name is required")]
    MissingFullName,
    #[error("Phone is required")]
    MissingPhone,
    #[error("Social is required")]
    MissingSocialId,
    #[error("Location is required")]
    MissingLocation,
    #[error("Unsupported country code {0}")]
    UnknownCountryCode(String),
    #[error("Please enter an address")]
    MissingAddress,
    #[error("Invalid address format")]
    InvalidAddress,
    #[error("Cannot exchange cards with yourself")]
    SelfExchange,
    #[error("Target address has not created a card")]
    TargetHasNoCard,
    #[error("You already have a card")]
    CardExists,
    #[error("Exchange not completed yet")]
    ExchangeNotCompleted,
    #[error("No pending request from this address")]
    NoPendingRequest,
    #[error("Decryption already in progress")]
    DecryptInProgress,
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("gender value {0} is outside 0..=3")]
    InvalidGender(u64),
    #[error("{kind} value does not fit in {width} bits")]
    Overflow { kind: FieldKind, width: usize },
    #[error("encrypted input does not fit in {width} bits")]
    InputTooWide { width: usize },
    #[error("{0} is not a decimal number")]
    NotANumber(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    #[error("Wallet not connected")]
    WalletNotConnected,
    #[error("FHE instance not ready")]
    RelayerNotReady,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{0}")]
    Contract(String),
    #[error("{0}")]
    Relayer(String),
    #[error("{0}")]
    Signature(String),
    #[error("Relayer SDK not loaded after {attempts} retries")]
    SdkNotLoaded { attempts: u32 },
    #[error("Relayer returned {got} handles, expected {expected}")]
    HandleCount { expected: usize, got: usize },
    #[error("Relayer returned a non-numeric clear value for {handle}: {value}")]
    ClearValue { handle: String, value: String },
    #[error("Transaction {0} was dropped before confirmation")]
    Dropped(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error while reading config: {0}")]
    Read(::config::ConfigError),
    #[error("Error while deserializing config: {0}")]
    Deserialize(::config::ConfigError),
    #[error("HONEST_WC_PROJECT_ID is not set")]
    MissingProjectId,
    #[error("HONEST_CONTRACT_ADDRESS is not set")]
    MissingContractAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_message_is_surfaced_verbatim() {
        let err = Error::from(RemoteError::Contract("execution reverted: no card".into()));
        assert_eq!(
            err.user_message("Failed to request exchange"),
            "execution reverted: no card"
        );
    }

    #[test]
    fn empty_remote_message_uses_fallback() {
        let err = Error::from(RemoteError::Relayer(String::new()));
        assert_eq!(err.user_message("Failed to decrypt"), "Failed to decrypt");
    }

    #[test]
    fn validation_message_ignores_fallback() {
        let err = Error::from(ValidationError::MissingSurname);
        assert_eq!(err.user_message("Failed to create card"), "Surname is required");
    }
}
