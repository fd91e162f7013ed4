//! Interface to the FHE relayer SDK.
//!
//! The relayer owns keypair generation, the EIP-712 challenge, input
//! encryption and threshold decryption. This module only describes the
//! entry points the client calls; a host binds them to a concrete SDK.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::transaction::eip712::TypedData;
use ethers::types::{Address, Bytes, H256, U256};

use crate::error::{CodecError, RemoteError};

/// Validity window requested for a user decryption authorization.
pub const DECRYPT_DURATION_DAYS: u64 = 1;

/// Primary EIP-712 type signed for a user decryption.
pub const DECRYPT_PRIMARY_TYPE: &str = "UserDecryptRequestVerification";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitWidth {
    U8,
    U64,
    U128,
    U256,
}

impl BitWidth {
    pub fn bits(self) -> usize {
        match self {
            BitWidth::U8 => 8,
            BitWidth::U64 => 64,
            BitWidth::U128 => 128,
            BitWidth::U256 => 256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretInput {
    pub width: BitWidth,
    pub value: U256,
}

/// Accumulates plaintext inputs for one encryption call. Inputs keep the
/// order in which they were added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInputBuilder {
    pub contract: Address,
    pub signer: Address,
    inputs: Vec<SecretInput>,
}

impl EncryptedInputBuilder {
    pub fn new(contract: Address, signer: Address) -> Self {
        Self {
            contract,
            signer,
            inputs: Vec::new(),
        }
    }

    pub fn add8(&mut self, value: U256) -> Result<&mut Self, CodecError> {
        self.add(BitWidth::U8, value)
    }

    pub fn add64(&mut self, value: U256) -> Result<&mut Self, CodecError> {
        self.add(BitWidth::U64, value)
    }

    pub fn add128(&mut self, value: U256) -> Result<&mut Self, CodecError> {
        self.add(BitWidth::U128, value)
    }

    pub fn add256(&mut self, value: U256) -> Result<&mut Self, CodecError> {
        self.add(BitWidth::U256, value)
    }

    fn add(&mut self, width: BitWidth, value: U256) -> Result<&mut Self, CodecError> {
        if value.bits() > width.bits() {
            return Err(CodecError::InputTooWide { width: width.bits() });
        }
        self.inputs.push(SecretInput { width, value });
        Ok(self)
    }

    pub fn inputs(&self) -> &[SecretInput] {
        &self.inputs
    }
}

/// Output of one encryption call: one handle per input plus a proof
/// covering all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInputs {
    pub handles: Vec<H256>,
    pub input_proof: Bytes,
}

/// Ephemeral keypair generated by the relayer for one decrypt session.
#[derive(Clone, PartialEq, Eq)]
pub struct Keypair {
    pub public_key: String,
    pub private_key: String,
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleContractPair {
    pub handle: H256,
    pub contract_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDecryptRequest {
    pub pairs: Vec<HandleContractPair>,
    pub keypair: Keypair,
    /// Hex encoded signature without a `0x` prefix.
    pub signature: String,
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

/// A clear value as handed back by the relayer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearValue {
    Int(U256),
    Text(String),
    Missing,
}

impl ClearValue {
    /// Normalize to an unsigned integer. Missing values read as zero.
    pub fn to_uint(&self, handle: H256) -> Result<U256, RemoteError> {
        match self {
            ClearValue::Int(value) => Ok(*value),
            ClearValue::Missing => Ok(U256::zero()),
            ClearValue::Text(text) => {
                let parsed = match text.strip_prefix("0x") {
                    Some(hex) => U256::from_str_radix(hex, 16).ok(),
                    None => U256::from_dec_str(text).ok(),
                };
                parsed.ok_or_else(|| RemoteError::ClearValue {
                    handle: format!("{handle:?}"),
                    value: text.clone(),
                })
            }
        }
    }
}

#[async_trait]
pub trait Relayer: Send + Sync {
    fn create_encrypted_input(&self, contract: Address, signer: Address) -> EncryptedInputBuilder {
        EncryptedInputBuilder::new(contract, signer)
    }

    async fn encrypt(&self, input: EncryptedInputBuilder) -> Result<EncryptedInputs, RemoteError>;

    fn generate_keypair(&self) -> Result<Keypair, RemoteError>;

    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> Result<TypedData, RemoteError>;

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<HashMap<H256, ClearValue>, RemoteError>;
}

/// Parameters for building a relayer handle bound to one wallet and chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub account: Address,
}

/// Entry point of a loaded SDK: builds relayer handles.
#[async_trait]
pub trait RelayerFactory: Send + Sync {
    async fn create_instance(&self, config: InstanceConfig)
        -> Result<Arc<dyn Relayer>, RemoteError>;
}
