//! Bindings for the HonestCard contract.
//!
//! The contract holds every piece of state: card existence, pending and
//! completed exchanges, the public surname and the encrypted field handles.
//! [`CardContract`] is the surface the client consumes;
//! [`EthersCardContract`] binds it to a JSON-RPC endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::contract::{abigen, ContractError};
use ethers::providers::Middleware;
use ethers::types::{Address, Bytes, H256};
use tracing::debug;

use crate::codec::FieldKind;
use crate::error::RemoteError;

abigen!(
    HonestCard,
    r#"[
        function hasCard(address user) external view returns (bool)
        function getAllPendingForUser(address user) external view returns (address[] outgoing, address[] incoming)
        function getConnections(address user) external view returns (address[])
        function getPublicInfo(address user) external view returns (string surname, bool exists)
        function getEncryptedHandles(address user) external view returns (bytes32 gender, bytes32 phone, bytes32 fullName, bytes32 socialId, bytes32 location)
        function hasCompletedExchange(address a, address b) external view returns (bool)
        function createCard(string surname, bytes32 gender, bytes32 phone, bytes32 fullName, bytes32 socialId, bytes32 location, bytes inputProof) external
        function requestExchange(address target) external
    ]"#
);

/// Ciphertext handles of one card, one per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardHandles {
    pub gender: H256,
    pub phone: H256,
    pub full_name: H256,
    pub social_id: H256,
    pub location: H256,
}

impl CardHandles {
    /// Handles in wire order, paired with the field each one holds.
    pub fn fields(&self) -> [(FieldKind, H256); 5] {
        [
            (FieldKind::Gender, self.gender),
            (FieldKind::Phone, self.phone),
            (FieldKind::FullName, self.full_name),
            (FieldKind::SocialId, self.social_id),
            (FieldKind::Location, self.location),
        ]
    }

    pub fn to_vec(&self) -> Vec<H256> {
        self.fields().iter().map(|(_, handle)| *handle).collect()
    }

    /// Rebuild from handles in wire order.
    pub fn from_slice(handles: &[H256]) -> Result<Self, RemoteError> {
        match handles {
            [gender, phone, full_name, social_id, location] => Ok(Self {
                gender: *gender,
                phone: *phone,
                full_name: *full_name,
                social_id: *social_id,
                location: *location,
            }),
            other => Err(RemoteError::HandleCount {
                expected: FieldKind::ORDER.len(),
                got: other.len(),
            }),
        }
    }
}

impl From<([u8; 32], [u8; 32], [u8; 32], [u8; 32], [u8; 32])> for CardHandles {
    fn from(
        (gender, phone, full_name, social_id, location): (
            [u8; 32],
            [u8; 32],
            [u8; 32],
            [u8; 32],
            [u8; 32],
        ),
    ) -> Self {
        Self {
            gender: H256(gender),
            phone: H256(phone),
            full_name: H256(full_name),
            social_id: H256(social_id),
            location: H256(location),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicInfo {
    pub surname: String,
    pub exists: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingRequests {
    pub outgoing: Vec<Address>,
    pub incoming: Vec<Address>,
}

#[async_trait]
pub trait CardContract: Send + Sync {
    async fn has_card(&self, user: Address) -> Result<bool, RemoteError>;

    async fn pending_for(&self, user: Address) -> Result<PendingRequests, RemoteError>;

    async fn connections(&self, user: Address) -> Result<Vec<Address>, RemoteError>;

    async fn public_info(&self, user: Address) -> Result<PublicInfo, RemoteError>;

    /// Read `user`'s handles on behalf of `caller`; the contract only
    /// answers for the owner and completed exchange partners.
    async fn encrypted_handles(
        &self,
        user: Address,
        caller: Address,
    ) -> Result<CardHandles, RemoteError>;

    async fn has_completed_exchange(&self, a: Address, b: Address) -> Result<bool, RemoteError>;

    /// Submit `createCard` and wait for the receipt.
    async fn create_card(
        &self,
        surname: &str,
        handles: &CardHandles,
        input_proof: Bytes,
    ) -> Result<H256, RemoteError>;

    /// Submit `requestExchange` and wait for the receipt. Called against an
    /// address that already requested us, this completes the exchange.
    async fn request_exchange(&self, target: Address) -> Result<H256, RemoteError>;
}

pub struct EthersCardContract<M> {
    inner: HonestCard<M>,
}

impl<M: Middleware> EthersCardContract<M> {
    pub fn new(address: Address, client: Arc<M>) -> Self {
        Self {
            inner: HonestCard::new(address, client),
        }
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }
}

fn contract_error<M: Middleware>(err: ContractError<M>) -> RemoteError {
    let message = err
        .decode_revert::<String>()
        .unwrap_or_else(|| err.to_string());
    RemoteError::Contract(message)
}

#[async_trait]
impl<M: Middleware + 'static> CardContract for EthersCardContract<M> {
    async fn has_card(&self, user: Address) -> Result<bool, RemoteError> {
        self.inner.has_card(user).call().await.map_err(contract_error)
    }

    async fn pending_for(&self, user: Address) -> Result<PendingRequests, RemoteError> {
        let (outgoing, incoming) = self
            .inner
            .get_all_pending_for_user(user)
            .call()
            .await
            .map_err(contract_error)?;
        Ok(PendingRequests { outgoing, incoming })
    }

    async fn connections(&self, user: Address) -> Result<Vec<Address>, RemoteError> {
        self.inner
            .get_connections(user)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn public_info(&self, user: Address) -> Result<PublicInfo, RemoteError> {
        let (surname, exists) = self
            .inner
            .get_public_info(user)
            .call()
            .await
            .map_err(contract_error)?;
        Ok(PublicInfo { surname, exists })
    }

    async fn encrypted_handles(
        &self,
        user: Address,
        caller: Address,
    ) -> Result<CardHandles, RemoteError> {
        let handles = self
            .inner
            .get_encrypted_handles(user)
            .from(caller)
            .call()
            .await
            .map_err(contract_error)?;
        Ok(CardHandles::from(handles))
    }

    async fn has_completed_exchange(&self, a: Address, b: Address) -> Result<bool, RemoteError> {
        self.inner
            .has_completed_exchange(a, b)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn create_card(
        &self,
        surname: &str,
        handles: &CardHandles,
        input_proof: Bytes,
    ) -> Result<H256, RemoteError> {
        let call = self.inner.create_card(
            surname.to_string(),
            handles.gender.0,
            handles.phone.0,
            handles.full_name.0,
            handles.social_id.0,
            handles.location.0,
            input_proof,
        );
        let pending = call.send().await.map_err(contract_error)?;
        let tx_hash = *pending;
        debug!(?tx_hash, "createCard submitted");
        let receipt = pending
            .await
            .map_err(|err| RemoteError::Contract(err.to_string()))?;
        receipt
            .map(|r| r.transaction_hash)
            .ok_or_else(|| RemoteError::Dropped(format!("{tx_hash:?}")))
    }

    async fn request_exchange(&self, target: Address) -> Result<H256, RemoteError> {
        let call = self.inner.request_exchange(target);
        let pending = call.send().await.map_err(contract_error)?;
        let tx_hash = *pending;
        debug!(?tx_hash, ?target, "requestExchange submitted");
        let receipt = pending
            .await
            .map_err(|err| RemoteError::Contract(err.to_string()))?;
        receipt
            .map(|r| r.transaction_hash)
            .ok_or_else(|| RemoteError::Dropped(format!("{tx_hash:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_keep_wire_order() {
        let handles: Vec<H256> = (1u8..=5).map(H256::repeat_byte).collect();
        let card = CardHandles::from_slice(&handles).unwrap();
        assert_eq!(card.full_name, H256::repeat_byte(3));
        assert_eq!(card.to_vec(), handles);
        let kinds: Vec<FieldKind> = card.fields().iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, FieldKind::ORDER.to_vec());
    }

    #[test]
    fn wrong_handle_count_is_rejected() {
        let handles = vec![H256::zero(); 4];
        assert_eq!(
            CardHandles::from_slice(&handles),
            Err(RemoteError::HandleCount {
                expected: 5,
                got: 4
            })
        );
    }
}
