//! User decryption of card handles.
//!
//! One decrypt session authorizes every handle with a single wallet
//! signature. The steps run strictly in order:
//!
//! 1. the relayer generates an ephemeral keypair,
//! 2. the relayer builds the EIP-712 authorization for that key, the card
//!    contract, the current time and a one day window,
//! 3. the wallet signs it once,
//! 4. the whole batch of handles goes to the relayer in one call,
//! 5. clear values are normalized to integers, missing ones to zero.
//!
//! Any failure aborts the batch; there is no partial result.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ethers::types::{Address, H256, U256};
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::debug;

use crate::codec::{self, FieldKind};
use crate::contract::CardHandles;
use crate::error::RemoteError;
use crate::relayer::{HandleContractPair, Relayer, UserDecryptRequest, DECRYPT_DURATION_DAYS};
use crate::wallet::{signature_hex, WalletSigner};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecryptPhase {
    #[default]
    Idle,
    AwaitingSignature,
    AwaitingRelayer,
    Decoded,
    Failed,
}

impl DecryptPhase {
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            DecryptPhase::AwaitingSignature | DecryptPhase::AwaitingRelayer
        )
    }
}

/// Publishes phase changes of one decrypt session. Updates from a session
/// whose view has since been closed or retargeted are dropped.
#[derive(Debug, Clone)]
pub struct PhaseReporter {
    tx: Arc<watch::Sender<DecryptPhase>>,
    generation: u64,
    current: Arc<AtomicU64>,
}

impl PhaseReporter {
    pub(crate) fn new(
        tx: Arc<watch::Sender<DecryptPhase>>,
        generation: u64,
        current: Arc<AtomicU64>,
    ) -> Self {
        Self {
            tx,
            generation,
            current,
        }
    }

    /// A reporter nobody listens to.
    pub fn detached() -> Self {
        let (tx, _) = watch::channel(DecryptPhase::Idle);
        Self::new(Arc::new(tx), 0, Arc::new(AtomicU64::new(0)))
    }

    pub fn report(&self, phase: DecryptPhase) {
        if self.current.load(Ordering::SeqCst) == self.generation {
            self.tx.send_replace(phase);
        }
    }
}

/// Clear text of every field of one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCard {
    pub gender: String,
    pub phone: String,
    pub full_name: String,
    pub social_id: String,
    pub location: String,
}

impl DecodedCard {
    pub fn field(&self, kind: FieldKind) -> &str {
        match kind {
            FieldKind::Gender => &self.gender,
            FieldKind::Phone => &self.phone,
            FieldKind::FullName => &self.full_name,
            FieldKind::SocialId => &self.social_id,
            FieldKind::Location => &self.location,
        }
    }
}

pub struct Decryptor<'a> {
    relayer: &'a dyn Relayer,
    signer: &'a dyn WalletSigner,
    contract: Address,
}

impl<'a> Decryptor<'a> {
    pub fn new(relayer: &'a dyn Relayer, signer: &'a dyn WalletSigner, contract: Address) -> Self {
        Self {
            relayer,
            signer,
            contract,
        }
    }

    /// Resolve every handle with one signature and one relayer call.
    pub async fn decrypt_all(
        &self,
        handles: &[H256],
        progress: &PhaseReporter,
    ) -> Result<BTreeMap<H256, U256>, RemoteError> {
        let keypair = self.relayer.generate_keypair()?;
        let start_timestamp = OffsetDateTime::now_utc().unix_timestamp().max(0) as u64;
        let typed_data = self.relayer.create_eip712(
            &keypair.public_key,
            &[self.contract],
            start_timestamp,
            DECRYPT_DURATION_DAYS,
        )?;

        progress.report(DecryptPhase::AwaitingSignature);
        debug!(handles = handles.len(), "requesting decrypt signature");
        let signature = self.signer.sign_typed_data(&typed_data).await?;

        progress.report(DecryptPhase::AwaitingRelayer);
        let request = UserDecryptRequest {
            pairs: handles
                .iter()
                .map(|handle| HandleContractPair {
                    handle: *handle,
                    contract_address: self.contract,
                })
                .collect(),
            keypair,
            signature: signature_hex(&signature),
            contract_addresses: vec![self.contract],
            user_address: self.signer.address(),
            start_timestamp,
            duration_days: DECRYPT_DURATION_DAYS,
        };
        let clear = self.relayer.user_decrypt(request).await?;
        debug!(values = clear.len(), "relayer answered decrypt batch");

        handles
            .iter()
            .map(|handle| {
                let value = match clear.get(handle) {
                    Some(value) => value.to_uint(*handle)?,
                    None => U256::zero(),
                };
                Ok((*handle, value))
            })
            .collect()
    }

    /// Decrypt and decode all five fields of a card.
    pub async fn decrypt_card(
        &self,
        handles: &CardHandles,
        progress: &PhaseReporter,
    ) -> Result<DecodedCard, RemoteError> {
        let values = self.decrypt_all(&handles.to_vec(), progress).await?;
        let text = |kind: FieldKind, handle: H256| {
            codec::decode(kind, values.get(&handle).copied().unwrap_or_default())
        };
        Ok(DecodedCard {
            gender: text(FieldKind::Gender, handles.gender),
            phone: text(FieldKind::Phone, handles.phone),
            full_name: text(FieldKind::FullName, handles.full_name),
            social_id: text(FieldKind::SocialId, handles.social_id),
            location: text(FieldKind::Location, handles.location),
        })
    }
}
