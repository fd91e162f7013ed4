//! Wallet and relayer handles for the connected account.
//!
//! A [`Session`] belongs to one (account, chain) pair. When either changes
//! the session is rebuilt from scratch rather than patched.

use std::sync::Arc;

use ethers::types::Address;
use tracing::{debug, error};

use crate::error::{Readiness, RemoteError};
use crate::relayer::{InstanceConfig, Relayer, RelayerFactory};
use crate::wallet::WalletSigner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub account: Address,
    pub chain_id: u64,
}

#[derive(Clone)]
pub struct Session {
    key: SessionKey,
    signer: Arc<dyn WalletSigner>,
    relayer: Option<Arc<dyn Relayer>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .field("relayer_ready", &self.relayer.is_some())
            .finish()
    }
}

impl Session {
    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn account(&self) -> Address {
        self.key.account
    }

    pub fn signer(&self) -> &dyn WalletSigner {
        self.signer.as_ref()
    }

    pub fn relayer(&self) -> Result<&dyn Relayer, Readiness> {
        self.relayer.as_deref().ok_or(Readiness::RelayerNotReady)
    }
}

#[derive(Debug, Default)]
pub struct SessionSlot {
    current: Option<Session>,
}

impl SessionSlot {
    pub fn get(&self) -> Result<&Session, Readiness> {
        self.current.as_ref().ok_or(Readiness::WalletNotConnected)
    }

    /// Attach a wallet without a relayer. Chain reads and writes work;
    /// encryption and decryption report the relayer as not ready.
    pub fn connect_wallet(&mut self, signer: Arc<dyn WalletSigner>, chain_id: u64) -> &Session {
        let key = SessionKey {
            account: signer.address(),
            chain_id,
        };
        self.current.insert(Session {
            key,
            signer,
            relayer: None,
        })
    }

    /// Make sure the session matches `signer` on `chain_id` with a relayer
    /// handle. An up to date session is kept as is; otherwise a new one is
    /// built. If the relayer cannot be created the wallet stays connected
    /// and the error is returned.
    pub async fn refresh(
        &mut self,
        signer: Arc<dyn WalletSigner>,
        chain_id: u64,
        rpc_url: &str,
        factory: &dyn RelayerFactory,
    ) -> Result<&Session, RemoteError> {
        let key = SessionKey {
            account: signer.address(),
            chain_id,
        };
        let session = match self.current.take() {
            Some(session) if session.key == key && session.relayer.is_some() => session,
            _ => {
                debug!(?key, "creating relayer instance");
                let mut session = Session {
                    key,
                    signer,
                    relayer: None,
                };
                self.current = Some(session.clone());
                let config = InstanceConfig {
                    rpc_url: rpc_url.to_string(),
                    chain_id,
                    account: key.account,
                };
                let relayer = factory.create_instance(config).await.map_err(|err| {
                    error!(%err, "failed to create relayer instance");
                    err
                })?;
                session.relayer = Some(relayer);
                session
            }
        };
        Ok(self.current.insert(session))
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
