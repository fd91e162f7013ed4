//! User actions against the card contract.
//!
//! [`CardClient`] is built once by the host and owns the contract binding
//! and the current [`SessionSlot`]. Every action checks readiness first,
//! then validates input, and only then talks to the network.

use ethers::types::{Address, H256};
use tracing::{debug, info};

use crate::card::CardForm;
use crate::contract::{CardContract, CardHandles, PublicInfo};
use crate::decrypt::{DecodedCard, Decryptor, PhaseReporter};
use crate::error::{RemoteError, Result, ValidationError};
use crate::exchange::{parse_address, ExchangeOverview, ExchangeState};
use crate::session::SessionSlot;

pub struct CardClient<C> {
    contract: C,
    contract_address: Address,
    session: SessionSlot,
}

impl<C: CardContract> CardClient<C> {
    pub fn new(contract: C, contract_address: Address) -> Self {
        Self {
            contract,
            contract_address,
            session: SessionSlot::default(),
        }
    }

    pub fn contract(&self) -> &C {
        &self.contract
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn session(&self) -> &SessionSlot {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionSlot {
        &mut self.session
    }

    fn account(&self) -> Result<Address> {
        Ok(self.session.get()?.account())
    }

    /// Encrypt the form's fields and submit `createCard`.
    pub async fn create_card(&self, form: &CardForm) -> Result<H256> {
        let session = self.session.get()?;
        let relayer = session.relayer()?;
        let encoded = form.encode()?;

        let account = session.account();
        if self.contract.has_card(account).await? {
            return Err(ValidationError::CardExists.into());
        }

        let mut input = relayer.create_encrypted_input(self.contract_address, account);
        encoded
            .add_to(&mut input)
            .map_err(ValidationError::from)?;
        debug!(contract = ?self.contract_address, ?account, "encrypting card inputs");
        let encrypted = relayer.encrypt(input).await?;
        let handles = CardHandles::from_slice(&encrypted.handles)?;

        let tx_hash = self
            .contract
            .create_card(form.surname.trim(), &handles, encrypted.input_proof)
            .await?;
        info!(?tx_hash, "card created");
        Ok(tx_hash)
    }

    pub async fn has_card(&self, user: Address) -> Result<bool> {
        Ok(self.contract.has_card(user).await?)
    }

    pub async fn public_info(&self, user: Address) -> Result<PublicInfo> {
        Ok(self.contract.public_info(user).await?)
    }

    /// Public part of the connected account's card, if it has one.
    pub async fn my_card(&self) -> Result<Option<PublicInfo>> {
        let account = self.account()?;
        if !self.contract.has_card(account).await? {
            return Ok(None);
        }
        Ok(Some(self.contract.public_info(account).await?))
    }

    pub async fn overview(&self, user: Address) -> Result<ExchangeOverview> {
        Ok(ExchangeOverview::fetch(&self.contract, user).await?)
    }

    pub async fn exchange_state(&self, other: Address) -> Result<ExchangeState> {
        let account = self.account()?;
        Ok(self.overview(account).await?.state_with(other))
    }

    /// Ask `target` (as typed by the user) for an exchange and return the
    /// overview as the contract now reports it.
    pub async fn request_exchange(&self, target: &str) -> Result<ExchangeOverview> {
        let account = self.account()?;
        let target = parse_address(target)?;
        if target == account {
            return Err(ValidationError::SelfExchange.into());
        }
        if !self.contract.has_card(target).await? {
            return Err(ValidationError::TargetHasNoCard.into());
        }
        let tx_hash = self.contract.request_exchange(target).await?;
        info!(?tx_hash, ?target, "exchange requested");
        self.overview(account).await
    }

    /// Answer an incoming request from `from`, completing the exchange.
    pub async fn accept(&self, from: Address) -> Result<ExchangeOverview> {
        let account = self.account()?;
        let before = self.overview(account).await?;
        if before.state_with(from) != ExchangeState::IncomingOnly {
            return Err(ValidationError::NoPendingRequest.into());
        }
        let tx_hash = self.contract.request_exchange(from).await?;
        info!(?tx_hash, ?from, "exchange accepted");
        self.overview(account).await
    }

    /// Handles of `target`'s card, readable by its owner or by a completed
    /// exchange partner.
    pub async fn card_handles(&self, target: Address) -> Result<CardHandles> {
        let account = self.account()?;
        if target != account && !self.contract.has_completed_exchange(account, target).await? {
            return Err(ValidationError::ExchangeNotCompleted.into());
        }
        Ok(self.contract.encrypted_handles(target, account).await?)
    }

    /// Fetch and decrypt every field of `target`'s card with a single
    /// wallet signature.
    pub async fn decrypt_card(
        &self,
        target: Address,
        progress: &PhaseReporter,
    ) -> Result<DecodedCard> {
        let session = self.session.get()?;
        let relayer = session.relayer()?;
        let handles = self.card_handles(target).await?;
        let decryptor = Decryptor::new(relayer, session.signer(), self.contract_address);
        let card = decryptor
            .decrypt_card(&handles, progress)
            .await
            .map_err(|err: RemoteError| {
                debug!(%err, ?target, "decrypt batch failed");
                err
            })?;
        Ok(card)
    }
}
