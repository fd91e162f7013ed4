//! Transient state of one viewed card.
//!
//! A [`CardView`] caches the decoded fields of the card it targets. The
//! cache lives only as long as the view; closing it or pointing it at a
//! different address wipes the cache and invalidates any decrypt still in
//! flight, whose result is then dropped on arrival.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ethers::types::Address;
use tokio::sync::watch;

use crate::codec::FieldKind;
use crate::decrypt::{DecodedCard, DecryptPhase, PhaseReporter};
use crate::error::{Error, Result, ValidationError};

/// Shown in place of a field that has not been decrypted.
pub const HIDDEN: &str = "***";

/// Proof that a decrypt was started by a given incarnation of the view.
#[derive(Debug)]
#[must_use]
pub struct DecryptTicket {
    generation: u64,
    reporter: PhaseReporter,
}

impl DecryptTicket {
    pub fn reporter(&self) -> &PhaseReporter {
        &self.reporter
    }
}

#[derive(Debug)]
pub enum Completion {
    Decoded,
    Failed(Error),
    /// The view was closed or retargeted while the decrypt was running.
    Stale,
}

#[derive(Debug)]
pub struct CardView {
    target: Option<Address>,
    cache: Option<DecodedCard>,
    phase: Arc<watch::Sender<DecryptPhase>>,
    generation: Arc<AtomicU64>,
}

impl Default for CardView {
    fn default() -> Self {
        let (tx, _) = watch::channel(DecryptPhase::Idle);
        Self {
            target: None,
            cache: None,
            phase: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl CardView {
    pub fn open(target: Address) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn target(&self) -> Option<Address> {
        self.target
    }

    pub fn phase(&self) -> DecryptPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<DecryptPhase> {
        self.phase.subscribe()
    }

    pub fn decoded(&self) -> Option<&DecodedCard> {
        self.cache.as_ref()
    }

    /// Display text for `kind`: the decoded value or the hidden marker.
    pub fn field(&self, kind: FieldKind) -> &str {
        self.cache
            .as_ref()
            .map(|card| card.field(kind))
            .unwrap_or(HIDDEN)
    }

    /// Start a decrypt. Refused while another one is awaiting the wallet or
    /// the relayer.
    pub fn begin_decrypt(&mut self) -> Result<DecryptTicket> {
        if self.phase().is_busy() {
            return Err(ValidationError::DecryptInProgress.into());
        }
        let generation = self.generation.load(Ordering::SeqCst);
        self.phase.send_replace(DecryptPhase::AwaitingSignature);
        Ok(DecryptTicket {
            generation,
            reporter: PhaseReporter::new(
                Arc::clone(&self.phase),
                generation,
                Arc::clone(&self.generation),
            ),
        })
    }

    /// Apply the outcome of a decrypt started with `ticket`. A failure
    /// leaves previously decoded values in place.
    pub fn complete(
        &mut self,
        ticket: DecryptTicket,
        result: Result<DecodedCard>,
    ) -> Completion {
        if ticket.generation != self.generation.load(Ordering::SeqCst) {
            return Completion::Stale;
        }
        match result {
            Ok(card) => {
                self.cache = Some(card);
                self.phase.send_replace(DecryptPhase::Decoded);
                Completion::Decoded
            }
            Err(err) => {
                self.phase.send_replace(DecryptPhase::Failed);
                Completion::Failed(err)
            }
        }
    }

    /// Point the view at another card. Same target keeps the cache.
    pub fn retarget(&mut self, target: Address) {
        if self.target != Some(target) {
            self.reset();
            self.target = Some(target);
        }
    }

    pub fn close(&mut self) {
        self.reset();
        self.target = None;
    }

    fn reset(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache = None;
        self.phase.send_replace(DecryptPhase::Idle);
    }
}
