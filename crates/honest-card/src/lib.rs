//! Client side of the Honest encrypted business card exchange.
//!
//! Card fields are packed into fixed-width integers ([`codec`]), encrypted
//! by the FHE relayer and stored as ciphertext handles by the HonestCard
//! contract. Two accounts that requested each other may decrypt each
//! other's fields; [`decrypt`] does so for a whole card with one wallet
//! signature.

pub mod bootstrap;
pub mod card;
pub mod client;
pub mod codec;
pub mod config;
pub mod contract;
pub mod decrypt;
pub mod error;
pub mod exchange;
pub mod notify;
pub mod relayer;
pub mod session;
pub mod view;
pub mod wallet;

pub use client::CardClient;
pub use error::{Error, Result};
