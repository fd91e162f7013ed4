//! Read-only view of the contract's exchange sets.
//!
//! Nothing here is ever mutated locally: after a transaction that may
//! change exchange state the overview is read again from the contract.

use ethers::types::Address;

use crate::contract::{CardContract, PendingRequests};
use crate::error::{RemoteError, ValidationError};

/// Relation between the connected account and one other address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    None,
    /// We asked, they have not answered.
    OutgoingOnly,
    /// They asked; calling `requestExchange` back completes it.
    IncomingOnly,
    Mutual,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeOverview {
    pub outgoing: Vec<Address>,
    pub incoming: Vec<Address>,
    pub connections: Vec<Address>,
}

impl ExchangeOverview {
    pub async fn fetch<C>(contract: &C, user: Address) -> Result<Self, RemoteError>
    where
        C: CardContract + ?Sized,
    {
        let PendingRequests { outgoing, incoming } = contract.pending_for(user).await?;
        let connections = contract.connections(user).await?;
        Ok(Self {
            outgoing,
            incoming,
            connections,
        })
    }

    /// Completed connections are authoritative. An address found in both
    /// pending sets but not connected is reported as incoming so it can
    /// still be accepted.
    pub fn state_with(&self, other: Address) -> ExchangeState {
        if self.connections.contains(&other) {
            ExchangeState::Mutual
        } else if self.incoming.contains(&other) {
            ExchangeState::IncomingOnly
        } else if self.outgoing.contains(&other) {
            ExchangeState::OutgoingOnly
        } else {
            ExchangeState::None
        }
    }
}

/// Parse a user-entered address: `0x` followed by exactly 40 hex digits.
pub fn parse_address(input: &str) -> Result<Address, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::MissingAddress);
    }
    let digits = input
        .strip_prefix("0x")
        .ok_or(ValidationError::InvalidAddress)?;
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidAddress);
    }
    input
        .parse::<Address>()
        .map_err(|_| ValidationError::InvalidAddress)
}

/// `0x1234...abcd` form used in listings.
pub fn short_address(address: &Address) -> String {
    let full = format!("{address:?}");
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_follows_the_contract_sets() {
        let a = Address::repeat_byte(0xa);
        let b = Address::repeat_byte(0xb);
        let c = Address::repeat_byte(0xc);
        let d = Address::repeat_byte(0xd);
        let overview = ExchangeOverview {
            outgoing: vec![a],
            incoming: vec![b],
            connections: vec![c],
        };
        assert_eq!(overview.state_with(a), ExchangeState::OutgoingOnly);
        assert_eq!(overview.state_with(b), ExchangeState::IncomingOnly);
        assert_eq!(overview.state_with(c), ExchangeState::Mutual);
        assert_eq!(overview.state_with(d), ExchangeState::None);
    }

    #[test]
    fn address_syntax() {
        assert_eq!(parse_address("  "), Err(ValidationError::MissingAddress));
        assert_eq!(
            parse_address("1234567890123456789012345678901234567890"),
            Err(ValidationError::InvalidAddress)
        );
        assert_eq!(parse_address("0x1234"), Err(ValidationError::InvalidAddress));
        assert_eq!(
            parse_address("0xZZ34567890123456789012345678901234567890"),
            Err(ValidationError::InvalidAddress)
        );
        assert_eq!(
            parse_address("0xAbCdEf0000000000000000000000000000000001"),
            Ok("0xabcdef0000000000000000000000000000000001".parse().unwrap())
        );
    }

    #[test]
    fn short_form() {
        let address: Address = "0xabcdef0000000000000000000000000000001234".parse().unwrap();
        assert_eq!(short_address(&address), "0xabcd...1234");
    }
}
