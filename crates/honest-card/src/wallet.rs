use async_trait::async_trait;
use ethers::signers::Signer;
use ethers::types::transaction::eip712::TypedData;
use ethers::types::{Address, Signature};

use crate::error::RemoteError;

/// The connected wallet, as far as the client needs it: an address and a
/// typed-data signature prompt.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_typed_data(&self, data: &TypedData) -> Result<Signature, RemoteError>;
}

#[async_trait]
impl<S> WalletSigner for S
where
    S: Signer,
{
    fn address(&self) -> Address {
        Signer::address(self)
    }

    async fn sign_typed_data(&self, data: &TypedData) -> Result<Signature, RemoteError> {
        Signer::sign_typed_data(self, data)
            .await
            .map_err(|err| RemoteError::Signature(err.to_string()))
    }
}

/// Hex encoding of a signature without the `0x` prefix, as the relayer
/// expects it.
pub fn signature_hex(signature: &Signature) -> String {
    ethers::utils::hex::encode(signature.to_vec())
}

#[cfg(test)]
mod tests {
    use ethers::signers::LocalWallet;
    use ethers::types::U256;

    use super::*;

    #[test]
    fn local_wallet_exposes_its_address() {
        let wallet: LocalWallet =
            "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
                .parse()
                .unwrap();
        assert_eq!(WalletSigner::address(&wallet), Signer::address(&wallet));
    }

    #[test]
    fn signature_hex_has_no_prefix() {
        let signature = Signature {
            r: U256::one(),
            s: U256::from(2),
            v: 27,
        };
        let hex = signature_hex(&signature);
        assert_eq!(hex.len(), 130);
        assert!(!hex.starts_with("0x"));
        assert!(hex.ends_with("1b"));
    }
}
