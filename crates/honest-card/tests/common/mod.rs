//! In-memory stand-ins for the contract, the relayer and the wallet.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::types::transaction::eip712::TypedData;
use ethers::types::{Address, Bytes, Signature, H256, U256};
use honest_card::contract::{CardContract, CardHandles, PendingRequests, PublicInfo};
use honest_card::error::RemoteError;
use honest_card::relayer::{
    ClearValue, EncryptedInputBuilder, EncryptedInputs, InstanceConfig, Keypair, Relayer,
    RelayerFactory, UserDecryptRequest,
};
use honest_card::wallet::WalletSigner;

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn events(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[derive(Debug, Default)]
pub struct Ledger {
    cards: HashMap<Address, (PublicInfo, CardHandles)>,
    requests: BTreeSet<(Address, Address)>,
    connections: BTreeSet<(Address, Address)>,
}

/// Contract double that acts as `caller` against a shared ledger.
#[derive(Clone)]
pub struct MockContract {
    pub caller: Address,
    pub ledger: Arc<Mutex<Ledger>>,
    pub writes: Arc<AtomicUsize>,
}

impl MockContract {
    pub fn new(caller: Address, ledger: Arc<Mutex<Ledger>>) -> Self {
        Self {
            caller,
            ledger,
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn connected(ledger: &Ledger, a: Address, b: Address) -> bool {
        ledger.connections.contains(&(a, b))
    }
}

#[async_trait]
impl CardContract for MockContract {
    async fn has_card(&self, user: Address) -> Result<bool, RemoteError> {
        Ok(self.ledger.lock().unwrap().cards.contains_key(&user))
    }

    async fn pending_for(&self, user: Address) -> Result<PendingRequests, RemoteError> {
        let ledger = self.ledger.lock().unwrap();
        Ok(PendingRequests {
            outgoing: ledger
                .requests
                .iter()
                .filter(|(from, _)| *from == user)
                .map(|(_, to)| *to)
                .collect(),
            incoming: ledger
                .requests
                .iter()
                .filter(|(_, to)| *to == user)
                .map(|(from, _)| *from)
                .collect(),
        })
    }

    async fn connections(&self, user: Address) -> Result<Vec<Address>, RemoteError> {
        let ledger = self.ledger.lock().unwrap();
        Ok(ledger
            .connections
            .iter()
            .filter(|(a, _)| *a == user)
            .map(|(_, b)| *b)
            .collect())
    }

    async fn public_info(&self, user: Address) -> Result<PublicInfo, RemoteError> {
        let ledger = self.ledger.lock().unwrap();
        Ok(ledger
            .cards
            .get(&user)
            .map(|(info, _)| info.clone())
            .unwrap_or_default())
    }

    async fn encrypted_handles(
        &self,
        user: Address,
        caller: Address,
    ) -> Result<CardHandles, RemoteError> {
        let ledger = self.ledger.lock().unwrap();
        if caller != user && !Self::connected(&ledger, caller, user) {
            return Err(RemoteError::Contract("execution reverted: not authorized".into()));
        }
        ledger
            .cards
            .get(&user)
            .map(|(_, handles)| *handles)
            .ok_or_else(|| RemoteError::Contract("execution reverted: no card".into()))
    }

    async fn has_completed_exchange(&self, a: Address, b: Address) -> Result<bool, RemoteError> {
        Ok(Self::connected(&self.ledger.lock().unwrap(), a, b))
    }

    async fn create_card(
        &self,
        surname: &str,
        handles: &CardHandles,
        _input_proof: Bytes,
    ) -> Result<H256, RemoteError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let info = PublicInfo {
            surname: surname.to_string(),
            exists: true,
        };
        self.ledger
            .lock()
            .unwrap()
            .cards
            .insert(self.caller, (info, *handles));
        Ok(H256::from_low_u64_be(self.writes.load(Ordering::SeqCst) as u64))
    }

    async fn request_exchange(&self, target: Address) -> Result<H256, RemoteError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut ledger = self.ledger.lock().unwrap();
        if ledger.requests.remove(&(target, self.caller)) {
            ledger.connections.insert((self.caller, target));
            ledger.connections.insert((target, self.caller));
        } else {
            ledger.requests.insert((self.caller, target));
        }
        Ok(H256::from_low_u64_be(self.writes.load(Ordering::SeqCst) as u64))
    }
}

/// Relayer double: "encrypts" by remembering plaintexts under fresh
/// handles and "decrypts" by looking them up.
#[derive(Clone, Default)]
pub struct MockRelayer {
    pub log: Log,
    pub vault: Arc<Mutex<HashMap<H256, U256>>>,
    pub next_handle: Arc<AtomicU64>,
    pub requests: Arc<Mutex<Vec<UserDecryptRequest>>>,
    pub fail_decrypt: bool,
    pub drop_values: bool,
}

impl MockRelayer {
    pub fn with_log(log: Log) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn seal(&self, value: U256) -> H256 {
        let handle = H256::from_low_u64_be(self.next_handle.fetch_add(1, Ordering::SeqCst) + 1);
        self.vault.lock().unwrap().insert(handle, value);
        handle
    }

    fn record(&self, event: &str) {
        self.log.lock().unwrap().push(event.to_string());
    }
}

pub fn decrypt_typed_data(contract: Address, start: u64) -> TypedData {
    serde_json::from_value(serde_json::json!({
        "types": {
            "EIP712Domain": [
                { "name": "name", "type": "string" },
                { "name": "version", "type": "string" },
                { "name": "chainId", "type": "uint256" },
                { "name": "verifyingContract", "type": "address" }
            ],
            "UserDecryptRequestVerification": [
                { "name": "publicKey", "type": "bytes" },
                { "name": "contractAddresses", "type": "address[]" },
                { "name": "startTimestamp", "type": "uint256" },
                { "name": "durationDays", "type": "uint256" }
            ]
        },
        "primaryType": "UserDecryptRequestVerification",
        "domain": {
            "name": "Decryption",
            "version": "1",
            "chainId": 11155111,
            "verifyingContract": format!("{contract:?}")
        },
        "message": {
            "publicKey": "0x01",
            "contractAddresses": [format!("{contract:?}")],
            "startTimestamp": start.to_string(),
            "durationDays": "1"
        }
    }))
    .unwrap()
}

#[async_trait]
impl Relayer for MockRelayer {
    async fn encrypt(&self, input: EncryptedInputBuilder) -> Result<EncryptedInputs, RemoteError> {
        self.record("encrypt");
        let handles = input.inputs().iter().map(|i| self.seal(i.value)).collect();
        Ok(EncryptedInputs {
            handles,
            input_proof: Bytes::from(vec![0xde, 0xad]),
        })
    }

    fn generate_keypair(&self) -> Result<Keypair, RemoteError> {
        self.record("keypair");
        Ok(Keypair {
            public_key: "0x01".into(),
            private_key: "0x02".into(),
        })
    }

    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> Result<TypedData, RemoteError> {
        self.record("eip712");
        assert_eq!(public_key, "0x01");
        assert_eq!(duration_days, 1);
        Ok(decrypt_typed_data(contract_addresses[0], start_timestamp))
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<HashMap<H256, ClearValue>, RemoteError> {
        self.record("user_decrypt");
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_decrypt {
            return Err(RemoteError::Relayer("relayer unavailable".into()));
        }
        let vault = self.vault.lock().unwrap();
        Ok(request
            .pairs
            .iter()
            .filter(|_| !self.drop_values)
            .map(|pair| {
                let value = vault
                    .get(&pair.handle)
                    .map(|v| ClearValue::Text(v.to_string()))
                    .unwrap_or(ClearValue::Missing);
                (pair.handle, value)
            })
            .collect())
    }
}

pub struct MockSigner {
    pub address: Address,
    pub log: Log,
    pub reject: bool,
}

impl MockSigner {
    pub fn new(address: Address, log: Log) -> Self {
        Self {
            address,
            log,
            reject: false,
        }
    }
}

#[async_trait]
impl WalletSigner for MockSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_typed_data(&self, data: &TypedData) -> Result<Signature, RemoteError> {
        self.log.lock().unwrap().push("sign".to_string());
        assert_eq!(data.primary_type, "UserDecryptRequestVerification");
        if self.reject {
            return Err(RemoteError::Signature("User rejected the request.".into()));
        }
        Ok(Signature {
            r: U256::one(),
            s: U256::from(2),
            v: 28,
        })
    }
}

pub struct MockFactory {
    pub relayer: MockRelayer,
    pub created: AtomicUsize,
    pub fail: bool,
}

impl MockFactory {
    pub fn new(relayer: MockRelayer) -> Self {
        Self {
            relayer,
            created: AtomicUsize::new(0),
            fail: false,
        }
    }
}

#[async_trait]
impl RelayerFactory for MockFactory {
    async fn create_instance(
        &self,
        _config: InstanceConfig,
    ) -> Result<Arc<dyn Relayer>, RemoteError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RemoteError::Relayer("wrong network".into()));
        }
        Ok(Arc::new(self.relayer.clone()))
    }
}
