//! Minimal in-process stand-ins for the remote RPC, local ledger and
//! draft-tx capabilities so the binary has something to drive. These are
//! illustrative, not a reference mock — `swaplock-swap`'s own test doubles
//! (under its `tests/` directory) are the ones exercised by the scenario
//! suite.

use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use std::collections::HashMap;
use std::sync::Mutex;
use swaplock_commitment::{ClaimOrRevertEvent, EventKind, SwapIntent};
use swaplock_receipt::{Log, Receipt, TxType};
use swaplock_swap::capabilities::Signature;
use swaplock_swap::proof::build_receipts_trie;
use swaplock_swap::{BlockHeader, DraftTxService, LocalLedger, RemoteRpc, SwapError};

#[derive(Default)]
pub struct InProcessLedger {
    vault: Mutex<HashMap<Address, Vec<H256>>>,
    pending: Mutex<HashMap<H256, (H256, Address, Address)>>,
    next_asset: Mutex<u64>,
}

impl InProcessLedger {
    pub async fn issue_asset(&self, owner: Address) -> H256 {
        let mut counter = self.next_asset.lock().unwrap();
        *counter += 1;
        let asset_ref = H256::from_low_u64_be(*counter);
        self.vault.lock().unwrap().entry(owner).or_default().push(asset_ref);
        asset_ref
    }
}

#[async_trait]
impl LocalLedger for InProcessLedger {
    async fn issue_asset(&self, owner: Address, _amount: U256) -> Result<H256, SwapError> {
        Ok(InProcessLedger::issue_asset(self, owner).await)
    }

    async fn build_draft_swap_tx(
        &self,
        swap_id: H256,
        asset_ref: H256,
        recipient: Address,
        _lock_event: Vec<u8>,
    ) -> Result<H256, SwapError> {
        let owner = self
            .vault
            .lock()
            .unwrap()
            .iter()
            .find(|(_, assets)| assets.contains(&asset_ref))
            .map(|(owner, _)| *owner)
            .ok_or(SwapError::MalformedSwap)?;
        self.pending.lock().unwrap().insert(swap_id, (asset_ref, owner, recipient));
        Ok(swap_id)
    }

    async fn sign_tx(&self, _draft_id: H256) -> Result<(), SwapError> {
        Ok(())
    }

    async fn finalize_tx(&self, swap_id: H256, witness: Vec<u8>) -> Result<H256, SwapError> {
        let (asset_ref, owner, recipient) =
            *self.pending.lock().unwrap().get(&swap_id).ok_or(SwapError::MalformedSwap)?;
        let destination = if witness.is_empty() { owner } else { recipient };
        let mut vault = self.vault.lock().unwrap();
        vault.entry(owner).or_default().retain(|a| *a != asset_ref);
        vault.entry(destination).or_default().push(asset_ref);
        Ok(swap_id)
    }

    async fn vault_query(&self, owner: Address) -> Result<Vec<H256>, SwapError> {
        Ok(self.vault.lock().unwrap().get(&owner).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InProcessRpc {
    blocks: Mutex<HashMap<u64, (BlockHeader, Vec<Receipt>)>>,
}

impl InProcessRpc {
    /// Seeds a single-transaction block whose receipt carries the claim
    /// event the demonstration swap expects, and returns the block number.
    pub async fn seed_block_proving_claim(&self, intent: &SwapIntent, swap_id: H256) -> u64 {
        let event = ClaimOrRevertEvent::build(intent, swap_id, EventKind::Claim);
        let log = Log { address: intent.protocol_address, topics: event.topics, data: event.data.into() };
        let receipts = vec![Receipt::new(TxType::Legacy, true, 21_000, vec![log])];
        let (_trie, root) = build_receipts_trie(&receipts).expect("receipts trie build never fails here");
        let number = 1;
        let header = BlockHeader { number, hash: H256::from_low_u64_be(number), receipts_root: root };
        self.blocks.lock().unwrap().insert(number, (header, receipts));
        number
    }
}

#[async_trait]
impl RemoteRpc for InProcessRpc {
    async fn get_transaction_receipt(&self, _tx_hash: H256) -> Result<Receipt, SwapError> {
        Err(SwapError::Remote("not used by the demonstration wiring".into()))
    }

    async fn get_block(&self, number: u64) -> Result<BlockHeader, SwapError> {
        self.blocks
            .lock()
            .unwrap()
            .get(&number)
            .map(|(header, _)| header.clone())
            .ok_or_else(|| SwapError::Remote(format!("unknown block {number}")))
    }

    async fn get_block_receipts(&self, number: u64) -> Result<Vec<Receipt>, SwapError> {
        self.blocks
            .lock()
            .unwrap()
            .get(&number)
            .map(|(_, receipts)| receipts.clone())
            .ok_or_else(|| SwapError::Remote(format!("unknown block {number}")))
    }

    async fn send_transaction(&self, _to: Address, _data: Vec<u8>, _value: U256) -> Result<H256, SwapError> {
        Ok(H256::random())
    }

    async fn call(&self, _to: Address, _data: Vec<u8>) -> Result<Vec<u8>, SwapError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct InProcessDraftTxService {
    drafts: Mutex<HashMap<H256, Vec<u8>>>,
    block_sigs: Mutex<HashMap<(H256, u64), Vec<Signature>>>,
    notary_sigs: Mutex<HashMap<H256, Vec<Signature>>>,
}

impl InProcessDraftTxService {
    pub async fn seed_block_signatures(&self, swap_id: H256, block_number: u64, validators: &[Address]) {
        let mut sigs = self.block_sigs.lock().unwrap();
        let entry = sigs.entry((swap_id, block_number)).or_default();
        for validator in validators {
            entry.push(Signature { signer: *validator, bytes: vec![0xAA] });
        }
    }
}

#[async_trait]
impl DraftTxService for InProcessDraftTxService {
    async fn put_draft(&self, swap_id: H256, draft_tx_bytes: Vec<u8>) -> Result<(), SwapError> {
        self.drafts.lock().unwrap().insert(swap_id, draft_tx_bytes);
        Ok(())
    }

    async fn get_draft(&self, swap_id: H256) -> Result<Option<Vec<u8>>, SwapError> {
        Ok(self.drafts.lock().unwrap().get(&swap_id).cloned())
    }

    async fn append_block_signature(&self, swap_id: H256, block_number: u64, signature: Signature) -> Result<(), SwapError> {
        self.block_sigs.lock().unwrap().entry((swap_id, block_number)).or_default().push(signature);
        Ok(())
    }

    async fn block_signatures(&self, swap_id: H256, block_number: u64) -> Result<Vec<Signature>, SwapError> {
        Ok(self.block_sigs.lock().unwrap().get(&(swap_id, block_number)).cloned().unwrap_or_default())
    }

    async fn append_notary_signature(&self, swap_id: H256, signature: Signature) -> Result<(), SwapError> {
        self.notary_sigs.lock().unwrap().entry(swap_id).or_default().push(signature);
        Ok(())
    }

    async fn notary_signatures(&self, swap_id: H256) -> Result<Vec<Signature>, SwapError> {
        Ok(self.notary_sigs.lock().unwrap().get(&swap_id).cloned().unwrap_or_default())
    }
}
