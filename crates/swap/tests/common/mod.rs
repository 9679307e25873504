//! Deterministic in-memory doubles for the remote RPC, local ledger and
//! draft-tx service capabilities, used to drive the state machine in tests
//! without a live network on either ledger.

use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use swaplock_receipt::Receipt;
use swaplock_swap::{BlockHeader, DraftTxService, LocalLedger, RemoteRpc, Signature, SwapError};

#[derive(Default)]
pub struct MockRemoteRpc {
    blocks: Mutex<HashMap<u64, (BlockHeader, Vec<Receipt>)>>,
}

impl MockRemoteRpc {
    pub fn register_block(&self, number: u64, header: BlockHeader, receipts: Vec<Receipt>) {
        self.blocks.lock().unwrap().insert(number, (header, receipts));
    }
}

#[async_trait]
impl RemoteRpc for MockRemoteRpc {
    async fn get_transaction_receipt(&self, _tx_hash: H256) -> Result<Receipt, SwapError> {
        Err(SwapError::Remote("not used by these scenarios".into()))
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
pub struct MockLedger {
    vault: Mutex<HashMap<Address, HashSet<H256>>>,
    /// swap_id -> (asset_ref, owner, recipient), recorded at draft time.
    pending: Mutex<HashMap<H256, (H256, Address, Address)>>,
    signed: Mutex<HashSet<H256>>,
    next_asset: Mutex<u64>,
}

impl MockLedger {
    pub fn owns(&self, owner: Address, asset_ref: H256) -> bool {
        self.vault
            .lock()
            .unwrap()
            .get(&owner)
            .map(|assets| assets.contains(&asset_ref))
            .unwrap_or(false)
    }
}

#[async_trait]
impl LocalLedger for MockLedger {
    async fn issue_asset(&self, owner: Address, _amount: U256) -> Result<H256, SwapError> {
        let mut counter = self.next_asset.lock().unwrap();
        *counter += 1;
        let asset_ref = H256::from_low_u64_be(*counter);
        self.vault.lock().unwrap().entry(owner).or_default().insert(asset_ref);
        Ok(asset_ref)
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

    async fn sign_tx(&self, draft_id: H256) -> Result<(), SwapError> {
        self.signed.lock().unwrap().insert(draft_id);
        Ok(())
    }

    async fn finalize_tx(&self, swap_id: H256, witness: Vec<u8>) -> Result<H256, SwapError> {
        let (asset_ref, owner, recipient) = *self
            .pending
            .lock()
            .unwrap()
            .get(&swap_id)
            .ok_or(SwapError::MalformedSwap)?;
        // An empty witness marks owner recovery after expiry; otherwise the
        // asset moves to the recipient named at draft time.
        let destination = if witness.is_empty() { owner } else { recipient };
        let mut vault = self.vault.lock().unwrap();
        vault.entry(owner).or_default().remove(&asset_ref);
        vault.entry(destination).or_default().insert(asset_ref);
        Ok(swap_id)
    }

    async fn vault_query(&self, owner: Address) -> Result<Vec<H256>, SwapError> {
        Ok(self
            .vault
            .lock()
            .unwrap()
            .get(&owner)
            .map(|assets| assets.iter().copied().collect())
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MockDraftTxService {
    drafts: Mutex<HashMap<H256, Vec<u8>>>,
    block_sigs: Mutex<HashMap<(H256, u64), Vec<Signature>>>,
    notary_sigs: Mutex<HashMap<H256, Vec<Signature>>>,
}

#[async_trait]
impl DraftTxService for MockDraftTxService {
    async fn put_draft(&self, swap_id: H256, draft_tx_bytes: Vec<u8>) -> Result<(), SwapError> {
        self.drafts.lock().unwrap().insert(swap_id, draft_tx_bytes);
        Ok(())
    }

    async fn get_draft(&self, swap_id: H256) -> Result<Option<Vec<u8>>, SwapError> {
        Ok(self.drafts.lock().unwrap().get(&swap_id).cloned())
    }

    async fn append_block_signature(&self, swap_id: H256, block_number: u64, signature: Signature) -> Result<(), SwapError> {
        self.block_sigs
            .lock()
            .unwrap()
            .entry((swap_id, block_number))
            .or_default()
            .push(signature);
        Ok(())
    }

    async fn block_signatures(&self, swap_id: H256, block_number: u64) -> Result<Vec<Signature>, SwapError> {
        Ok(self
            .block_sigs
            .lock()
            .unwrap()
            .get(&(swap_id, block_number))
            .cloned()
            .unwrap_or_default())
    }

    async fn append_notary_signature(&self, swap_id: H256, signature: Signature) -> Result<(), SwapError> {
        self.notary_sigs.lock().unwrap().entry(swap_id).or_default().push(signature);
        Ok(())
    }

    async fn notary_signatures(&self, swap_id: H256) -> Result<Vec<Signature>, SwapError> {
        Ok(self.notary_sigs.lock().unwrap().get(&swap_id).cloned().unwrap_or_default())
    }
}
