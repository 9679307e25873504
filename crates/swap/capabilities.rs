//! External collaborators the swap core consumes but does not implement:
//! the remote-ledger RPC client, the local-ledger transaction engine, and
//! the draft-tx service that persists per-swap signature sets. Each is a
//! capability trait so the state machine can be driven against a
//! deterministic mock in tests instead of a live network.

use crate::error::SwapError;
use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use swaplock_receipt::Receipt;

/// Remote block header fields the swap core needs. Real headers carry many
/// more fields (gas, parent hash, ...); only `receipts_root` and `number`
/// are load-bearing here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: H256,
    pub receipts_root: H256,
}

/// A signature over a canonical block identifier, produced by an oracle
/// (block-signatures strategy) or a notary (notarization-signatures
/// strategy). Distinct public keys are what the threshold guard counts;
/// duplicates by the same signer count once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub signer: Address,
    pub bytes: Vec<u8>,
}

/// The remote-ledger RPC capability: reads blocks/receipts and submits
/// transactions. Implemented externally; the swap core only consumes it.
#[async_trait]
pub trait RemoteRpc: Send + Sync {
    async fn get_transaction_receipt(&self, tx_hash: H256) -> Result<Receipt, SwapError>;
    async fn get_block(&self, number: u64) -> Result<BlockHeader, SwapError>;
    async fn get_block_receipts(&self, number: u64) -> Result<Vec<Receipt>, SwapError>;
    async fn send_transaction(&self, to: Address, data: Vec<u8>, value: U256) -> Result<H256, SwapError>;
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, SwapError>;
}

/// The local-ledger capability: validates, orders and notarizes local
/// (UTXO-style) transactions.
#[async_trait]
pub trait LocalLedger: Send + Sync {
    async fn issue_asset(&self, owner: Address, amount: U256) -> Result<H256, SwapError>;
    async fn build_draft_swap_tx(
        &self,
        swap_id: H256,
        asset_ref: H256,
        recipient: Address,
        lock_event: Vec<u8>,
    ) -> Result<H256, SwapError>;
    async fn sign_tx(&self, draft_id: H256) -> Result<(), SwapError>;
    async fn finalize_tx(&self, draft_id: H256, witness: Vec<u8>) -> Result<H256, SwapError>;
    async fn vault_query(&self, owner: Address) -> Result<Vec<H256>, SwapError>;
}

/// Per-process store of swap-keyed signature sets, open for the node's
/// lifetime and passed in as a capability rather than reached for as a
/// singleton.
#[async_trait]
pub trait DraftTxService: Send + Sync {
    async fn put_draft(&self, swap_id: H256, draft_tx_bytes: Vec<u8>) -> Result<(), SwapError>;
    async fn get_draft(&self, swap_id: H256) -> Result<Option<Vec<u8>>, SwapError>;

    async fn append_block_signature(
        &self,
        swap_id: H256,
        block_number: u64,
        signature: Signature,
    ) -> Result<(), SwapError>;
    async fn block_signatures(&self, swap_id: H256, block_number: u64) -> Result<Vec<Signature>, SwapError>;

    async fn append_notary_signature(&self, swap_id: H256, signature: Signature) -> Result<(), SwapError>;
    async fn notary_signatures(&self, swap_id: H256) -> Result<Vec<Signature>, SwapError>;
}
