use ethereum_types::{Address, H256};
use swaplock_commitment::SwapIntent;

/// The local output that encapsulates a swap on the local ledger. Consumed
/// by exactly one of `unlock` or `revert` — the local ledger's UTXO model
/// enforces this at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockState {
    pub swap_id: H256,
    pub owner_party: Address,
    pub recipient_party: Address,
    pub notary: Address,
    /// Local parties authorized to sign proofs (oracles or notaries,
    /// depending on the chosen [`crate::assemblers::ProofStrategy`]).
    pub approved_validators: Vec<Address>,
    pub signatures_threshold: u32,
    /// ABI-encoded event expectation this lock state was drafted against.
    pub encoded_event: Vec<u8>,
}

/// Unsigned local transaction that consumes the asset input and produces
/// `{lock state, asset output transferred to recipient}`. Its hash, by
/// construction, equals the swap id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftTransaction {
    pub swap_id: H256,
    pub intent: SwapIntent,
    pub asset_ref: H256,
    pub lock_state: LockState,
}

/// A draft transaction carrying the owner's signature; still unnotarized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDraft {
    pub draft: DraftTransaction,
    pub owner_signature: Vec<u8>,
}
