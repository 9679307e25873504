//! The swap coordination state machine (C6).
//!
//! `Idle -> Drafted -> Signed -> RemoteCommitted -> (ProofCollected | Expired)
//! -> (Unlocked | Reverted)`. Each step that performs I/O (remote RPC,
//! notary collection, local ledger commit) is `async` and may suspend;
//! hashing, trie construction and verification run to completion. Guards
//! are checked before a transition is applied; on failure `&mut self` is
//! left untouched so the caller can retry the same transition or fall back
//! to `Revert`.

use crate::assemblers::{threshold_met, ProofAssembler, ProofStrategy};
use crate::capabilities::{BlockHeader, DraftTxService, LocalLedger, RemoteRpc, Signature};
use crate::error::SwapError;
use crate::lock::{DraftTransaction, LockState, SignedDraft};
use crate::proof::{build_receipts_trie, receipt_key, verify_merkle_proof, ProofBundle, UnlockData};
use ethereum_types::{Address, H256};
use swaplock_commitment::{commitment_hash, ClaimOrRevertEvent, EventKind, SwapIntent};
use swaplock_receipt::Receipt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapState {
    Idle,
    Drafted(DraftTransaction),
    Signed(SignedDraft),
    RemoteCommitted(SignedDraft),
    ProofCollected {
        draft: SignedDraft,
        signatures: Vec<Signature>,
        block_header: BlockHeader,
        receipts: Vec<Receipt>,
    },
    Expired(SignedDraft),
    Unlocked { draft: SignedDraft, unlock_tx: H256 },
    Reverted { draft: SignedDraft, revert_tx: H256 },
}

impl SwapState {
    fn name(&self) -> &'static str {
        match self {
            SwapState::Idle => "Idle",
            SwapState::Drafted(_) => "Drafted",
            SwapState::Signed(_) => "Signed",
            SwapState::RemoteCommitted(_) => "RemoteCommitted",
            SwapState::ProofCollected { .. } => "ProofCollected",
            SwapState::Expired(_) => "Expired",
            SwapState::Unlocked { .. } => "Unlocked",
            SwapState::Reverted { .. } => "Reverted",
        }
    }
}

fn invalid(from: &SwapState, event: &'static str) -> SwapError {
    SwapError::InvalidTransition { from: from.name(), event }
}

/// One swap's run of the state machine. Per-swap tasks are serialized by
/// `swap_id`; across swaps there is no ordering.
pub struct Swap {
    pub swap_id: H256,
    pub strategy: ProofStrategy,
    pub state: SwapState,
}

impl Swap {
    /// `Draft`: builds the unsigned local transaction. Guards: the asset
    /// must be owned by the caller, and the threshold must not exceed the
    /// validator set.
    pub async fn draft(
        intent: SwapIntent,
        asset_ref: H256,
        notary: Address,
        approved_validators: Vec<Address>,
        strategy: ProofStrategy,
        caller: Address,
        ledger: &dyn LocalLedger,
    ) -> Result<Self, SwapError> {
        intent.validate().map_err(|err| SwapError::Codec(err.to_string()))?;
        if intent.signatures_threshold as usize > approved_validators.len() {
            return Err(SwapError::Codec(format!(
                "threshold {} exceeds {} approved validators",
                intent.signatures_threshold,
                approved_validators.len()
            )));
        }
        let owned = ledger.vault_query(caller).await?;
        if !owned.contains(&asset_ref) {
            return Err(SwapError::MalformedSwap);
        }

        let swap_id = commitment_hash(&intent);
        let claim_event = ClaimOrRevertEvent::build(&intent, swap_id, EventKind::Claim);
        let lock_state = LockState {
            swap_id,
            owner_party: intent.owner,
            recipient_party: intent.recipient,
            notary,
            approved_validators,
            signatures_threshold: intent.signatures_threshold,
            encoded_event: claim_event.data,
        };
        // The draft tx id is the swap id by construction: both are derived
        // deterministically from the same intent.
        ledger
            .build_draft_swap_tx(swap_id, asset_ref, intent.recipient, lock_state.encoded_event.clone())
            .await?;

        let draft = DraftTransaction { swap_id, intent, asset_ref, lock_state };
        debug!(swap_id = %format_args!("{swap_id:#x}"), "swap drafted");
        Ok(Swap { swap_id, strategy, state: SwapState::Drafted(draft) })
    }

    /// `Sign`: the asset owner signs the draft. Guard: caller is the asset
    /// owner named in the intent.
    pub async fn sign(&mut self, caller: Address, ledger: &dyn LocalLedger) -> Result<(), SwapError> {
        let SwapState::Drafted(draft) = &self.state else {
            return Err(invalid(&self.state, "Sign"));
        };
        if draft.intent.owner != caller {
            return Err(SwapError::MalformedSwap);
        }
        ledger.sign_tx(self.swap_id).await?;
        let SwapState::Drafted(draft) = std::mem::replace(&mut self.state, SwapState::Idle) else {
            unreachable!("state checked above");
        };
        self.state = SwapState::Signed(SignedDraft { draft, owner_signature: Vec::new() });
        info!(swap_id = %format_args!("{:#x}", self.swap_id), "draft signed");
        Ok(())
    }

    /// `RemoteCommitObserved`: implicit, driven by an external watcher
    /// noticing the counterpart's `commit` call land on the remote ledger.
    pub fn observe_remote_commit(&mut self) -> Result<(), SwapError> {
        if !matches!(self.state, SwapState::Signed(_)) {
            return Err(invalid(&self.state, "RemoteCommitObserved"));
        }
        let SwapState::Signed(draft) = std::mem::replace(&mut self.state, SwapState::Idle) else {
            unreachable!("state checked above");
        };
        self.state = SwapState::RemoteCommitted(draft);
        Ok(())
    }

    /// `Timeout`: the swap-level deadline elapsed before proofs could be
    /// collected. Only `Revert` is permitted afterward.
    pub fn timeout(&mut self) -> Result<(), SwapError> {
        if !matches!(self.state, SwapState::Drafted(_) | SwapState::Signed(_) | SwapState::RemoteCommitted(_)) {
            return Err(invalid(&self.state, "Timeout"));
        }
        let draft = match std::mem::replace(&mut self.state, SwapState::Idle) {
            SwapState::Drafted(d) => SignedDraft { draft: d, owner_signature: Vec::new() },
            SwapState::Signed(d) | SwapState::RemoteCommitted(d) => d,
            _ => unreachable!("state checked above"),
        };
        warn!(swap_id = %format_args!("{:#x}", self.swap_id), "swap expired before proof collection");
        self.state = SwapState::Expired(draft);
        Ok(())
    }

    /// `CollectProofs(draft_id, block, mode)`: gathers the signature set
    /// for the chosen strategy, fetches the block header and its receipts,
    /// and asserts the receipts trie reproduces the header's
    /// `receipts_root` — steps 2-5 of the unlock procedure.
    pub async fn collect_proofs(
        &mut self,
        block_number: u64,
        assembler: &dyn ProofAssembler,
        rpc: &dyn RemoteRpc,
        draft_tx_service: &dyn DraftTxService,
    ) -> Result<(), SwapError> {
        if !matches!(self.state, SwapState::Signed(_) | SwapState::RemoteCommitted(_)) {
            return Err(invalid(&self.state, "CollectProofs"));
        }

        let signatures = assembler.collect(self.swap_id, draft_tx_service).await?;
        let block_header = rpc.get_block(block_number).await?;
        let receipts = rpc.get_block_receipts(block_number).await?;

        let (_trie, computed_root) = build_receipts_trie(&receipts)?;
        if computed_root != block_header.receipts_root {
            // Guard failed: leave the swap in its prior state so a retry
            // against a different RPC provider remains possible.
            return Err(SwapError::RootMismatch {
                computed: computed_root,
                expected: block_header.receipts_root,
            });
        }

        let draft = match std::mem::replace(&mut self.state, SwapState::Idle) {
            SwapState::Signed(draft) | SwapState::RemoteCommitted(draft) => draft,
            _ => unreachable!("state checked above"),
        };
        self.state = SwapState::ProofCollected { draft, signatures, block_header, receipts };
        Ok(())
    }

    /// `Unlock(draft_id, block_number, tx_index)`: produces the Merkle
    /// proof for `tx_index`, checks the threshold and the event match, and
    /// submits the local unlock transaction. The local contract
    /// independently re-verifies the root and proof.
    pub async fn unlock(&mut self, tx_index: u64, ledger: &dyn LocalLedger) -> Result<H256, SwapError> {
        self.finish(tx_index, EventKind::Claim, ledger).await
    }

    /// `Revert(draft_id, …)`: symmetric to `Unlock`, proven against the
    /// revert event instead of the claim event.
    pub async fn revert(&mut self, tx_index: u64, ledger: &dyn LocalLedger) -> Result<H256, SwapError> {
        self.finish(tx_index, EventKind::Revert, ledger).await
    }

    async fn finish(&mut self, tx_index: u64, kind: EventKind, ledger: &dyn LocalLedger) -> Result<H256, SwapError> {
        let event_name = if kind == EventKind::Claim { "Unlock" } else { "Revert" };
        // Clone the state's contents up front rather than holding a borrow
        // of `self.state` across the `.await` points below.
        let (draft, signatures, block_header, receipts) = match &self.state {
            SwapState::ProofCollected { draft, signatures, block_header, receipts } => {
                (draft.clone(), signatures.clone(), block_header.clone(), receipts.clone())
            }
            _ => return Err(invalid(&self.state, event_name)),
        };

        threshold_met(
            &signatures,
            &draft.draft.lock_state.approved_validators,
            draft.draft.lock_state.signatures_threshold,
        )?;

        let (trie, computed_root) = build_receipts_trie(&receipts)?;
        if computed_root != block_header.receipts_root {
            return Err(SwapError::RootMismatch {
                computed: computed_root,
                expected: block_header.receipts_root,
            });
        }

        let key = receipt_key(tx_index);
        let unlock_receipt = receipts
            .get(tx_index as usize)
            .cloned()
            .ok_or_else(|| SwapError::Proof(format!("no receipt at tx_index {tx_index}")))?;
        let merkle_proof = trie.get_proof(&key)?;
        let value = unlock_receipt.encode_canonical_to_vec();
        if !verify_merkle_proof(&merkle_proof, computed_root, &key, &value)? {
            return Err(SwapError::Proof(
                "reconstructed proof does not resolve to the claimed receipt".into(),
            ));
        }

        let expected_event = ClaimOrRevertEvent::build(&draft.draft.intent, self.swap_id, kind);
        let matched = unlock_receipt
            .logs
            .iter()
            .any(|log| expected_event.matches(&log.topics, &log.data));
        if !matched {
            return Err(SwapError::Proof(
                "proven receipt's logs do not match the expected event".into(),
            ));
        }

        let bundle = ProofBundle {
            merkle_proof,
            block_signatures: signatures,
            receipts_root: computed_root,
            unlock_receipt,
        };
        let unlock_data: UnlockData = bundle.into();
        let witness = encode_unlock_data(&unlock_data);
        let settlement_tx = ledger.finalize_tx(self.swap_id, witness).await?;

        self.state = match kind {
            EventKind::Claim => SwapState::Unlocked { draft, unlock_tx: settlement_tx },
            EventKind::Revert => SwapState::Reverted { draft, revert_tx: settlement_tx },
        };
        info!(
            swap_id = %format_args!("{:#x}", self.swap_id),
            outcome = ?kind,
            "swap settled on the local ledger"
        );
        Ok(settlement_tx)
    }

    /// Owner recovery after `Expired`: no proof is required, only that the
    /// deadline has actually passed and the caller is the original owner.
    pub async fn revert_after_expiry(&mut self, caller: Address, ledger: &dyn LocalLedger) -> Result<H256, SwapError> {
        let SwapState::Expired(draft) = &self.state else {
            return Err(invalid(&self.state, "Revert"));
        };
        if draft.draft.intent.owner != caller {
            return Err(SwapError::MalformedSwap);
        }
        let revert_tx = ledger.finalize_tx(self.swap_id, Vec::new()).await?;
        let SwapState::Expired(draft) = std::mem::replace(&mut self.state, SwapState::Idle) else {
            unreachable!("state checked above");
        };
        self.state = SwapState::Reverted { draft, revert_tx };
        Ok(revert_tx)
    }
}

fn encode_unlock_data(data: &UnlockData) -> Vec<u8> {
    use swaplock_rlp::{encode::RLPEncode, structs::Encoder};
    let mut buf = Vec::new();
    let sig_bytes: Vec<Vec<u8>> = data
        .signatures
        .iter()
        .map(|sig| {
            let mut bytes = sig.signer.as_bytes().to_vec();
            bytes.extend_from_slice(&sig.bytes);
            bytes
        })
        .collect();
    Encoder::new(&mut buf)
        .encode_field(&data.merkle_proof)
        .encode_field(&sig_bytes)
        .encode_field(&data.receipts_root)
        .encode_field(&data.unlock_receipt.encode_canonical_to_vec())
        .finish();
    buf
}
