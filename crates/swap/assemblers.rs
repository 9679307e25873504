//! Proof assembly strategies (C7): two ways to gather the signature set an
//! unlock needs, sharing one verification interface so the state machine
//! never special-cases which was chosen.

use crate::capabilities::{DraftTxService, Signature};
use crate::error::SwapError;
use async_trait::async_trait;
use ethereum_types::H256;
use sha3::{Digest, Keccak256};
use std::collections::HashSet;

/// Which proof strategy a swap uses, fixed at draft time by the intent
/// (who needs to act where). Both satisfy the same threshold invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofStrategy {
    /// Oracles sign `keccak(receipts_root || block_number)`; the local
    /// contract checks their signatures against the receipts trie itself.
    BlockSignatures,
    /// Local notaries sign the draft transaction in a form the remote
    /// contract accepts via `claim_with_signatures`.
    NotarizationSignatures,
}

/// Canonical block identifier signed by oracles under the block-signatures
/// strategy.
pub fn block_signing_payload(receipts_root: H256, block_number: u64) -> [u8; 32] {
    Keccak256::new_with_prefix(receipts_root.as_bytes())
        .chain_update(block_number.to_be_bytes())
        .finalize()
        .into()
}

/// Fixed byte layout notaries sign under the notarization-signatures
/// strategy, and that the remote contract's `claim_with_signatures` entry
/// point accepts: `swap_id || notary_pubkey || signature`.
pub fn notarization_payload(swap_id: H256, notary_signature: &Signature) -> Vec<u8> {
    let mut payload = Vec::with_capacity(32 + 20 + notary_signature.bytes.len());
    payload.extend_from_slice(swap_id.as_bytes());
    payload.extend_from_slice(notary_signature.signer.as_bytes());
    payload.extend_from_slice(&notary_signature.bytes);
    payload
}

/// Shared verification surface for both strategies: has the threshold been
/// reached by distinct approved signers?
#[async_trait]
pub trait ProofAssembler {
    async fn collect(
        &self,
        swap_id: H256,
        service: &dyn DraftTxService,
    ) -> Result<Vec<Signature>, SwapError>;
}

pub struct BlockSignaturesAssembler {
    pub block_number: u64,
}

#[async_trait]
impl ProofAssembler for BlockSignaturesAssembler {
    async fn collect(
        &self,
        swap_id: H256,
        service: &dyn DraftTxService,
    ) -> Result<Vec<Signature>, SwapError> {
        service.block_signatures(swap_id, self.block_number).await
    }
}

pub struct NotarizationSignaturesAssembler;

#[async_trait]
impl ProofAssembler for NotarizationSignaturesAssembler {
    async fn collect(
        &self,
        swap_id: H256,
        service: &dyn DraftTxService,
    ) -> Result<Vec<Signature>, SwapError> {
        service.notary_signatures(swap_id).await
    }
}

/// Counts distinct approved signers among `signatures`, ignoring
/// duplicates, and checks the result against `threshold`. Signature
/// ordering is irrelevant; only distinct validator identity is counted.
pub fn threshold_met(
    signatures: &[Signature],
    approved_validators: &[ethereum_types::Address],
    threshold: u32,
) -> Result<(), SwapError> {
    let approved: HashSet<_> = approved_validators.iter().copied().collect();
    let distinct_valid: HashSet<_> = signatures
        .iter()
        .filter(|sig| approved.contains(&sig.signer))
        .map(|sig| sig.signer)
        .collect();
    if distinct_valid.len() >= threshold as usize {
        Ok(())
    } else {
        Err(SwapError::Threshold {
            have: distinct_valid.len(),
            need: threshold as usize,
        })
    }
}
