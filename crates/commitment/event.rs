//! Builds the remote event a proof must match.
//!
//! The swap id is not known at intent-construction time (it is the hash of
//! the intent itself), so the encoder is exposed in curried form:
//! `build(swap_id)` rather than eagerly computed on `SwapIntent`.

use crate::abi::{encode_address, encode_uint256};
use crate::intent::SwapIntent;
use ethereum_types::{Address, H256, U256};
use sha3::{Digest, Keccak256};

/// Canonical function signature hashed to produce the event topic.
pub const CLAIM_OR_REVERT_SIGNATURE: &str =
    "ClaimOrRevert(bytes32,address,address,uint256,uint256,address)";

lazy_static::lazy_static! {
    /// `keccak256("ClaimOrRevert(bytes32,address,address,uint256,uint256,address)")`
    pub static ref CLAIM_OR_REVERT_TOPIC: H256 = H256::from_slice(
        Keccak256::new_with_prefix(CLAIM_OR_REVERT_SIGNATURE.as_bytes())
            .finalize()
            .as_slice(),
    );
}

/// Which terminal transition a proof is being assembled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Asset moves from owner to recipient on the remote ledger.
    Claim,
    /// Asset returns to owner on the remote ledger.
    Revert,
}

/// The expected remote event payload for a swap, curried over the swap id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOrRevertEvent {
    pub kind: EventKind,
    pub topics: Vec<H256>,
    pub data: Vec<u8>,
}

impl ClaimOrRevertEvent {
    /// `build(swap_id)`: produces the event expectation for `kind`, given an
    /// intent and the previously-computed swap id.
    pub fn build(intent: &SwapIntent, swap_id: H256, kind: EventKind) -> Self {
        let beneficiary = match kind {
            EventKind::Claim => intent.recipient,
            EventKind::Revert => intent.owner,
        };
        let topics = vec![*CLAIM_OR_REVERT_TOPIC, swap_id];
        let data = encode_event_data(beneficiary, intent.amount, intent.token_id, intent.token_address);
        Self { kind, topics, data }
    }

    /// Whether a proven receipt log matches this expectation: same topics,
    /// in order, and identical ABI-encoded data.
    pub fn matches(&self, log_topics: &[H256], log_data: &[u8]) -> bool {
        log_topics == self.topics.as_slice() && log_data == self.data.as_slice()
    }
}

fn encode_event_data(beneficiary: Address, amount: U256, token_id: U256, token_address: Address) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 * 4);
    out.extend_from_slice(&encode_address(beneficiary));
    out.extend_from_slice(&encode_uint256(amount));
    out.extend_from_slice(&encode_uint256(token_id));
    out.extend_from_slice(&encode_address(token_address));
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use ethereum_types::Address;

    fn sample_intent() -> SwapIntent {
        SwapIntent {
            chain_id: U256::from(1337),
            protocol_address: Address::from_low_u64_be(0xC0FFEE),
            owner: Address::from_low_u64_be(0xA11CE),
            recipient: Address::from_low_u64_be(0xB0B),
            amount: U256::from(1),
            token_id: U256::zero(),
            token_address: Address::from_low_u64_be(0x601D),
            signatures_threshold: 1,
            signers: vec![Address::from_low_u64_be(0xC4A121E)],
        }
    }

    #[test]
    fn topics_one_is_always_the_swap_id() {
        let intent = sample_intent();
        let swap_id = H256::from_low_u64_be(42);
        let event = ClaimOrRevertEvent::build(&intent, swap_id, EventKind::Claim);
        assert_eq!(event.topics[0], *CLAIM_OR_REVERT_TOPIC);
        assert_eq!(event.topics[1], swap_id);
    }

    #[test]
    fn claim_and_revert_differ_only_in_beneficiary() {
        let intent = sample_intent();
        let swap_id = H256::from_low_u64_be(42);
        let claim = ClaimOrRevertEvent::build(&intent, swap_id, EventKind::Claim);
        let revert = ClaimOrRevertEvent::build(&intent, swap_id, EventKind::Revert);
        assert_ne!(claim.data, revert.data);
        assert_eq!(claim.topics, revert.topics);
    }

    #[test]
    fn matches_is_order_and_value_sensitive() {
        let intent = sample_intent();
        let swap_id = H256::from_low_u64_be(42);
        let event = ClaimOrRevertEvent::build(&intent, swap_id, EventKind::Claim);
        assert!(event.matches(&event.topics, &event.data));
        assert!(!event.matches(&[swap_id, event.topics[0]], &event.data));
    }
}
