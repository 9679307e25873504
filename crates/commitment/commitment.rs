//! Commitment hashing (C5) and expected remote event construction (C4).
//!
//! The swap id is the keccak-256 hash of the ABI-encoded intent tuple,
//! computed identically here and by the remote contract so both sides
//! agree on the swap's handle without exchanging it out of band.

pub mod abi;
mod event;
mod intent;

pub use event::{ClaimOrRevertEvent, EventKind};
pub use intent::{IntentError, SwapIntent};

use abi::{encode_address, encode_address_array_tail, encode_uint256, WORD_SIZE};
use ethereum_types::{H256, U256};
use sha3::{Digest, Keccak256};

/// Number of head words in the commitment tuple before the dynamic
/// `address[] signers` tail: chain_id, owner, recipient, amount, token_id,
/// token_address, threshold, signers-offset.
const COMMITMENT_HEAD_WORDS: usize = 8;

/// ABI-encodes the commitment tuple
/// `(chain_id, owner, recipient, amount, token_id, token_address, threshold, signers[])`
/// per the remote ledger's standard: static fields head-packed, the
/// dynamic `address[]` appended after an offset word.
pub fn encode_commitment(intent: &SwapIntent) -> Vec<u8> {
    let mut out = Vec::with_capacity(WORD_SIZE * COMMITMENT_HEAD_WORDS);
    out.extend_from_slice(&encode_uint256(intent.chain_id));
    out.extend_from_slice(&encode_address(intent.owner));
    out.extend_from_slice(&encode_address(intent.recipient));
    out.extend_from_slice(&encode_uint256(intent.amount));
    out.extend_from_slice(&encode_uint256(intent.token_id));
    out.extend_from_slice(&encode_address(intent.token_address));
    out.extend_from_slice(&encode_uint256(U256::from(intent.signatures_threshold)));
    let offset = U256::from(COMMITMENT_HEAD_WORDS * WORD_SIZE);
    out.extend_from_slice(&encode_uint256(offset));
    out.extend_from_slice(&encode_address_array_tail(&intent.signers));
    out
}

/// Computes the swap id: `keccak256(ABI.encode(intent))`. Deterministic and
/// collision-free across distinct intents, and bit-exactly reproducible by
/// the remote contract's own hash of the same tuple.
pub fn commitment_hash(intent: &SwapIntent) -> H256 {
    let encoded = encode_commitment(intent);
    H256::from_slice(Keccak256::new_with_prefix(&encoded).finalize().as_slice())
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
    fn commitment_hash_is_deterministic() {
        let intent = sample_intent();
        assert_eq!(commitment_hash(&intent), commitment_hash(&intent));
    }

    #[test]
    fn distinct_intents_do_not_collide() {
        let a = sample_intent();
        let mut b = sample_intent();
        b.amount = U256::from(2);
        assert_ne!(commitment_hash(&a), commitment_hash(&b));
    }

    #[test]
    fn protocol_address_is_not_part_of_the_commitment() {
        let a = sample_intent();
        let mut b = sample_intent();
        b.protocol_address = Address::from_low_u64_be(0xdead);
        assert_eq!(commitment_hash(&a), commitment_hash(&b));
    }

    #[test]
    fn encoded_commitment_lays_out_head_then_dynamic_tail() {
        let intent = sample_intent();
        let encoded = encode_commitment(&intent);
        assert_eq!(encoded.len(), WORD_SIZE * (COMMITMENT_HEAD_WORDS + 1 + 1));
        let offset_word = &encoded[WORD_SIZE * 7..WORD_SIZE * 8];
        assert_eq!(
            U256::from_big_endian(offset_word),
            U256::from(COMMITMENT_HEAD_WORDS * WORD_SIZE)
        );
    }
}
