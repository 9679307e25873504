use ethereum_types::H256;
use swaplock_rlp::error::{RLPDecodeError, RLPEncodeError};
use swaplock_trie::TrieError;
use thiserror::Error;

/// Every failure the swap core can surface. Verification errors abort the
/// current transition and leave the swap in its prior state so alternative
/// paths (chiefly `Revert`) remain open; remote/network errors are retried
/// by the caller up to its own deadline.
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("malformed RLP or ABI bytes: {0}")]
    Codec(String),

    #[error("merkle proof verification failed: {0}")]
    Proof(String),

    #[error("computed receipts root {computed} does not match block header root {expected}")]
    RootMismatch { computed: H256, expected: H256 },

    #[error("insufficient valid signatures: have {have}, need {need}")]
    Threshold { have: usize, need: usize },

    #[error("local transaction does not contain exactly one lock output and one asset output")]
    MalformedSwap,

    #[error("remote RPC error: {0}")]
    Remote(String),

    #[error("swap {0:#x} is past its deadline; only Revert is permitted")]
    Expired(H256),

    #[error("transition not permitted from state {from} via {event}")]
    InvalidTransition { from: &'static str, event: &'static str },
}

impl From<RLPDecodeError> for SwapError {
    fn from(err: RLPDecodeError) -> Self {
        SwapError::Codec(err.to_string())
    }
}

impl From<RLPEncodeError> for SwapError {
    fn from(err: RLPEncodeError) -> Self {
        SwapError::Codec(err.to_string())
    }
}

impl From<TrieError> for SwapError {
    fn from(err: TrieError) -> Self {
        SwapError::Proof(err.to_string())
    }
}
