use ethereum_types::{Address, U256};

/// The immutable agreement between the two swap parties.
///
/// `swap_id` (see [`crate::commitment_hash`]) is a pure function of every
/// field here except `protocol_address`: the remote contract is addressed
/// separately from the commitment it is asked to verify.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapIntent {
    pub chain_id: U256,
    pub protocol_address: Address,
    pub owner: Address,
    pub recipient: Address,
    pub amount: U256,
    pub token_id: U256,
    pub token_address: Address,
    pub signatures_threshold: u32,
    pub signers: Vec<Address>,
}

/// Errors that make an intent impossible to commit to.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntentError {
    #[error("signers list must not be empty")]
    NoSigners,
    #[error("threshold {threshold} exceeds signer count {signer_count}")]
    ThresholdExceedsSigners { threshold: u32, signer_count: usize },
    #[error("threshold must be positive")]
    ZeroThreshold,
}

impl SwapIntent {
    pub fn validate(&self) -> Result<(), IntentError> {
        if self.signers.is_empty() {
            return Err(IntentError::NoSigners);
        }
        if self.signatures_threshold == 0 {
            return Err(IntentError::ZeroThreshold);
        }
        if self.signatures_threshold as usize > self.signers.len() {
            return Err(IntentError::ThresholdExceedsSigners {
                threshold: self.signatures_threshold,
                signer_count: self.signers.len(),
            });
        }
        Ok(())
    }
}
