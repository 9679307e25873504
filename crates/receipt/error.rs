use swaplock_rlp::error::RLPDecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error(transparent)]
    RLPDecode(#[from] RLPDecodeError),
    #[error("Invalid transaction type byte: {0}")]
    InvalidTxType(u8),
}
