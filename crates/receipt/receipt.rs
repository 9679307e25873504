//! Deterministic encoding of remote transaction receipts.
//!
//! Matches the remote ledger's canonical receipt form byte-for-byte so that
//! the patricia trie built over a block's receipts (see `swaplock-trie`)
//! reproduces the block header's `receipts_root` exactly.

mod error;
mod log;
mod tx_type;

pub use error::ReceiptError;
pub use log::Log;
pub use tx_type::TxType;

use ethereum_types::Bloom;
use swaplock_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};

/// Result of a remote transaction, post-Byzantium style (status flag rather
/// than an intermediate post-state root).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_type: TxType,
    pub succeeded: bool,
    pub cumulative_gas_used: u64,
    pub bloom: Bloom,
    pub logs: Vec<Log>,
}

impl Receipt {
    pub fn new(tx_type: TxType, succeeded: bool, cumulative_gas_used: u64, logs: Vec<Log>) -> Self {
        Self {
            tx_type,
            succeeded,
            cumulative_gas_used,
            bloom: bloom_from_logs(&logs),
            logs,
        }
    }

    /// Encodes the receipt exactly as it must appear as a trie leaf value:
    /// `tx_type || RLP(receipt)` for typed transactions, or bare `RLP(receipt)`
    /// for legacy ones.
    pub fn encode_canonical_to_vec(&self) -> Vec<u8> {
        self.encode_to_vec()
    }
}

fn bloom_from_logs(logs: &[Log]) -> Bloom {
    use ethereum_types::BloomInput;
    let mut bloom = Bloom::zero();
    for log in logs {
        bloom.accrue(BloomInput::Raw(log.address.as_ref()));
        for topic in log.topics.iter() {
            bloom.accrue(BloomInput::Raw(topic.as_ref()));
        }
    }
    bloom
}

impl RLPEncode for Receipt {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        match self.tx_type {
            TxType::Legacy => {}
            other => buf.put_u8(other as u8),
        }
        Encoder::new(buf)
            .encode_field(&self.succeeded)
            .encode_field(&self.cumulative_gas_used)
            .encode_field(&self.bloom)
            .encode_field(&self.logs)
            .finish();
    }
}

impl RLPDecode for Receipt {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        // A legacy receipt's RLP starts with a list prefix (>= 0xc0); any
        // byte below that is a typed-transaction discriminant.
        let (tx_type, rlp) = match rlp.first() {
            Some(byte) if *byte < 0xc0 => match TxType::from_byte(*byte) {
                Some(ty) => (ty, &rlp[1..]),
                None => {
                    return Err(RLPDecodeError::Custom(format!(
                        "Invalid transaction type: {byte}"
                    )))
                }
            },
            _ => (TxType::Legacy, rlp),
        };
        let decoder = Decoder::new(rlp)?;
        let (succeeded, decoder) = decoder.decode_field("succeeded")?;
        let (cumulative_gas_used, decoder) = decoder.decode_field("cumulative_gas_used")?;
        let (bloom, decoder) = decoder.decode_field("bloom")?;
        let (logs, decoder) = decoder.decode_field("logs")?;
        let receipt = Receipt {
            tx_type,
            succeeded,
            cumulative_gas_used,
            bloom,
            logs,
        };
        Ok((receipt, decoder.finish()?))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bytes::Bytes;
    use ethereum_types::{Address, H256};

    fn sample_log() -> Log {
        Log {
            address: Address::from_low_u64_be(0xA11CE),
            topics: vec![H256::from_low_u64_be(1), H256::from_low_u64_be(2)],
            data: Bytes::from_static(b"swap-claim"),
        }
    }

    #[test]
    fn legacy_receipt_round_trips() {
        let receipt = Receipt::new(TxType::Legacy, true, 21_000, vec![sample_log()]);
        let encoded = receipt.encode_to_vec();
        assert_eq!(encoded[0] & 0xf0, 0xc0, "legacy receipts start with a list prefix");
        let (decoded, rest) = Receipt::decode_unfinished(&encoded).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, receipt);
    }

    #[test]
    fn typed_receipt_prepends_type_byte() {
        let receipt = Receipt::new(TxType::EIP1559, true, 42_000, vec![sample_log()]);
        let encoded = receipt.encode_to_vec();
        assert_eq!(encoded[0], TxType::EIP1559 as u8);
        let (decoded, rest) = Receipt::decode_unfinished(&encoded).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, receipt);
    }

    #[test]
    fn failed_receipt_carries_succeeded_false() {
        let receipt = Receipt::new(TxType::Legacy, false, 0, vec![]);
        let (decoded, _) = Receipt::decode_unfinished(&receipt.encode_to_vec()).unwrap();
        assert!(!decoded.succeeded);
    }

    #[test]
    fn bloom_accrues_log_addresses_and_topics() {
        let log = sample_log();
        let receipt = Receipt::new(TxType::Legacy, true, 1, vec![log.clone()]);
        assert!(receipt.bloom.contains_input(ethereum_types::BloomInput::Raw(
            log.address.as_ref()
        )));
    }
}
