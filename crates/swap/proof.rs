//! Merkle proof construction and verification over a block's receipts trie
//! (C2 + C3 feeding the unlock path), and the tx-index key convention the
//! receipts trie is keyed by.

use crate::capabilities::Signature;
use crate::error::SwapError;
use ethereum_types::H256;
use swaplock_receipt::Receipt;
use swaplock_rlp::encode::RLPEncode;
use swaplock_trie::{InMemoryTrieDB, NodeRLP, Trie};

/// The key a receipt is stored under: `RLP(tx_index)` — the integer value,
/// not a hex string, so leading zeros are stripped the way RLP integer
/// encoding always strips them.
pub fn receipt_key(tx_index: u64) -> Vec<u8> {
    tx_index.encode_to_vec()
}

/// Builds the receipts trie fresh (never shared across unlocks) and returns
/// its root hash alongside the trie itself so a proof can still be pulled.
pub fn build_receipts_trie(receipts: &[Receipt]) -> Result<(Trie, H256), SwapError> {
    let mut trie = Trie::new(Box::new(InMemoryTrieDB::new_empty()));
    for (tx_index, receipt) in receipts.iter().enumerate() {
        trie.insert(receipt_key(tx_index as u64), receipt.encode_canonical_to_vec())?;
    }
    let root = trie.hash()?;
    Ok((trie, root))
}

/// The witness accompanying an unlock or revert: the trie nodes on the path
/// to the target receipt, the signature set authorizing the claim, the
/// root they were both produced against, and the receipt itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofBundle {
    pub merkle_proof: Vec<NodeRLP>,
    pub block_signatures: Vec<Signature>,
    pub receipts_root: H256,
    pub unlock_receipt: Receipt,
}

/// What actually gets submitted to the local unlock transaction; the local
/// contract independently re-verifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockData {
    pub merkle_proof: Vec<NodeRLP>,
    pub signatures: Vec<Signature>,
    pub receipts_root: H256,
    pub unlock_receipt: Receipt,
}

impl From<ProofBundle> for UnlockData {
    fn from(bundle: ProofBundle) -> Self {
        UnlockData {
            merkle_proof: bundle.merkle_proof,
            signatures: bundle.block_signatures,
            receipts_root: bundle.receipts_root,
            unlock_receipt: bundle.unlock_receipt,
        }
    }
}

/// Reconstructs a trie from the proof's node bytes and checks that `key`
/// resolves to `value` under `expected_root`. Fails with `ErrProof` on a
/// missing node, reference mismatch, or path divergence; the caller turns a
/// root mismatch found independently (step 5 of unlock) into `ErrRootMismatch`
/// before ever reaching this check.
pub fn verify_merkle_proof(
    proof_nodes: &[NodeRLP],
    expected_root: H256,
    key: &[u8],
    value: &[u8],
) -> Result<bool, SwapError> {
    let Some((root_node, other_nodes)) = proof_nodes.split_first() else {
        return Ok(false);
    };
    let trie = Trie::from_nodes(Some(root_node), other_nodes)?;
    if trie.hash_no_commit() != expected_root {
        return Ok(false);
    }
    Ok(trie.get(&key.to_vec())?.as_deref() == Some(value))
}

#[cfg(test)]
mod test {
    use super::*;
    use swaplock_receipt::TxType;

    fn receipts() -> Vec<Receipt> {
        vec![
            Receipt::new(TxType::Legacy, true, 21_000, vec![]),
            Receipt::new(TxType::EIP1559, true, 43_000, vec![]),
            Receipt::new(TxType::Legacy, false, 21_000, vec![]),
        ]
    }

    #[test]
    fn proof_for_each_receipt_verifies_against_the_root() {
        let rs = receipts();
        let (trie, root) = build_receipts_trie(&rs).unwrap();
        for (idx, receipt) in rs.iter().enumerate() {
            let key = receipt_key(idx as u64);
            let proof = trie.get_proof(&key).unwrap();
            assert!(verify_merkle_proof(&proof, root, &key, &receipt.encode_canonical_to_vec()).unwrap());
        }
    }

    #[test]
    fn proof_fails_against_a_tampered_root() {
        let rs = receipts();
        let (trie, _root) = build_receipts_trie(&rs).unwrap();
        let key = receipt_key(0);
        let proof = trie.get_proof(&key).unwrap();
        let wrong_root = H256::repeat_byte(0xAB);
        assert!(!verify_merkle_proof(&proof, wrong_root, &key, &rs[0].encode_canonical_to_vec()).unwrap());
    }

    #[test]
    fn tx_index_key_strips_leading_zeros() {
        assert_eq!(receipt_key(0), vec![0x80]);
        assert_eq!(receipt_key(127), vec![0x7F]);
        assert_eq!(receipt_key(128), vec![0x81, 0x80]);
    }
}
