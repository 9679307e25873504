//! Minimal ABI word-packing, scoped to what the commitment tuple and event
//! payloads need: static `uint256`/`address` head words plus one trailing
//! dynamic `address[]`. Not a general ABI codec.

use ethereum_types::{Address, U256};

pub const WORD_SIZE: usize = 32;

pub fn encode_uint256(value: U256) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    value.to_big_endian(&mut word);
    word
}

pub fn encode_address(address: Address) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Encodes a dynamic `address[]` tail: `offset` is written by the caller into
/// the head; this returns the `[length, elements...]` body that the offset
/// points at.
pub fn encode_address_array_tail(addresses: &[Address]) -> Vec<u8> {
    let mut out = Vec::with_capacity(WORD_SIZE * (1 + addresses.len()));
    out.extend_from_slice(&encode_uint256(U256::from(addresses.len())));
    for address in addresses {
        out.extend_from_slice(&encode_address(*address));
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn uint256_head_packs_big_endian() {
        let word = encode_uint256(U256::from(1));
        assert_eq!(word[31], 1);
        assert!(word[..31].iter().all(|b| *b == 0));
    }

    #[test]
    fn address_is_right_aligned_in_its_word() {
        let addr = Address::from_low_u64_be(0xdead_beef);
        let word = encode_address(addr);
        assert_eq!(&word[12..], addr.as_bytes());
        assert!(word[..12].iter().all(|b| *b == 0));
    }

    #[test]
    fn address_array_tail_prefixes_length() {
        let addrs = vec![Address::from_low_u64_be(1), Address::from_low_u64_be(2)];
        let tail = encode_address_array_tail(&addrs);
        assert_eq!(tail.len(), WORD_SIZE * 3);
        assert_eq!(tail[31], 2);
    }
}
