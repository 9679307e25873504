//! Canonical Recursive Length Prefix (RLP) encoding and decoding.
//!
//! Implements the encoding scheme used by the remote ledger to serialize
//! integers, byte strings and nested lists into a single canonical byte
//! representation. Used throughout the swap core to encode receipts,
//! trie nodes and trie paths in a form that is bit-exact with the remote
//! ledger's own encoding.

pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod structs;
