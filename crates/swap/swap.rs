//! Cross-ledger atomic swap coordination core.
//!
//! Couples a time-locked local commitment to cryptographic proofs of
//! remote-ledger events so two parties can exchange assets held on
//! opposite ledgers without a trusted intermediary. See
//! [`state_machine::Swap`] for the orchestrating state machine and
//! [`proof`]/[`assemblers`] for the two proof-collection strategies it
//! drives.

pub mod assemblers;
pub mod capabilities;
pub mod error;
pub mod lock;
pub mod proof;
pub mod state_machine;

pub use assemblers::ProofStrategy;
pub use capabilities::{BlockHeader, DraftTxService, LocalLedger, RemoteRpc, Signature};
pub use error::SwapError;
pub use lock::{DraftTransaction, LockState, SignedDraft};
pub use proof::{ProofBundle, UnlockData};
pub use state_machine::{Swap, SwapState};

pub use swaplock_commitment::{commitment_hash, EventKind, SwapIntent};
