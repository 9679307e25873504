//! End-to-end swap scenarios against the in-memory capability doubles.

mod common;

use common::{MockDraftTxService, MockLedger, MockRemoteRpc};
use ethereum_types::{Address, U256};
use swaplock_receipt::{Log, Receipt, TxType};
use swaplock_swap::assemblers::{
    block_signing_payload, notarization_payload, BlockSignaturesAssembler, NotarizationSignaturesAssembler,
};
use swaplock_swap::capabilities::Signature;
use swaplock_swap::proof::build_receipts_trie;
use swaplock_swap::{
    commitment_hash, BlockHeader, DraftTxService, EventKind, LocalLedger, ProofStrategy, RemoteRpc, Swap, SwapError,
    SwapIntent, SwapState,
};
use swaplock_commitment::ClaimOrRevertEvent;

fn intent(owner: Address, recipient: Address, signers: Vec<Address>, threshold: u32) -> SwapIntent {
    SwapIntent {
        chain_id: U256::from(1337),
        protocol_address: Address::from_low_u64_be(0xC0FFEE),
        owner,
        recipient,
        amount: U256::from(1),
        token_id: U256::zero(),
        token_address: Address::from_low_u64_be(0x601D),
        signatures_threshold: threshold,
        signers,
    }
}

/// Builds a one-transaction block whose sole receipt carries the expected
/// claim (or revert) event, and whose header's `receipts_root` matches the
/// receipts trie built over it.
fn block_proving_event(intent: &SwapIntent, swap_id: ethereum_types::H256, kind: EventKind) -> (BlockHeader, Vec<Receipt>) {
    let event = ClaimOrRevertEvent::build(intent, swap_id, kind);
    let log = Log {
        address: intent.protocol_address,
        topics: event.topics,
        data: event.data.into(),
    };
    let receipts = vec![Receipt::new(TxType::Legacy, true, 21_000, vec![log])];
    let (_trie, root) = build_receipts_trie(&receipts).unwrap();
    let header = BlockHeader { number: 10, hash: ethereum_types::H256::from_low_u64_be(10), receipts_root: root };
    (header, receipts)
}

#[test]
fn s1_commitment_hash_is_deterministic_and_independent_of_call_site() {
    let intent = intent(
        Address::from_low_u64_be(0xA11CE),
        Address::from_low_u64_be(0xB0B),
        vec![Address::from_low_u64_be(0xC4A121E)],
        1,
    );
    let a = commitment_hash(&intent);
    let b = commitment_hash(&intent);
    assert_eq!(a, b, "the same intent must hash to the same swap id every time");
}

#[tokio::test]
async fn s2_bob_claims_via_block_signatures() {
    let ledger = MockLedger::default();
    let rpc = MockRemoteRpc::default();
    let draft_tx_service = MockDraftTxService::default();

    let bob = Address::from_low_u64_be(0xB0B);
    let alice = Address::from_low_u64_be(0xA11CE);
    let charlie = Address::from_low_u64_be(0xC4A121E);

    let asset_ref = ledger.issue_asset(bob, U256::from(1)).await.unwrap();
    let intent = intent(bob, alice, vec![charlie, bob], 2);

    let mut swap = Swap::draft(
        intent.clone(),
        asset_ref,
        Address::from_low_u64_be(0x270A12),
        vec![charlie, bob],
        ProofStrategy::BlockSignatures,
        bob,
        &ledger,
    )
    .await
    .unwrap();

    swap.sign(bob, &ledger).await.unwrap();
    swap.observe_remote_commit().unwrap();

    let (header, receipts) = block_proving_event(&intent, swap.swap_id, EventKind::Claim);
    rpc.register_block(10, header, receipts);

    draft_tx_service
        .append_block_signature(swap.swap_id, 10, Signature { signer: charlie, bytes: vec![0xAA] })
        .await
        .unwrap();
    draft_tx_service
        .append_block_signature(swap.swap_id, 10, Signature { signer: bob, bytes: vec![0xBB] })
        .await
        .unwrap();

    let assembler = BlockSignaturesAssembler { block_number: 10 };
    swap.collect_proofs(10, &assembler, &rpc, &draft_tx_service).await.unwrap();
    assert!(matches!(swap.state, SwapState::ProofCollected { .. }));

    swap.unlock(0, &ledger).await.unwrap();
    assert!(matches!(swap.state, SwapState::Unlocked { .. }));
    assert!(!ledger.owns(bob, asset_ref), "Bob's vault must no longer see the swapped asset");
    assert!(ledger.owns(alice, asset_ref), "ownership transfers to Alice on unlock");
}

#[tokio::test]
async fn s3_alice_driving_the_same_unlock_still_succeeds() {
    // Neither CollectProofs nor Unlock is gated on caller identity (only
    // Sign is), so the party that drives the final steps doesn't matter —
    // the transfer to Alice happens either way.
    let ledger = MockLedger::default();
    let rpc = MockRemoteRpc::default();
    let draft_tx_service = MockDraftTxService::default();

    let bob = Address::from_low_u64_be(0xB0B);
    let alice = Address::from_low_u64_be(0xA11CE);
    let charlie = Address::from_low_u64_be(0xC4A121E);

    let asset_ref = ledger.issue_asset(bob, U256::from(1)).await.unwrap();
    let intent = intent(bob, alice, vec![charlie, bob], 2);

    let mut swap = Swap::draft(
        intent.clone(),
        asset_ref,
        Address::from_low_u64_be(0x270A12),
        vec![charlie, bob],
        ProofStrategy::BlockSignatures,
        bob,
        &ledger,
    )
    .await
    .unwrap();
    swap.sign(bob, &ledger).await.unwrap();
    swap.observe_remote_commit().unwrap();

    let (header, receipts) = block_proving_event(&intent, swap.swap_id, EventKind::Claim);
    rpc.register_block(10, header, receipts);
    draft_tx_service
        .append_block_signature(swap.swap_id, 10, Signature { signer: charlie, bytes: vec![0xAA] })
        .await
        .unwrap();
    draft_tx_service
        .append_block_signature(swap.swap_id, 10, Signature { signer: bob, bytes: vec![0xBB] })
        .await
        .unwrap();

    // Alice (not Bob) drives collection and unlock from here on.
    let assembler = BlockSignaturesAssembler { block_number: 10 };
    swap.collect_proofs(10, &assembler, &rpc, &draft_tx_service).await.unwrap();
    swap.unlock(0, &ledger).await.unwrap();

    assert!(ledger.owns(alice, asset_ref));
}

#[tokio::test]
async fn s4_notary_signatures_path() {
    let ledger = MockLedger::default();
    let rpc = MockRemoteRpc::default();
    let draft_tx_service = MockDraftTxService::default();

    let bob = Address::from_low_u64_be(0xB0B);
    let alice = Address::from_low_u64_be(0xA11CE);
    let charlie = Address::from_low_u64_be(0xC4A121E);

    let asset_ref = ledger.issue_asset(bob, U256::from(1)).await.unwrap();
    let intent = intent(bob, alice, vec![charlie, bob], 2);

    let mut swap = Swap::draft(
        intent.clone(),
        asset_ref,
        Address::from_low_u64_be(0x270A12),
        vec![charlie, bob],
        ProofStrategy::NotarizationSignatures,
        bob,
        &ledger,
    )
    .await
    .unwrap();
    swap.sign(bob, &ledger).await.unwrap();

    draft_tx_service
        .append_notary_signature(swap.swap_id, Signature { signer: charlie, bytes: vec![0x01] })
        .await
        .unwrap();
    draft_tx_service
        .append_notary_signature(swap.swap_id, Signature { signer: bob, bytes: vec![0x02] })
        .await
        .unwrap();

    let notary_sigs = draft_tx_service.notary_signatures(swap.swap_id).await.unwrap();
    assert_eq!(notary_sigs.len(), 2);
    // Fixed byte layout the remote contract's claim_with_signatures expects.
    let payload = notarization_payload(swap.swap_id, &notary_sigs[0]);
    assert_eq!(&payload[..32], swap.swap_id.as_bytes());
    assert_eq!(&payload[32..52], notary_sigs[0].signer.as_bytes());

    let claim_calldata = payload.clone();
    let tx_hash = rpc.send_transaction(intent.protocol_address, claim_calldata, U256::zero()).await.unwrap();
    assert_ne!(tx_hash, ethereum_types::H256::zero());

    swap.observe_remote_commit().unwrap();
    let (header, receipts) = block_proving_event(&intent, swap.swap_id, EventKind::Claim);
    rpc.register_block(11, header, receipts);

    let assembler = NotarizationSignaturesAssembler;
    swap.collect_proofs(11, &assembler, &rpc, &draft_tx_service).await.unwrap();
    swap.unlock(0, &ledger).await.unwrap();
    assert!(ledger.owns(alice, asset_ref));
}

#[tokio::test]
async fn s5_insufficient_signatures_blocks_unlock_but_leaves_lock_intact() {
    let ledger = MockLedger::default();
    let rpc = MockRemoteRpc::default();
    let draft_tx_service = MockDraftTxService::default();

    let bob = Address::from_low_u64_be(0xB0B);
    let alice = Address::from_low_u64_be(0xA11CE);
    let charlie = Address::from_low_u64_be(0xC4A121E);

    let asset_ref = ledger.issue_asset(bob, U256::from(1)).await.unwrap();
    let intent = intent(bob, alice, vec![charlie, bob], 2);

    let mut swap = Swap::draft(
        intent.clone(),
        asset_ref,
        Address::from_low_u64_be(0x270A12),
        vec![charlie, bob],
        ProofStrategy::BlockSignatures,
        bob,
        &ledger,
    )
    .await
    .unwrap();
    swap.sign(bob, &ledger).await.unwrap();
    swap.observe_remote_commit().unwrap();

    let (header, receipts) = block_proving_event(&intent, swap.swap_id, EventKind::Claim);
    rpc.register_block(10, header, receipts);
    // Only one of the two required signatures is collected.
    draft_tx_service
        .append_block_signature(swap.swap_id, 10, Signature { signer: charlie, bytes: vec![0xAA] })
        .await
        .unwrap();

    let assembler = BlockSignaturesAssembler { block_number: 10 };
    swap.collect_proofs(10, &assembler, &rpc, &draft_tx_service).await.unwrap();

    let err = swap.unlock(0, &ledger).await.unwrap_err();
    assert!(matches!(err, SwapError::Threshold { have: 1, need: 2 }));
    assert!(matches!(swap.state, SwapState::ProofCollected { .. }), "lock remains intact after a failed unlock");
    assert!(ledger.owns(bob, asset_ref));
}

#[tokio::test]
async fn s6_receipts_root_mismatch_is_rejected_before_any_state_change() {
    let ledger = MockLedger::default();
    let rpc = MockRemoteRpc::default();
    let draft_tx_service = MockDraftTxService::default();

    let bob = Address::from_low_u64_be(0xB0B);
    let alice = Address::from_low_u64_be(0xA11CE);
    let charlie = Address::from_low_u64_be(0xC4A121E);

    let asset_ref = ledger.issue_asset(bob, U256::from(1)).await.unwrap();
    let intent = intent(bob, alice, vec![charlie, bob], 1);

    let mut swap = Swap::draft(
        intent.clone(),
        asset_ref,
        Address::from_low_u64_be(0x270A12),
        vec![charlie, bob],
        ProofStrategy::BlockSignatures,
        bob,
        &ledger,
    )
    .await
    .unwrap();
    swap.sign(bob, &ledger).await.unwrap();
    swap.observe_remote_commit().unwrap();

    let (mut header, receipts) = block_proving_event(&intent, swap.swap_id, EventKind::Claim);
    header.receipts_root = ethereum_types::H256::repeat_byte(0xEE); // corrupted by the RPC provider
    rpc.register_block(10, header, receipts);

    let assembler = BlockSignaturesAssembler { block_number: 10 };
    let err = swap.collect_proofs(10, &assembler, &rpc, &draft_tx_service).await.unwrap_err();
    assert!(matches!(err, SwapError::RootMismatch { .. }));
    assert!(matches!(swap.state, SwapState::RemoteCommitted(_)), "state unchanged after a root mismatch");
}

#[test]
fn block_signing_payload_binds_block_number_into_the_signed_hash() {
    let root = ethereum_types::H256::repeat_byte(0x11);
    let a = block_signing_payload(root, 10);
    let b = block_signing_payload(root, 11);
    assert_ne!(a, b);
}
