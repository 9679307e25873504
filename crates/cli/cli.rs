//! Demonstration wiring for the swap coordination core: drives a single
//! swap end to end against in-process capability stand-ins. There is no
//! real remote RPC or local ledger to connect to outside of this exercise,
//! so the capabilities constructed here are illustrative rather than
//! production implementations — see `swaplock-swap`'s own test doubles for
//! the versions exercised by the scenario tests.

mod capabilities;

use clap::Parser;
use ethereum_types::{Address, U256};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use capabilities::{InProcessLedger, InProcessRpc, InProcessDraftTxService};
use swaplock_swap::assemblers::BlockSignaturesAssembler;
use swaplock_swap::{ProofStrategy, Swap, SwapIntent};

#[derive(Parser)]
#[command(name = "swaplock-cli", author, version, about = "Drives a demonstration cross-ledger swap to completion")]
struct Options {
    /// Remote-ledger RPC endpoint; unused by the in-process stand-in but
    /// accepted so the wiring matches a real deployment's surface.
    #[arg(long, env = "SWAPLOCK_RPC_URL", default_value = "http://localhost:8545")]
    rpc_url: String,

    /// Poll interval while waiting on signature collection.
    #[arg(long, env = "SWAPLOCK_POLL_INTERVAL_MS", default_value_t = 200)]
    poll_interval_ms: u64,

    /// Swap-level deadline; exceeding it without proofs collected moves the
    /// swap to `Expired`.
    #[arg(long, env = "SWAPLOCK_DEADLINE_SECS", default_value_t = 300)]
    deadline_secs: u64,

    /// `tracing_subscriber::EnvFilter` default directive, overridden by
    /// `RUST_LOG` when set.
    #[arg(long, env = "SWAPLOCK_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let options = Options::parse();

    let log_filter = EnvFilter::builder()
        .with_default_directive(options.log_level.parse().expect("invalid --log-level directive"))
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder().with_env_filter(log_filter).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(rpc_url = %options.rpc_url, deadline_secs = options.deadline_secs, "starting demonstration swap");

    let ledger = InProcessLedger::default();
    let rpc = InProcessRpc::default();
    let draft_tx_service = InProcessDraftTxService::default();

    let bob = Address::from_low_u64_be(0xB0B);
    let alice = Address::from_low_u64_be(0xA11CE);
    let charlie = Address::from_low_u64_be(0xC4A121E);

    let asset_ref = ledger.issue_asset(bob).await;
    let intent = SwapIntent {
        chain_id: U256::from(1337),
        protocol_address: Address::from_low_u64_be(0xC0FFEE),
        owner: bob,
        recipient: alice,
        amount: U256::from(1),
        token_id: U256::zero(),
        token_address: Address::from_low_u64_be(0x601D),
        signatures_threshold: 2,
        signers: vec![charlie, bob],
    };

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
    .expect("draft");
    info!(swap_id = %format_args!("{:#x}", swap.swap_id), "swap drafted");

    swap.sign(bob, &ledger).await.expect("sign");
    swap.observe_remote_commit().expect("remote commit observed");

    let block_number = rpc.seed_block_proving_claim(&intent, swap.swap_id).await;
    draft_tx_service.seed_block_signatures(swap.swap_id, block_number, &[charlie, bob]).await;

    tokio::time::sleep(Duration::from_millis(options.poll_interval_ms)).await;

    let assembler = BlockSignaturesAssembler { block_number };
    swap.collect_proofs(block_number, &assembler, &rpc, &draft_tx_service)
        .await
        .expect("collect proofs");
    info!("proofs collected, receipts root verified");

    let unlock_tx = swap.unlock(0, &ledger).await.expect("unlock");
    info!(unlock_tx = %format_args!("{unlock_tx:#x}"), "swap unlocked, asset transferred to recipient");
}
