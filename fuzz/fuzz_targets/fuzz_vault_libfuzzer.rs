#![no_main]

use arbitrary::Arbitrary;
use fuzz_helpers::*;
use inheritance_vault::constants::SECONDS_PER_DAY;
use inheritance_vault::state::Vault;
use libfuzzer_sys::fuzz_target;
use solana_sdk::{pubkey::Pubkey, signature::Signer};

/// Number of keypairs the fuzzer can pick callers and heirs from
const ACTOR_COUNT: usize = 4;

/// Longest operation sequence run per iteration
const MAX_OPS: usize = 16;

/// One externally driven call against the vault
#[derive(Debug, Clone, Arbitrary)]
enum VaultOp {
    Deposit { depositor: u8, amount: u32 },
    Transfer { sender: u8, amount: u32 },
    Withdraw { caller: u8, amount: u32 },
    DesignateNewHeir { caller: u8, new_heir: HeirChoice },
    AdvanceClock { days: u8, seconds: u16 },
}

#[derive(Debug, Clone, Arbitrary)]
enum HeirChoice {
    Actor(u8),
    Zero,
}

#[derive(Debug, Clone, Arbitrary)]
struct VaultFuzzInput {
    ops: Vec<VaultOp>,
}

/// Running totals used to check balance conservation. Bare transfers
/// count as deposits.
#[derive(Debug, Default)]
struct Ledger {
    deposited: u64,
    withdrawn: u64,
}

impl Ledger {
    fn held(&self) -> u64 {
        self.deposited - self.withdrawn
    }
}

fn actor(setup: &VaultSetup, index: u8) -> &solana_sdk::signature::Keypair {
    &setup.actors[index as usize % setup.actors.len()]
}

/// Execute a single fuzz iteration: replay the op sequence on-chain and
/// against the in-memory state machine, and require both to agree.
async fn fuzz_vault_once(input: VaultFuzzInput) -> Result<(), Box<dyn std::error::Error>> {
    let (mut env, setup) = match setup_complete_environment(ACTOR_COUNT).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Setup failed: {}", e);
            return Ok(()); // Skip this iteration if setup fails
        }
    };

    let rent_reserve = vault_rent_reserve(&mut env.context).await?;
    let mut model: Vault = get_vault_state(&mut env.context, &setup.vault).await?;
    let mut ledger = Ledger::default();

    assert_eq!(model.owner, setup.founder().pubkey());
    assert_eq!(model.heir, setup.initial_heir().pubkey());

    for op in input.ops.into_iter().take(MAX_OPS) {
        let now = current_time(&mut env.context).await?;
        let before = model.snapshot();

        // Every handler first records lamports that arrived outside `deposit`.
        let pristine = model.clone();
        let vault_lamports = get_lamports(&mut env.context, &setup.vault).await?;
        model.absorb_unrecorded(vault_lamports.saturating_sub(rent_reserve));

        let (expected, outcome) = match &op {
            VaultOp::AdvanceClock { days, seconds } => {
                let delta = i64::from(*days) * SECONDS_PER_DAY + i64::from(*seconds);
                advance_clock(&mut env.context, delta).await?;
                model = pristine;
                continue;
            }
            VaultOp::Transfer { sender, amount } => {
                let sender = actor(&setup, *sender);
                let amount = u64::from(*amount);
                if transfer_lamports(&mut env.context, sender, &setup.vault, amount)
                    .await
                    .is_ok()
                {
                    ledger.deposited += amount;
                }
                model = pristine;
                continue;
            }
            VaultOp::Deposit { depositor, amount } => {
                let depositor = actor(&setup, *depositor);
                let amount = u64::from(*amount);
                let expected = model.credit(amount).map(|_| ());
                let ix = deposit_ix(&env.program_id, &setup.vault, &depositor.pubkey(), amount);
                let outcome = send_instruction(&mut env.context, ix, depositor).await;
                if outcome.is_ok() {
                    ledger.deposited += amount;
                }
                (expected, outcome)
            }
            VaultOp::Withdraw { caller, amount } => {
                let caller = actor(&setup, *caller);
                let amount = u64::from(*amount);
                let lamports_before = get_lamports(&mut env.context, &caller.pubkey()).await?;
                let expected = model.debit(&caller.pubkey(), amount, now);
                let ix = withdraw_ix(&env.program_id, &setup.vault, &caller.pubkey(), amount);
                let outcome = send_instruction(&mut env.context, ix, caller).await;
                if outcome.is_ok() {
                    ledger.withdrawn += amount;

                    // Fees are paid by the test payer, so the owner receives exactly `amount`.
                    let lamports_after = get_lamports(&mut env.context, &caller.pubkey()).await?;
                    assert_eq!(
                        lamports_after,
                        lamports_before + amount,
                        "Owner should receive exactly the withdrawn amount"
                    );
                }
                (expected, outcome)
            }
            VaultOp::DesignateNewHeir { caller, new_heir } => {
                let caller = actor(&setup, *caller);
                let new_heir = match new_heir {
                    HeirChoice::Actor(index) => actor(&setup, *index).pubkey(),
                    HeirChoice::Zero => Pubkey::default(),
                };
                let expected = model
                    .designate_new_heir(&caller.pubkey(), new_heir, now)
                    .map(|_| ());
                let ix = designate_new_heir_ix(&env.program_id, &setup.vault, &caller.pubkey(), &new_heir);
                let outcome = send_instruction(&mut env.context, ix, caller).await;
                (expected, outcome)
            }
        };

        // ========================================
        // DIFFERENTIAL CHECK
        // ========================================

        match (&expected, &outcome) {
            (Ok(()), Ok(())) => {}
            (Err(model_err), Err(chain_err)) => {
                assert_eq!(
                    anchor_error_code(model_err),
                    custom_error_code(chain_err),
                    "Program and state machine rejected {:?} for different reasons: {} vs {:?}",
                    op,
                    model_err,
                    chain_err
                );
            }
            _ => panic!(
                "Program and state machine disagree on {:?}: model={:?} chain={:?}",
                op,
                expected.as_ref().err(),
                outcome.as_ref().err()
            ),
        }

        // A rejected transaction also rolls back the absorbed lamports.
        if outcome.is_err() {
            model = pristine;
        }

        let chain = get_vault_state(&mut env.context, &setup.vault).await?;
        assert_eq!(chain.snapshot(), model.snapshot(), "Vault state diverged after {:?}", op);

        // ========================================
        // INVARIANT CHECKS
        // ========================================

        // INVARIANT 1: OWNERSHIP INTEGRITY
        assert_ne!(chain.owner, chain.heir, "Owner and heir collapsed into one identity");
        assert_ne!(chain.heir, Pubkey::default(), "Heir became the zero address");

        // INVARIANT 2: BALANCE CONSERVATION
        let vault_lamports = get_lamports(&mut env.context, &setup.vault).await?;
        assert_eq!(
            vault_lamports,
            rent_reserve + ledger.held(),
            "Vault lamports should equal rent reserve plus deposits minus withdrawals"
        );
        if outcome.is_ok() {
            assert_eq!(chain.balance, ledger.held(), "Balance should include every lamport received");
        } else {
            assert!(chain.balance <= ledger.held(), "Balance exceeds lamports held");
        }

        // INVARIANT 3: TIMER
        assert!(
            chain.last_withdrawal >= before.last_withdrawal,
            "Inactivity timer moved backwards"
        );
        if matches!(op, VaultOp::Withdraw { .. }) && outcome.is_ok() {
            assert_eq!(chain.last_withdrawal, now.max(before.last_withdrawal));
        } else {
            assert_eq!(chain.last_withdrawal, before.last_withdrawal);
        }

        // INVARIANT 4: REJECTIONS ARE ALL-OR-NOTHING
        if outcome.is_err() {
            assert_eq!(chain.snapshot(), before, "Rejected {:?} mutated the vault", op);
        }

        println!("✓ PASS {:?} -> {}", op, if outcome.is_ok() { "ok" } else { "rejected" });
    }

    Ok(())
}

fuzz_target!(|input: VaultFuzzInput| {
    // Run the async fuzz test
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        if let Err(e) = fuzz_vault_once(input).await {
            eprintln!("Fuzz iteration failed: {}", e);
        }
    });
});
