use anchor_lang::error::ERROR_CODE_OFFSET;
use fuzz_helpers::*;
use inheritance_vault::constants::{ENFORCE_INACTIVITY, INACTIVITY_PERIOD, SECONDS_PER_DAY};
use inheritance_vault::error::VaultError;
use inheritance_vault::events::Withdrawal;
use solana_sdk::{pubkey::Pubkey, signature::Signer};

const ONE_SOL: u64 = 1_000_000_000;

fn code(err: VaultError) -> Option<u32> {
    Some(err as u32 + ERROR_CODE_OFFSET)
}

/// Owner, heir and a third actor used as the next heir
async fn deployed() -> (FuzzTestEnv, VaultSetup) {
    setup_complete_environment(3).await.expect("setup")
}

/// Withdraws as `caller` and returns the decoded `Withdrawal` events
async fn withdraw_with_events(
    env: &mut FuzzTestEnv,
    setup: &VaultSetup,
    caller: usize,
    amount: u64,
) -> Vec<Withdrawal> {
    let caller = &setup.actors[caller];
    let ix = withdraw_ix(&env.program_id, &setup.vault, &caller.pubkey(), amount);
    let outcome = send_instruction_with_metadata(&mut env.context, ix, caller)
        .await
        .expect("banks client");

    assert!(outcome.result.is_ok(), "withdraw failed: {:?}", outcome.result);
    let metadata = outcome.metadata.expect("transaction metadata");
    decode_events::<Withdrawal>(&metadata.log_messages)
}

#[tokio::test]
async fn deploy_sets_owner_and_heir() {
    let (mut env, setup) = deployed().await;

    let snapshot = fetch_snapshot(&mut env.context, &env.program_id, &setup.vault)
        .await
        .unwrap();

    assert_eq!(snapshot.owner, setup.founder().pubkey());
    assert_eq!(snapshot.heir, setup.initial_heir().pubkey());
    assert_eq!(snapshot.balance, 0);
    assert_eq!(snapshot.inactivity_period, INACTIVITY_PERIOD);
    assert!(snapshot.last_withdrawal > 0);
    assert!(snapshot.last_withdrawal <= current_time(&mut env.context).await.unwrap());
}

#[tokio::test]
async fn deploy_rejects_invalid_heirs() {
    let mut env = setup_program_test().await;
    let actors = setup_actors(&mut env.context, 1).await.unwrap();
    let owner = &actors[0];
    let (vault, _) = derive_vault_pda(&env.program_id, &owner.pubkey());

    for heir in [owner.pubkey(), Pubkey::default()] {
        let ix = initialize_ix(&env.program_id, &vault, &owner.pubkey(), &heir);
        let err = send_instruction(&mut env.context, ix, owner).await.unwrap_err();
        assert_eq!(custom_error_code(&err), code(VaultError::InvalidHeir));
    }
}

#[tokio::test]
async fn deposit_of_one_lamport_is_stored() {
    let (mut env, setup) = deployed().await;
    let owner = setup.founder();

    let ix = deposit_ix(&env.program_id, &setup.vault, &owner.pubkey(), 1);
    send_instruction(&mut env.context, ix, owner).await.unwrap();

    let snapshot = fetch_snapshot(&mut env.context, &env.program_id, &setup.vault)
        .await
        .unwrap();
    assert_eq!(snapshot.balance, 1);

    let rent = vault_rent_reserve(&mut env.context).await.unwrap();
    assert_eq!(get_lamports(&mut env.context, &setup.vault).await.unwrap(), rent + 1);
}

#[tokio::test]
async fn plain_transfer_counts_as_deposit() {
    let (mut env, setup) = deployed().await;
    let owner = setup.founder();

    transfer_lamports(&mut env.context, owner, &setup.vault, 1)
        .await
        .unwrap();

    let snapshot = fetch_snapshot(&mut env.context, &env.program_id, &setup.vault)
        .await
        .unwrap();
    assert_eq!(snapshot.balance, 1);
}

#[tokio::test]
async fn owner_withdraws_and_emits_withdrawal() {
    let (mut env, setup) = deployed().await;
    let owner = setup.founder().pubkey();

    let ix = deposit_ix(&env.program_id, &setup.vault, &owner, ONE_SOL);
    send_instruction(&mut env.context, ix, setup.founder()).await.unwrap();
    let lamports_before = get_lamports(&mut env.context, &owner).await.unwrap();

    let events = withdraw_with_events(&mut env, &setup, 0, ONE_SOL).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].owner, owner);
    assert_eq!(events[0].amount, ONE_SOL);

    let state = get_vault_state(&mut env.context, &setup.vault).await.unwrap();
    assert_eq!(state.balance, 0);
    assert_eq!(
        get_lamports(&mut env.context, &owner).await.unwrap(),
        lamports_before + ONE_SOL
    );
}

#[tokio::test]
async fn transferred_funds_can_be_withdrawn() {
    let (mut env, setup) = deployed().await;
    let owner = setup.founder();

    transfer_lamports(&mut env.context, owner, &setup.vault, ONE_SOL)
        .await
        .unwrap();

    let events = withdraw_with_events(&mut env, &setup, 0, ONE_SOL).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].amount, ONE_SOL);

    let state = get_vault_state(&mut env.context, &setup.vault).await.unwrap();
    assert_eq!(state.balance, 0);
    let rent = vault_rent_reserve(&mut env.context).await.unwrap();
    assert_eq!(get_lamports(&mut env.context, &setup.vault).await.unwrap(), rent);
}

#[tokio::test]
async fn zero_withdrawal_resets_timer_and_emits() {
    let (mut env, setup) = deployed().await;
    let initial = get_vault_state(&mut env.context, &setup.vault)
        .await
        .unwrap()
        .last_withdrawal;

    let now = advance_clock(&mut env.context, 15 * SECONDS_PER_DAY)
        .await
        .unwrap();
    let events = withdraw_with_events(&mut env, &setup, 0, 0).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].owner, setup.founder().pubkey());
    assert_eq!(events[0].amount, 0);

    let state = get_vault_state(&mut env.context, &setup.vault).await.unwrap();
    assert!(state.last_withdrawal > initial);
    assert!(state.last_withdrawal >= now);
}

#[tokio::test]
async fn stranger_cannot_withdraw() {
    let (mut env, setup) = deployed().await;
    let owner = setup.founder();
    let ix = deposit_ix(&env.program_id, &setup.vault, &owner.pubkey(), ONE_SOL);
    send_instruction(&mut env.context, ix, owner).await.unwrap();
    let before = get_vault_state(&mut env.context, &setup.vault).await.unwrap();

    advance_clock(&mut env.context, SECONDS_PER_DAY).await.unwrap();
    for caller in &setup.actors[1..] {
        let ix = withdraw_ix(&env.program_id, &setup.vault, &caller.pubkey(), 1);
        let err = send_instruction(&mut env.context, ix, caller).await.unwrap_err();
        assert_eq!(custom_error_code(&err), code(VaultError::Unauthorized));
    }

    let after = get_vault_state(&mut env.context, &setup.vault).await.unwrap();
    assert_eq!(after.snapshot(), before.snapshot());
}

#[tokio::test]
async fn overdraw_is_rejected() {
    let (mut env, setup) = deployed().await;
    let owner = setup.founder();

    let ix = withdraw_ix(&env.program_id, &setup.vault, &owner.pubkey(), 1);
    let err = send_instruction(&mut env.context, ix, owner).await.unwrap_err();

    assert_eq!(custom_error_code(&err), code(VaultError::InsufficientFunds));
}

#[tokio::test]
async fn heir_takes_over_after_inactivity() {
    let (mut env, setup) = deployed().await;
    let heir = &setup.actors[1];
    let new_heir = setup.actors[2].pubkey();

    advance_clock(&mut env.context, 32 * SECONDS_PER_DAY).await.unwrap();
    let ix = designate_new_heir_ix(&env.program_id, &setup.vault, &heir.pubkey(), &new_heir);
    send_instruction(&mut env.context, ix, heir).await.unwrap();

    let snapshot = fetch_snapshot(&mut env.context, &env.program_id, &setup.vault)
        .await
        .unwrap();
    assert_eq!(snapshot.owner, heir.pubkey());
    assert_eq!(snapshot.heir, new_heir);

    // The former owner is locked out, the new one is not.
    let former = setup.founder();
    let ix = withdraw_ix(&env.program_id, &setup.vault, &former.pubkey(), 0);
    let err = send_instruction(&mut env.context, ix, former).await.unwrap_err();
    assert_eq!(custom_error_code(&err), code(VaultError::Unauthorized));

    let events = withdraw_with_events(&mut env, &setup, 1, 0).await;
    assert_eq!(events[0].owner, heir.pubkey());
}

#[tokio::test]
async fn heir_waits_for_inactivity_period() {
    let (mut env, setup) = deployed().await;
    let heir = &setup.actors[1];
    let new_heir = setup.actors[2].pubkey();

    advance_clock(&mut env.context, INACTIVITY_PERIOD - 60).await.unwrap();
    let ix = designate_new_heir_ix(&env.program_id, &setup.vault, &heir.pubkey(), &new_heir);
    let outcome = send_instruction(&mut env.context, ix, heir).await;

    let state = get_vault_state(&mut env.context, &setup.vault).await.unwrap();
    if ENFORCE_INACTIVITY {
        assert_eq!(
            custom_error_code(&outcome.unwrap_err()),
            code(VaultError::OwnerStillActive)
        );
        assert_eq!(state.owner, setup.founder().pubkey());
        assert_eq!(state.heir, heir.pubkey());
    } else {
        outcome.unwrap();
        assert_eq!(state.owner, heir.pubkey());
    }
}

#[tokio::test]
async fn non_heir_cannot_designate() {
    let (mut env, setup) = deployed().await;
    let outsider = &setup.actors[2];
    let before = get_vault_state(&mut env.context, &setup.vault).await.unwrap();

    advance_clock(&mut env.context, 32 * SECONDS_PER_DAY).await.unwrap();
    let ix = designate_new_heir_ix(
        &env.program_id,
        &setup.vault,
        &outsider.pubkey(),
        &outsider.pubkey(),
    );
    let err = send_instruction(&mut env.context, ix, outsider).await.unwrap_err();

    assert_eq!(custom_error_code(&err), code(VaultError::Unauthorized));
    let after = get_vault_state(&mut env.context, &setup.vault).await.unwrap();
    assert_eq!(after.snapshot(), before.snapshot());
}

#[tokio::test]
async fn heir_cannot_name_owner_self_or_zero() {
    let (mut env, setup) = deployed().await;
    let heir = &setup.actors[1];
    let before = get_vault_state(&mut env.context, &setup.vault).await.unwrap();

    advance_clock(&mut env.context, 32 * SECONDS_PER_DAY).await.unwrap();
    for candidate in [setup.founder().pubkey(), heir.pubkey(), Pubkey::default()] {
        let ix = designate_new_heir_ix(&env.program_id, &setup.vault, &heir.pubkey(), &candidate);
        let err = send_instruction(&mut env.context, ix, heir).await.unwrap_err();
        assert_eq!(custom_error_code(&err), code(VaultError::InvalidHeir));
    }

    let after = get_vault_state(&mut env.context, &setup.vault).await.unwrap();
    assert_eq!(after.snapshot(), before.snapshot());
}
