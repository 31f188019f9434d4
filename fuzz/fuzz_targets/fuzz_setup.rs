use anchor_lang::error::Error as AnchorError;
use anchor_lang::solana_program::program_stubs::{set_syscall_stubs, SyscallStubs};
use anchor_lang::AccountDeserialize;
use anchor_lang::AnchorDeserialize;
use anchor_lang::Discriminator;
use anchor_lang::Event;
use anchor_lang::InstructionData;
use anchor_lang::ToAccountMetas;
use base64::{prelude::BASE64_STANDARD, Engine};
use inheritance_vault::state::{Vault, VaultSnapshot};
use solana_program_test::*;
use solana_sdk::{
    account_info::AccountInfo,
    clock::Clock,
    entrypoint::ProgramResult,
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};
use std::sync::Once;

// Re-export for convenience
pub use solana_program_test::{BanksClientError, BanksTransactionResultWithMetadata, ProgramTestContext};

// Custom error type for fuzzing
pub type FuzzResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Lamports given to every actor so deposits never run dry mid-sequence.
pub const ACTOR_FUNDING: u64 = 100_000_000_000; // 100 SOL

/// Test environment with program loaded
pub struct FuzzTestEnv {
    pub program_id: Pubkey,
    pub context: ProgramTestContext,
}

/// The deployed vault and the identities that interact with it.
/// `actors[0]` deployed the vault, `actors[1]` is the initial heir.
pub struct VaultSetup {
    pub vault: Pubkey,
    pub actors: Vec<Keypair>,
}

impl VaultSetup {
    pub fn founder(&self) -> &Keypair {
        &self.actors[0]
    }

    pub fn initial_heir(&self) -> &Keypair {
        &self.actors[1]
    }
}

// ============================================================================
// Core Setup Functions
// ============================================================================

/// Runs the Anchor entrypoint as a builtin, so no SBF build is needed.
fn process_instruction<'a>(
    program_id: &Pubkey,
    accounts: &[AccountInfo<'a>],
    data: &[u8],
) -> ProgramResult {
    // Anchor ties the slice lifetime to the account lifetime.
    let accounts: &'a [AccountInfo<'a>] = Box::leak(accounts.to_vec().into_boxed_slice());
    inheritance_vault::entry(program_id, accounts, data)
}

/// Builtin programs send `sol_log_data` to stdout. This wrapper writes it to
/// the program log instead, so `emit!` events show up in transaction metadata.
struct EventLogStubs(Box<dyn SyscallStubs>);

impl SyscallStubs for EventLogStubs {
    fn sol_log(&self, message: &str) {
        self.0.sol_log(message)
    }
    fn sol_log_compute_units(&self) {
        self.0.sol_log_compute_units()
    }
    fn sol_remaining_compute_units(&self) -> u64 {
        self.0.sol_remaining_compute_units()
    }
    fn sol_invoke_signed(
        &self,
        instruction: &Instruction,
        account_infos: &[AccountInfo],
        signers_seeds: &[&[&[u8]]],
    ) -> ProgramResult {
        self.0.sol_invoke_signed(instruction, account_infos, signers_seeds)
    }
    fn sol_get_sysvar(&self, sysvar_id_addr: *const u8, var_addr: *mut u8, offset: u64, length: u64) -> u64 {
        self.0.sol_get_sysvar(sysvar_id_addr, var_addr, offset, length)
    }
    fn sol_get_clock_sysvar(&self, var_addr: *mut u8) -> u64 {
        self.0.sol_get_clock_sysvar(var_addr)
    }
    fn sol_get_epoch_schedule_sysvar(&self, var_addr: *mut u8) -> u64 {
        self.0.sol_get_epoch_schedule_sysvar(var_addr)
    }
    fn sol_get_fees_sysvar(&self, var_addr: *mut u8) -> u64 {
        self.0.sol_get_fees_sysvar(var_addr)
    }
    fn sol_get_rent_sysvar(&self, var_addr: *mut u8) -> u64 {
        self.0.sol_get_rent_sysvar(var_addr)
    }
    fn sol_get_epoch_rewards_sysvar(&self, var_addr: *mut u8) -> u64 {
        self.0.sol_get_epoch_rewards_sysvar(var_addr)
    }
    fn sol_get_last_restart_slot(&self, var_addr: *mut u8) -> u64 {
        self.0.sol_get_last_restart_slot(var_addr)
    }
    fn sol_get_epoch_stake(&self, vote_address: *const u8) -> u64 {
        self.0.sol_get_epoch_stake(vote_address)
    }
    unsafe fn sol_memcpy(&self, dst: *mut u8, src: *const u8, n: usize) {
        self.0.sol_memcpy(dst, src, n)
    }
    unsafe fn sol_memmove(&self, dst: *mut u8, src: *const u8, n: usize) {
        self.0.sol_memmove(dst, src, n)
    }
    unsafe fn sol_memcmp(&self, s1: *const u8, s2: *const u8, n: usize, result: *mut i32) {
        self.0.sol_memcmp(s1, s2, n, result)
    }
    unsafe fn sol_memset(&self, s: *mut u8, c: u8, n: usize) {
        self.0.sol_memset(s, c, n)
    }
    fn sol_get_return_data(&self) -> Option<(Pubkey, Vec<u8>)> {
        self.0.sol_get_return_data()
    }
    fn sol_set_return_data(&self, data: &[u8]) {
        self.0.sol_set_return_data(data)
    }
    fn sol_log_data(&self, fields: &[&[u8]]) {
        let encoded: Vec<String> = fields.iter().map(|field| BASE64_STANDARD.encode(field)).collect();
        self.0.sol_log(&format!("Program data: {}", encoded.join(" ")));
    }
    fn sol_get_processed_sibling_instruction(&self, index: usize) -> Option<Instruction> {
        self.0.sol_get_processed_sibling_instruction(index)
    }
    fn sol_get_stack_height(&self) -> u64 {
        self.0.sol_get_stack_height()
    }
}

/// Creates the program test environment with the vault program loaded
pub async fn setup_program_test() -> FuzzTestEnv {
    let program_id = inheritance_vault::id();
    let program_test = ProgramTest::new("inheritance_vault", program_id, processor!(process_instruction));

    // Starting the first bank installs the runtime's stubs; wrap them once afterwards.
    let context = program_test.start_with_context().await;

    static EVENT_LOGS: Once = Once::new();
    EVENT_LOGS.call_once(|| {
        let runtime_stubs = set_syscall_stubs(Box::new(EventLogStubs(Box::new(NoStubs))));
        set_syscall_stubs(Box::new(EventLogStubs(runtime_stubs)));
    });

    FuzzTestEnv {
        program_id,
        context,
    }
}

/// Placeholder held only while the runtime's stubs are being swapped out.
struct NoStubs;

impl SyscallStubs for NoStubs {}

/// Moves lamports from the test payer to `recipient`
pub async fn fund_account(
    context: &mut ProgramTestContext,
    recipient: &Pubkey,
    lamports: u64,
) -> FuzzResult<()> {
    let ix = solana_sdk::system_instruction::transfer(&context.payer.pubkey(), recipient, lamports);

    let tx = Transaction::new_signed_with_payer(
        &[ix],
        Some(&context.payer.pubkey()),
        &[&context.payer],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(())
}

/// Creates and funds `count` actors
pub async fn setup_actors(context: &mut ProgramTestContext, count: usize) -> FuzzResult<Vec<Keypair>> {
    let mut actors = Vec::with_capacity(count);
    for _ in 0..count {
        let actor = Keypair::new();
        fund_account(context, &actor.pubkey(), ACTOR_FUNDING).await?;
        actors.push(actor);
    }
    Ok(actors)
}

/// Deploys a vault owned by `owner` naming `heir` as successor
pub async fn setup_vault(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    owner: &Keypair,
    heir: &Pubkey,
) -> FuzzResult<Pubkey> {
    let (vault, _) = derive_vault_pda(program_id, &owner.pubkey());

    let ix = initialize_ix(program_id, &vault, &owner.pubkey(), heir);
    send_instruction(context, ix, owner).await?;

    Ok(vault)
}

/// Sets up everything: program + funded actors + a vault deployed by the first actor
pub async fn setup_complete_environment(actor_count: usize) -> FuzzResult<(FuzzTestEnv, VaultSetup)> {
    let mut env = setup_program_test().await;

    let actors = setup_actors(&mut env.context, actor_count.max(2)).await?;

    let vault = setup_vault(
        &mut env.context,
        &env.program_id,
        &actors[0],
        &actors[1].pubkey(),
    )
    .await?;

    Ok((env, VaultSetup { vault, actors }))
}

// ============================================================================
// Instruction Builders
// ============================================================================

pub fn initialize_ix(program_id: &Pubkey, vault: &Pubkey, owner: &Pubkey, heir: &Pubkey) -> Instruction {
    let accounts = inheritance_vault::accounts::Initialize {
        vault: *vault,
        owner: *owner,
        system_program: solana_sdk::system_program::ID,
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: inheritance_vault::instruction::Initialize { heir: *heir }.data(),
    }
}

pub fn deposit_ix(program_id: &Pubkey, vault: &Pubkey, depositor: &Pubkey, amount: u64) -> Instruction {
    let accounts = inheritance_vault::accounts::Deposit {
        vault: *vault,
        depositor: *depositor,
        system_program: solana_sdk::system_program::ID,
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: inheritance_vault::instruction::Deposit { amount }.data(),
    }
}

pub fn withdraw_ix(program_id: &Pubkey, vault: &Pubkey, owner: &Pubkey, amount: u64) -> Instruction {
    let accounts = inheritance_vault::accounts::Withdraw {
        vault: *vault,
        owner: *owner,
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: inheritance_vault::instruction::Withdraw { amount }.data(),
    }
}

pub fn snapshot_ix(program_id: &Pubkey, vault: &Pubkey) -> Instruction {
    let accounts = inheritance_vault::accounts::Snapshot { vault: *vault };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: inheritance_vault::instruction::Snapshot {}.data(),
    }
}

pub fn designate_new_heir_ix(
    program_id: &Pubkey,
    vault: &Pubkey,
    heir: &Pubkey,
    new_heir: &Pubkey,
) -> Instruction {
    let accounts = inheritance_vault::accounts::DesignateNewHeir {
        vault: *vault,
        heir: *heir,
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: inheritance_vault::instruction::DesignateNewHeir { new_heir: *new_heir }.data(),
    }
}

// ============================================================================
// Execution Helpers
// ============================================================================

/// Sends a single instruction signed by `signer`, with the test payer covering fees.
/// A fresh blockhash is fetched first so identical instructions can be replayed.
pub async fn send_instruction(
    context: &mut ProgramTestContext,
    ix: Instruction,
    signer: &Keypair,
) -> std::result::Result<(), BanksClientError> {
    context.last_blockhash = context.get_new_latest_blockhash().await?;

    let tx = Transaction::new_signed_with_payer(
        &[ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, signer],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await
}

/// Like `send_instruction`, but keeps the logs and return data of the transaction.
/// The transaction result sits in the returned `result` field.
pub async fn send_instruction_with_metadata(
    context: &mut ProgramTestContext,
    ix: Instruction,
    signer: &Keypair,
) -> std::result::Result<BanksTransactionResultWithMetadata, BanksClientError> {
    context.last_blockhash = context.get_new_latest_blockhash().await?;

    let tx = Transaction::new_signed_with_payer(
        &[ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, signer],
        context.last_blockhash,
    );

    context.banks_client.process_transaction_with_metadata(tx).await
}

/// Sends lamports straight to `recipient` with the system program, bypassing the vault
pub async fn transfer_lamports(
    context: &mut ProgramTestContext,
    sender: &Keypair,
    recipient: &Pubkey,
    lamports: u64,
) -> std::result::Result<(), BanksClientError> {
    let ix = solana_sdk::system_instruction::transfer(&sender.pubkey(), recipient, lamports);
    send_instruction(context, ix, sender).await
}

/// Runs the `snapshot` instruction and decodes its return data
pub async fn fetch_snapshot(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    vault: &Pubkey,
) -> FuzzResult<VaultSnapshot> {
    context.last_blockhash = context.get_new_latest_blockhash().await?;
    let tx = Transaction::new_signed_with_payer(
        &[snapshot_ix(program_id, vault)],
        Some(&context.payer.pubkey()),
        &[&context.payer],
        context.last_blockhash,
    );

    let outcome = context.banks_client.process_transaction_with_metadata(tx).await?;
    outcome.result?;

    let return_data = outcome
        .metadata
        .and_then(|metadata| metadata.return_data)
        .ok_or("Snapshot returned no data")?;
    if return_data.program_id != *program_id {
        return Err("Snapshot return data came from another program".into());
    }

    Ok(VaultSnapshot::try_from_slice(&return_data.data)?)
}

/// Decodes every `E` event found in `Program data:` log lines
pub fn decode_events<E: Event>(logs: &[String]) -> Vec<E> {
    logs.iter()
        .filter_map(|line| line.split_once("Program data: ").map(|(_, data)| data))
        .filter_map(|data| BASE64_STANDARD.decode(data.trim()).ok())
        .filter(|bytes| bytes.starts_with(E::DISCRIMINATOR))
        .filter_map(|bytes| E::try_from_slice(&bytes[E::DISCRIMINATOR.len()..]).ok())
        .collect()
}

/// Moves the clock sysvar forward by `seconds`
pub async fn advance_clock(context: &mut ProgramTestContext, seconds: i64) -> FuzzResult<i64> {
    let mut clock: Clock = context.banks_client.get_sysvar().await?;
    clock.unix_timestamp = clock.unix_timestamp.saturating_add(seconds);
    context.set_sysvar(&clock);
    Ok(clock.unix_timestamp)
}

/// Current clock reading as seen by the program
pub async fn current_time(context: &mut ProgramTestContext) -> FuzzResult<i64> {
    let clock: Clock = context.banks_client.get_sysvar().await?;
    Ok(clock.unix_timestamp)
}

/// Extracts the custom program error code from a failed transaction
pub fn custom_error_code(err: &BanksClientError) -> Option<u32> {
    let tx_error = match err {
        BanksClientError::TransactionError(tx_error) => tx_error,
        BanksClientError::SimulationError { err, .. } => err,
        _ => return None,
    };

    match tx_error {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => Some(*code),
        _ => None,
    }
}

/// Error code carried by an off-chain state machine rejection
pub fn anchor_error_code(err: &AnchorError) -> Option<u32> {
    match err {
        AnchorError::AnchorError(err) => Some(err.error_code_number),
        AnchorError::ProgramError(_) => None,
    }
}

// ============================================================================
// PDA Derivation Helpers
// ============================================================================

/// Derive vault PDA for the signer that deployed it
pub fn derive_vault_pda(program_id: &Pubkey, founder: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[inheritance_vault::VAULT_SEED, founder.as_ref()], program_id)
}

// ============================================================================
// Account State Verification Helpers
// ============================================================================

/// Fetch and return vault state
pub async fn get_vault_state(context: &mut ProgramTestContext, vault: &Pubkey) -> FuzzResult<Vault> {
    let account = context
        .banks_client
        .get_account(*vault)
        .await?
        .ok_or("Vault account not found")?;

    let vault_data = Vault::try_deserialize(&mut account.data.as_ref())?;
    Ok(vault_data)
}

/// Get the lamports held by any account
pub async fn get_lamports(context: &mut ProgramTestContext, account: &Pubkey) -> FuzzResult<u64> {
    let balance = context.banks_client.get_balance(*account).await?;
    Ok(balance)
}

/// Rent-exempt reserve of a vault account, which is never withdrawable
pub async fn vault_rent_reserve(context: &mut ProgramTestContext) -> FuzzResult<u64> {
    let rent = context.banks_client.get_rent().await?;
    Ok(rent.minimum_balance(Vault::LEN))
}
