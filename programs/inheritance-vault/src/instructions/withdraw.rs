use anchor_lang::prelude::*;

use crate::constants::VAULT_SEED;
use crate::events::Withdrawal;
use crate::instructions::sync_balance;
use crate::state::Vault;

#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(
        mut,
        seeds = [VAULT_SEED, vault.founder.as_ref()],
        bump = vault.bump,
    )]
    pub vault: Account<'info, Vault>,

    /// Must match the vault owner; checked by the vault itself
    #[account(mut)]
    pub owner: Signer<'info>,
}

pub fn handler(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let owner = ctx.accounts.owner.key();

    sync_balance(&mut ctx.accounts.vault)?;
    ctx.accounts.vault.debit(&owner, amount, now)?;

    // The vault is program-owned, so lamports move without a system CPI.
    if amount > 0 {
        ctx.accounts.vault.sub_lamports(amount)?;
        ctx.accounts.owner.add_lamports(amount)?;
    }

    msg!("Withdrawal successful!");
    msg!("Withdrawn: {} lamports", amount);
    msg!("Remaining vault balance: {}", ctx.accounts.vault.balance);
    msg!("Inactivity timer reset to {}", ctx.accounts.vault.last_withdrawal);

    emit!(Withdrawal { owner, amount });

    Ok(())
}
