use anchor_lang::prelude::*;
use anchor_lang::system_program::{transfer, Transfer};

use crate::constants::VAULT_SEED;
use crate::events::Deposited;
use crate::instructions::sync_balance;
use crate::state::Vault;

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(
        mut,
        seeds = [VAULT_SEED, vault.founder.as_ref()],
        bump = vault.bump,
    )]
    pub vault: Account<'info, Vault>,

    /// Anyone may fund the vault
    #[account(mut)]
    pub depositor: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Deposit>, amount: u64) -> Result<()> {
    sync_balance(&mut ctx.accounts.vault)?;
    let balance = ctx.accounts.vault.credit(amount)?;

    let transfer_accounts = Transfer {
        from: ctx.accounts.depositor.to_account_info(),
        to: ctx.accounts.vault.to_account_info(),
    };

    let cpi_ctx = CpiContext::new(
        ctx.accounts.system_program.to_account_info(),
        transfer_accounts,
    );

    transfer(cpi_ctx, amount)?;

    msg!("Deposit successful!");
    msg!("Deposited: {} lamports", amount);
    msg!("Vault balance: {}", balance);

    emit!(Deposited {
        vault: ctx.accounts.vault.key(),
        depositor: ctx.accounts.depositor.key(),
        amount,
        balance,
    });

    Ok(())
}
