use anchor_lang::prelude::*;

use crate::constants::{INACTIVITY_PERIOD, VAULT_SEED};
use crate::events::VaultOpened;
use crate::state::Vault;

#[derive(Accounts)]
pub struct Initialize<'info> {
    /// The vault record, which also custodies the deposited lamports
    #[account(
        init,
        payer = owner,
        space = Vault::LEN,
        seeds = [VAULT_SEED, owner.key().as_ref()],
        bump
    )]
    pub vault: Account<'info, Vault>,

    /// The deploying signer, who becomes the first owner
    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Initialize>, heir: Pubkey) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let owner = ctx.accounts.owner.key();
    let vault = &mut ctx.accounts.vault;

    vault.open(owner, heir, now, INACTIVITY_PERIOD, ctx.bumps.vault)?;

    msg!("Vault initialized successfully!");
    msg!("Vault: {}", vault.key());
    msg!("Owner: {}", vault.owner);
    msg!("Heir: {}", vault.heir);
    msg!("Inactivity period: {} seconds", vault.inactivity_period);

    emit!(VaultOpened {
        vault: vault.key(),
        owner: vault.owner,
        heir: vault.heir,
        last_withdrawal: vault.last_withdrawal,
    });

    Ok(())
}
