use anchor_lang::prelude::*;

use crate::constants::VAULT_SEED;
use crate::instructions::lamports_above_rent;
use crate::state::{Vault, VaultSnapshot};

#[derive(Accounts)]
pub struct Snapshot<'info> {
    #[account(
        seeds = [VAULT_SEED, vault.founder.as_ref()],
        bump = vault.bump,
    )]
    pub vault: Account<'info, Vault>,
}

pub fn handler(ctx: Context<Snapshot>) -> Result<VaultSnapshot> {
    let vault = &ctx.accounts.vault;
    let mut view = vault.snapshot();
    // Report funds sent by plain transfer even though nothing has recorded them yet.
    view.balance = view.balance.max(lamports_above_rent(vault)?);
    Ok(view)
}
