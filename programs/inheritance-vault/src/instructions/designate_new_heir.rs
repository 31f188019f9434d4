use anchor_lang::prelude::*;

use crate::constants::VAULT_SEED;
use crate::events::HeirDesignated;
use crate::instructions::sync_balance;
use crate::state::Vault;

#[derive(Accounts)]
pub struct DesignateNewHeir<'info> {
    #[account(
        mut,
        seeds = [VAULT_SEED, vault.founder.as_ref()],
        bump = vault.bump,
    )]
    pub vault: Account<'info, Vault>,

    /// Must match the vault heir; checked by the vault itself
    pub heir: Signer<'info>,
}

pub fn handler(ctx: Context<DesignateNewHeir>, new_heir: Pubkey) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let caller = ctx.accounts.heir.key();
    sync_balance(&mut ctx.accounts.vault)?;
    let vault = &mut ctx.accounts.vault;

    let previous_owner = vault.designate_new_heir(&caller, new_heir, now)?;

    msg!("Succession complete!");
    msg!("Previous owner: {}", previous_owner);
    msg!("New owner: {}", vault.owner);
    msg!("New heir: {}", vault.heir);

    emit!(HeirDesignated {
        previous_owner,
        owner: vault.owner,
        heir: vault.heir,
    });

    Ok(())
}
