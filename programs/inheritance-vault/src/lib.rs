pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod state;

use anchor_lang::prelude::*;

pub use constants::*;
pub use instructions::*;
pub use state::*;

declare_id!("89FqqGyA6q3ZzEvfHCHG6mSEE1nBKpMXErK52UikYJ7q");

#[program]
pub mod inheritance_vault {
    use super::*;

    pub fn initialize(ctx: Context<Initialize>, heir: Pubkey) -> Result<()> {
        initialize::handler(ctx, heir)
    }

    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
        deposit::handler(ctx, amount)
    }

    pub fn withdraw(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
        withdraw::handler(ctx, amount)
    }

    pub fn designate_new_heir(ctx: Context<DesignateNewHeir>, new_heir: Pubkey) -> Result<()> {
        designate_new_heir::handler(ctx, new_heir)
    }

    pub fn snapshot(ctx: Context<Snapshot>) -> Result<VaultSnapshot> {
        snapshot::handler(ctx)
    }
}
