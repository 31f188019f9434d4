use anchor_lang::prelude::*;

#[event]
pub struct VaultOpened {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub heir: Pubkey,
    pub last_withdrawal: i64,
}

#[event]
pub struct Deposited {
    pub vault: Pubkey,
    pub depositor: Pubkey,
    pub amount: u64,
    /// Vault balance after the deposit
    pub balance: u64,
}

/// Emitted on every successful withdrawal, zero-amount liveness pings included.
#[event]
pub struct Withdrawal {
    pub owner: Pubkey,
    pub amount: u64,
}

#[event]
pub struct HeirDesignated {
    pub previous_owner: Pubkey,
    pub owner: Pubkey,
    pub heir: Pubkey,
}
