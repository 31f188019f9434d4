use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    #[msg("Caller does not hold the role required for this instruction")]
    Unauthorized,
    #[msg("Withdrawal amount exceeds the vault balance")]
    InsufficientFunds,
    #[msg("Proposed heir is not a valid successor")]
    InvalidHeir,
    #[msg("Owner has been active within the inactivity period")]
    OwnerStillActive,
    #[msg("Math operation overflow")]
    BalanceOverflow,
}
