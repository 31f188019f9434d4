pub mod deposit;
pub mod designate_new_heir;
pub mod initialize;
pub mod snapshot;
pub mod withdraw;

pub use deposit::*;
pub use designate_new_heir::*;
pub use initialize::*;
pub use snapshot::*;
pub use withdraw::*;

use anchor_lang::prelude::*;

use crate::state::Vault;

/// Lamports the vault account holds beyond its rent-exempt reserve.
pub(crate) fn lamports_above_rent(vault: &Account<'_, Vault>) -> Result<u64> {
    let info = vault.to_account_info();
    let reserve = Rent::get()?.minimum_balance(info.data_len());
    Ok(info.lamports().saturating_sub(reserve))
}

/// Records funds sent to the vault by plain transfer so the owner can withdraw them.
pub(crate) fn sync_balance(vault: &mut Account<'_, Vault>) -> Result<()> {
    let above_rent = lamports_above_rent(vault)?;
    let absorbed = vault.absorb_unrecorded(above_rent);
    if absorbed > 0 {
        msg!("Recorded {} lamports received outside deposit", absorbed);
    }
    Ok(())
}
