use anchor_lang::prelude::*;

use crate::constants::ENFORCE_INACTIVITY;
use crate::error::VaultError;

#[account]
pub struct Vault {
    /// The signer that opened the vault; keeps the PDA address stable across successions
    pub founder: Pubkey,
    /// The current controller and sole withdrawer
    pub owner: Pubkey,
    /// The successor allowed to claim the vault once the owner goes quiet
    pub heir: Pubkey,
    /// Lamports held on behalf of the owner, rent reserve excluded
    pub balance: u64,
    /// Unix timestamp of the owner's last withdrawal
    pub last_withdrawal: i64,
    /// Seconds of owner silence after which succession unlocks
    pub inactivity_period: i64,
    /// Bump seed for PDA derivation
    pub bump: u8,
}

impl Vault {
    pub const LEN: usize = 8 + // discriminator
        32 + // founder
        32 + // owner
        32 + // heir
        8 + // balance
        8 + // last_withdrawal
        8 + // inactivity_period
        1; // bump

    /// Fills a freshly allocated vault. The founder becomes the first owner.
    pub fn open(
        &mut self,
        founder: Pubkey,
        heir: Pubkey,
        now: i64,
        inactivity_period: i64,
        bump: u8,
    ) -> Result<()> {
        if heir == founder {
            msg!("Heir cannot be the owner");
            return err!(VaultError::InvalidHeir);
        }
        if heir == Pubkey::default() {
            msg!("Heir cannot be the zero address");
            return err!(VaultError::InvalidHeir);
        }

        self.founder = founder;
        self.owner = founder;
        self.heir = heir;
        self.balance = 0;
        self.last_withdrawal = now;
        self.inactivity_period = inactivity_period;
        self.bump = bump;

        Ok(())
    }

    /// Records incoming funds and returns the new balance.
    pub fn credit(&mut self, amount: u64) -> Result<u64> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(VaultError::BalanceOverflow)?;
        Ok(self.balance)
    }

    /// Folds lamports that reached the vault without going through `deposit`
    /// (a bare system transfer) into the balance. `lamports_above_rent` is
    /// everything the account holds beyond its rent-exempt reserve.
    /// Returns the amount newly recorded.
    pub fn absorb_unrecorded(&mut self, lamports_above_rent: u64) -> u64 {
        let unrecorded = lamports_above_rent.saturating_sub(self.balance);
        self.balance = self.balance.max(lamports_above_rent);
        unrecorded
    }

    /// Owner-only withdrawal. Always restarts the inactivity timer, even for a
    /// zero amount.
    ///
    /// The timer is clamped: a `now` earlier than the stored timestamp leaves it
    /// in place, so `last_withdrawal` equals the call's timestamp whenever the
    /// clock has not stepped back, and never decreases otherwise.
    pub fn debit(&mut self, caller: &Pubkey, amount: u64, now: i64) -> Result<()> {
        if *caller != self.owner {
            msg!("Only the owner can withdraw");
            return err!(VaultError::Unauthorized);
        }

        let remaining = self
            .balance
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientFunds)?;

        self.balance = remaining;
        self.last_withdrawal = self.last_withdrawal.max(now);

        Ok(())
    }

    /// Promotes the calling heir to owner and installs `new_heir` in its place.
    /// Returns the previous owner.
    pub fn designate_new_heir(
        &mut self,
        caller: &Pubkey,
        new_heir: Pubkey,
        now: i64,
    ) -> Result<Pubkey> {
        if *caller != self.heir {
            msg!("Only the heir can call this function");
            return err!(VaultError::Unauthorized);
        }
        if new_heir == self.owner {
            msg!("New heir cannot be the current owner");
            return err!(VaultError::InvalidHeir);
        }
        if new_heir == self.heir {
            msg!("New heir cannot be the current heir");
            return err!(VaultError::InvalidHeir);
        }
        if new_heir == Pubkey::default() {
            msg!("New heir cannot be the zero address");
            return err!(VaultError::InvalidHeir);
        }
        if ENFORCE_INACTIVITY && !self.is_owner_inactive(now) {
            msg!(
                "Succession unlocks at {}, now is {}",
                self.succession_unlocks_at(),
                now
            );
            return err!(VaultError::OwnerStillActive);
        }

        let previous_owner = self.owner;
        self.owner = self.heir;
        self.heir = new_heir;

        Ok(previous_owner)
    }

    /// Earliest timestamp at which the heir may take over.
    pub fn succession_unlocks_at(&self) -> i64 {
        self.last_withdrawal.saturating_add(self.inactivity_period)
    }

    pub fn is_owner_inactive(&self, now: i64) -> bool {
        now >= self.succession_unlocks_at()
    }

    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            owner: self.owner,
            heir: self.heir,
            balance: self.balance,
            last_withdrawal: self.last_withdrawal,
            inactivity_period: self.inactivity_period,
        }
    }
}

/// Read-only view of a vault, returned by the `snapshot` instruction.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct VaultSnapshot {
    pub owner: Pubkey,
    pub heir: Pubkey,
    pub balance: u64,
    pub last_withdrawal: i64,
    pub inactivity_period: i64,
}
