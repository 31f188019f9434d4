use anchor_lang::prelude::*;

#[constant]
pub const VAULT_SEED: &[u8] = b"vault";

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// How long the owner may go without withdrawing before the heir can take over.
pub const INACTIVITY_PERIOD: i64 = 30 * SECONDS_PER_DAY;

/// Whether succession waits for the inactivity period to elapse.
/// Building with `ungated-succession` lets the heir take over at any time.
pub const ENFORCE_INACTIVITY: bool = !cfg!(feature = "ungated-succession");
