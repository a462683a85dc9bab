//! Deterministic addresses for every record the program owns.
//!
//! | Record        | Seeds                                  |
//! |---------------|----------------------------------------|
//! | config        | `"config"`                             |
//! | rewards mint  | `"rewards"`, config                    |
//! | user account  | `"user"`, user wallet                  |
//! | stake account | `"stake"`, NFT mint, config            |
//!
//! A stake address is keyed by the NFT mint, so there can only ever be one
//! live stake record per asset.

use crate::error::StakeError;
use anchor_lang::prelude::*;

pub const CONFIG_SEED: &[u8] = b"config";
pub const REWARDS_SEED: &[u8] = b"rewards";
pub const USER_SEED: &[u8] = b"user";
pub const STAKE_SEED: &[u8] = b"stake";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Derived {
    pub address: Pubkey,
    pub bump: u8,
}

fn derive(seeds: &[&[u8]], program_id: &Pubkey) -> Derived {
    let (address, bump) = Pubkey::find_program_address(seeds, program_id);
    Derived { address, bump }
}

pub fn config_address(program_id: &Pubkey) -> Derived {
    derive(&[CONFIG_SEED], program_id)
}

pub fn rewards_mint_address(config: &Pubkey, program_id: &Pubkey) -> Derived {
    derive(&[REWARDS_SEED, config.as_ref()], program_id)
}

pub fn user_address(user: &Pubkey, program_id: &Pubkey) -> Derived {
    derive(&[USER_SEED, user.as_ref()], program_id)
}

pub fn stake_address(mint: &Pubkey, config: &Pubkey, program_id: &Pubkey) -> Derived {
    derive(&[STAKE_SEED, mint.as_ref(), config.as_ref()], program_id)
}

/// Re-derives `address` from `seeds` and a stored `bump`. Must pass before the
/// contents of a caller-supplied account are trusted.
pub fn verify_address(
    address: &Pubkey,
    seeds: &[&[u8]],
    bump: u8,
    program_id: &Pubkey,
) -> Result<()> {
    let bump = [bump];
    let mut signer_seeds = seeds.to_vec();
    signer_seeds.push(&bump);

    let derived = Pubkey::create_program_address(&signer_seeds, program_id)
        .map_err(|_| StakeError::InvalidDerivation)?;
    require_keys_eq!(derived, *address, StakeError::InvalidDerivation);
    Ok(())
}
