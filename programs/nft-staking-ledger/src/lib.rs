//! # nft staking ledger - NFT Staking and Points System
//!
//! ## Business Process Flow
//!
//! 1. Initial Setup:
//!    - The program's upgrade authority initializes the staking config with
//!      the points rate, per-user stake limit and freeze period
//!    - The config names the NFT collection that may be staked
//!    - A rewards mint is derived from the config, with the config PDA as its
//!      only mint authority
//!
//! 2. User Staking Flow:
//!    a. Registration:
//!       - Each wallet creates its user account once
//!    b. Stake:
//!       - User stakes a verified NFT of the collection
//!       - The NFT stays in the user's token account, delegated to and frozen
//!         by a stake record PDA derived from the NFT mint
//!       - The stake record remembers owner and stake time
//!
//! 3. Withdrawal Flow:
//!    - After the freeze period the owner unstakes
//!    - Points are credited for every whole day staked (at least one)
//!    - The NFT is thawed, delegation revoked, the stake record closed
//!
//! 4. Rewards:
//!    - User claims all accumulated points as reward tokens
//!    - Points reset to zero
//!
//! Security is maintained through PDAs (Program Derived Addresses) and strict
//! token authority controls. All token operations are atomic and validated
//! through Solana's transaction model.

pub mod account_structs;
pub mod custody;
pub mod engine;
pub mod error;
pub mod events;
mod guard;
#[cfg(not(target_os = "solana"))]
pub mod ledger;
pub mod pda;
pub mod processor;
pub mod state;

use account_structs::*;
use anchor_lang::prelude::*;

declare_id!("nftmapxi1xxp8F4TiU3cZ7xxEd1kFcT5aSnpRZaqa3U");

#[program]
pub mod nft_staking_ledger {
    use super::*;

    /// Creates the staking config and its rewards mint:
    /// - points_per_stake: Points credited per day an NFT stays staked
    /// - max_stake: Maximum NFTs one user may have staked at once
    /// - freeze_period: Days an NFT must stay staked before it can be withdrawn
    pub fn initialize_config(
        ctx: Context<InitializeConfig>,
        points_per_stake: u32,
        max_stake: u32,
        freeze_period: u32,
    ) -> Result<()> {
        processor::initialize_config(ctx, points_per_stake, max_stake, freeze_period)
    }

    pub fn initialize_user(ctx: Context<InitializeUser>) -> Result<()> {
        processor::initialize_user(ctx)
    }

    /// Freezes a collection NFT in the user's wallet and opens its stake record
    pub fn stake(ctx: Context<Stake>) -> Result<()> {
        processor::stake(ctx)
    }

    /// Credits points, thaws the NFT and closes its stake record
    pub fn unstake(ctx: Context<Unstake>) -> Result<()> {
        processor::unstake(ctx)
    }

    /// Mints accumulated points as reward tokens to the user's rewards ATA
    pub fn claim(ctx: Context<Claim>) -> Result<()> {
        processor::claim(ctx)
    }
}
