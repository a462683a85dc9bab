//! Staking engine and rewards issuer.
//!
//! Every function here checks all of its preconditions before it touches
//! anything, then calls out to custody or the reward mint, and only mutates
//! the records it was handed once that call has succeeded. The caller persists
//! the results; on chain the transaction makes the whole thing atomic, off
//! chain `ledger::Ledger` stages the state.

use crate::custody::{AssetCustody, CollectionVerifier, RewardIssuer};
use crate::error::StakeError;
use crate::state::{StakeAccount, StakeConfig, UserAccount};
use anchor_lang::prelude::*;

/// Checks a drafted config against the one currently stored at the config
/// address, which is all zeroes if it has never been written.
pub fn new_config(draft: StakeConfig, existing: &StakeConfig) -> Result<StakeConfig> {
    require!(!existing.is_initialized(), StakeError::AlreadyInitialized);
    require!(draft.is_initialized(), StakeError::Unauthorized);
    draft.validate()?;
    Ok(draft)
}

pub fn new_user(owner: Pubkey, bump: u8, existing: &UserAccount) -> Result<UserAccount> {
    require!(!existing.is_initialized(), StakeError::AlreadyInitialized);

    Ok(UserAccount {
        owner,
        points: 0,
        amount_staked: 0,
        bump,
    })
}

/// Who is staking what, and the stake record PDA that will hold custody.
#[derive(Clone, Copy, Debug)]
pub struct StakeRequest {
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub stake_account: Pubkey,
    pub stake_bump: u8,
    pub now: i64,
}

pub fn stake<V, C>(
    config: &StakeConfig,
    user: &mut UserAccount,
    existing: Option<&StakeAccount>,
    request: StakeRequest,
    verifier: &V,
    custody: &mut C,
) -> Result<StakeAccount>
where
    V: CollectionVerifier + ?Sized,
    C: AssetCustody + ?Sized,
{
    require!(user.is_initialized(), StakeError::AccountNotInitialized);
    require_keys_eq!(user.owner, request.owner, StakeError::NotOwner);
    require!(
        !existing.is_some_and(StakeAccount::is_live),
        StakeError::AlreadyStaked
    );
    require!(
        verifier.is_verified_member(&request.mint, &config.collection),
        StakeError::NotCollectionMember
    );
    require!(
        custody.holder(&request.mint) == Some(request.owner),
        StakeError::AssetNotHeld
    );
    require!(
        user.amount_staked < config.max_stake,
        StakeError::MaxStakeReached
    );
    let amount_staked = user
        .amount_staked
        .checked_add(1)
        .ok_or(StakeError::ArithmeticOverflow)?;

    custody.freeze(&request.mint, &request.stake_account)?;

    user.amount_staked = amount_staked;
    Ok(StakeAccount {
        owner: request.owner,
        mint: request.mint,
        staked_at: request.now,
        bump: request.stake_bump,
    })
}

/// Outcome of a completed stake cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unstaked {
    pub earned: u64,
    pub staked_at: i64,
}

/// Closes a stake cycle. The caller must destroy the stake record afterwards.
pub fn unstake<C>(
    config: &StakeConfig,
    user: &mut UserAccount,
    record: Option<&StakeAccount>,
    caller: &Pubkey,
    stake_account: &Pubkey,
    now: i64,
    custody: &mut C,
) -> Result<Unstaked>
where
    C: AssetCustody + ?Sized,
{
    let record = record
        .filter(|r| r.is_live())
        .ok_or(StakeError::StakeNotFound)?;
    require_keys_eq!(record.owner, *caller, StakeError::NotOwner);
    require_keys_eq!(user.owner, *caller, StakeError::NotOwner);
    require!(
        config.freeze_period_elapsed(record.staked_at, now)?,
        StakeError::FreezePeriodNotElapsed
    );

    let earned = config.points_earned(record.staked_at, now)?;
    let points = user
        .points
        .checked_add(earned)
        .ok_or(StakeError::ArithmeticOverflow)?;
    let amount_staked = user
        .amount_staked
        .checked_sub(1)
        .ok_or(StakeError::ArithmeticOverflow)?;

    custody.thaw(&record.mint, stake_account)?;

    user.points = points;
    user.amount_staked = amount_staked;
    Ok(Unstaked {
        earned,
        staked_at: record.staked_at,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Claimed {
    /// Points redeemed, also the number of reward base units minted.
    pub points: u64,
}

/// Mints one reward base unit per point and zeroes the user's points.
pub fn claim<I>(
    config: &StakeConfig,
    config_address: &Pubkey,
    user: &mut UserAccount,
    caller: &Pubkey,
    destination: &Pubkey,
    issuer: &mut I,
) -> Result<Claimed>
where
    I: RewardIssuer + ?Sized,
{
    require!(user.is_initialized(), StakeError::AccountNotInitialized);
    require_keys_eq!(user.owner, *caller, StakeError::NotOwner);
    require!(user.points > 0, StakeError::NothingToClaim);
    require_keys_eq!(issuer.asset(), config.rewards_mint, StakeError::Unauthorized);

    let points = user.points;
    issuer.mint(points, destination, config_address)?;

    user.points = 0;
    Ok(Claimed { points })
}
