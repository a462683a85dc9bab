//! In-memory ledger that runs the staking engine outside the runtime.
//!
//! The runtime gives every instruction all-or-nothing semantics. Here each
//! operation runs against a cloned copy of the ledger state, and the copy
//! replaces the live state only if the operation returns `Ok`.
//!
//! Callers pass the addresses they want to touch in [`AccountKeys`], the same
//! way a transaction names its accounts. Every address is re-derived from its
//! seeds before the record behind it is read.

use crate::custody::{AssetCustody, CollectionVerifier, LedgerClock, RewardIssuer};
use crate::engine::{self, Claimed, StakeRequest, Unstaked};
use crate::error::StakeError;
use crate::guard::ensure_admin;
use crate::pda::{self, CONFIG_SEED, REWARDS_SEED, STAKE_SEED, USER_SEED};
use crate::state::{StakeAccount, StakeConfig, UserAccount, REWARDS_DECIMALS};
use anchor_lang::prelude::*;
use anchor_spl::associated_token::get_associated_token_address;
use std::collections::BTreeMap;

/// Clock driven by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManualClock {
    now: i64,
}

impl ManualClock {
    pub fn set(&mut self, now: i64) {
        self.now = now;
    }

    pub fn advance(&mut self, seconds: i64) -> Result<()> {
        self.now = self
            .now
            .checked_add(seconds)
            .ok_or(StakeError::ArithmeticOverflow)?;
        Ok(())
    }
}

impl LedgerClock for ManualClock {
    fn now(&self) -> Result<i64> {
        Ok(self.now)
    }
}

/// Verified collection memberships, asset -> collection.
#[derive(Clone, Debug, Default)]
pub struct CollectionRegistry {
    verified: BTreeMap<Pubkey, Pubkey>,
}

impl CollectionRegistry {
    pub fn verify(&mut self, asset: Pubkey, collection: Pubkey) {
        self.verified.insert(asset, collection);
    }
}

impl CollectionVerifier for CollectionRegistry {
    fn is_verified_member(&self, asset: &Pubkey, collection: &Pubkey) -> bool {
        self.verified.get(asset) == Some(collection)
    }
}

/// NFT holdings plus the freeze authority of every frozen asset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetVault {
    holders: BTreeMap<Pubkey, Pubkey>,
    frozen: BTreeMap<Pubkey, Pubkey>,
}

impl AssetVault {
    pub fn deposit(&mut self, asset: Pubkey, holder: Pubkey) {
        self.holders.insert(asset, holder);
    }

    pub fn transfer(&mut self, asset: &Pubkey, from: &Pubkey, to: Pubkey) -> Result<()> {
        require!(
            self.holders.get(asset) == Some(from),
            StakeError::AssetNotHeld
        );
        require!(!self.frozen.contains_key(asset), StakeError::AssetFrozen);
        self.holders.insert(*asset, to);
        Ok(())
    }

    pub fn frozen_by(&self, asset: &Pubkey) -> Option<Pubkey> {
        self.frozen.get(asset).copied()
    }
}

impl AssetCustody for AssetVault {
    fn holder(&self, asset: &Pubkey) -> Option<Pubkey> {
        self.holders.get(asset).copied()
    }

    fn freeze(&mut self, asset: &Pubkey, authority: &Pubkey) -> Result<()> {
        require!(self.holders.contains_key(asset), StakeError::AssetNotHeld);
        require!(!self.frozen.contains_key(asset), StakeError::AssetFrozen);
        self.frozen.insert(*asset, *authority);
        Ok(())
    }

    fn thaw(&mut self, asset: &Pubkey, authority: &Pubkey) -> Result<()> {
        require!(
            self.frozen.get(asset) == Some(authority),
            StakeError::Unauthorized
        );
        self.frozen.remove(asset);
        Ok(())
    }
}

/// Fungible reward mint. Balances are keyed by token account address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardMint {
    address: Pubkey,
    authority: Pubkey,
    decimals: u8,
    supply: u64,
    balances: BTreeMap<Pubkey, u64>,
}

impl RewardMint {
    pub fn new(address: Pubkey, authority: Pubkey, decimals: u8) -> Self {
        Self {
            address,
            authority,
            decimals,
            supply: 0,
            balances: BTreeMap::new(),
        }
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn supply(&self) -> u64 {
        self.supply
    }

    pub fn balance(&self, token_account: &Pubkey) -> u64 {
        self.balances.get(token_account).copied().unwrap_or(0)
    }
}

impl RewardIssuer for RewardMint {
    fn asset(&self) -> Pubkey {
        self.address
    }

    fn mint(&mut self, amount: u64, to: &Pubkey, authority: &Pubkey) -> Result<()> {
        require_keys_eq!(*authority, self.authority, StakeError::Unauthorized);

        let supply = self
            .supply
            .checked_add(amount)
            .ok_or(StakeError::ArithmeticOverflow)?;
        let balance = self
            .balance(to)
            .checked_add(amount)
            .ok_or(StakeError::ArithmeticOverflow)?;

        self.supply = supply;
        self.balances.insert(*to, balance);
        Ok(())
    }
}

/// Addresses an operation is invoked with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountKeys {
    pub config: Pubkey,
    pub rewards_mint: Pubkey,
    pub user_account: Pubkey,
    /// Only needed by stake and unstake.
    pub stake_account: Option<Pubkey>,
}

impl AccountKeys {
    pub fn derive(program_id: &Pubkey, user: &Pubkey, asset: Option<&Pubkey>) -> Self {
        let config = pda::config_address(program_id).address;
        Self {
            config,
            rewards_mint: pda::rewards_mint_address(&config, program_id).address,
            user_account: pda::user_address(user, program_id).address,
            stake_account: asset.map(|mint| pda::stake_address(mint, &config, program_id).address),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct LedgerState {
    config: Option<StakeConfig>,
    users: BTreeMap<Pubkey, UserAccount>,
    stakes: BTreeMap<Pubkey, StakeAccount>,
    vault: AssetVault,
    rewards: Option<RewardMint>,
}

fn staged<T>(
    state: &mut LedgerState,
    op: impl FnOnce(&mut LedgerState) -> Result<T>,
) -> Result<T> {
    let mut staged = state.clone();
    let out = op(&mut staged)?;
    *state = staged;
    Ok(out)
}

/// Checks `address` against `seeds`, using the bump stored in the record
/// when there is one and the canonical bump otherwise. Returns the bump.
fn check_address(
    address: &Pubkey,
    seeds: &[&[u8]],
    stored_bump: Option<u8>,
    program_id: &Pubkey,
) -> Result<u8> {
    let bump = match stored_bump {
        Some(bump) => bump,
        None => Pubkey::find_program_address(seeds, program_id).1,
    };
    pda::verify_address(address, seeds, bump, program_id)?;
    Ok(bump)
}

pub struct Ledger {
    program_id: Pubkey,
    upgrade_authority: Option<Pubkey>,
    clock: ManualClock,
    collections: CollectionRegistry,
    state: LedgerState,
}

impl Ledger {
    pub fn new(program_id: Pubkey, upgrade_authority: Option<Pubkey>) -> Self {
        Self {
            program_id,
            upgrade_authority,
            clock: ManualClock::default(),
            collections: CollectionRegistry::default(),
            state: LedgerState::default(),
        }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn keys(&self, user: &Pubkey, asset: Option<&Pubkey>) -> AccountKeys {
        AccountKeys::derive(&self.program_id, user, asset)
    }

    pub fn clock_mut(&mut self) -> &mut ManualClock {
        &mut self.clock
    }

    /// Puts a fresh NFT in `holder`'s wallet, optionally as a verified member
    /// of `collection`.
    pub fn mint_asset(&mut self, holder: Pubkey, collection: Option<Pubkey>) -> Pubkey {
        let asset = Pubkey::new_unique();
        self.state.vault.deposit(asset, holder);
        if let Some(collection) = collection {
            self.collections.verify(asset, collection);
        }
        asset
    }

    pub fn transfer_asset(&mut self, asset: &Pubkey, from: &Pubkey, to: Pubkey) -> Result<()> {
        staged(&mut self.state, |state| state.vault.transfer(asset, from, to))
    }

    pub fn config(&self) -> Option<&StakeConfig> {
        self.state.config.as_ref()
    }

    pub fn user(&self, user: &Pubkey) -> Option<&UserAccount> {
        let address = pda::user_address(user, &self.program_id).address;
        self.state.users.get(&address)
    }

    pub fn stake_record(&self, asset: &Pubkey) -> Option<&StakeAccount> {
        let config = pda::config_address(&self.program_id).address;
        let address = pda::stake_address(asset, &config, &self.program_id).address;
        self.state.stakes.get(&address)
    }

    pub fn vault(&self) -> &AssetVault {
        &self.state.vault
    }

    pub fn rewards(&self) -> Option<&RewardMint> {
        self.state.rewards.as_ref()
    }

    /// Reward balance of `user`'s associated token account.
    pub fn reward_balance(&self, user: &Pubkey) -> u64 {
        self.state.rewards.as_ref().map_or(0, |rewards| {
            rewards.balance(&get_associated_token_address(user, &rewards.address))
        })
    }

    fn stored_config(&self, keys: &AccountKeys) -> Result<StakeConfig> {
        let config = self
            .state
            .config
            .clone()
            .ok_or(StakeError::AccountNotInitialized)?;
        check_address(
            &keys.config,
            &[CONFIG_SEED],
            Some(config.bump),
            &self.program_id,
        )?;
        Ok(config)
    }

    fn check_user_account(&self, user: &Pubkey, keys: &AccountKeys) -> Result<u8> {
        check_address(
            &keys.user_account,
            &[USER_SEED, user.as_ref()],
            self.state.users.get(&keys.user_account).map(|u| u.bump),
            &self.program_id,
        )
    }

    fn check_stake_account(&self, asset: &Pubkey, keys: &AccountKeys) -> Result<(Pubkey, u8)> {
        let address = keys.stake_account.ok_or(StakeError::InvalidDerivation)?;
        let bump = check_address(
            &address,
            &[STAKE_SEED, asset.as_ref(), keys.config.as_ref()],
            self.state
                .stakes
                .get(&address)
                .filter(|record| record.is_live())
                .map(|record| record.bump),
            &self.program_id,
        )?;
        Ok((address, bump))
    }

    pub fn initialize_config(
        &mut self,
        admin: &Pubkey,
        keys: &AccountKeys,
        collection: &Pubkey,
        points_per_stake: u32,
        max_stake: u32,
        freeze_period: u32,
    ) -> Result<()> {
        let existing = self.state.config.clone().unwrap_or_default();
        let stored = existing.is_initialized();
        let bump = check_address(
            &keys.config,
            &[CONFIG_SEED],
            stored.then_some(existing.bump),
            &self.program_id,
        )?;
        let rewards_bump = check_address(
            &keys.rewards_mint,
            &[REWARDS_SEED, keys.config.as_ref()],
            stored.then_some(existing.rewards_bump),
            &self.program_id,
        )?;
        ensure_admin(self.upgrade_authority, admin)?;

        let draft = StakeConfig {
            admin: *admin,
            collection: *collection,
            rewards_mint: keys.rewards_mint,
            points_per_stake,
            max_stake,
            freeze_period,
            rewards_bump,
            bump,
        };
        let config = engine::new_config(draft, &existing)?;

        staged(&mut self.state, |state| {
            state.rewards = Some(RewardMint::new(
                keys.rewards_mint,
                keys.config,
                REWARDS_DECIMALS,
            ));
            state.config = Some(config);
            Ok(())
        })
    }

    pub fn initialize_user(&mut self, user: &Pubkey, keys: &AccountKeys) -> Result<()> {
        let bump = self.check_user_account(user, keys)?;
        let existing = self
            .state
            .users
            .get(&keys.user_account)
            .cloned()
            .unwrap_or_default();
        let account = engine::new_user(*user, bump, &existing)?;

        staged(&mut self.state, |state| {
            state.users.insert(keys.user_account, account);
            Ok(())
        })
    }

    pub fn stake(&mut self, user: &Pubkey, asset: &Pubkey, keys: &AccountKeys) -> Result<()> {
        let config = self.stored_config(keys)?;
        self.check_user_account(user, keys)?;
        let (stake_account, stake_bump) = self.check_stake_account(asset, keys)?;
        let request = StakeRequest {
            owner: *user,
            mint: *asset,
            stake_account,
            stake_bump,
            now: self.clock.now()?,
        };
        let collections = &self.collections;

        staged(&mut self.state, |state| {
            let mut account = state
                .users
                .get(&keys.user_account)
                .cloned()
                .unwrap_or_default();
            let record = engine::stake(
                &config,
                &mut account,
                state.stakes.get(&stake_account),
                request,
                collections,
                &mut state.vault,
            )?;
            state.users.insert(keys.user_account, account);
            state.stakes.insert(stake_account, record);
            Ok(())
        })
    }

    pub fn unstake(
        &mut self,
        user: &Pubkey,
        asset: &Pubkey,
        keys: &AccountKeys,
    ) -> Result<Unstaked> {
        let config = self.stored_config(keys)?;
        self.check_user_account(user, keys)?;
        let (stake_account, _) = self.check_stake_account(asset, keys)?;
        let now = self.clock.now()?;

        staged(&mut self.state, |state| {
            let mut account = state
                .users
                .get(&keys.user_account)
                .cloned()
                .unwrap_or_default();
            let outcome = engine::unstake(
                &config,
                &mut account,
                state.stakes.get(&stake_account),
                user,
                &stake_account,
                now,
                &mut state.vault,
            )?;
            state.users.insert(keys.user_account, account);
            state.stakes.remove(&stake_account);
            Ok(outcome)
        })
    }

    pub fn claim(&mut self, user: &Pubkey, keys: &AccountKeys) -> Result<Claimed> {
        let config = self.stored_config(keys)?;
        check_address(
            &keys.rewards_mint,
            &[REWARDS_SEED, keys.config.as_ref()],
            Some(config.rewards_bump),
            &self.program_id,
        )?;
        self.check_user_account(user, keys)?;
        let destination = get_associated_token_address(user, &keys.rewards_mint);

        staged(&mut self.state, |state| {
            let mut account = state
                .users
                .get(&keys.user_account)
                .cloned()
                .unwrap_or_default();
            let rewards = state
                .rewards
                .as_mut()
                .ok_or(StakeError::AccountNotInitialized)?;
            let claimed = engine::claim(
                &config,
                &keys.config,
                &mut account,
                user,
                &destination,
                rewards,
            )?;
            state.users.insert(keys.user_account, account);
            Ok(claimed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::assert_stake_error;
    use crate::state::ACCRUAL_UNIT_SECONDS;
    use proptest::prelude::*;

    const DAY: i64 = ACCRUAL_UNIT_SECONDS;

    struct Setup {
        ledger: Ledger,
        admin: Pubkey,
        collection: Pubkey,
        user: Pubkey,
    }

    fn setup(points_per_stake: u32, max_stake: u32, freeze_period: u32) -> Setup {
        let admin = Pubkey::new_unique();
        let collection = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        let mut ledger = Ledger::new(Pubkey::new_unique(), Some(admin));
        ledger.clock_mut().set(1_700_000_000);

        let keys = ledger.keys(&admin, None);
        ledger
            .initialize_config(
                &admin,
                &keys,
                &collection,
                points_per_stake,
                max_stake,
                freeze_period,
            )
            .unwrap();
        let keys = ledger.keys(&user, None);
        ledger.initialize_user(&user, &keys).unwrap();

        Setup {
            ledger,
            admin,
            collection,
            user,
        }
    }

    impl Setup {
        fn member(&mut self) -> Pubkey {
            self.ledger.mint_asset(self.user, Some(self.collection))
        }

        fn stake(&mut self, asset: &Pubkey) -> Result<()> {
            let keys = self.ledger.keys(&self.user, Some(asset));
            self.ledger.stake(&self.user, asset, &keys)
        }

        fn unstake(&mut self, asset: &Pubkey) -> Result<Unstaked> {
            let keys = self.ledger.keys(&self.user, Some(asset));
            self.ledger.unstake(&self.user, asset, &keys)
        }

        fn claim(&mut self) -> Result<Claimed> {
            let keys = self.ledger.keys(&self.user, None);
            self.ledger.claim(&self.user, &keys)
        }

        fn user_account(&self) -> &UserAccount {
            self.ledger.user(&self.user).unwrap()
        }
    }

    #[test]
    fn stake_unstake_claim_round() {
        let mut s = setup(10, 10, 0);
        let asset = s.member();

        s.stake(&asset).unwrap();
        assert_eq!(s.user_account().amount_staked, 1);
        assert!(s.ledger.vault().frozen_by(&asset).is_some());

        let outcome = s.unstake(&asset).unwrap();
        assert_eq!(outcome.earned, 10);
        assert_eq!(s.user_account().points, 10);
        assert_eq!(s.user_account().amount_staked, 0);
        assert!(s.ledger.stake_record(&asset).is_none());
        assert!(s.ledger.vault().frozen_by(&asset).is_none());

        let claimed = s.claim().unwrap();
        assert_eq!(claimed.points, 10);
        assert_eq!(s.ledger.reward_balance(&s.user), 10);
        assert_eq!(s.ledger.rewards().unwrap().supply(), 10);
        assert_eq!(s.user_account().points, 0);

        assert_stake_error(s.claim(), StakeError::NothingToClaim);
    }

    #[test]
    fn large_point_balances_stay_claimable() {
        let mut s = setup(u32::MAX, 10, 0);
        let asset = s.member();
        s.stake(&asset).unwrap();
        s.ledger.clock_mut().advance(5_000 * DAY).unwrap();

        let earned = s.unstake(&asset).unwrap().earned;
        assert_eq!(earned, u64::from(u32::MAX) * 5_000);

        let claimed = s.claim().unwrap();
        assert_eq!(claimed.points, earned);
        assert_eq!(s.ledger.reward_balance(&s.user), earned);
        assert_eq!(s.user_account().points, 0);
    }

    #[test]
    fn points_accrue_per_whole_day() {
        let mut s = setup(10, 10, 2);
        let asset = s.member();
        s.stake(&asset).unwrap();

        s.ledger.clock_mut().advance(DAY).unwrap();
        assert_stake_error(s.unstake(&asset), StakeError::FreezePeriodNotElapsed);

        s.ledger.clock_mut().advance(2 * DAY + DAY / 2).unwrap();
        assert_eq!(s.unstake(&asset).unwrap().earned, 30);
        assert_eq!(s.user_account().points, 30);
    }

    #[test]
    fn early_unstake_leaves_state_unchanged() {
        let mut s = setup(10, 10, 1);
        let asset = s.member();
        s.stake(&asset).unwrap();
        let before = s.ledger.state.clone();

        assert_stake_error(s.unstake(&asset), StakeError::FreezePeriodNotElapsed);
        assert_eq!(s.ledger.state, before);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut s = setup(10, 2, 0);
        let assets = [s.member(), s.member(), s.member()];

        s.stake(&assets[0]).unwrap();
        s.stake(&assets[1]).unwrap();
        assert_stake_error(s.stake(&assets[2]), StakeError::MaxStakeReached);

        assert_eq!(s.user_account().amount_staked, 2);
        assert!(s.ledger.stake_record(&assets[2]).is_none());
        assert!(s.ledger.vault().frozen_by(&assets[2]).is_none());

        s.unstake(&assets[0]).unwrap();
        s.stake(&assets[2]).unwrap();
    }

    #[test]
    fn non_member_cannot_stake() {
        let mut s = setup(10, 10, 0);
        let outsider = s.ledger.mint_asset(s.user, None);
        let other_collection = s.ledger.mint_asset(s.user, Some(Pubkey::new_unique()));

        assert_stake_error(s.stake(&outsider), StakeError::NotCollectionMember);
        assert_stake_error(s.stake(&other_collection), StakeError::NotCollectionMember);
        assert!(s.ledger.stake_record(&outsider).is_none());
        assert_eq!(s.user_account().amount_staked, 0);
    }

    #[test]
    fn only_the_holder_can_stake() {
        let mut s = setup(10, 10, 0);
        let asset = s.ledger.mint_asset(Pubkey::new_unique(), Some(s.collection));

        assert_stake_error(s.stake(&asset), StakeError::AssetNotHeld);
    }

    #[test]
    fn staked_asset_cannot_be_staked_again_or_moved() {
        let mut s = setup(10, 10, 0);
        let asset = s.member();
        s.stake(&asset).unwrap();

        assert_stake_error(s.stake(&asset), StakeError::AlreadyStaked);
        assert_stake_error(
            s.ledger.transfer_asset(&asset, &s.user, Pubkey::new_unique()),
            StakeError::AssetFrozen,
        );

        s.unstake(&asset).unwrap();
        s.ledger
            .transfer_asset(&asset, &s.user, Pubkey::new_unique())
            .unwrap();
    }

    #[test]
    fn second_unstake_finds_nothing() {
        let mut s = setup(10, 10, 0);
        let asset = s.member();
        s.stake(&asset).unwrap();
        s.unstake(&asset).unwrap();

        assert_stake_error(s.unstake(&asset), StakeError::StakeNotFound);
        assert_eq!(s.user_account().points, 10);
    }

    #[test]
    fn only_the_staker_can_unstake() {
        let mut s = setup(10, 10, 0);
        let asset = s.member();
        s.stake(&asset).unwrap();

        let thief = Pubkey::new_unique();
        let keys = s.ledger.keys(&thief, None);
        s.ledger.initialize_user(&thief, &keys).unwrap();
        let keys = s.ledger.keys(&thief, Some(&asset));

        assert_stake_error(
            s.ledger.unstake(&thief, &asset, &keys),
            StakeError::NotOwner,
        );
        assert!(s.ledger.vault().frozen_by(&asset).is_some());
    }

    #[test]
    fn substituted_addresses_are_rejected() {
        let mut s = setup(10, 10, 0);
        let asset = s.member();
        let other = s.member();

        let mut keys = s.ledger.keys(&s.user, Some(&asset));
        keys.stake_account = s.ledger.keys(&s.user, Some(&other)).stake_account;
        assert_stake_error(
            s.ledger.stake(&s.user, &asset, &keys),
            StakeError::InvalidDerivation,
        );

        let mut keys = s.ledger.keys(&s.user, Some(&asset));
        keys.user_account = s.ledger.keys(&Pubkey::new_unique(), None).user_account;
        assert_stake_error(
            s.ledger.stake(&s.user, &asset, &keys),
            StakeError::InvalidDerivation,
        );

        let mut keys = s.ledger.keys(&s.user, None);
        keys.rewards_mint = Pubkey::new_unique();
        assert_stake_error(
            s.ledger.claim(&s.user, &keys),
            StakeError::InvalidDerivation,
        );

        let mut keys = s.ledger.keys(&s.user, None);
        keys.stake_account = None;
        assert_stake_error(
            s.ledger.stake(&s.user, &asset, &keys),
            StakeError::InvalidDerivation,
        );
    }

    #[test]
    fn config_is_created_once_by_the_upgrade_authority() {
        let mut s = setup(10, 10, 0);
        let keys = s.ledger.keys(&s.admin, None);
        assert_stake_error(
            s.ledger
                .initialize_config(&s.admin, &keys, &s.collection, 99, 99, 0),
            StakeError::AlreadyInitialized,
        );
        assert_eq!(s.ledger.config().unwrap().points_per_stake, 10);

        let admin = Pubkey::new_unique();
        let mut ledger = Ledger::new(Pubkey::new_unique(), Some(admin));
        let keys = ledger.keys(&admin, None);
        assert_stake_error(
            ledger.initialize_config(&Pubkey::new_unique(), &keys, &s.collection, 10, 10, 0),
            StakeError::Unauthorized,
        );
        assert_stake_error(
            ledger.initialize_config(&admin, &keys, &s.collection, 10, 0, 0),
            StakeError::InvalidConfig,
        );
        assert!(ledger.config().is_none());

        let mut frozen = Ledger::new(Pubkey::new_unique(), None);
        let keys = frozen.keys(&admin, None);
        assert_stake_error(
            frozen.initialize_config(&admin, &keys, &s.collection, 10, 10, 0),
            StakeError::NoUpgradeAuthority,
        );
    }

    #[test]
    fn config_owns_the_reward_mint() {
        let s = setup(10, 10, 0);
        let config = s.ledger.config().unwrap();
        let rewards = s.ledger.rewards().unwrap();
        let keys = s.ledger.keys(&s.admin, None);

        assert_eq!(rewards.asset(), config.rewards_mint);
        assert_eq!(rewards.authority, keys.config);
        assert_eq!(rewards.decimals(), REWARDS_DECIMALS);
        assert_eq!(rewards.supply(), 0);
    }

    #[test]
    fn user_is_created_once() {
        let mut s = setup(10, 10, 0);
        let keys = s.ledger.keys(&s.user, None);
        assert_stake_error(
            s.ledger.initialize_user(&s.user, &keys),
            StakeError::AlreadyInitialized,
        );
    }

    #[test]
    fn unregistered_user_cannot_stake_or_claim() {
        let mut s = setup(10, 10, 0);
        let stranger = Pubkey::new_unique();
        let asset = s.ledger.mint_asset(stranger, Some(s.collection));

        let keys = s.ledger.keys(&stranger, Some(&asset));
        assert_stake_error(
            s.ledger.stake(&stranger, &asset, &keys),
            StakeError::AccountNotInitialized,
        );
        assert_stake_error(
            s.ledger.claim(&stranger, &keys),
            StakeError::AccountNotInitialized,
        );
    }

    #[test]
    fn operations_need_a_config() {
        let user = Pubkey::new_unique();
        let mut ledger = Ledger::new(Pubkey::new_unique(), Some(Pubkey::new_unique()));
        let asset = ledger.mint_asset(user, Some(Pubkey::new_unique()));
        let keys = ledger.keys(&user, Some(&asset));

        ledger.initialize_user(&user, &keys).unwrap();
        assert_stake_error(
            ledger.stake(&user, &asset, &keys),
            StakeError::AccountNotInitialized,
        );
    }

    #[derive(Clone, Debug)]
    enum Op {
        Stake(usize),
        Unstake(usize),
        Wait(i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4).prop_map(Op::Stake),
            (0usize..4).prop_map(Op::Unstake),
            (0i64..3 * DAY).prop_map(Op::Wait),
        ]
    }

    proptest! {
        #[test]
        fn custody_matches_stake_records(ops in prop::collection::vec(op(), 1..40)) {
            let mut s = setup(3, 3, 1);
            let assets: Vec<Pubkey> = (0..4).map(|_| s.member()).collect();
            let mut expected_points = 0u64;

            for op in ops {
                match op {
                    Op::Stake(i) => {
                        let _ = s.stake(&assets[i]);
                    }
                    Op::Unstake(i) => {
                        if let Ok(outcome) = s.unstake(&assets[i]) {
                            expected_points += outcome.earned;
                        }
                    }
                    Op::Wait(seconds) => s.ledger.clock_mut().advance(seconds).unwrap(),
                }

                let mut live = 0u32;
                for asset in &assets {
                    let staked = s.ledger.stake_record(asset).is_some();
                    prop_assert_eq!(s.ledger.vault().frozen_by(asset).is_some(), staked);
                    live += u32::from(staked);
                }
                let account = s.user_account();
                prop_assert_eq!(account.amount_staked, live);
                prop_assert!(account.amount_staked <= 3);
                prop_assert_eq!(account.points, expected_points);
            }
        }
    }
}
