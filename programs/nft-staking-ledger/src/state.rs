use crate::error::StakeError;
use anchor_lang::prelude::*;

/// Length of one accrual unit. Both `freeze_period` and `points_per_stake`
/// are expressed in these units.
pub const ACCRUAL_UNIT_SECONDS: i64 = 86_400;
/// A completed stake cycle is always credited with at least this many units.
pub const MIN_ACCRUAL_UNITS: u64 = 1;
pub const MAX_FREEZE_PERIOD: u32 = 3_650;
/// One claimed point is one base unit of the reward mint.
pub const REWARDS_DECIMALS: u8 = 0;

#[account]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StakeConfig {
    pub admin: Pubkey,
    pub collection: Pubkey,
    pub rewards_mint: Pubkey,
    pub points_per_stake: u32,
    pub max_stake: u32,
    pub freeze_period: u32,
    pub rewards_bump: u8,
    pub bump: u8,
}

impl StakeConfig {
    pub const LEN: usize = 8 + 32 + 32 + 32 + 4 + 4 + 4 + 1 + 1;

    pub fn validate(&self) -> Result<()> {
        require!(self.max_stake > 0, StakeError::InvalidConfig);
        require!(
            self.freeze_period <= MAX_FREEZE_PERIOD,
            StakeError::InvalidConfig
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.admin != Pubkey::default()
    }

    pub fn freeze_period_elapsed(&self, staked_at: i64, now: i64) -> Result<bool> {
        Ok(elapsed_units(staked_at, now)? >= u64::from(self.freeze_period))
    }

    /// Points owed for a stake that started at `staked_at` and ends at `now`.
    pub fn points_earned(&self, staked_at: i64, now: i64) -> Result<u64> {
        let units = elapsed_units(staked_at, now)?.max(MIN_ACCRUAL_UNITS);
        u64::from(self.points_per_stake)
            .checked_mul(units)
            .ok_or_else(|| error!(StakeError::ArithmeticOverflow))
    }
}

#[account]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UserAccount {
    pub owner: Pubkey,
    pub points: u64,
    pub amount_staked: u32,
    pub bump: u8,
}

impl UserAccount {
    pub const LEN: usize = 8 + 32 + 8 + 4 + 1;

    pub fn is_initialized(&self) -> bool {
        self.owner != Pubkey::default()
    }
}

#[account]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StakeAccount {
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub staked_at: i64,
    pub bump: u8,
}

impl StakeAccount {
    pub const LEN: usize = 8 + 32 + 32 + 8 + 1;

    pub fn is_live(&self) -> bool {
        self.owner != Pubkey::default()
    }
}

/// Whole accrual units between two ledger timestamps. A clock that reads
/// earlier than `staked_at` counts as zero elapsed.
pub fn elapsed_units(staked_at: i64, now: i64) -> Result<u64> {
    let elapsed = now
        .checked_sub(staked_at)
        .ok_or_else(|| error!(StakeError::ArithmeticOverflow))?
        .max(0);
    Ok((elapsed / ACCRUAL_UNIT_SECONDS) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::assert_stake_error;
    use proptest::prelude::*;

    fn config(points_per_stake: u32, freeze_period: u32) -> StakeConfig {
        StakeConfig {
            admin: Pubkey::new_unique(),
            points_per_stake,
            max_stake: 10,
            freeze_period,
            ..Default::default()
        }
    }

    fn serialized_len<T: AnchorSerialize>(value: &T) -> usize {
        let mut buf = Vec::new();
        value.serialize(&mut buf).unwrap();
        buf.len()
    }

    #[test]
    fn account_sizes_match_layout() {
        assert_eq!(StakeConfig::LEN, 8 + serialized_len(&StakeConfig::default()));
        assert_eq!(UserAccount::LEN, 8 + serialized_len(&UserAccount::default()));
        assert_eq!(StakeAccount::LEN, 8 + serialized_len(&StakeAccount::default()));
    }

    #[test]
    fn immediate_unstake_earns_one_unit() {
        let cfg = config(10, 0);
        assert!(cfg.freeze_period_elapsed(1_000, 1_000).unwrap());
        assert_eq!(cfg.points_earned(1_000, 1_000).unwrap(), 10);
    }

    #[test]
    fn partial_units_round_down() {
        let cfg = config(7, 0);
        let start = 50;
        let now = start + 3 * ACCRUAL_UNIT_SECONDS + ACCRUAL_UNIT_SECONDS - 1;
        assert_eq!(cfg.points_earned(start, now).unwrap(), 21);
    }

    #[test]
    fn freeze_period_is_inclusive() {
        let cfg = config(1, 2);
        let start = 0;
        assert!(!cfg
            .freeze_period_elapsed(start, 2 * ACCRUAL_UNIT_SECONDS - 1)
            .unwrap());
        assert!(cfg
            .freeze_period_elapsed(start, 2 * ACCRUAL_UNIT_SECONDS)
            .unwrap());
    }

    #[test]
    fn clock_behind_stake_counts_as_zero() {
        assert_eq!(elapsed_units(500, 100).unwrap(), 0);
    }

    #[test]
    fn extreme_timestamps_overflow_cleanly() {
        assert_stake_error(
            elapsed_units(i64::MIN, i64::MAX),
            StakeError::ArithmeticOverflow,
        );
        assert_stake_error(
            config(u32::MAX, 0).points_earned(0, i64::MAX),
            StakeError::ArithmeticOverflow,
        );
    }

    #[test]
    fn config_bounds() {
        let mut cfg = config(10, MAX_FREEZE_PERIOD);
        cfg.validate().unwrap();

        cfg.freeze_period = MAX_FREEZE_PERIOD + 1;
        assert_stake_error(cfg.validate(), StakeError::InvalidConfig);

        cfg.freeze_period = 0;
        cfg.max_stake = 0;
        assert_stake_error(cfg.validate(), StakeError::InvalidConfig);
    }

    proptest! {
        #[test]
        fn points_are_exact_or_overflow(
            points_per_stake in any::<u32>(),
            staked_at in 0i64..=i64::MAX,
            elapsed in 0i64..=i64::MAX,
        ) {
            let now = staked_at.saturating_add(elapsed);
            let units = ((now - staked_at) / ACCRUAL_UNIT_SECONDS).max(1) as u128;
            let expected = u128::from(points_per_stake) * units;

            match config(points_per_stake, 0).points_earned(staked_at, now) {
                Ok(points) => prop_assert_eq!(u128::from(points), expected),
                Err(_) => prop_assert!(expected > u128::from(u64::MAX)),
            }
        }
    }
}
