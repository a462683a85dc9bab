use anchor_lang::prelude::*;

#[event]
pub struct ConfigInitialized {
    pub admin: Pubkey,
    pub collection: Pubkey,
    pub rewards_mint: Pubkey,
    pub points_per_stake: u32,
    pub max_stake: u32,
    pub freeze_period: u32,
}

#[event]
pub struct UserInitialized {
    pub user: Pubkey,
    pub user_account: Pubkey,
}

#[event]
pub struct NftStaked {
    pub user: Pubkey,
    pub mint: Pubkey,
    pub stake_account: Pubkey,
    pub staked_at: i64,
    pub amount_staked: u32,
}

#[event]
pub struct NftUnstaked {
    pub user: Pubkey,
    pub mint: Pubkey,
    pub staked_at: i64,
    pub earned: u64,
    pub points: u64,
    pub amount_staked: u32,
}

#[event]
pub struct RewardsClaimed {
    pub user: Pubkey,
    pub points: u64,
    pub mint: Pubkey,
}
