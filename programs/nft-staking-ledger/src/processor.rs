use crate::account_structs::*;
use crate::custody::{
    ConfigMintAuthority, DelegatedFreeze, LedgerClock, MetadataCollection, SysvarClock,
};
use crate::engine::{self, StakeRequest};
use crate::error::*;
use crate::events::*;
use crate::guard::validate_program_update_authority;
use crate::pda::{CONFIG_SEED, STAKE_SEED};
use crate::state::{StakeAccount, StakeConfig};
use anchor_lang::prelude::*;

pub fn initialize_config(
    ctx: Context<InitializeConfig>,
    points_per_stake: u32,
    max_stake: u32,
    freeze_period: u32,
) -> Result<()> {
    validate_program_update_authority(&ctx.accounts.program_data, &ctx.accounts.admin)?;

    let draft = StakeConfig {
        admin: ctx.accounts.admin.key(),
        collection: ctx.accounts.collection_mint.key(),
        rewards_mint: ctx.accounts.rewards_mint.key(),
        points_per_stake,
        max_stake,
        freeze_period,
        rewards_bump: ctx.bumps.rewards_mint,
        bump: ctx.bumps.config,
    };
    let config = engine::new_config(draft, &ctx.accounts.config)?;
    ctx.accounts.config.set_inner(config);

    let config = &ctx.accounts.config;
    msg!(
        "Staking config initialized: {} points per unit, max {} staked, freeze {} units",
        config.points_per_stake,
        config.max_stake,
        config.freeze_period
    );

    emit!(ConfigInitialized {
        admin: config.admin,
        collection: config.collection,
        rewards_mint: config.rewards_mint,
        points_per_stake: config.points_per_stake,
        max_stake: config.max_stake,
        freeze_period: config.freeze_period,
    });

    Ok(())
}

pub fn initialize_user(ctx: Context<InitializeUser>) -> Result<()> {
    let user = ctx.accounts.user.key();
    let account = engine::new_user(user, ctx.bumps.user_account, &ctx.accounts.user_account)?;
    ctx.accounts.user_account.set_inner(account);

    emit!(UserInitialized {
        user,
        user_account: ctx.accounts.user_account.key(),
    });

    Ok(())
}

pub fn stake(ctx: Context<Stake>) -> Result<()> {
    let now = SysvarClock.now()?;
    let user = ctx.accounts.user.key();
    let mint = ctx.accounts.mint.key();
    let config_key = ctx.accounts.config.key();
    let stake_key = ctx.accounts.stake_account.key();
    let stake_bump = ctx.bumps.stake_account;

    let seeds: &[&[u8]] = &[
        STAKE_SEED,
        mint.as_ref(),
        config_key.as_ref(),
        &[stake_bump],
    ];
    let signer = &[seeds];

    let accounts = &mut *ctx.accounts;
    let verifier = MetadataCollection {
        metadata: &accounts.metadata,
    };
    let mut custody = DelegatedFreeze {
        owner: accounts.user.to_account_info(),
        token_account: &accounts.user_mint_ata,
        mint: accounts.mint.to_account_info(),
        edition: accounts.edition.to_account_info(),
        delegate: accounts.stake_account.to_account_info(),
        token_program: accounts.token_program.to_account_info(),
        metadata_program: accounts.metadata_program.to_account_info(),
        signer_seeds: signer,
    };

    let existing: &StakeAccount = &accounts.stake_account;
    let record = engine::stake(
        &accounts.config,
        &mut accounts.user_account,
        Some(existing),
        StakeRequest {
            owner: user,
            mint,
            stake_account: stake_key,
            stake_bump,
            now,
        },
        &verifier,
        &mut custody,
    )?;
    accounts.stake_account.set_inner(record);

    msg!("NFT {} staked by {}", mint, user);

    emit!(NftStaked {
        user,
        mint,
        stake_account: stake_key,
        staked_at: now,
        amount_staked: accounts.user_account.amount_staked,
    });

    Ok(())
}

pub fn unstake(ctx: Context<Unstake>) -> Result<()> {
    let now = SysvarClock.now()?;
    let user = ctx.accounts.user.key();
    let mint = ctx.accounts.mint.key();
    let config_key = ctx.accounts.config.key();
    let stake_key = ctx.accounts.stake_account.key();

    let record = load_stake_record(&ctx.accounts.stake_account)?;
    let stake_bump = record.as_ref().map_or(ctx.bumps.stake_account, |r| r.bump);

    let seeds: &[&[u8]] = &[
        STAKE_SEED,
        mint.as_ref(),
        config_key.as_ref(),
        &[stake_bump],
    ];
    let signer = &[seeds];

    let accounts = &mut *ctx.accounts;
    let mut custody = DelegatedFreeze {
        owner: accounts.user.to_account_info(),
        token_account: &accounts.user_mint_ata,
        mint: accounts.mint.to_account_info(),
        edition: accounts.edition.to_account_info(),
        delegate: accounts.stake_account.to_account_info(),
        token_program: accounts.token_program.to_account_info(),
        metadata_program: accounts.metadata_program.to_account_info(),
        signer_seeds: signer,
    };

    let outcome = engine::unstake(
        &accounts.config,
        &mut accounts.user_account,
        record.as_ref(),
        &user,
        &stake_key,
        now,
        &mut custody,
    )?;

    close_stake_record(
        &accounts.stake_account.to_account_info(),
        &accounts.user.to_account_info(),
    )?;

    msg!(
        "NFT {} unstaked by {}, earned {} points",
        mint,
        user,
        outcome.earned
    );

    emit!(NftUnstaked {
        user,
        mint,
        staked_at: outcome.staked_at,
        earned: outcome.earned,
        points: accounts.user_account.points,
        amount_staked: accounts.user_account.amount_staked,
    });

    Ok(())
}

pub fn claim(ctx: Context<Claim>) -> Result<()> {
    let user = ctx.accounts.user.key();
    let config_key = ctx.accounts.config.key();
    let destination = ctx.accounts.rewards_ata.key();

    let seeds: &[&[u8]] = &[CONFIG_SEED, &[ctx.accounts.config.bump]];
    let signer = &[seeds];

    let accounts = &mut *ctx.accounts;
    let mut issuer = ConfigMintAuthority {
        mint: &accounts.rewards_mint,
        destination: &accounts.rewards_ata,
        authority: accounts.config.to_account_info(),
        token_program: accounts.token_program.to_account_info(),
        signer_seeds: signer,
    };

    let claimed = engine::claim(
        &accounts.config,
        &config_key,
        &mut accounts.user_account,
        &user,
        &destination,
        &mut issuer,
    )?;

    msg!("{} claimed {} points", user, claimed.points);

    emit!(RewardsClaimed {
        user,
        points: claimed.points,
        mint: accounts.rewards_mint.key(),
    });

    Ok(())
}

// A closed stake account is owned by the system program with no data.
fn load_stake_record(info: &AccountInfo) -> Result<Option<StakeAccount>> {
    if info.owner != &crate::ID || info.data_is_empty() {
        return Ok(None);
    }
    let data = info.try_borrow_data()?;
    let record = StakeAccount::try_deserialize(&mut &data[..])?;
    Ok(record.is_live().then_some(record))
}

fn close_stake_record<'info>(
    info: &AccountInfo<'info>,
    destination: &AccountInfo<'info>,
) -> Result<()> {
    let refunded = destination
        .lamports()
        .checked_add(info.lamports())
        .ok_or(StakeError::ArithmeticOverflow)?;
    **destination.try_borrow_mut_lamports()? = refunded;
    **info.try_borrow_mut_lamports()? = 0;

    info.assign(&anchor_lang::system_program::ID);
    #[allow(deprecated)]
    info.realloc(0, false)?;
    Ok(())
}
