//! Capabilities the staking engine needs from the outside world, and the
//! on-chain implementations backed by SPL Token and Token Metadata CPIs.

use crate::error::StakeError;
use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::metadata::mpl_token_metadata::instructions::{
    FreezeDelegatedAccountCpi, FreezeDelegatedAccountCpiAccounts, ThawDelegatedAccountCpi,
    ThawDelegatedAccountCpiAccounts,
};
use anchor_spl::metadata::MetadataAccount;
use anchor_spl::token::{self, Approve, Mint, MintTo, Revoke, TokenAccount};

/// Locks and unlocks a non-fungible asset in place.
pub trait AssetCustody {
    /// Wallet currently holding `asset`, if any.
    fn holder(&self, asset: &Pubkey) -> Option<Pubkey>;
    fn freeze(&mut self, asset: &Pubkey, authority: &Pubkey) -> Result<()>;
    fn thaw(&mut self, asset: &Pubkey, authority: &Pubkey) -> Result<()>;
}

pub trait CollectionVerifier {
    fn is_verified_member(&self, asset: &Pubkey, collection: &Pubkey) -> bool;
}

/// Issues the fungible reward asset.
pub trait RewardIssuer {
    fn asset(&self) -> Pubkey;
    fn mint(&mut self, amount: u64, to: &Pubkey, authority: &Pubkey) -> Result<()>;
}

pub trait LedgerClock {
    fn now(&self) -> Result<i64>;
}

pub struct SysvarClock;

impl LedgerClock for SysvarClock {
    fn now(&self) -> Result<i64> {
        Ok(Clock::get()?.unix_timestamp)
    }
}

/// Reads collection membership from the NFT's metadata account.
pub struct MetadataCollection<'a> {
    pub metadata: &'a MetadataAccount,
}

impl CollectionVerifier for MetadataCollection<'_> {
    fn is_verified_member(&self, asset: &Pubkey, collection: &Pubkey) -> bool {
        self.metadata.mint.as_ref() == asset.as_ref()
            && self
                .metadata
                .collection
                .as_ref()
                .is_some_and(|c| c.verified && c.key.as_ref() == collection.as_ref())
    }
}

/// Custody of an NFT left in its owner's token account: the stake record PDA
/// is approved as delegate and then freezes the account through Token Metadata.
pub struct DelegatedFreeze<'a, 'info> {
    pub owner: AccountInfo<'info>,
    pub token_account: &'a Account<'info, TokenAccount>,
    pub mint: AccountInfo<'info>,
    pub edition: AccountInfo<'info>,
    pub delegate: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
    pub metadata_program: AccountInfo<'info>,
    pub signer_seeds: &'a [&'a [&'a [u8]]],
}

impl DelegatedFreeze<'_, '_> {
    fn check_target(&self, asset: &Pubkey, authority: &Pubkey) -> Result<()> {
        require_keys_eq!(*self.mint.key, *asset, StakeError::AssetNotHeld);
        require_keys_eq!(*self.delegate.key, *authority, StakeError::Unauthorized);
        Ok(())
    }
}

impl AssetCustody for DelegatedFreeze<'_, '_> {
    fn holder(&self, asset: &Pubkey) -> Option<Pubkey> {
        (self.token_account.mint == *asset && self.token_account.amount == 1)
            .then_some(self.token_account.owner)
    }

    fn freeze(&mut self, asset: &Pubkey, authority: &Pubkey) -> Result<()> {
        self.check_target(asset, authority)?;

        token::approve(
            CpiContext::new(
                self.token_program.clone(),
                Approve {
                    to: self.token_account.to_account_info(),
                    delegate: self.delegate.clone(),
                    authority: self.owner.clone(),
                },
            ),
            1,
        )?;

        let token_account = self.token_account.to_account_info();
        FreezeDelegatedAccountCpi::new(
            &self.metadata_program,
            FreezeDelegatedAccountCpiAccounts {
                delegate: &self.delegate,
                token_account: &token_account,
                edition: &self.edition,
                mint: &self.mint,
                token_program: &self.token_program,
            },
        )
        .invoke_signed(self.signer_seeds)?;
        Ok(())
    }

    fn thaw(&mut self, asset: &Pubkey, authority: &Pubkey) -> Result<()> {
        self.check_target(asset, authority)?;

        let token_account = self.token_account.to_account_info();
        ThawDelegatedAccountCpi::new(
            &self.metadata_program,
            ThawDelegatedAccountCpiAccounts {
                delegate: &self.delegate,
                token_account: &token_account,
                edition: &self.edition,
                mint: &self.mint,
                token_program: &self.token_program,
            },
        )
        .invoke_signed(self.signer_seeds)?;

        token::revoke(CpiContext::new(
            self.token_program.clone(),
            Revoke {
                source: token_account,
                authority: self.owner.clone(),
            },
        ))
    }
}

/// Rewards mint whose mint authority is the config PDA.
pub struct ConfigMintAuthority<'a, 'info> {
    pub mint: &'a Account<'info, Mint>,
    pub destination: &'a Account<'info, TokenAccount>,
    pub authority: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
    pub signer_seeds: &'a [&'a [&'a [u8]]],
}

impl RewardIssuer for ConfigMintAuthority<'_, '_> {
    fn asset(&self) -> Pubkey {
        self.mint.key()
    }

    fn mint(&mut self, amount: u64, to: &Pubkey, authority: &Pubkey) -> Result<()> {
        require!(
            self.mint.mint_authority == COption::Some(*authority),
            StakeError::Unauthorized
        );
        require_keys_eq!(*self.authority.key, *authority, StakeError::Unauthorized);
        require_keys_eq!(self.destination.key(), *to, StakeError::Unauthorized);

        token::mint_to(
            CpiContext::new_with_signer(
                self.token_program.clone(),
                MintTo {
                    mint: self.mint.to_account_info(),
                    to: self.destination.to_account_info(),
                    authority: self.authority.clone(),
                },
                self.signer_seeds,
            ),
            amount,
        )
    }
}
