use crate::error::StakeError;
use anchor_lang::prelude::*;

#[allow(deprecated)]
use anchor_lang::solana_program::bpf_loader_upgradeable::{self, UpgradeableLoaderState};

pub fn program_data_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[program_id.as_ref()], &bpf_loader_upgradeable::id()).0
}

/// Only the program's upgrade authority may act as staking admin.
pub fn validate_program_update_authority(
    program_data_account: &UncheckedAccount,
    authority: &Signer,
) -> Result<()> {
    let program_data = program_data_account
        .try_borrow_data()
        .map_err(|_| StakeError::InvalidProgramData)?;

    ensure_admin(upgrade_authority(&program_data)?, &authority.key())
}

pub fn upgrade_authority(program_data: &[u8]) -> Result<Option<Pubkey>> {
    let loader_state = bincode::deserialize::<UpgradeableLoaderState>(program_data)
        .map_err(|_| StakeError::InvalidProgramData)?;

    match loader_state {
        UpgradeableLoaderState::ProgramData {
            slot: _,
            upgrade_authority_address,
        } => Ok(upgrade_authority_address),
        _ => Err(StakeError::InvalidProgramData.into()),
    }
}

pub fn ensure_admin(upgrade_authority: Option<Pubkey>, signer: &Pubkey) -> Result<()> {
    match upgrade_authority {
        Some(update_authority) => {
            require_keys_eq!(*signer, update_authority, StakeError::Unauthorized);
            Ok(())
        }
        None => Err(StakeError::NoUpgradeAuthority.into()),
    }
}
