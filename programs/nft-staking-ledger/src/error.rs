use anchor_lang::prelude::*;

#[error_code]
pub enum StakeError {
    #[msg("Account already initialized")]
    AlreadyInitialized = 1,
    #[msg("Account not initialized")]
    AccountNotInitialized = 2,
    #[msg("Invalid staking configuration")]
    InvalidConfig = 3,

    #[msg("Maximum stake limit reached")]
    MaxStakeReached = 4,
    #[msg("Asset is not a verified member of the staking collection")]
    NotCollectionMember = 5,
    #[msg("Asset is already staked")]
    AlreadyStaked = 6,
    #[msg("Asset is not held by the signer")]
    AssetNotHeld = 7,
    #[msg("Asset is frozen")]
    AssetFrozen = 8,

    #[msg("Freeze period not elapsed")]
    FreezePeriodNotElapsed = 9,
    #[msg("Signer is not the owner of the stake")]
    NotOwner = 10,
    #[msg("No stake found for this asset")]
    StakeNotFound = 11,
    #[msg("No points to claim")]
    NothingToClaim = 12,

    #[msg("Arithmetic overflow")]
    ArithmeticOverflow = 13,

    #[msg("Unauthorized")]
    Unauthorized = 14,
    #[msg("Address does not match its derivation")]
    InvalidDerivation = 15,
    #[msg("ProgramData account did not match expected PDA.")]
    InvalidProgramData = 16,
    #[msg("Program has no upgrade authority (set to None).")]
    NoUpgradeAuthority = 17,
}

#[cfg(test)]
pub(crate) fn assert_stake_error<T: std::fmt::Debug>(result: Result<T>, expected: StakeError) {
    let code = match result {
        Err(anchor_lang::error::Error::AnchorError(err)) => err.error_code_number,
        other => panic!("expected {expected:?}, got {other:?}"),
    };
    assert_eq!(
        code,
        expected as u32 + anchor_lang::error::ERROR_CODE_OFFSET,
        "expected {expected:?}"
    );
}
