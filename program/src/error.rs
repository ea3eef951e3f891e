use solana_program::program_error::ProgramError;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamFlowDemoError {
    #[error("deposit amount must be greater than zero")]
    InvalidAmount,
    #[error("deposit account does not match its derived address")]
    InvalidPda,
    #[error("token account is not the expected associated token account")]
    InvalidAssociatedAccount,
    #[error("deposit account belongs to another owner")]
    OwnerMismatch,
    #[error("depositor has nothing deposited")]
    NothingDeposited,
    #[error("deposit amount overflow")]
    AmountOverflow,
    #[error("streamflow program id mismatch")]
    InvalidStreamflowProgram,
    #[error("escrow account does not match the stream metadata")]
    InvalidEscrow,
}

impl From<StreamFlowDemoError> for ProgramError {
    fn from(e: StreamFlowDemoError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
