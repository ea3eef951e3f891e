use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

/// Seed prefix of the per-user deposit account.
pub const USER_ACCOUNT_SEED: &[u8] = b"user_account";

pub const STREAM_NAME_LEN: usize = 64;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserDepositAccount {
    pub owner: Pubkey,
    pub amount: u64,
    pub bump: u8,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateSfArgs {
    pub start_time: u64,
    pub cancelable_by_sender: bool,
    pub cancelable_by_recipient: bool,
    pub automatic_withdrawal: bool,
    pub transferable_by_sender: bool,
    pub transferable_by_recipient: bool,
    pub can_topup: bool,
    pub stream_name: [u8; STREAM_NAME_LEN],
    pub withdraw_frequency: u64,
    pub pausable: Option<bool>,
    pub can_update_rate: Option<bool>,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum StreamFlowInstruction {
    /// Moves `amount` tokens from the sender's token account into its vault.
    Deposit { amount: u64 },
    /// Drains the depositor's vault to the sender and opens a Streamflow
    /// stream back to the depositor.
    CreateSf(CreateSfArgs),
}

impl UserDepositAccount {
    pub const LEN: usize = 32 + 8 + 1;

    pub fn new(owner: Pubkey, bump: u8) -> Self {
        UserDepositAccount {
            owner,
            amount: 0,
            bump,
        }
    }
}

impl CreateSfArgs {
    /// Builds args with every flag cleared and `name` copied into the
    /// fixed-width stream name, truncated to fit.
    pub fn named(name: &str, start_time: u64, withdraw_frequency: u64) -> Self {
        CreateSfArgs {
            start_time,
            cancelable_by_sender: false,
            cancelable_by_recipient: false,
            automatic_withdrawal: false,
            transferable_by_sender: false,
            transferable_by_recipient: false,
            can_topup: false,
            stream_name: encode_stream_name(name),
            withdraw_frequency,
            pausable: Some(false),
            can_update_rate: Some(false),
        }
    }
}

pub fn encode_stream_name(name: &str) -> [u8; STREAM_NAME_LEN] {
    let mut buf = [0u8; STREAM_NAME_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(STREAM_NAME_LEN);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

pub fn find_user_account_address(owner: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[USER_ACCOUNT_SEED, owner.as_ref()], program_id)
}
