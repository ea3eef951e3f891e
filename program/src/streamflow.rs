//! Client side of the Streamflow timelock program's `create` instruction.
//!
//! Streamflow is an Anchor program, so instruction data is an eight byte
//! discriminator followed by the Borsh encoded arguments.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey,
    pubkey::Pubkey,
};

use crate::state::{CreateSfArgs, STREAM_NAME_LEN};

pub const PROGRAM_ID: Pubkey = pubkey!("strmRqUCoQUgGUan5YhzUZa6KqdzwX5L6FpUxfmKg5m");
pub const TREASURY: Pubkey = pubkey!("5SEpbdjFK5FxwTvfsGMXVQTD2v4M2c5tyRTxhdsPkgDw");
pub const WITHDRAWOR: Pubkey = pubkey!("wdrwhnCv4pzW8beKsbPa4S2UDZrXenjg16KJdKSpb5u");
pub const FEE_ORACLE: Pubkey = pubkey!("B743wFVk2pCYhV91cn287e1xY7f1vt4gdY48hhNiuQmT");

pub const ESCROW_SEED: &[u8] = b"strm";

/// `sha256("global:create")[..8]`
pub const CREATE_DISCRIMINATOR: [u8; 8] = [24, 30, 200, 40, 5, 28, 7, 119];

/// Fee reserved when the withdrawor is not listed in the fee oracle, in
/// basis points.
pub const DEFAULT_FEE_BPS: u64 = 99;
const BPS_DENOMINATOR: u64 = 10_000;

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateStreamParams {
    pub start_time: u64,
    pub net_amount_deposited: u64,
    pub period: u64,
    pub amount_per_period: u64,
    pub cliff: u64,
    pub cliff_amount: u64,
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

impl CreateStreamParams {
    /// A single-period stream that unlocks `net_amount` entirely at the
    /// cliff.
    pub fn single_period(args: &CreateSfArgs, net_amount: u64) -> Self {
        CreateStreamParams {
            start_time: args.start_time,
            net_amount_deposited: net_amount,
            period: 1,
            amount_per_period: net_amount,
            cliff: 0,
            cliff_amount: net_amount,
            cancelable_by_sender: args.cancelable_by_sender,
            cancelable_by_recipient: args.cancelable_by_recipient,
            automatic_withdrawal: args.automatic_withdrawal,
            transferable_by_sender: args.transferable_by_sender,
            transferable_by_recipient: args.transferable_by_recipient,
            can_topup: args.can_topup,
            stream_name: args.stream_name,
            withdraw_frequency: args.withdraw_frequency,
            pausable: args.pausable,
            can_update_rate: args.can_update_rate,
        }
    }

    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        let mut data = CREATE_DISCRIMINATOR.to_vec();
        borsh::to_writer(&mut data, self)?;
        Ok(data)
    }

    pub fn unpack(data: &[u8]) -> Option<Self> {
        let rest = data.strip_prefix(&CREATE_DISCRIMINATOR)?;
        Self::try_from_slice(rest).ok()
    }
}

/// Amount left for the stream after reserving the default Streamflow fee.
pub fn net_amount(amount: u64) -> u64 {
    let net = amount as u128 * (BPS_DENOMINATOR - DEFAULT_FEE_BPS) as u128 / BPS_DENOMINATOR as u128;
    // net <= amount, so it always fits back into u64
    net as u64
}

pub fn find_escrow_address(metadata: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ESCROW_SEED, metadata.as_ref()], &PROGRAM_ID)
}

/// Accounts of the Streamflow `create` instruction, in wire order.
#[derive(Debug, Clone, Copy)]
pub struct CreateAccounts {
    pub sender: Pubkey,
    pub sender_tokens: Pubkey,
    pub recipient: Pubkey,
    pub metadata: Pubkey,
    pub escrow_tokens: Pubkey,
    pub recipient_tokens: Pubkey,
    pub streamflow_treasury: Pubkey,
    pub streamflow_treasury_tokens: Pubkey,
    pub withdrawor: Pubkey,
    pub partner: Pubkey,
    pub partner_tokens: Pubkey,
    pub mint: Pubkey,
    pub fee_oracle: Pubkey,
    pub rent: Pubkey,
    pub timelock_program: Pubkey,
    pub token_program: Pubkey,
    pub associated_token_program: Pubkey,
    pub system_program: Pubkey,
}

impl CreateAccounts {
    pub const COUNT: usize = 18;

    pub fn to_account_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.sender, true),
            AccountMeta::new(self.sender_tokens, false),
            AccountMeta::new(self.recipient, false),
            AccountMeta::new(self.metadata, true),
            AccountMeta::new(self.escrow_tokens, false),
            AccountMeta::new(self.recipient_tokens, false),
            AccountMeta::new(self.streamflow_treasury, false),
            AccountMeta::new(self.streamflow_treasury_tokens, false),
            AccountMeta::new(self.withdrawor, false),
            AccountMeta::new(self.partner, false),
            AccountMeta::new(self.partner_tokens, false),
            AccountMeta::new_readonly(self.mint, false),
            AccountMeta::new_readonly(self.fee_oracle, false),
            AccountMeta::new_readonly(self.rent, false),
            AccountMeta::new_readonly(self.timelock_program, false),
            AccountMeta::new_readonly(self.token_program, false),
            AccountMeta::new_readonly(self.associated_token_program, false),
            AccountMeta::new_readonly(self.system_program, false),
        ]
    }
}

pub fn create(
    accounts: &CreateAccounts,
    params: &CreateStreamParams,
) -> Result<Instruction, ProgramError> {
    Ok(Instruction {
        program_id: PROGRAM_ID,
        accounts: accounts.to_account_metas(),
        data: params.pack()?,
    })
}
