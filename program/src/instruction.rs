//! Instruction builders for clients and tests.

use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction, system_program, sysvar,
};
use spl_associated_token_account::{
    get_associated_token_address_with_program_id,
    instruction::create_associated_token_account_idempotent,
};

use crate::{
    state::{find_user_account_address, CreateSfArgs, StreamFlowInstruction},
    streamflow,
};

pub fn deposit(
    program_id: &Pubkey,
    sender: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
    amount: u64,
) -> Instruction {
    let sender_tokens = get_associated_token_address_with_program_id(sender, mint, token_program);
    let (deposit_account, _) = find_user_account_address(sender, program_id);
    let vault = get_associated_token_address_with_program_id(&deposit_account, mint, token_program);

    Instruction::new_with_borsh(
        *program_id,
        &StreamFlowInstruction::Deposit { amount },
        vec![
            AccountMeta::new(*sender, true),
            AccountMeta::new(sender_tokens, false),
            AccountMeta::new(deposit_account, false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(*token_program, false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

/// Streamflow parties of a stream. `Default` uses the public Streamflow
/// treasury as partner, i.e. no partner fees.
#[derive(Debug, Clone, Copy)]
pub struct StreamflowAccounts {
    pub treasury: Pubkey,
    pub withdrawor: Pubkey,
    pub partner: Pubkey,
    pub fee_oracle: Pubkey,
}

impl Default for StreamflowAccounts {
    fn default() -> Self {
        StreamflowAccounts {
            treasury: streamflow::TREASURY,
            withdrawor: streamflow::WITHDRAWOR,
            partner: streamflow::WITHDRAWOR,
            fee_oracle: streamflow::FEE_ORACLE,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn create_sf(
    program_id: &Pubkey,
    sender: &Pubkey,
    depositor: &Pubkey,
    metadata: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
    streamflow_accounts: &StreamflowAccounts,
    args: CreateSfArgs,
) -> Instruction {
    let ata = |owner: &Pubkey| get_associated_token_address_with_program_id(owner, mint, token_program);
    let (depositor_account, _) = find_user_account_address(depositor, program_id);
    let (escrow_tokens, _) = streamflow::find_escrow_address(metadata);

    Instruction::new_with_borsh(
        *program_id,
        &StreamFlowInstruction::CreateSf(args),
        vec![
            AccountMeta::new(*sender, true),
            AccountMeta::new(ata(sender), false),
            AccountMeta::new(*depositor, false),
            AccountMeta::new(ata(depositor), false),
            AccountMeta::new(depositor_account, false),
            AccountMeta::new(ata(&depositor_account), false),
            AccountMeta::new(*metadata, true),
            AccountMeta::new(escrow_tokens, false),
            AccountMeta::new(streamflow_accounts.treasury, false),
            AccountMeta::new(ata(&streamflow_accounts.treasury), false),
            AccountMeta::new(streamflow_accounts.withdrawor, false),
            AccountMeta::new(streamflow_accounts.partner, false),
            AccountMeta::new(ata(&streamflow_accounts.partner), false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(streamflow_accounts.fee_oracle, false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(streamflow::PROGRAM_ID, false),
            AccountMeta::new_readonly(*token_program, false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

/// Creates the payer's wrapped SOL account if needed, funds it with
/// `lamports` and syncs the token balance.
pub fn wrap_sol(payer: &Pubkey, lamports: u64) -> Result<Vec<Instruction>, ProgramError> {
    let mint = spl_token::native_mint::id();
    let account = get_associated_token_address_with_program_id(payer, &mint, &spl_token::id());
    Ok(vec![
        create_associated_token_account_idempotent(payer, payer, &mint, &spl_token::id()),
        system_instruction::transfer(payer, &account, lamports),
        spl_token::instruction::sync_native(&spl_token::id(), &account)?,
    ])
}
