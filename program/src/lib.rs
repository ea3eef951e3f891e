use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;
pub mod streamflow;

solana_program::declare_id!("HDnWpNXm6nqJ3m3cZeQdaTWvMkCAXSkHLFN95CxaWz1S");

#[cfg(not(feature = "no-entrypoint"))]
solana_program::entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::process_instruction(program_id, accounts, instruction_data)
}
