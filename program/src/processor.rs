use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program, sysvar,
    sysvar::Sysvar,
};
use spl_associated_token_account::{
    get_associated_token_address_with_program_id,
    instruction::create_associated_token_account_idempotent,
};
use spl_token_2022::{extension::StateWithExtensions, state::Mint};

use crate::{
    error::StreamFlowDemoError,
    state::{
        find_user_account_address, CreateSfArgs, StreamFlowInstruction, UserDepositAccount,
        USER_ACCOUNT_SEED,
    },
    streamflow::{self, CreateAccounts, CreateStreamParams},
};
use borsh::{BorshDeserialize, BorshSerialize};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = StreamFlowInstruction::try_from_slice(instruction_data)
        .map_err(|_| ProgramError::InvalidInstructionData)?;

    match instruction {
        StreamFlowInstruction::Deposit { amount } => process_deposit(program_id, accounts, amount),
        StreamFlowInstruction::CreateSf(args) => process_create_sf(program_id, accounts, args),
    }
}

fn process_deposit(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let sender = next_account_info(accounts_iter)?;
    let sender_tokens = next_account_info(accounts_iter)?;
    let deposit_info = next_account_info(accounts_iter)?;
    let vault = next_account_info(accounts_iter)?;
    let mint = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;
    let ata_program = next_account_info(accounts_iter)?;
    let system = next_account_info(accounts_iter)?;

    if amount == 0 {
        return Err(StreamFlowDemoError::InvalidAmount.into());
    }
    if !sender.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    check_programs(token_program, ata_program, system)?;

    let (expected_pda, bump) = find_user_account_address(sender.key, program_id);
    if expected_pda != *deposit_info.key {
        return Err(StreamFlowDemoError::InvalidPda.into());
    }
    check_associated_account(sender_tokens, sender.key, mint.key, token_program.key)?;
    check_associated_account(vault, deposit_info.key, mint.key, token_program.key)?;

    let mut deposit = if deposit_info.data_is_empty() && *deposit_info.owner == system_program::id()
    {
        create_deposit_account(program_id, sender, deposit_info, system, bump)?;
        msg!("Deposit account created for {}", sender.key);
        UserDepositAccount::new(*sender.key, bump)
    } else {
        load_deposit_account(program_id, deposit_info, sender.key)?
    };

    create_associated_account(sender, vault, deposit_info, mint, system, token_program, ata_program)?;

    let decimals = mint_decimals(mint, token_program.key)?;
    invoke(
        &spl_token_2022::instruction::transfer_checked(
            token_program.key,
            sender_tokens.key,
            mint.key,
            vault.key,
            sender.key,
            &[],
            amount,
            decimals,
        )?,
        &[
            sender_tokens.clone(),
            mint.clone(),
            vault.clone(),
            sender.clone(),
            token_program.clone(),
        ],
    )?;

    deposit.amount = deposit
        .amount
        .checked_add(amount)
        .ok_or(StreamFlowDemoError::AmountOverflow)?;
    deposit.serialize(&mut &mut deposit_info.data.borrow_mut()[..])?;

    msg!("Deposited {} tokens, balance={}", amount, deposit.amount);
    Ok(())
}

fn process_create_sf(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: CreateSfArgs,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let sender = next_account_info(accounts_iter)?;
    let sender_tokens = next_account_info(accounts_iter)?;
    let depositor = next_account_info(accounts_iter)?;
    let depositor_tokens = next_account_info(accounts_iter)?;
    let depositor_info = next_account_info(accounts_iter)?;
    let depositor_vault = next_account_info(accounts_iter)?;
    let metadata = next_account_info(accounts_iter)?;
    let escrow_tokens = next_account_info(accounts_iter)?;
    let treasury = next_account_info(accounts_iter)?;
    let treasury_tokens = next_account_info(accounts_iter)?;
    let withdrawor = next_account_info(accounts_iter)?;
    let partner = next_account_info(accounts_iter)?;
    let partner_tokens = next_account_info(accounts_iter)?;
    let mint = next_account_info(accounts_iter)?;
    let fee_oracle = next_account_info(accounts_iter)?;
    let rent = next_account_info(accounts_iter)?;
    let streamflow_program = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;
    let ata_program = next_account_info(accounts_iter)?;
    let system = next_account_info(accounts_iter)?;

    if !sender.is_signer || !metadata.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    check_programs(token_program, ata_program, system)?;
    if !sysvar::rent::check_id(rent.key) {
        return Err(ProgramError::InvalidArgument);
    }
    if *streamflow_program.key != streamflow::PROGRAM_ID {
        return Err(StreamFlowDemoError::InvalidStreamflowProgram.into());
    }
    if streamflow::find_escrow_address(metadata.key).0 != *escrow_tokens.key {
        return Err(StreamFlowDemoError::InvalidEscrow.into());
    }

    let (expected_pda, _) = find_user_account_address(depositor.key, program_id);
    if expected_pda != *depositor_info.key {
        return Err(StreamFlowDemoError::InvalidPda.into());
    }
    let mut deposit = load_deposit_account(program_id, depositor_info, depositor.key)?;
    if deposit.amount == 0 {
        return Err(StreamFlowDemoError::NothingDeposited.into());
    }

    check_associated_account(sender_tokens, sender.key, mint.key, token_program.key)?;
    check_associated_account(depositor_tokens, depositor.key, mint.key, token_program.key)?;
    check_associated_account(depositor_vault, depositor_info.key, mint.key, token_program.key)?;
    check_associated_account(treasury_tokens, treasury.key, mint.key, token_program.key)?;
    check_associated_account(partner_tokens, partner.key, mint.key, token_program.key)?;

    for (tokens, owner) in [
        (sender_tokens, sender),
        (depositor_tokens, depositor),
        (treasury_tokens, treasury),
        (partner_tokens, partner),
    ] {
        create_associated_account(sender, tokens, owner, mint, system, token_program, ata_program)?;
    }

    let amount = deposit.amount;
    msg!("Transfer {} tokens to sender tokens {}", amount, sender_tokens.key);
    let decimals = mint_decimals(mint, token_program.key)?;
    invoke_signed(
        &spl_token_2022::instruction::transfer_checked(
            token_program.key,
            depositor_vault.key,
            mint.key,
            sender_tokens.key,
            depositor_info.key,
            &[],
            amount,
            decimals,
        )?,
        &[
            depositor_vault.clone(),
            mint.clone(),
            sender_tokens.clone(),
            depositor_info.clone(),
            token_program.clone(),
        ],
        &[&[USER_ACCOUNT_SEED, depositor.key.as_ref(), &[deposit.bump]]],
    )?;

    deposit.amount = 0;
    deposit.serialize(&mut &mut depositor_info.data.borrow_mut()[..])?;

    let net = streamflow::net_amount(amount);
    let params = CreateStreamParams::single_period(&args, net);
    let create_accounts = CreateAccounts {
        sender: *sender.key,
        sender_tokens: *sender_tokens.key,
        recipient: *depositor.key,
        metadata: *metadata.key,
        escrow_tokens: *escrow_tokens.key,
        recipient_tokens: *depositor_tokens.key,
        streamflow_treasury: *treasury.key,
        streamflow_treasury_tokens: *treasury_tokens.key,
        withdrawor: *withdrawor.key,
        partner: *partner.key,
        partner_tokens: *partner_tokens.key,
        mint: *mint.key,
        fee_oracle: *fee_oracle.key,
        rent: *rent.key,
        timelock_program: *streamflow_program.key,
        token_program: *token_program.key,
        associated_token_program: *ata_program.key,
        system_program: *system.key,
    };

    msg!("Invoking streamflow create: net_amount={}", net);
    invoke(
        &streamflow::create(&create_accounts, &params)?,
        &[
            sender.clone(),
            sender_tokens.clone(),
            depositor.clone(),
            metadata.clone(),
            escrow_tokens.clone(),
            depositor_tokens.clone(),
            treasury.clone(),
            treasury_tokens.clone(),
            withdrawor.clone(),
            partner.clone(),
            partner_tokens.clone(),
            mint.clone(),
            fee_oracle.clone(),
            rent.clone(),
            streamflow_program.clone(),
            token_program.clone(),
            ata_program.clone(),
            system.clone(),
        ],
    )?;

    msg!("Stream created for {}", depositor.key);
    Ok(())
}

fn check_programs(
    token_program: &AccountInfo,
    ata_program: &AccountInfo,
    system: &AccountInfo,
) -> ProgramResult {
    spl_token_2022::check_spl_token_program_account(token_program.key)?;
    if *ata_program.key != spl_associated_token_account::id()
        || *system.key != system_program::id()
    {
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

fn check_associated_account(
    account: &AccountInfo,
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> ProgramResult {
    if get_associated_token_address_with_program_id(owner, mint, token_program) != *account.key {
        return Err(StreamFlowDemoError::InvalidAssociatedAccount.into());
    }
    Ok(())
}

fn load_deposit_account(
    program_id: &Pubkey,
    deposit_info: &AccountInfo,
    owner: &Pubkey,
) -> Result<UserDepositAccount, ProgramError> {
    if deposit_info.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }
    let deposit = UserDepositAccount::try_from_slice(&deposit_info.data.borrow())?;
    if deposit.owner != *owner {
        return Err(StreamFlowDemoError::OwnerMismatch.into());
    }
    Ok(deposit)
}

/// Creates the deposit PDA owned by this program. An address that already
/// holds lamports cannot go through `create_account`, so it is topped up to
/// rent exemption and then allocated and assigned in place.
fn create_deposit_account<'a>(
    program_id: &Pubkey,
    sender: &AccountInfo<'a>,
    deposit_info: &AccountInfo<'a>,
    system: &AccountInfo<'a>,
    bump: u8,
) -> ProgramResult {
    let space = UserDepositAccount::LEN;
    let required = Rent::get()?.minimum_balance(space);
    let seeds: &[&[u8]] = &[USER_ACCOUNT_SEED, sender.key.as_ref(), &[bump]];

    let current = deposit_info.lamports();
    if current == 0 {
        return invoke_signed(
            &system_instruction::create_account(
                sender.key,
                deposit_info.key,
                required,
                space as u64,
                program_id,
            ),
            &[sender.clone(), deposit_info.clone(), system.clone()],
            &[seeds],
        );
    }

    let shortfall = required.saturating_sub(current);
    if shortfall > 0 {
        invoke(
            &system_instruction::transfer(sender.key, deposit_info.key, shortfall),
            &[sender.clone(), deposit_info.clone(), system.clone()],
        )?;
    }
    invoke_signed(
        &system_instruction::allocate(deposit_info.key, space as u64),
        &[deposit_info.clone(), system.clone()],
        &[seeds],
    )?;
    invoke_signed(
        &system_instruction::assign(deposit_info.key, program_id),
        &[deposit_info.clone(), system.clone()],
        &[seeds],
    )
}

fn create_associated_account<'a>(
    payer: &AccountInfo<'a>,
    account: &AccountInfo<'a>,
    owner: &AccountInfo<'a>,
    mint: &AccountInfo<'a>,
    system: &AccountInfo<'a>,
    token_program: &AccountInfo<'a>,
    ata_program: &AccountInfo<'a>,
) -> ProgramResult {
    invoke(
        &create_associated_token_account_idempotent(
            payer.key,
            owner.key,
            mint.key,
            token_program.key,
        ),
        &[
            payer.clone(),
            account.clone(),
            owner.clone(),
            mint.clone(),
            system.clone(),
            token_program.clone(),
            ata_program.clone(),
        ],
    )
}

fn mint_decimals(mint: &AccountInfo, token_program: &Pubkey) -> Result<u8, ProgramError> {
    if mint.owner != token_program {
        return Err(ProgramError::IncorrectProgramId);
    }
    let data = mint.data.borrow();
    let state = StateWithExtensions::<Mint>::unpack(&data)?;
    Ok(state.base.decimals)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::instruction::{self, StreamflowAccounts};
    use solana_program::{clock::Epoch, instruction::Instruction};

    /// Owned backing storage for one `AccountInfo`.
    struct TestAccount {
        key: Pubkey,
        is_signer: bool,
        is_writable: bool,
        lamports: u64,
        data: Vec<u8>,
        owner: Pubkey,
    }

    impl TestAccount {
        fn info(&mut self) -> AccountInfo<'_> {
            AccountInfo::new(
                &self.key,
                self.is_signer,
                self.is_writable,
                &mut self.lamports,
                &mut self.data,
                &self.owner,
                false,
                Epoch::default(),
            )
        }
    }

    /// Backing accounts for every meta of `ix`, all owned by the system
    /// program and empty.
    fn accounts_for(ix: &Instruction) -> Vec<TestAccount> {
        ix.accounts
            .iter()
            .map(|meta| TestAccount {
                key: meta.pubkey,
                is_signer: meta.is_signer,
                is_writable: meta.is_writable,
                lamports: 0,
                data: vec![],
                owner: system_program::id(),
            })
            .collect()
    }

    fn run(program_id: &Pubkey, ix: &Instruction, accounts: &mut [TestAccount]) -> ProgramResult {
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(|a| a.info()).collect();
        process_instruction(program_id, &infos, &ix.data)
    }

    fn deposit_ix(sender: &Pubkey, amount: u64) -> Instruction {
        instruction::deposit(
            &crate::id(),
            sender,
            &spl_token::native_mint::id(),
            &spl_token::id(),
            amount,
        )
    }

    fn create_sf_ix(sender: &Pubkey, depositor: &Pubkey) -> Instruction {
        instruction::create_sf(
            &crate::id(),
            sender,
            depositor,
            &Pubkey::new_unique(),
            &spl_token::native_mint::id(),
            &spl_token::id(),
            &StreamflowAccounts::default(),
            CreateSfArgs::named("test stream", 0, 1),
        )
    }

    fn stored_deposit(owner: Pubkey, amount: u64) -> Vec<u8> {
        let (_, bump) = find_user_account_address(&owner, &crate::id());
        borsh::to_vec(&UserDepositAccount {
            owner,
            amount,
            bump,
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_instruction_data() {
        let ix = deposit_ix(&Pubkey::new_unique(), 1);
        let mut accounts = accounts_for(&ix);
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(|a| a.info()).collect();
        assert_eq!(
            process_instruction(&crate::id(), &infos, &[9, 9]),
            Err(ProgramError::InvalidInstructionData)
        );
    }

    #[test]
    fn test_deposit_zero_amount() {
        let ix = deposit_ix(&Pubkey::new_unique(), 0);
        let mut accounts = accounts_for(&ix);
        assert_eq!(
            run(&crate::id(), &ix, &mut accounts),
            Err(StreamFlowDemoError::InvalidAmount.into())
        );
    }

    #[test]
    fn test_deposit_requires_signer() {
        let ix = deposit_ix(&Pubkey::new_unique(), 10);
        let mut accounts = accounts_for(&ix);
        accounts[0].is_signer = false;
        assert_eq!(
            run(&crate::id(), &ix, &mut accounts),
            Err(ProgramError::MissingRequiredSignature)
        );
    }

    #[test]
    fn test_deposit_rejects_foreign_pda() {
        let ix = deposit_ix(&Pubkey::new_unique(), 10);
        let mut accounts = accounts_for(&ix);
        accounts[2].key = Pubkey::new_unique();
        assert_eq!(
            run(&crate::id(), &ix, &mut accounts),
            Err(StreamFlowDemoError::InvalidPda.into())
        );
    }

    #[test]
    fn test_deposit_rejects_wrong_vault() {
        let ix = deposit_ix(&Pubkey::new_unique(), 10);
        let mut accounts = accounts_for(&ix);
        accounts[3].key = Pubkey::new_unique();
        assert_eq!(
            run(&crate::id(), &ix, &mut accounts),
            Err(StreamFlowDemoError::InvalidAssociatedAccount.into())
        );
    }

    #[test]
    fn test_deposit_rejects_unknown_token_program() {
        let ix = deposit_ix(&Pubkey::new_unique(), 10);
        let mut accounts = accounts_for(&ix);
        accounts[5].key = Pubkey::new_unique();
        assert_eq!(
            run(&crate::id(), &ix, &mut accounts),
            Err(ProgramError::IncorrectProgramId)
        );
    }

    #[test]
    fn test_deposit_rejects_other_owner() {
        let sender = Pubkey::new_unique();
        let ix = deposit_ix(&sender, 10);
        let mut accounts = accounts_for(&ix);
        accounts[2].owner = crate::id();
        accounts[2].data = stored_deposit(Pubkey::new_unique(), 5);
        assert_eq!(
            run(&crate::id(), &ix, &mut accounts),
            Err(StreamFlowDemoError::OwnerMismatch.into())
        );
    }

    #[test]
    fn test_create_sf_requires_metadata_signature() {
        let ix = create_sf_ix(&Pubkey::new_unique(), &Pubkey::new_unique());
        let mut accounts = accounts_for(&ix);
        accounts[6].is_signer = false;
        assert_eq!(
            run(&crate::id(), &ix, &mut accounts),
            Err(ProgramError::MissingRequiredSignature)
        );
    }

    #[test]
    fn test_create_sf_rejects_wrong_streamflow_program() {
        let ix = create_sf_ix(&Pubkey::new_unique(), &Pubkey::new_unique());
        let mut accounts = accounts_for(&ix);
        accounts[16].key = Pubkey::new_unique();
        assert_eq!(
            run(&crate::id(), &ix, &mut accounts),
            Err(StreamFlowDemoError::InvalidStreamflowProgram.into())
        );
    }

    #[test]
    fn test_create_sf_rejects_wrong_escrow() {
        let ix = create_sf_ix(&Pubkey::new_unique(), &Pubkey::new_unique());
        let mut accounts = accounts_for(&ix);
        accounts[7].key = Pubkey::new_unique();
        assert_eq!(
            run(&crate::id(), &ix, &mut accounts),
            Err(StreamFlowDemoError::InvalidEscrow.into())
        );
    }

    #[test]
    fn test_create_sf_uninitialized_depositor() {
        let ix = create_sf_ix(&Pubkey::new_unique(), &Pubkey::new_unique());
        let mut accounts = accounts_for(&ix);
        assert_eq!(
            run(&crate::id(), &ix, &mut accounts),
            Err(ProgramError::IncorrectProgramId)
        );
    }

    #[test]
    fn test_create_sf_nothing_deposited() {
        let depositor = Pubkey::new_unique();
        let ix = create_sf_ix(&Pubkey::new_unique(), &depositor);
        let mut accounts = accounts_for(&ix);
        accounts[4].owner = crate::id();
        accounts[4].data = stored_deposit(depositor, 0);
        assert_eq!(
            run(&crate::id(), &ix, &mut accounts),
            Err(StreamFlowDemoError::NothingDeposited.into())
        );
    }
}
