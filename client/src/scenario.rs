//! The two end-to-end flows against a live cluster.

use solana_sdk::{
    instruction::Instruction,
    native_token::lamports_to_sol,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use stream_flow_demo::{
    instruction::{self, StreamflowAccounts},
    state::CreateSfArgs,
};
use tracing::{info, warn};

use crate::{error::Result, rpc::StreamFlowClient, transaction};

#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub depositor: Pubkey,
    pub name: String,
    pub start_time: u64,
    pub withdraw_frequency: u64,
}

/// Setup and deposit instructions for wrapping `wrap_lamports` of SOL and
/// depositing `amount` of it.
pub fn deposit_instructions(
    payer: &Pubkey,
    amount: u64,
    wrap_lamports: u64,
) -> Result<Vec<Instruction>> {
    let mut ixs = instruction::wrap_sol(payer, wrap_lamports)?;
    ixs.push(instruction::deposit(
        &stream_flow_demo::id(),
        payer,
        &spl_token::native_mint::id(),
        &spl_token::id(),
        amount,
    ));
    Ok(ixs)
}

/// Instruction creating a stream from the depositor's vault, with the
/// payer as sender and `metadata` as the new stream account.
pub fn create_stream_instruction(
    payer: &Pubkey,
    metadata: &Pubkey,
    request: &StreamRequest,
) -> Instruction {
    instruction::create_sf(
        &stream_flow_demo::id(),
        payer,
        &request.depositor,
        metadata,
        &spl_token::native_mint::id(),
        &spl_token::id(),
        &StreamflowAccounts::default(),
        CreateSfArgs::named(&request.name, request.start_time, request.withdraw_frequency),
    )
}

pub async fn log_balance(client: &StreamFlowClient) -> Result<u64> {
    let lamports = client.balance(&client.payer().pubkey()).await?;
    info!(
        wallet = %client.payer().pubkey(),
        sol = lamports_to_sol(lamports),
        "balance"
    );
    Ok(lamports)
}

pub async fn deposit(client: &StreamFlowClient, amount: u64, wrap_lamports: u64) -> Result<Signature> {
    log_balance(client).await?;

    let payer = client.payer().pubkey();
    let ixs = deposit_instructions(&payer, amount, wrap_lamports)?;
    let signature = client.send_with_payer(&ixs, &[]).await?;
    info!(%signature, amount, "deposit confirmed");

    log_balance(client).await?;
    Ok(signature)
}

/// Compiles, dual signs and submits the stream creation as a v0
/// transaction, then prints its logs.
pub async fn create_stream(client: &StreamFlowClient, request: &StreamRequest) -> Result<Signature> {
    log_balance(client).await?;

    let payer = client.payer();
    let metadata = Keypair::new();
    info!(metadata = %metadata.pubkey(), depositor = %request.depositor, "creating stream");

    let ix = create_stream_instruction(&payer.pubkey(), &metadata.pubkey(), request);
    let validity = client.latest_blockhash().await?;
    let tx = transaction::assemble(
        &payer.pubkey(),
        &[ix],
        validity.blockhash,
        &[payer, &metadata],
    )?;

    let signature = match client.submit_versioned(&tx).await {
        Ok(signature) => signature,
        Err(err) => {
            for line in err.logs() {
                warn!("{line}");
            }
            return Err(err);
        }
    };
    client
        .confirm(&signature, validity.last_valid_block_height)
        .await?;

    for line in client.transaction_logs(&signature).await? {
        info!("{line}");
    }
    log_balance(client).await?;
    Ok(signature)
}
