use std::time::Duration;

use solana_client::{
    client_error::{ClientError as RpcClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_config::RpcTransactionConfig,
    rpc_request::{RpcError, RpcResponseErrorData},
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::{Transaction, VersionedTransaction},
};
use solana_transaction_status::UiTransactionEncoding;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::ClientConfig,
    error::{ClientError, Result},
};

/// A recent blockhash with the last block height at which transactions
/// referencing it can still land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

pub struct StreamFlowClient {
    rpc: RpcClient,
    payer: Keypair,
    commitment: CommitmentConfig,
    poll_interval: Duration,
    settle_delay: Duration,
}

impl StreamFlowClient {
    pub fn new(config: &ClientConfig, payer: Keypair) -> Self {
        let rpc = RpcClient::new_with_commitment(config.url.clone(), config.commitment);
        Self::with_rpc(rpc, config, payer)
    }

    /// Wraps an already built RPC client. `config.url` is ignored.
    pub fn with_rpc(rpc: RpcClient, config: &ClientConfig, payer: Keypair) -> Self {
        StreamFlowClient {
            rpc,
            payer,
            commitment: config.commitment,
            poll_interval: config.poll_interval,
            settle_delay: config.settle_delay,
        }
    }

    pub fn payer(&self) -> &Keypair {
        &self.payer
    }

    pub async fn balance(&self, address: &Pubkey) -> Result<u64> {
        Ok(self.rpc.get_balance(address).await?)
    }

    pub async fn latest_blockhash(&self) -> Result<Validity> {
        let (blockhash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(self.commitment)
            .await?;
        Ok(Validity {
            blockhash,
            last_valid_block_height,
        })
    }

    /// Signs `instructions` with the payer and `extra_signers` into a legacy
    /// transaction, sends it and waits for confirmation.
    #[instrument(skip_all, fields(instructions = instructions.len()))]
    pub async fn send_with_payer(
        &self,
        instructions: &[Instruction],
        extra_signers: &[&Keypair],
    ) -> Result<Signature> {
        let validity = self.latest_blockhash().await?;
        let mut signers: Vec<&Keypair> = vec![&self.payer];
        signers.extend_from_slice(extra_signers);
        let mut tx = Transaction::new_with_payer(instructions, Some(&self.payer.pubkey()));
        tx.try_sign(&signers[..], validity.blockhash)?;
        let signature = self
            .rpc
            .send_transaction(&tx)
            .await
            .map_err(rejected_or_rpc)?;
        self.confirm(&signature, validity.last_valid_block_height)
            .await?;
        Ok(signature)
    }

    #[instrument(skip_all, fields(signatures = tx.signatures.len()))]
    pub async fn submit_versioned(&self, tx: &VersionedTransaction) -> Result<Signature> {
        let signature = self
            .rpc
            .send_transaction(tx)
            .await
            .map_err(rejected_or_rpc)?;
        info!(%signature, "transaction submitted");
        Ok(signature)
    }

    /// Polls the signature status until it lands, fails, or the block
    /// height passes `last_valid_block_height`.
    #[instrument(skip(self))]
    pub async fn confirm(&self, signature: &Signature, last_valid_block_height: u64) -> Result<()> {
        loop {
            match self.rpc.get_signature_status(signature).await? {
                Some(Ok(())) => {
                    info!("transaction confirmed");
                    return Ok(());
                }
                Some(Err(error)) => {
                    return Err(ClientError::TransactionFailed {
                        signature: *signature,
                        error,
                    })
                }
                None => {}
            }

            let height = self.rpc.get_block_height().await?;
            if height > last_valid_block_height {
                warn!(height, last_valid_block_height, "blockhash expired");
                return Err(ClientError::Expired {
                    signature: *signature,
                });
            }
            debug!(height, "waiting for confirmation");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Log lines of a landed transaction. Waits the settle delay first so
    /// the node has the transaction indexed.
    pub async fn transaction_logs(&self, signature: &Signature) -> Result<Vec<String>> {
        tokio::time::sleep(self.settle_delay).await;
        let tx = self
            .rpc
            .get_transaction_with_config(
                signature,
                RpcTransactionConfig {
                    encoding: Some(UiTransactionEncoding::Json),
                    commitment: Some(self.commitment),
                    max_supported_transaction_version: Some(0),
                },
            )
            .await?;
        Ok(tx
            .transaction
            .meta
            .and_then(|meta| Option::<Vec<String>>::from(meta.log_messages))
            .unwrap_or_default())
    }
}

/// Preflight log lines attached to a rejected submission.
pub fn rejection_logs(err: &RpcClientError) -> Option<&[String]> {
    match err.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError {
            data: RpcResponseErrorData::SendTransactionPreflightFailure(result),
            ..
        }) => result.logs.as_deref(),
        _ => None,
    }
}

fn rejected_or_rpc(err: RpcClientError) -> ClientError {
    match rejection_logs(&err) {
        Some(logs) => ClientError::Rejected {
            message: err.to_string(),
            logs: logs.to_vec(),
        },
        None => ClientError::Rpc(err),
    }
}
