use solana_client::client_error::ClientError as RpcClientError;
use solana_sdk::{
    message::CompileError, program_error::ProgramError, pubkey::Pubkey, signature::Signature,
    signer::SignerError, transaction::TransactionError,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("rpc request failed: {0}")]
    Rpc(#[from] RpcClientError),
    /// The node refused the transaction before inclusion.
    #[error("transaction rejected: {message}")]
    Rejected { message: String, logs: Vec<String> },
    #[error("transaction {signature} failed: {error}")]
    TransactionFailed {
        signature: Signature,
        error: TransactionError,
    },
    #[error("transaction {signature} expired before confirmation")]
    Expired { signature: Signature },
    #[error("failed to compile message: {0}")]
    Compile(#[from] CompileError),
    #[error("message requires {required} signatures but lists {keys} keys")]
    MalformedMessage { required: usize, keys: usize },
    #[error("no signer for required account {0}")]
    MissingSigner(Pubkey),
    #[error("signer {0} is not required by the message")]
    UnexpectedSigner(Pubkey),
    #[error("signing failed: {0}")]
    Signing(#[from] SignerError),
    #[error("failed to read keypair {path}: {reason}")]
    Keypair { path: String, reason: String },
    #[error("failed to build instruction: {0}")]
    Instruction(#[from] ProgramError),
}

impl ClientError {
    /// Diagnostic log lines attached to the failure, if the node returned
    /// any.
    pub fn logs(&self) -> &[String] {
        match self {
            ClientError::Rejected { logs, .. } => logs,
            _ => &[],
        }
    }
}
