//! Manual assembly of signed v0 transactions.

use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::Signature,
    signer::Signer,
    transaction::VersionedTransaction,
};
use tracing::debug;

use crate::error::{ClientError, Result};

/// Compiles `instructions` into a v0 message paid by `payer`.
pub fn compile_message(
    payer: &Pubkey,
    instructions: &[Instruction],
    recent_blockhash: Hash,
) -> Result<VersionedMessage> {
    let message = v0::Message::try_compile(payer, instructions, &[], recent_blockhash)?;
    Ok(VersionedMessage::V0(message))
}

/// Signs the serialized `message` with one signer per required signature,
/// in the order the message lists its signing keys.
pub fn sign_message(
    message: VersionedMessage,
    signers: &[&dyn Signer],
) -> Result<VersionedTransaction> {
    let required = usize::from(message.header().num_required_signatures);
    let keys = message.static_account_keys();
    let signing_keys = keys
        .get(..required)
        .ok_or(ClientError::MalformedMessage {
            required,
            keys: keys.len(),
        })?;

    if let Some(extra) = signers
        .iter()
        .map(|signer| signer.pubkey())
        .find(|key| !signing_keys.contains(key))
    {
        return Err(ClientError::UnexpectedSigner(extra));
    }

    let bytes = message.serialize();
    let signatures = signing_keys
        .iter()
        .map(|key| -> Result<Signature> {
            let signer = signers
                .iter()
                .find(|signer| signer.pubkey() == *key)
                .ok_or(ClientError::MissingSigner(*key))?;
            Ok(signer.try_sign_message(&bytes)?)
        })
        .collect::<Result<Vec<Signature>>>()?;

    debug!(signatures = signatures.len(), bytes = bytes.len(), "signed message");
    Ok(VersionedTransaction {
        signatures,
        message,
    })
}

pub fn assemble(
    payer: &Pubkey,
    instructions: &[Instruction],
    recent_blockhash: Hash,
    signers: &[&dyn Signer],
) -> Result<VersionedTransaction> {
    let message = compile_message(payer, instructions, recent_blockhash)?;
    sign_message(message, signers)
}
