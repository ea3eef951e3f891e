use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
};

use crate::error::{ClientError, Result};

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";
pub const DEFAULT_KEYPAIR: &str = "~/.config/solana/id.json";

#[derive(Debug, Parser)]
#[command(name = "stream-flow-demo", version, about = "Deposit and stream tokens through the StreamFlow demo program")]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// RPC endpoint of the ledger node.
    #[arg(long, env = "ANCHOR_PROVIDER_URL", default_value = DEFAULT_RPC_URL, global = true)]
    pub url: String,
    /// Fee payer keypair file.
    #[arg(long, env = "ANCHOR_WALLET", default_value = DEFAULT_KEYPAIR, global = true)]
    pub keypair: String,
    #[arg(long, default_value = "confirmed", value_parser = parse_commitment, global = true)]
    pub commitment: CommitmentConfig,
    #[arg(long, default_value_t = 500, global = true)]
    pub poll_interval_ms: u64,
    /// Pause before fetching logs of a landed transaction.
    #[arg(long, default_value_t = 2000, global = true)]
    pub settle_delay_ms: u64,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the payer's SOL balance.
    Balance,
    /// Wrap SOL and deposit it into the payer's vault.
    Deposit {
        /// Amount of wrapped SOL to deposit, in lamports.
        #[arg(long)]
        amount: u64,
        /// Lamports to wrap before depositing. Defaults to `amount`.
        #[arg(long)]
        wrap: Option<u64>,
    },
    /// Stream a depositor's vault back to them through Streamflow.
    CreateStream {
        #[arg(long, value_parser = Pubkey::from_str)]
        depositor: Pubkey,
        #[arg(long, default_value = "test stream")]
        name: String,
        #[arg(long, default_value_t = 0)]
        start_time: u64,
        #[arg(long, default_value_t = 1)]
        withdraw_frequency: u64,
    },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
    pub keypair_path: PathBuf,
    pub commitment: CommitmentConfig,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
}

impl From<&ConfigArgs> for ClientConfig {
    fn from(args: &ConfigArgs) -> Self {
        ClientConfig {
            url: args.url.clone(),
            keypair_path: expand_home(&args.keypair),
            commitment: args.commitment,
            poll_interval: Duration::from_millis(args.poll_interval_ms),
            settle_delay: Duration::from_millis(args.settle_delay_ms),
        }
    }
}

impl ClientConfig {
    pub fn load_keypair(&self) -> Result<Keypair> {
        read_keypair_file(&self.keypair_path).map_err(|e| ClientError::Keypair {
            path: self.keypair_path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

fn parse_commitment(s: &str) -> std::result::Result<CommitmentConfig, String> {
    CommitmentLevel::from_str(s)
        .map(|commitment| CommitmentConfig { commitment })
        .map_err(|_| format!("unknown commitment level `{s}`"))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_deposit() {
        let cli = Cli::try_parse_from([
            "stream-flow-demo",
            "--url",
            "http://localhost:8899",
            "--keypair",
            "/tmp/id.json",
            "deposit",
            "--amount",
            "100000000000",
        ])
        .unwrap();
        let config = ClientConfig::from(&cli.config);
        assert_eq!(config.url, "http://localhost:8899");
        assert_eq!(config.keypair_path, PathBuf::from("/tmp/id.json"));
        assert_eq!(config.commitment, CommitmentConfig::confirmed());
        assert!(matches!(
            cli.command,
            Command::Deposit {
                amount: 100_000_000_000,
                wrap: None
            }
        ));
    }

    #[test]
    fn test_parse_create_stream() {
        let depositor = Pubkey::new_unique();
        let cli = Cli::try_parse_from([
            "stream-flow-demo",
            "create-stream",
            "--depositor",
            &depositor.to_string(),
            "--commitment",
            "finalized",
        ])
        .unwrap();
        assert_eq!(cli.config.commitment, CommitmentConfig::finalized());
        match cli.command {
            Command::CreateStream {
                depositor: parsed,
                name,
                withdraw_frequency,
                ..
            } => {
                assert_eq!(parsed, depositor);
                assert_eq!(name, "test stream");
                assert_eq!(withdraw_frequency, 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_defaults_without_flags() {
        let cli = Cli::try_parse_from(["stream-flow-demo", "balance"]).unwrap();
        let config = ClientConfig::from(&cli.config);
        assert_eq!(config.commitment, CommitmentConfig::confirmed());
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.settle_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_rejects_unknown_commitment() {
        assert!(Cli::try_parse_from(["stream-flow-demo", "--commitment", "eventually", "balance"]).is_err());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/id.json"), PathBuf::from("/abs/id.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home("~/.config/solana/id.json"),
                home.join(".config/solana/id.json")
            );
        }
    }
}
