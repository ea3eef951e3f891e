use clap::Parser;
use solana_sdk::signer::Signer;
use stream_flow_demo_client::{
    config::{Cli, Command},
    scenario::{self, StreamRequest},
    ClientConfig, StreamFlowClient,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from(&cli.config);
    let payer = config.load_keypair()?;
    info!(url = %config.url, wallet = %payer.pubkey(), "connecting");
    let client = StreamFlowClient::new(&config, payer);

    let result = match cli.command {
        Command::Balance => scenario::log_balance(&client).await.map(|_| ()),
        Command::Deposit { amount, wrap } => scenario::deposit(&client, amount, wrap.unwrap_or(amount))
            .await
            .map(|signature| println!("{signature}")),
        Command::CreateStream {
            depositor,
            name,
            start_time,
            withdraw_frequency,
        } => {
            let request = StreamRequest {
                depositor,
                name,
                start_time,
                withdraw_frequency,
            };
            scenario::create_stream(&client, &request)
                .await
                .map(|signature| println!("{signature}"))
        }
    };

    if let Err(err) = &result {
        error!(%err, "command failed");
    }
    Ok(result?)
}
