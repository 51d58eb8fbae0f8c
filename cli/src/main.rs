use anyhow::Result;
use clap::{error::ErrorKind, Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;
use squads_multisig_cli::commands::{info::InfoCommand, withdraw::WithdrawCommand};
use squads_multisig_cli::tx_utils;
use squads_multisig_sdk::{
    config::{Cluster, Config},
    MultisigClient,
};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "squads-multisig", version, about, long_about = None)]
struct App {
    #[arg(
        long,
        global = true,
        env = "SOLANA_CLUSTER",
        default_value = "devnet",
        help = "mainnet-beta, devnet, testnet, localhost or an RPC url"
    )]
    cluster: Cluster,
    #[arg(long, global = true, help = "Override the multisig program id")]
    program_id: Option<Pubkey>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(name = "info", about = "Show a multisig's configuration, vault and recent proposals")]
    Info(InfoCommand),
    #[command(name = "withdraw", about = "Withdraw SOL from the default vault through a proposal")]
    Withdraw(WithdrawCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let app = match App::try_parse() {
        Ok(app) => app,
        Err(e) => {
            // help and version are not failures; every other bad input exits 1
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
            let _ = e.print();
            return code;
        }
    };
    match run(app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tx_utils::report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(app: App) -> Result<()> {
    let config = Config::new(app.cluster).with_program_id(app.program_id);
    let client = MultisigClient::from_config(&config);

    match app.command {
        Commands::Info(cmd) => {
            println!("=== Multisig Info Query ===");
            println!("Cluster: {}", config.cluster);
            println!("Program ID: {}", config.program_id);
            cmd.run(&client).await
        }
        Commands::Withdraw(cmd) => {
            println!("=== Multisig Withdraw ===");
            println!("Cluster: {}", config.cluster);
            println!("Program ID: {}", config.program_id);
            cmd.run(&client).await.map(|_| ())
        }
    }
}
