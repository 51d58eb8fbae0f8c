use anyhow::{anyhow, Result};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::fmt;
use std::str::FromStr;

use crate::{LOCAL_PROGRAM_ID, SQUADS_PROGRAM_ID};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cluster {
    MainnetBeta,
    #[default]
    Devnet,
    Testnet,
    Localhost,
    // any http(s) endpoint, served by the production program
    Custom(String),
}

impl Cluster {
    pub fn url(&self) -> &str {
        match self {
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::Localhost => "http://127.0.0.1:8899",
            Cluster::Custom(url) => url,
        }
    }

    /// The local validator runs a test deployment of the program under its own id.
    pub fn program_id(&self) -> Pubkey {
        match self {
            Cluster::Localhost => LOCAL_PROGRAM_ID,
            _ => SQUADS_PROGRAM_ID,
        }
    }
}

impl FromStr for Cluster {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mainnet-beta" | "mainnet" => Ok(Cluster::MainnetBeta),
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "localhost" | "localnet" => Ok(Cluster::Localhost),
            url if url.starts_with("http://") || url.starts_with("https://") => {
                Ok(Cluster::Custom(url.to_string()))
            }
            other => Err(anyhow!(
                "Unknown cluster {other}, expected mainnet-beta, devnet, testnet, localhost or an RPC url"
            )),
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cluster::MainnetBeta => write!(f, "mainnet-beta"),
            Cluster::Devnet => write!(f, "devnet"),
            Cluster::Testnet => write!(f, "testnet"),
            Cluster::Localhost => write!(f, "localhost"),
            Cluster::Custom(url) => write!(f, "{url}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cluster: Cluster,
    pub rpc_url: String,
    pub program_id: Pubkey,
    pub commitment: CommitmentConfig,
}

impl Config {
    pub fn new(cluster: Cluster) -> Self {
        Self {
            rpc_url: cluster.url().to_string(),
            program_id: cluster.program_id(),
            commitment: CommitmentConfig::confirmed(),
            cluster,
        }
    }

    pub fn with_program_id(mut self, program_id: Option<Pubkey>) -> Self {
        if let Some(program_id) = program_id {
            self.program_id = program_id;
        }
        self
    }
}
