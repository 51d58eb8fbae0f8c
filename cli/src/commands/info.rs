use anyhow::Result;
use clap::Args;
use solana_sdk::pubkey::Pubkey;
use squads_multisig_sdk::{
    accounts::{Multisig, Proposal},
    rpc::Rpc,
    utils::lamports_to_sol,
    MultisigClient, DEFAULT_VAULT_INDEX,
};
use std::fmt;

use crate::commands::DEFAULT_MULTISIG;
use crate::tx_utils;

/// How many of the newest transaction indices are probed for proposals.
pub const RECENT_TRANSACTIONS: u64 = 5;

#[derive(Debug, Args)]
pub struct InfoCommand {
    #[arg(help = "Multisig account address", default_value = DEFAULT_MULTISIG)]
    pub multisig: Pubkey,
}

#[derive(Debug)]
pub enum InfoReport {
    Found(MultisigInfo),
    // the multisig could not be read and nothing lives at the address
    Missing,
    // the multisig could not be read but an account exists there
    Unreadable {
        owner: Pubkey,
        data_len: usize,
        lamports: u64,
    },
}

#[derive(Debug)]
pub struct MultisigInfo {
    pub multisig: Multisig,
    pub vault: Pubkey,
    pub vault_balance: u64,
    // newest first, `None` when the proposal could not be fetched
    pub recent: Vec<(u64, Option<Proposal>)>,
}

impl InfoCommand {
    pub async fn run<R: Rpc>(&self, client: &MultisigClient<R>) -> Result<()> {
        println!("Multisig PDA: {}", self.multisig);
        println!();
        let report = query(client, &self.multisig).await?;
        print!("{report}");
        Ok(())
    }
}

/// Reads the multisig, its default vault and its latest proposals.
///
/// Failing to read the multisig is not an error: the account is probed instead
/// and what is found there is reported.
pub async fn query<R: Rpc>(client: &MultisigClient<R>, address: &Pubkey) -> Result<InfoReport> {
    match fetch_info(client, address).await {
        Ok(info) => Ok(InfoReport::Found(info)),
        Err(e) => {
            tx_utils::report_error(&e);
            tracing::warn!(%address, "multisig fetch failed, checking account existence");
            println!("\nChecking if account exists...");
            Ok(match client.account(address).await? {
                None => InfoReport::Missing,
                Some(account) => InfoReport::Unreadable {
                    owner: account.owner,
                    data_len: account.data.len(),
                    lamports: account.lamports,
                },
            })
        }
    }
}

async fn fetch_info<R: Rpc>(client: &MultisigClient<R>, address: &Pubkey) -> Result<MultisigInfo> {
    let multisig = client.multisig(address).await?;
    let vault = client.vault_pda(address, DEFAULT_VAULT_INDEX);
    let vault_balance = client.balance(&vault).await?;

    let mut recent = Vec::new();
    for index in multisig.recent_transaction_indices(RECENT_TRANSACTIONS) {
        let proposal = match client.proposal(address, index).await {
            Ok(proposal) => Some(proposal),
            Err(e) => {
                tracing::debug!(index, error = %e, "proposal not found");
                None
            }
        };
        recent.push((index, proposal));
    }

    Ok(MultisigInfo {
        multisig,
        vault,
        vault_balance,
        recent,
    })
}

impl fmt::Display for InfoReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InfoReport::Found(info) => write!(f, "{info}"),
            InfoReport::Missing => {
                writeln!(f, "Account does not exist at this address")?;
                writeln!(f, "  Make sure you're using the correct cluster and address")
            }
            InfoReport::Unreadable {
                owner,
                data_len,
                lamports,
            } => {
                writeln!(f, "Account exists")?;
                writeln!(f, "  Owner: {owner}")?;
                writeln!(f, "  Data length: {data_len} bytes")?;
                writeln!(f, "  Lamports: {lamports}")
            }
        }
    }
}

impl fmt::Display for MultisigInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ms = &self.multisig;
        writeln!(f, "Multisig Configuration:")?;
        writeln!(f, "  Threshold: {}", ms.threshold)?;
        writeln!(f, "  Time Lock: {} seconds", ms.time_lock)?;
        writeln!(f, "  Transaction Index: {}", ms.transaction_index)?;
        writeln!(f, "  Stale Transaction Index: {}", ms.stale_transaction_index)?;
        writeln!(f, "  Config Authority: {}", ms.config_authority)?;
        match &ms.rent_collector {
            Some(collector) => writeln!(f, "  Rent Collector: {collector}")?,
            None => writeln!(f, "  Rent Collector: None")?,
        }
        writeln!(f)?;

        writeln!(f, "Members: {}", ms.members.len())?;
        for (i, member) in ms.members.iter().enumerate() {
            writeln!(f, "  [{}] {}", i + 1, member.key)?;
            writeln!(f, "      Permissions: {}", member.permissions)?;
        }
        writeln!(f)?;

        writeln!(f, "Default Vault (Index {DEFAULT_VAULT_INDEX}):")?;
        writeln!(f, "  PDA: {}", self.vault)?;
        writeln!(f, "  Balance: {} SOL", lamports_to_sol(self.vault_balance))?;
        writeln!(f)?;

        writeln!(f, "Recent Transactions:")?;
        for (index, proposal) in &self.recent {
            match proposal {
                Some(p) => {
                    writeln!(f, "  Transaction #{index}:")?;
                    writeln!(f, "    Status: {}", p.status)?;
                    writeln!(f, "    Approved: {}", p.approved.len())?;
                    writeln!(f, "    Rejected: {}", p.rejected.len())?;
                    writeln!(f, "    Cancelled: {}", p.cancelled.len())?;
                }
                None => writeln!(f, "  Transaction #{index}: Not found")?,
            }
        }
        writeln!(f, "\nSuccessfully retrieved multisig information")
    }
}
