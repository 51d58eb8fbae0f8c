use anyhow::{anyhow, Result};
use clap::Args;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
};
use squads_multisig_sdk::{
    accounts::Permission,
    rpc::Rpc,
    utils::{lamports_to_sol, load_keypair, sol_to_lamports},
    MultisigClient, DEFAULT_VAULT_INDEX,
};
use std::path::PathBuf;

use crate::commands::DEFAULT_MULTISIG;
use crate::tx_utils;

#[derive(Debug, Args)]
pub struct WithdrawCommand {
    #[arg(help = "Multisig account address", default_value = DEFAULT_MULTISIG)]
    pub multisig: Pubkey,
    #[arg(help = "Recipient of the withdrawal (defaults to a fresh address)")]
    pub destination: Option<Pubkey>,
    #[arg(help = "Amount to withdraw in SOL", default_value_t = 0.1)]
    pub amount: f64,
    #[arg(
        long,
        env = "MEMBER_KEYPAIR_PATH",
        help = "Member keypair file (JSON array of secret key bytes)"
    )]
    pub keypair: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawRequest {
    pub multisig: Pubkey,
    pub destination: Pubkey,
    pub lamports: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawOutcome {
    // nothing was sent
    EmptyVault,
    // created and approved, waiting on other members
    AwaitingApprovals {
        transaction_index: u64,
        required: u16,
        current: usize,
    },
    Executed {
        transaction_index: u64,
        vault_balance: u64,
        destination_balance: u64,
    },
}

impl WithdrawCommand {
    pub async fn run<R: Rpc>(&self, client: &MultisigClient<R>) -> Result<WithdrawOutcome> {
        let path = self
            .keypair
            .as_ref()
            .ok_or(anyhow!("MEMBER_KEYPAIR_PATH environment variable not set"))?;
        let member = load_keypair(path)?;

        let request = WithdrawRequest {
            multisig: self.multisig,
            destination: self.destination.unwrap_or_else(|| Keypair::new().pubkey()),
            lamports: sol_to_lamports(self.amount)?,
        };

        println!("Multisig PDA: {}", request.multisig);
        println!("Member Public Key: {}", member.pubkey());
        println!("Destination: {}", request.destination);
        println!("Amount: {} SOL", self.amount);
        println!();

        withdraw(client, &member, &request).await
    }
}

/// Moves `request.lamports` out of the default vault through a proposal.
///
/// Steps are sent one after another and each waits for confirmation; a failure
/// leaves whatever was already created on chain.
pub async fn withdraw<R: Rpc>(
    client: &MultisigClient<R>,
    member: &Keypair,
    request: &WithdrawRequest,
) -> Result<WithdrawOutcome> {
    let multisig_pda = &request.multisig;
    let multisig = client.multisig(multisig_pda).await?;

    println!("Multisig Info:");
    println!("  Threshold: {}", multisig.threshold);
    println!("  Members: {}", multisig.members.len());
    println!("  Transaction Index: {}", multisig.transaction_index);
    println!();

    // the program has the final say, these only warn
    match multisig.member(&member.pubkey()) {
        None => {
            tracing::warn!(member = %member.pubkey(), "signer is not a member of this multisig");
        }
        Some(m)
            if !m.permissions.has(Permission::Initiate)
                || !m.permissions.has(Permission::Vote) =>
        {
            tracing::warn!(
                member = %member.pubkey(),
                permissions = %m.permissions,
                "signer lacks initiate or vote permission"
            );
        }
        Some(_) => {}
    }

    let vault = client.vault_pda(multisig_pda, DEFAULT_VAULT_INDEX);
    let vault_balance = client.balance(&vault).await?;
    println!("Vault PDA: {vault}");
    println!("  Vault Balance: {} SOL", lamports_to_sol(vault_balance));
    println!();

    if vault_balance == 0 {
        println!("Warning: Vault has no balance to withdraw!");
        return Ok(WithdrawOutcome::EmptyVault);
    }

    let transaction_index = multisig.next_transaction_index()?;
    println!("Transaction Index: {transaction_index}");

    let transfer = system_instruction::transfer(&vault, &request.destination, request.lamports);

    tx_utils::step(
        "Step 1: Creating vault transaction",
        "Transaction created",
        client.vault_transaction_create(
            multisig_pda,
            transaction_index,
            DEFAULT_VAULT_INDEX,
            &[transfer],
            Some(format!("Withdraw {} SOL", lamports_to_sol(request.lamports))),
            member,
        ),
    )
    .await?;

    tx_utils::step(
        "Step 2: Creating proposal",
        "Proposal created",
        client.proposal_create(multisig_pda, transaction_index, member),
    )
    .await?;

    println!("\nNote: You need {} approvals to execute", multisig.threshold);
    tx_utils::step(
        "Step 3: Approving proposal",
        &format!("Proposal approved (1/{})", multisig.threshold),
        client.proposal_approve(
            multisig_pda,
            transaction_index,
            member,
            Some("Approved".to_string()),
        ),
    )
    .await?;

    let proposal = client.proposal(multisig_pda, transaction_index).await?;
    println!("\nProposal Status:");
    println!("  Status: {}", proposal.status);
    println!("  Approved: {}", proposal.approved.len());
    println!("  Rejected: {}", proposal.rejected.len());
    println!("  Cancelled: {}", proposal.cancelled.len());

    if !proposal.status.is_approved() {
        println!("\nProposal needs more approvals before execution");
        println!("   Required: {}", multisig.threshold);
        println!("   Current: {}", proposal.approved.len());
        return Ok(WithdrawOutcome::AwaitingApprovals {
            transaction_index,
            required: multisig.threshold,
            current: proposal.approved.len(),
        });
    }

    tx_utils::step(
        "Step 4: Executing transaction",
        "Transaction executed",
        client.vault_transaction_execute(multisig_pda, transaction_index, member),
    )
    .await?;
    println!("\nWithdrawal completed successfully!");

    let vault_balance = client.balance(&vault).await?;
    let destination_balance = client.balance(&request.destination).await?;
    println!("\nFinal Balances:");
    println!("  Vault: {} SOL", lamports_to_sol(vault_balance));
    println!("  Destination: {} SOL", lamports_to_sol(destination_balance));

    Ok(WithdrawOutcome::Executed {
        transaction_index,
        vault_balance,
        destination_balance,
    })
}
