pub mod accounts;
pub mod config;
pub mod instructions;
pub mod message;
pub mod pda;
pub mod rpc;
pub mod utils;

use anyhow::{anyhow, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    account::Account,
    instruction::Instruction,
    pubkey,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use std::sync::Arc;

use crate::accounts::{Multisig, ProgramAccount, Proposal, VaultTransaction};
use crate::config::Config;
use crate::instructions::{ProposalCreateArgs, ProposalVoteArgs, VaultTransactionCreateArgs};
use crate::message::VaultTransactionMessage;
use crate::rpc::Rpc;

/// Squads v4 program on mainnet-beta, devnet and testnet.
pub const SQUADS_PROGRAM_ID: Pubkey = pubkey!("SQDS4ep65T869zMMBKyuUq6aD6EgTu8psMjkvj52pCf");
/// Test deployment used by the local validator.
pub const LOCAL_PROGRAM_ID: Pubkey = pubkey!("SMPL1JzvaVRmKLfqeuD6EfHxGtkC8HnVioC6HBnK3zg");

/// The vault every multisig gets by default.
pub const DEFAULT_VAULT_INDEX: u8 = 0;

pub struct MultisigClient<R = RpcClient> {
    rpc: Arc<R>,
    program_id: Pubkey,
}

impl<R> Clone for MultisigClient<R> {
    fn clone(&self) -> Self {
        Self {
            rpc: self.rpc.clone(),
            program_id: self.program_id,
        }
    }
}

impl MultisigClient<RpcClient> {
    // === Constructors ===

    pub fn from_config(config: &Config) -> Self {
        tracing::debug!(url = %config.rpc_url, program_id = %config.program_id, "connecting");
        Self::new_with_client(
            RpcClient::new_with_commitment(config.rpc_url.clone(), config.commitment),
            config.program_id,
        )
    }
}

impl<R: Rpc> MultisigClient<R> {
    pub fn new_with_client(rpc: R, program_id: Pubkey) -> Self {
        Self {
            rpc: Arc::new(rpc),
            program_id,
        }
    }

    // === Addresses ===

    pub fn vault_pda(&self, multisig: &Pubkey, vault_index: u8) -> Pubkey {
        pda::get_vault_pda(multisig, vault_index, &self.program_id).0
    }

    pub fn transaction_pda(&self, multisig: &Pubkey, transaction_index: u64) -> Pubkey {
        pda::get_transaction_pda(multisig, transaction_index, &self.program_id).0
    }

    pub fn proposal_pda(&self, multisig: &Pubkey, transaction_index: u64) -> Pubkey {
        pda::get_proposal_pda(multisig, transaction_index, &self.program_id).0
    }

    // === Accounts ===

    pub async fn account(&self, address: &Pubkey) -> Result<Option<Account>> {
        self.rpc.account(address).await
    }

    pub async fn balance(&self, address: &Pubkey) -> Result<u64> {
        self.rpc.balance(address).await
    }

    pub async fn multisig(&self, address: &Pubkey) -> Result<Multisig> {
        self.fetch_program_account(address).await
    }

    pub async fn proposal(&self, multisig: &Pubkey, transaction_index: u64) -> Result<Proposal> {
        self.fetch_program_account(&self.proposal_pda(multisig, transaction_index))
            .await
    }

    pub async fn vault_transaction(
        &self,
        multisig: &Pubkey,
        transaction_index: u64,
    ) -> Result<VaultTransaction> {
        self.fetch_program_account(&self.transaction_pda(multisig, transaction_index))
            .await
    }

    // === Transactions ===

    /// Stores `instructions` as a transaction to be run by vault `vault_index`.
    /// `creator` signs and pays rent.
    pub async fn vault_transaction_create(
        &self,
        multisig: &Pubkey,
        transaction_index: u64,
        vault_index: u8,
        instructions: &[Instruction],
        memo: Option<String>,
        creator: &Keypair,
    ) -> Result<Signature> {
        let vault = self.vault_pda(multisig, vault_index);
        let message = VaultTransactionMessage::compile(&vault, instructions)?;
        let args = VaultTransactionCreateArgs {
            vault_index,
            ephemeral_signers: 0,
            transaction_message: message.to_create_bytes()?,
            memo,
        };
        let ix = instructions::vault_transaction_create(
            multisig,
            &self.transaction_pda(multisig, transaction_index),
            &creator.pubkey(),
            &creator.pubkey(),
            &args,
            &self.program_id,
        )?;

        tracing::debug!(%multisig, transaction_index, "vault_transaction_create");
        self.rpc.send_and_confirm(&[ix], creator).await
    }

    pub async fn proposal_create(
        &self,
        multisig: &Pubkey,
        transaction_index: u64,
        creator: &Keypair,
    ) -> Result<Signature> {
        let ix = instructions::proposal_create(
            multisig,
            &self.proposal_pda(multisig, transaction_index),
            &creator.pubkey(),
            &creator.pubkey(),
            &ProposalCreateArgs {
                transaction_index,
                draft: false,
            },
            &self.program_id,
        )?;

        tracing::debug!(%multisig, transaction_index, "proposal_create");
        self.rpc.send_and_confirm(&[ix], creator).await
    }

    pub async fn proposal_approve(
        &self,
        multisig: &Pubkey,
        transaction_index: u64,
        member: &Keypair,
        memo: Option<String>,
    ) -> Result<Signature> {
        let ix = instructions::proposal_approve(
            multisig,
            &self.proposal_pda(multisig, transaction_index),
            &member.pubkey(),
            &ProposalVoteArgs { memo },
            &self.program_id,
        )?;

        tracing::debug!(%multisig, transaction_index, member = %member.pubkey(), "proposal_approve");
        self.rpc.send_and_confirm(&[ix], member).await
    }

    /// Executes an approved vault transaction; the stored message is fetched to
    /// assemble the accounts it touches.
    pub async fn vault_transaction_execute(
        &self,
        multisig: &Pubkey,
        transaction_index: u64,
        member: &Keypair,
    ) -> Result<Signature> {
        let transaction = self.vault_transaction(multisig, transaction_index).await?;
        let ix = instructions::vault_transaction_execute(
            multisig,
            &self.proposal_pda(multisig, transaction_index),
            &self.transaction_pda(multisig, transaction_index),
            &member.pubkey(),
            &transaction,
            &self.program_id,
        )?;

        tracing::debug!(%multisig, transaction_index, "vault_transaction_execute");
        self.rpc.send_and_confirm(&[ix], member).await
    }

    // === Getters ===

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    // === Helpers ===

    async fn fetch_program_account<T: ProgramAccount>(&self, address: &Pubkey) -> Result<T> {
        let account = self
            .rpc
            .account(address)
            .await?
            .ok_or(anyhow!("{} account not found {}", T::NAME, address))?;
        T::try_from_bytes(&account.data)
    }
}
