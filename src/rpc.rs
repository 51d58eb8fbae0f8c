use anyhow::Result;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    account::Account,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};

/// The handful of node calls the client needs.
///
/// Implemented for the nonblocking `RpcClient`; anything else that can answer
/// these (e.g. an in-memory ledger) can stand in for it.
#[allow(async_fn_in_trait)]
pub trait Rpc {
    /// `None` when no account exists at `address`.
    async fn account(&self, address: &Pubkey) -> Result<Option<Account>>;

    async fn balance(&self, address: &Pubkey) -> Result<u64>;

    /// Signs with `payer` (fee payer and only signer), sends, and waits for confirmation.
    async fn send_and_confirm(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
    ) -> Result<Signature>;
}

impl Rpc for RpcClient {
    async fn account(&self, address: &Pubkey) -> Result<Option<Account>> {
        tracing::debug!(%address, "get_account");
        Ok(self
            .get_account_with_commitment(address, self.commitment())
            .await?
            .value)
    }

    async fn balance(&self, address: &Pubkey) -> Result<u64> {
        tracing::debug!(%address, "get_balance");
        Ok(self.get_balance(address).await?)
    }

    async fn send_and_confirm(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
    ) -> Result<Signature> {
        let blockhash = self.get_latest_blockhash().await?;
        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&payer.pubkey()),
            &[payer],
            blockhash,
        );
        let signature = self.send_and_confirm_transaction(&tx).await?;
        tracing::info!(%signature, "transaction confirmed");
        Ok(signature)
    }
}
