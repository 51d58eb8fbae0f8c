use anyhow::{anyhow, Result};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

use crate::accounts::VaultTransaction;
use crate::pda;
use crate::utils::discriminator;

pub const VAULT_TRANSACTION_CREATE: &str = "vault_transaction_create";
pub const PROPOSAL_CREATE: &str = "proposal_create";
pub const PROPOSAL_APPROVE: &str = "proposal_approve";
pub const VAULT_TRANSACTION_EXECUTE: &str = "vault_transaction_execute";

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct VaultTransactionCreateArgs {
    pub vault_index: u8,
    pub ephemeral_signers: u8,
    // encoded with `VaultTransactionMessage::to_create_bytes`
    pub transaction_message: Vec<u8>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ProposalCreateArgs {
    pub transaction_index: u64,
    pub draft: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ProposalVoteArgs {
    pub memo: Option<String>,
}

fn instruction_data<T: BorshSerialize>(name: &str, args: &T) -> Result<Vec<u8>> {
    let mut data = discriminator("global", name).to_vec();
    args.serialize(&mut data)?;
    Ok(data)
}

pub fn vault_transaction_create(
    multisig: &Pubkey,
    transaction: &Pubkey,
    creator: &Pubkey,
    rent_payer: &Pubkey,
    args: &VaultTransactionCreateArgs,
    program_id: &Pubkey,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*multisig, false),
            AccountMeta::new(*transaction, false),
            AccountMeta::new_readonly(*creator, true),
            AccountMeta::new(*rent_payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: instruction_data(VAULT_TRANSACTION_CREATE, args)?,
    })
}

pub fn proposal_create(
    multisig: &Pubkey,
    proposal: &Pubkey,
    creator: &Pubkey,
    rent_payer: &Pubkey,
    args: &ProposalCreateArgs,
    program_id: &Pubkey,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*multisig, false),
            AccountMeta::new(*proposal, false),
            AccountMeta::new_readonly(*creator, true),
            AccountMeta::new(*rent_payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: instruction_data(PROPOSAL_CREATE, args)?,
    })
}

pub fn proposal_approve(
    multisig: &Pubkey,
    proposal: &Pubkey,
    member: &Pubkey,
    args: &ProposalVoteArgs,
    program_id: &Pubkey,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*multisig, false),
            AccountMeta::new(*member, true),
            AccountMeta::new(*proposal, false),
        ],
        data: instruction_data(PROPOSAL_APPROVE, args)?,
    })
}

/// Builds the execute instruction for a stored vault transaction.
///
/// The message's account keys are appended as remaining accounts. The vault and
/// ephemeral signers are PDAs signed for by the program, so they are passed as
/// non-signers.
pub fn vault_transaction_execute(
    multisig: &Pubkey,
    proposal: &Pubkey,
    transaction_pda: &Pubkey,
    member: &Pubkey,
    transaction: &VaultTransaction,
    program_id: &Pubkey,
) -> Result<Instruction> {
    let message = &transaction.message;
    if !message.address_table_lookups.is_empty() {
        return Err(anyhow!("Address lookup tables are not supported"));
    }

    let (vault, _) = pda::get_vault_pda(multisig, transaction.vault_index, program_id);
    let ephemeral_signers: Vec<Pubkey> = (0..transaction.ephemeral_signer_bumps.len())
        .map(|i| pda::get_ephemeral_signer_pda(transaction_pda, i as u8, program_id).0)
        .collect();

    let mut accounts = vec![
        AccountMeta::new_readonly(*multisig, false),
        AccountMeta::new(*proposal, false),
        AccountMeta::new_readonly(*transaction_pda, false),
        AccountMeta::new_readonly(*member, true),
    ];

    for (index, key) in message.account_keys.iter().enumerate() {
        let is_pda_signer = *key == vault || ephemeral_signers.contains(key);
        let is_signer = message.is_signer_index(index) && !is_pda_signer;
        accounts.push(if message.is_static_writable_index(index) {
            AccountMeta::new(*key, is_signer)
        } else {
            AccountMeta::new_readonly(*key, is_signer)
        });
    }

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: discriminator("global", VAULT_TRANSACTION_EXECUTE).to_vec(),
    })
}
