#![allow(dead_code)]

use anyhow::{anyhow, Result};
use borsh::BorshDeserialize;
use solana_sdk::{
    account::Account,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{write_keypair_file, Keypair, Signature, Signer},
    system_program,
};
use squads_multisig_sdk::{
    accounts::{Member, Multisig, Permissions, ProgramAccount, Proposal, ProposalStatus, VaultTransaction},
    instructions::{
        ProposalCreateArgs, ProposalVoteArgs, VaultTransactionCreateArgs, PROPOSAL_APPROVE,
        PROPOSAL_CREATE, VAULT_TRANSACTION_CREATE, VAULT_TRANSACTION_EXECUTE,
    },
    message::VaultTransactionMessage,
    pda,
    rpc::Rpc,
    utils::discriminator,
    MultisigClient, SQUADS_PROGRAM_ID,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// In-memory ledger that plays the multisig program for the four pipeline instructions.
#[derive(Default)]
pub struct FakeLedger {
    accounts: Mutex<HashMap<Pubkey, Account>>,
    calls: Mutex<Vec<String>>,
    // memo of each created vault transaction, in order
    memos: Mutex<Vec<Option<String>>>,
    // instruction name that fails when sent
    fail_on: Mutex<Option<&'static str>>,
}

impl FakeLedger {
    pub fn set_account(&self, address: Pubkey, account: Account) {
        self.accounts.lock().unwrap().insert(address, account);
    }

    pub fn set_program_account<T: ProgramAccount>(&self, address: Pubkey, value: &T) {
        self.set_account(
            address,
            Account {
                lamports: 1_000_000,
                data: value.to_bytes().unwrap(),
                owner: SQUADS_PROGRAM_ID,
                executable: false,
                rent_epoch: 0,
            },
        );
    }

    pub fn fund(&self, address: Pubkey, lamports: u64) {
        self.set_account(
            address,
            Account {
                lamports,
                data: vec![],
                owner: system_program::ID,
                executable: false,
                rent_epoch: 0,
            },
        );
    }

    pub fn lamports(&self, address: &Pubkey) -> u64 {
        self.accounts
            .lock()
            .unwrap()
            .get(address)
            .map(|a| a.lamports)
            .unwrap_or(0)
    }

    pub fn program_account<T: ProgramAccount>(&self, address: &Pubkey) -> Option<T> {
        let accounts = self.accounts.lock().unwrap();
        accounts.get(address).map(|a| T::try_from_bytes(&a.data).unwrap())
    }

    pub fn fail_on(&self, instruction: &'static str) {
        *self.fail_on.lock().unwrap() = Some(instruction);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn memos(&self) -> Vec<Option<String>> {
        self.memos.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("send:").map(str::to_string))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn process(&self, ix: &Instruction) -> Result<()> {
        let name = [
            VAULT_TRANSACTION_CREATE,
            PROPOSAL_CREATE,
            PROPOSAL_APPROVE,
            VAULT_TRANSACTION_EXECUTE,
        ]
        .into_iter()
        .find(|name| ix.data.starts_with(&discriminator("global", name)))
        .ok_or(anyhow!("unknown instruction"))?;
        self.record(format!("send:{name}"));

        if *self.fail_on.lock().unwrap() == Some(name) {
            return Err(anyhow!("simulated failure in {name}"));
        }

        let args = &ix.data[8..];
        match name {
            VAULT_TRANSACTION_CREATE => {
                let args = VaultTransactionCreateArgs::try_from_slice(args)?;
                let multisig_key = ix.accounts[0].pubkey;
                let mut multisig: Multisig = self
                    .program_account(&multisig_key)
                    .ok_or(anyhow!("multisig missing"))?;
                multisig.transaction_index += 1;
                let (_, vault_bump) = pda::get_vault_pda(&multisig_key, args.vault_index, &ix.program_id);
                let transaction = VaultTransaction {
                    multisig: multisig_key,
                    creator: ix.accounts[2].pubkey,
                    index: multisig.transaction_index,
                    bump: 255,
                    vault_index: args.vault_index,
                    vault_bump,
                    ephemeral_signer_bumps: vec![],
                    message: VaultTransactionMessage::from_create_bytes(&args.transaction_message)?,
                };
                self.set_program_account(ix.accounts[1].pubkey, &transaction);
                self.set_program_account(multisig_key, &multisig);
                self.memos.lock().unwrap().push(args.memo);
            }
            PROPOSAL_CREATE => {
                let args = ProposalCreateArgs::try_from_slice(args)?;
                let proposal = Proposal {
                    multisig: ix.accounts[0].pubkey,
                    transaction_index: args.transaction_index,
                    status: ProposalStatus::Active { timestamp: 1 },
                    bump: 255,
                    approved: vec![],
                    rejected: vec![],
                    cancelled: vec![],
                };
                self.set_program_account(ix.accounts[1].pubkey, &proposal);
            }
            PROPOSAL_APPROVE => {
                ProposalVoteArgs::try_from_slice(args)?;
                let multisig: Multisig = self
                    .program_account(&ix.accounts[0].pubkey)
                    .ok_or(anyhow!("multisig missing"))?;
                let proposal_key = ix.accounts[2].pubkey;
                let mut proposal: Proposal = self
                    .program_account(&proposal_key)
                    .ok_or(anyhow!("proposal missing"))?;
                proposal.approved.push(ix.accounts[1].pubkey);
                if proposal.approved.len() >= usize::from(multisig.threshold) {
                    proposal.status = ProposalStatus::Approved { timestamp: 2 };
                }
                self.set_program_account(proposal_key, &proposal);
            }
            VAULT_TRANSACTION_EXECUTE => {
                let proposal_key = ix.accounts[1].pubkey;
                let mut proposal: Proposal = self
                    .program_account(&proposal_key)
                    .ok_or(anyhow!("proposal missing"))?;
                if !proposal.status.is_approved() {
                    return Err(anyhow!("proposal not approved"));
                }
                let transaction: VaultTransaction = self
                    .program_account(&ix.accounts[2].pubkey)
                    .ok_or(anyhow!("transaction missing"))?;
                let message = &transaction.message;
                for compiled in &message.instructions {
                    let program = message.account_keys[usize::from(compiled.program_id_index)];
                    // system transfer: u32 tag 2, then u64 lamports
                    if program == system_program::ID && compiled.data[..4] == 2u32.to_le_bytes() {
                        let lamports = u64::from_le_bytes(compiled.data[4..12].try_into()?);
                        let from = message.account_keys[usize::from(compiled.account_indexes[0])];
                        let to = message.account_keys[usize::from(compiled.account_indexes[1])];
                        let remaining = self
                            .lamports(&from)
                            .checked_sub(lamports)
                            .ok_or(anyhow!("insufficient lamports"))?;
                        self.fund(from, remaining);
                        let received = self.lamports(&to) + lamports;
                        self.fund(to, received);
                    }
                }
                proposal.status = ProposalStatus::Executed { timestamp: 3 };
                self.set_program_account(proposal_key, &proposal);
            }
            _ => unreachable!(),
        }
        Ok(())
    }
}

impl Rpc for FakeLedger {
    async fn account(&self, address: &Pubkey) -> Result<Option<Account>> {
        self.record(format!("account:{address}"));
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn balance(&self, address: &Pubkey) -> Result<u64> {
        self.record(format!("balance:{address}"));
        Ok(self.lamports(address))
    }

    async fn send_and_confirm(&self, instructions: &[Instruction], payer: &Keypair) -> Result<Signature> {
        assert!(instructions
            .iter()
            .flat_map(|ix| &ix.accounts)
            .filter(|meta| meta.is_signer)
            .all(|meta| meta.pubkey == payer.pubkey()));
        for ix in instructions {
            self.process(ix)?;
        }
        Ok(Signature::new_unique())
    }
}

pub fn new_multisig(threshold: u16, members: &[Pubkey], transaction_index: u64) -> Multisig {
    Multisig {
        create_key: Pubkey::new_unique(),
        config_authority: Pubkey::default(),
        threshold,
        time_lock: 0,
        transaction_index,
        stale_transaction_index: 0,
        rent_collector: None,
        bump: 255,
        members: members
            .iter()
            .map(|key| Member { key: *key, permissions: Permissions::all() })
            .collect(),
    }
}

/// A client over a fresh ledger holding `multisig` at a random address.
pub fn setup(multisig: &Multisig) -> (MultisigClient<FakeLedger>, Pubkey) {
    let client = MultisigClient::new_with_client(FakeLedger::default(), SQUADS_PROGRAM_ID);
    let address = Pubkey::new_unique();
    client.rpc().set_program_account(address, multisig);
    (client, address)
}

pub fn keypair_file(keypair: &Keypair) -> PathBuf {
    let path = std::env::temp_dir().join(format!("squads-member-{}.json", keypair.pubkey()));
    write_keypair_file(keypair, &path).unwrap();
    path
}
