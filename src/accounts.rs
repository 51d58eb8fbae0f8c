use anyhow::{anyhow, Result};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::fmt;

use crate::message::VaultTransactionMessage;
use crate::utils::discriminator;

/// An account owned by the multisig program: 8-byte Anchor discriminator then Borsh body.
pub trait ProgramAccount: BorshDeserialize + BorshSerialize {
    const NAME: &'static str;

    fn discriminator() -> [u8; 8] {
        discriminator("account", Self::NAME)
    }

    fn try_from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(anyhow!("{} account data too short ({} bytes)", Self::NAME, data.len()));
        }
        let (disc, mut body) = data.split_at(8);
        if disc != Self::discriminator() {
            return Err(anyhow!("Account is not a {} (discriminator mismatch)", Self::NAME));
        }
        // accounts may be allocated larger than their content, trailing bytes are ignored
        Self::deserialize(&mut body)
            .map_err(|e| anyhow!("Failed to parse {} account: {}", Self::NAME, e))
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut data = Self::discriminator().to_vec();
        self.serialize(&mut data)?;
        Ok(data)
    }
}

// === Multisig ===

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Multisig {
    pub create_key: Pubkey,
    pub config_authority: Pubkey,
    pub threshold: u16,
    // seconds between approval and execution
    pub time_lock: u32,
    pub transaction_index: u64,
    pub stale_transaction_index: u64,
    pub rent_collector: Option<Pubkey>,
    pub bump: u8,
    pub members: Vec<Member>,
}

impl ProgramAccount for Multisig {
    const NAME: &'static str = "Multisig";
}

impl Multisig {
    pub fn member(&self, key: &Pubkey) -> Option<&Member> {
        self.members.iter().find(|m| &m.key == key)
    }

    /// The newest `count` transaction indices, newest first. Index 0 is never used.
    pub fn recent_transaction_indices(&self, count: u64) -> impl Iterator<Item = u64> {
        let current = self.transaction_index;
        let oldest = current.saturating_sub(count.saturating_sub(1)).max(1);
        (oldest..=current).rev()
    }

    pub fn next_transaction_index(&self) -> Result<u64> {
        self.transaction_index
            .checked_add(1)
            .ok_or(anyhow!("Transaction index overflow"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Member {
    pub key: Pubkey,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Permission {
    Initiate = 1 << 0,
    Vote = 1 << 1,
    Execute = 1 << 2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Permissions {
    pub mask: u8,
}

impl Permissions {
    pub fn all() -> Self {
        Self::from_vec(&[Permission::Initiate, Permission::Vote, Permission::Execute])
    }

    pub fn from_vec(permissions: &[Permission]) -> Self {
        Self {
            mask: permissions.iter().fold(0, |mask, p| mask | *p as u8),
        }
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.mask & (permission as u8) != 0
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names: Vec<&str> = [
            (Permission::Initiate, "initiate"),
            (Permission::Vote, "vote"),
            (Permission::Execute, "execute"),
        ]
        .iter()
        .filter(|(p, _)| self.has(*p))
        .map(|(_, name)| *name)
        .collect();
        write!(f, "{} ({})", self.mask, names.join(", "))
    }
}

// === Proposal ===

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Proposal {
    pub multisig: Pubkey,
    pub transaction_index: u64,
    pub status: ProposalStatus,
    pub bump: u8,
    pub approved: Vec<Pubkey>,
    pub rejected: Vec<Pubkey>,
    pub cancelled: Vec<Pubkey>,
}

impl ProgramAccount for Proposal {
    const NAME: &'static str = "Proposal";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, BorshSerialize, BorshDeserialize)]
#[serde(tag = "__kind")]
pub enum ProposalStatus {
    Draft { timestamp: i64 },
    Active { timestamp: i64 },
    Rejected { timestamp: i64 },
    Approved { timestamp: i64 },
    // deprecated by the program, kept for layout compatibility
    Executing,
    Executed { timestamp: i64 },
    Cancelled { timestamp: i64 },
}

impl ProposalStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, ProposalStatus::Approved { .. })
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(e) => write!(f, "<failed to serialize status: {}>", e),
        }
    }
}

// === VaultTransaction ===

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct VaultTransaction {
    pub multisig: Pubkey,
    pub creator: Pubkey,
    pub index: u64,
    pub bump: u8,
    pub vault_index: u8,
    pub vault_bump: u8,
    pub ephemeral_signer_bumps: Vec<u8>,
    pub message: VaultTransactionMessage,
}

impl ProgramAccount for VaultTransaction {
    const NAME: &'static str = "VaultTransaction";
}
