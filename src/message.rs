use anyhow::{anyhow, Result};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{instruction::Instruction, message::Message, pubkey::Pubkey};

/// A transaction message as the program stores it inside a `VaultTransaction`.
///
/// Account keys are ordered writable signers, readonly signers, writable
/// non-signers, readonly non-signers; the three counters describe the split.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct VaultTransactionMessage {
    pub num_signers: u8,
    pub num_writable_signers: u8,
    pub num_writable_non_signers: u8,
    pub account_keys: Vec<Pubkey>,
    pub instructions: Vec<MultisigCompiledInstruction>,
    pub address_table_lookups: Vec<MultisigMessageAddressTableLookup>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MultisigCompiledInstruction {
    pub program_id_index: u8,
    pub account_indexes: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MultisigMessageAddressTableLookup {
    pub account_key: Pubkey,
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

impl VaultTransactionMessage {
    /// Compiles `instructions` with `vault` as the fee payer, i.e. the first writable signer.
    pub fn compile(vault: &Pubkey, instructions: &[Instruction]) -> Result<Self> {
        let message = Message::new(instructions, Some(vault));
        let header = message.header;

        let num_signers = header.num_required_signatures;
        let num_writable_signers = num_signers
            .checked_sub(header.num_readonly_signed_accounts)
            .ok_or(anyhow!("Invalid message header"))?;
        let num_keys: u8 = message
            .account_keys
            .len()
            .try_into()
            .map_err(|_| anyhow!("Too many accounts in message"))?;
        let num_writable_non_signers = num_keys
            .checked_sub(num_signers)
            .and_then(|n| n.checked_sub(header.num_readonly_unsigned_accounts))
            .ok_or(anyhow!("Invalid message header"))?;

        Ok(Self {
            num_signers,
            num_writable_signers,
            num_writable_non_signers,
            account_keys: message.account_keys,
            instructions: message
                .instructions
                .into_iter()
                .map(|ix| MultisigCompiledInstruction {
                    program_id_index: ix.program_id_index,
                    account_indexes: ix.accounts,
                    data: ix.data,
                })
                .collect(),
            address_table_lookups: Vec::new(),
        })
    }

    pub fn is_signer_index(&self, index: usize) -> bool {
        index < usize::from(self.num_signers)
    }

    pub fn is_static_writable_index(&self, index: usize) -> bool {
        let num_signers = usize::from(self.num_signers);
        if index < usize::from(self.num_writable_signers) {
            return true;
        }
        index >= num_signers
            && index < num_signers + usize::from(self.num_writable_non_signers)
    }

    /// Encodes the message the way `vault_transaction_create` expects it:
    /// u8 length prefixes for key, instruction and lookup lists, u16 for instruction data.
    pub fn to_create_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![
            self.num_signers,
            self.num_writable_signers,
            self.num_writable_non_signers,
        ];

        push_u8_len(&mut buf, self.account_keys.len())?;
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_ref());
        }

        push_u8_len(&mut buf, self.instructions.len())?;
        for ix in &self.instructions {
            buf.push(ix.program_id_index);
            push_u8_len(&mut buf, ix.account_indexes.len())?;
            buf.extend_from_slice(&ix.account_indexes);
            let data_len: u16 = ix
                .data
                .len()
                .try_into()
                .map_err(|_| anyhow!("Instruction data too long"))?;
            buf.extend_from_slice(&data_len.to_le_bytes());
            buf.extend_from_slice(&ix.data);
        }

        push_u8_len(&mut buf, self.address_table_lookups.len())?;
        for lookup in &self.address_table_lookups {
            buf.extend_from_slice(lookup.account_key.as_ref());
            push_u8_len(&mut buf, lookup.writable_indexes.len())?;
            buf.extend_from_slice(&lookup.writable_indexes);
            push_u8_len(&mut buf, lookup.readonly_indexes.len())?;
            buf.extend_from_slice(&lookup.readonly_indexes);
        }

        Ok(buf)
    }

    /// Inverse of [`Self::to_create_bytes`].
    pub fn from_create_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader { bytes, pos: 0 };
        let num_signers = reader.u8()?;
        let num_writable_signers = reader.u8()?;
        let num_writable_non_signers = reader.u8()?;

        let num_keys = reader.u8()?;
        let mut account_keys = Vec::with_capacity(num_keys.into());
        for _ in 0..num_keys {
            account_keys.push(reader.pubkey()?);
        }

        let num_instructions = reader.u8()?;
        let mut instructions = Vec::with_capacity(num_instructions.into());
        for _ in 0..num_instructions {
            let program_id_index = reader.u8()?;
            let len = reader.u8()?;
            let account_indexes = reader.take(len.into())?.to_vec();
            let data_len = u16::from_le_bytes(reader.take(2)?.try_into()?);
            let data = reader.take(data_len.into())?.to_vec();
            instructions.push(MultisigCompiledInstruction {
                program_id_index,
                account_indexes,
                data,
            });
        }

        let num_lookups = reader.u8()?;
        let mut address_table_lookups = Vec::with_capacity(num_lookups.into());
        for _ in 0..num_lookups {
            let account_key = reader.pubkey()?;
            let len = reader.u8()?;
            let writable_indexes = reader.take(len.into())?.to_vec();
            let len = reader.u8()?;
            let readonly_indexes = reader.take(len.into())?.to_vec();
            address_table_lookups.push(MultisigMessageAddressTableLookup {
                account_key,
                writable_indexes,
                readonly_indexes,
            });
        }

        if reader.pos != bytes.len() {
            return Err(anyhow!("Trailing bytes after transaction message"));
        }

        Ok(Self {
            num_signers,
            num_writable_signers,
            num_writable_non_signers,
            account_keys,
            instructions,
            address_table_lookups,
        })
    }
}

fn push_u8_len(buf: &mut Vec<u8>, len: usize) -> Result<()> {
    buf.push(u8::try_from(len).map_err(|_| anyhow!("List too long: {}", len))?);
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos + len;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(anyhow!("Unexpected end of transaction message"))?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn pubkey(&mut self) -> Result<Pubkey> {
        Ok(Pubkey::new_from_array(self.take(32)?.try_into()?))
    }
}
