//! Instruction encoding: `data = discriminator || borsh(args)`.
//!
//! Account metas are passed through in the order given. Nothing here
//! reorders, deduplicates or checks them against the remote program.

use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::{
    discriminator::{prepend_discriminator, Discriminator},
    error::{CodecError, CodecResult},
    idl::IdlAccountItem,
    layout::{field_path, Layout},
    types::TypeDescriptor,
    value::Value,
};

/// Build an instruction from a discriminator name, an argument descriptor and a value.
///
/// The argument value is checked against `args_descriptor` before any bytes
/// are produced; the same inputs always produce the same data.
pub fn build_instruction(
    program_id: &Pubkey,
    name: &str,
    accounts: Vec<AccountMeta>,
    args_descriptor: &TypeDescriptor,
    args: &Value,
) -> CodecResult<Instruction> {
    let layout = Layout::compile(args_descriptor)?;
    let discriminator = Discriminator::for_instruction(name);
    let data = encode_instruction_data(&discriminator, &layout, args)?;
    tracing::trace!(%program_id, name, %discriminator, len = data.len(), "built instruction");
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

pub fn encode_instruction_data(
    discriminator: &Discriminator,
    args_layout: &Layout,
    args: &Value,
) -> CodecResult<Vec<u8>> {
    let encoded = args_layout.encode(args)?;
    Ok(prepend_discriminator(discriminator, &encoded))
}

// ---------------------------------------------------------------------------
// Named account input
// ---------------------------------------------------------------------------

/// Addresses for an instruction's accounts, keyed by IDL account name.
///
/// Nested account groups are supplied as nested `Accounts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accounts {
    entries: Vec<(String, AccountInput)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountInput {
    Key(Pubkey),
    Group(Accounts),
}

impl Accounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, key: Pubkey) -> Self {
        self.entries.push((name.into(), AccountInput::Key(key)));
        self
    }

    pub fn with_group(mut self, name: impl Into<String>, group: Accounts) -> Self {
        self.entries.push((name.into(), AccountInput::Group(group)));
        self
    }

    pub fn get(&self, name: &str) -> Option<&AccountInput> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, input)| input)
    }
}

/// Flatten the IDL account list into ordered metas, depth-first through groups.
pub fn resolve_account_metas(items: &[IdlAccountItem], accounts: &Accounts) -> CodecResult<Vec<AccountMeta>> {
    let mut metas = Vec::with_capacity(items.len());
    push_metas(items, accounts, "", &mut metas)?;
    Ok(metas)
}

fn push_metas(
    items: &[IdlAccountItem],
    accounts: &Accounts,
    path: &str,
    metas: &mut Vec<AccountMeta>,
) -> CodecResult<()> {
    for item in items {
        let item_path = field_path(path, item.name());
        let input = accounts
            .get(item.name())
            .ok_or_else(|| CodecError::shape(&item_path, "missing account"))?;
        match (item, input) {
            (
                IdlAccountItem::Single {
                    is_signer,
                    is_writable,
                    ..
                },
                AccountInput::Key(key),
            ) => metas.push(AccountMeta {
                pubkey: *key,
                is_signer: *is_signer,
                is_writable: *is_writable,
            }),
            (IdlAccountItem::Nested { accounts: nested, .. }, AccountInput::Group(group)) => {
                push_metas(nested, group, &item_path, metas)?
            }
            (IdlAccountItem::Single { .. }, AccountInput::Group(_)) => {
                return Err(CodecError::shape(&item_path, "expected an address, got an account group"))
            }
            (IdlAccountItem::Nested { .. }, AccountInput::Key(_)) => {
                return Err(CodecError::shape(&item_path, "expected an account group, got an address"))
            }
        }
    }
    Ok(())
}

/// Flattened account names in wire order, groups joined with `.`.
pub fn flatten_account_names(items: &[IdlAccountItem]) -> Vec<String> {
    fn walk(items: &[IdlAccountItem], path: &str, out: &mut Vec<String>) {
        for item in items {
            let item_path = field_path(path, item.name());
            match item {
                IdlAccountItem::Single { .. } => out.push(item_path),
                IdlAccountItem::Nested { accounts, .. } => walk(accounts, &item_path, out),
            }
        }
    }
    let mut out = Vec::new();
    walk(items, "", &mut out);
    out
}

// ---------------------------------------------------------------------------
// Decoded instructions
// ---------------------------------------------------------------------------

/// An instruction matched back to its IDL definition.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedInstruction {
    pub name: String,
    pub args: Value,
    /// IDL names of the instruction's accounts; accounts beyond the IDL list
    /// (remaining accounts) have no name here.
    pub account_names: Vec<String>,
}
