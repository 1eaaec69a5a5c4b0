//! Human-readable rendering of instructions and decoded accounts.
//!
//! Provides:
//! - [`InstructionSnapshot`] / [`AccountSnapshot`] -- JSON-serializable views (for insta)
//! - [`format_instruction`] -- account table plus decoded arguments
//! - [`format_account`] -- field table of a decoded account

use serde::Serialize;
use solana_instruction::Instruction;
use tabled::{settings::Style, Table, Tabled};

use crate::{
    account::DecodedAccount,
    error::CodecResult,
    json::to_json,
    layout::Layout,
    program::Program,
    value::Value,
};

// ---------------------------------------------------------------------------
// Snapshot types (JSON-serializable for insta)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionSnapshot {
    pub program_id: String,
    pub program_name: String,
    /// `None` when the data matches no instruction of the program.
    pub instruction_name: Option<String>,
    pub data_len: usize,
    pub accounts: Vec<AccountMetaSnapshot>,
    pub args: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountMetaSnapshot {
    /// IDL name; `None` for remaining accounts.
    pub name: Option<String>,
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub account_type: String,
    pub owner: String,
    pub value: serde_json::Value,
}

/// Describe `instruction` against `program`. Data the program cannot decode
/// still yields a snapshot, with no name and no arguments.
pub fn instruction_snapshot(program: &Program, instruction: &Instruction) -> InstructionSnapshot {
    let decoded = program.decode_instruction(instruction);
    if let Err(err) = &decoded {
        tracing::trace!(%err, "instruction not decodable");
    }
    let decoded = decoded.ok();
    let (instruction_name, names, args) = match decoded {
        Some(ix) => {
            let args = program
                .instruction(&ix.name)
                .and_then(|codec| to_json(&ix.args, codec.layout()))
                .ok();
            (Some(ix.name), ix.account_names, args)
        }
        None => (None, Vec::new(), None),
    };
    let accounts = instruction
        .accounts
        .iter()
        .enumerate()
        .map(|(i, meta)| AccountMetaSnapshot {
            name: names.get(i).cloned(),
            pubkey: meta.pubkey.to_string(),
            is_signer: meta.is_signer,
            is_writable: meta.is_writable,
        })
        .collect();
    InstructionSnapshot {
        program_id: instruction.program_id.to_string(),
        program_name: program.name().to_string(),
        instruction_name,
        data_len: instruction.data.len(),
        accounts,
        args,
    }
}

pub fn account_snapshot(
    account_type: &str,
    account: &DecodedAccount,
    layout: &Layout,
) -> CodecResult<AccountSnapshot> {
    Ok(AccountSnapshot {
        account_type: account_type.to_string(),
        owner: account.owner().to_string(),
        value: to_json(account.value(), layout)?,
    })
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Pubkey")]
    pubkey: String,
    #[tabled(rename = "Signer")]
    signer: &'static str,
    #[tabled(rename = "Writable")]
    writable: &'static str,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn flag(set: bool) -> &'static str {
    if set {
        "yes"
    } else {
        "-"
    }
}

fn compact(json: &serde_json::Value) -> String {
    match json {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn format_instruction(program: &Program, instruction: &Instruction) -> String {
    let snapshot = instruction_snapshot(program, instruction);
    let mut out = format!(
        "{} ({})\n  instruction: {}\n  data: {} bytes\n",
        snapshot.program_name,
        snapshot.program_id,
        snapshot.instruction_name.as_deref().unwrap_or("<unknown>"),
        snapshot.data_len,
    );

    let rows: Vec<AccountRow> = snapshot
        .accounts
        .iter()
        .enumerate()
        .map(|(index, a)| AccountRow {
            index,
            name: a.name.clone().unwrap_or_else(|| "(remaining)".to_string()),
            pubkey: a.pubkey.clone(),
            signer: flag(a.is_signer),
            writable: flag(a.is_writable),
        })
        .collect();
    if !rows.is_empty() {
        out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
        out.push('\n');
    }

    if let Some(serde_json::Value::Object(args)) = &snapshot.args {
        if !args.is_empty() {
            let rows = args.iter().map(|(name, value)| FieldRow {
                name: name.clone(),
                value: compact(value),
            });
            out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
            out.push('\n');
        }
    }
    out
}

/// Field table of a decoded account. Non-struct values render as a single `value` row.
pub fn format_account(account_type: &str, account: &DecodedAccount<Value>, layout: &Layout) -> CodecResult<String> {
    let snapshot = account_snapshot(account_type, account, layout)?;
    let rows: Vec<FieldRow> = match &snapshot.value {
        serde_json::Value::Object(fields) => fields
            .iter()
            .map(|(name, value)| FieldRow {
                name: name.clone(),
                value: compact(value),
            })
            .collect(),
        other => vec![FieldRow {
            name: "value".to_string(),
            value: compact(other),
        }],
    };
    Ok(format!(
        "{} (owner {})\n{}\n",
        snapshot.account_type,
        snapshot.owner,
        Table::new(rows).with(Style::rounded())
    ))
}
