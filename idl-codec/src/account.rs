//! Account decoding: ownership gate, discriminator check, body decode.
//!
//! Batch decoding keeps one output slot per input slot:
//! - `None` -- the address does not exist remotely
//! - `Some(Err(_))` -- the account exists but is foreign or corrupt
//! - `Some(Ok(_))` -- decoded
//!
//! A failing slot never affects its siblings.

use solana_pubkey::Pubkey;

use crate::{
    config::CodecConfig,
    discriminator::{strip_and_validate, Discriminator, DISCRIMINATOR_LEN},
    error::{CodecError, CodecResult},
    layout::Layout,
    value::Value,
};

/// Owner and data of an account as returned by the remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAccount {
    pub owner: Pubkey,
    pub data: Vec<u8>,
}

impl RawAccount {
    pub fn new(owner: Pubkey, data: Vec<u8>) -> Self {
        Self { owner, data }
    }
}

/// A successfully decoded account. Only the decoders construct these.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAccount<T = Value> {
    owner: Pubkey,
    value: T,
}

impl<T> DecodedAccount<T> {
    pub fn owner(&self) -> &Pubkey {
        &self.owner
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Convert the decoded value into a typed representation.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<DecodedAccount<U>, E> {
        Ok(DecodedAccount {
            owner: self.owner,
            value: f(self.value)?,
        })
    }
}

/// Result of decoding one entry of a batch.
pub type AccountSlot<T = Value> = Option<CodecResult<DecodedAccount<T>>>;

/// Decode a single account with strict trailing-byte handling.
pub fn decode_account(
    owner: &Pubkey,
    expected_program: &Pubkey,
    discriminator: &Discriminator,
    layout: &Layout,
    data: &[u8],
) -> CodecResult<DecodedAccount> {
    decode_account_with(
        &CodecConfig::strict(),
        owner,
        expected_program,
        discriminator,
        layout,
        data,
    )
}

pub fn decode_account_with(
    config: &CodecConfig,
    owner: &Pubkey,
    expected_program: &Pubkey,
    discriminator: &Discriminator,
    layout: &Layout,
    data: &[u8],
) -> CodecResult<DecodedAccount> {
    if owner != expected_program {
        return Err(CodecError::OwnershipMismatch {
            expected: *expected_program,
            actual: *owner,
        });
    }
    let body = strip_and_validate(discriminator, data)?;
    let value = decode_body(config, layout, body)
        .map_err(|e| as_layout_mismatch(e.rebase(DISCRIMINATOR_LEN)))?;
    tracing::trace!(%owner, %discriminator, len = data.len(), "decoded account");
    Ok(DecodedAccount {
        owner: *owner,
        value,
    })
}

fn decode_body(config: &CodecConfig, layout: &Layout, body: &[u8]) -> CodecResult<Value> {
    if config.allow_trailing_account_bytes {
        layout.decode(body, 0).map(|(value, _)| value)
    } else {
        layout.decode_exact(body)
    }
}

/// Any structural failure inside the body is reported as `LayoutMismatch`,
/// keeping the offset and the underlying description.
fn as_layout_mismatch(err: CodecError) -> CodecError {
    match err {
        CodecError::TruncatedInput { offset, .. } | CodecError::InvalidTag { offset, .. } => {
            CodecError::mismatch(offset, err.to_string())
        }
        other => other,
    }
}

/// Decode a batch of fetched accounts, one slot per entry, in input order.
pub fn decode_accounts(
    expected_program: &Pubkey,
    discriminator: &Discriminator,
    layout: &Layout,
    entries: &[Option<RawAccount>],
) -> Vec<AccountSlot> {
    decode_accounts_with(
        &CodecConfig::strict(),
        expected_program,
        discriminator,
        layout,
        entries,
    )
}

pub fn decode_accounts_with(
    config: &CodecConfig,
    expected_program: &Pubkey,
    discriminator: &Discriminator,
    layout: &Layout,
    entries: &[Option<RawAccount>],
) -> Vec<AccountSlot> {
    entries
        .iter()
        .enumerate()
        .map(|(slot, entry)| {
            let raw = entry.as_ref()?;
            let result = decode_account_with(
                config,
                &raw.owner,
                expected_program,
                discriminator,
                layout,
                &raw.data,
            );
            if let Err(err) = &result {
                if config.log_batch_failures {
                    tracing::debug!(slot, kind = ?err.kind(), %err, "batch account slot failed to decode");
                }
            }
            Some(result)
        })
        .collect()
}
