//! Remote collaborator contract and a typed client driving the codec over it.
//!
//! Transport, signing and retries live behind [`AccountFetcher`] and
//! [`InstructionSink`]; the client only fetches bytes, hands them to the
//! decoders and submits built instructions.

use async_trait::async_trait;
use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;
use thiserror::Error;

use crate::{
    account::{AccountSlot, DecodedAccount, RawAccount},
    error::CodecError,
    instruction::Accounts,
    program::Program,
    value::Value,
};

/// Reads account state from the remote environment.
#[async_trait]
pub trait AccountFetcher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Owner and data of `address`, or `None` if it does not exist.
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, Self::Error>;

    /// One entry per address, in input order.
    async fn fetch_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<RawAccount>>, Self::Error> {
        let mut accounts = Vec::with_capacity(addresses.len());
        for address in addresses {
            accounts.push(self.fetch_account(address).await?);
        }
        Ok(accounts)
    }
}

/// Accepts built instructions together with opaque signer material.
#[async_trait]
pub trait InstructionSink: Send + Sync {
    type Signers: ?Sized + Sync;
    type Output: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn submit(
        &self,
        instruction: Instruction,
        signers: &Self::Signers,
    ) -> Result<Self::Output, Self::Error>;
}

#[derive(Debug, Error)]
pub enum ClientError<E> {
    #[error("transport error: {0}")]
    Transport(E),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("fetcher returned {actual} accounts for {expected} addresses")]
    BatchLength { expected: usize, actual: usize },
}

/// Typed access to one program's accounts and instructions.
#[derive(Debug, Clone)]
pub struct ProgramClient<'p, F> {
    program: &'p Program,
    fetcher: F,
}

impl<'p, F: AccountFetcher> ProgramClient<'p, F> {
    pub fn new(program: &'p Program, fetcher: F) -> Self {
        Self { program, fetcher }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch and decode one account of the named type. `Ok(None)` when the address does not exist.
    pub async fn fetch(
        &self,
        account: &str,
        address: &Pubkey,
    ) -> Result<Option<DecodedAccount>, ClientError<F::Error>> {
        let codec = self.program.account(account)?;
        let Some(raw) = self
            .fetcher
            .fetch_account(address)
            .await
            .map_err(ClientError::Transport)?
        else {
            return Ok(None);
        };
        Ok(Some(codec.decode(&raw)?))
    }

    /// Fetch and decode a batch of accounts of the named type, one slot per address.
    pub async fn fetch_multiple(
        &self,
        account: &str,
        addresses: &[Pubkey],
    ) -> Result<Vec<AccountSlot>, ClientError<F::Error>> {
        let codec = self.program.account(account)?;
        let entries = self
            .fetcher
            .fetch_multiple_accounts(addresses)
            .await
            .map_err(ClientError::Transport)?;
        if entries.len() != addresses.len() {
            return Err(ClientError::BatchLength {
                expected: addresses.len(),
                actual: entries.len(),
            });
        }
        Ok(codec.decode_many(&entries))
    }

    /// Fetch an account and decode it as whichever of the program's account types it carries.
    pub async fn fetch_any(
        &self,
        address: &Pubkey,
    ) -> Result<Option<(String, DecodedAccount)>, ClientError<F::Error>> {
        let Some(raw) = self
            .fetcher
            .fetch_account(address)
            .await
            .map_err(ClientError::Transport)?
        else {
            return Ok(None);
        };
        let (name, decoded) = self.program.decode_any_account(&raw)?;
        Ok(Some((name.to_string(), decoded)))
    }

    /// Build the named instruction and hand it to `sink`.
    pub async fn send<S: InstructionSink>(
        &self,
        sink: &S,
        instruction: &str,
        args: &Value,
        accounts: &Accounts,
        remaining: Vec<AccountMeta>,
        signers: &S::Signers,
    ) -> Result<S::Output, ClientError<S::Error>> {
        let instruction = self
            .program
            .instruction(instruction)?
            .build_with_remaining(args, accounts, remaining)?;
        tracing::debug!(
            program_id = %instruction.program_id,
            accounts = instruction.accounts.len(),
            "submitting instruction"
        );
        sink.submit(instruction, signers)
            .await
            .map_err(ClientError::Transport)
    }
}
