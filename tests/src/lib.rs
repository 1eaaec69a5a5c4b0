//! Shared fixtures for the codec integration tests.
//!
//! Provides:
//! - fixture program descriptions: [`basic_2_idl`], [`tictactoe_idl`], [`example_program_idl`]
//! - [`MemoryAccounts`] -- an in-memory [`AccountFetcher`]
//! - [`RecordingSink`] -- an [`InstructionSink`] that keeps what it is given
//! - [`anchor_discriminator`] -- independent sha256 computation of discriminators

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use idl_codec::{
    AccountFetcher, EnumVariant, Field, IdlAccountItem, IdlInstruction, InstructionSink,
    ProgramIdl, RawAccount, TypeDescriptor,
};
use sha2::{Digest, Sha256};
use solana_instruction::Instruction;
use solana_pubkey::Pubkey;

pub const BASIC_2_PROGRAM_ID: Pubkey =
    solana_pubkey::pubkey!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");
pub const TICTACTOE_PROGRAM_ID: Pubkey =
    solana_pubkey::pubkey!("Tic1111111111111111111111111111111111111111");
pub const EXAMPLE_PROGRAM_ID: Pubkey =
    solana_pubkey::pubkey!("3rTQ3R4B2PxZrAyx7EUefySPgZY8RhJf16cZajbmrzp8");

pub const SYSVAR_CLOCK: Pubkey = solana_pubkey::pubkey!("SysvarC1ock11111111111111111111111111111111");
pub const SYSVAR_RENT: Pubkey = solana_pubkey::pubkey!("SysvarRent111111111111111111111111111111111");
pub const SYSTEM_PROGRAM: Pubkey = solana_pubkey::pubkey!("11111111111111111111111111111111");

/// `sha256("<namespace>:<name>")[..8]`, computed without the crate under test.
pub fn anchor_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(format!("{namespace}:{name}").as_bytes());
    let hash = hasher.finalize();
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

// ---------------------------------------------------------------------------
// Fixture programs
// ---------------------------------------------------------------------------

pub fn basic_2_idl() -> ProgramIdl {
    ProgramIdl::new("basic_2")
        .with_instruction(
            IdlInstruction::new("create")
                .arg("authority", TypeDescriptor::PUBLIC_KEY)
                .account("counter", false, true)
                .account("rent", false, false),
        )
        .with_instruction(
            IdlInstruction::new("increment")
                .account("counter", false, true)
                .account("authority", true, false),
        )
        .with_account(
            "Counter",
            TypeDescriptor::Struct(vec![
                Field::new("authority", TypeDescriptor::PUBLIC_KEY),
                Field::new("count", TypeDescriptor::U64),
            ]),
        )
}

pub fn sign_type() -> TypeDescriptor {
    TypeDescriptor::Enum(vec![EnumVariant::unit("X"), EnumVariant::unit("O")])
}

pub fn game_state_type() -> TypeDescriptor {
    TypeDescriptor::Enum(vec![
        EnumVariant::unit("Active"),
        EnumVariant::unit("Tie"),
        EnumVariant::with_fields("Won", vec![Field::new("winner", TypeDescriptor::PUBLIC_KEY)]),
    ])
}

pub fn tile_type() -> TypeDescriptor {
    TypeDescriptor::Struct(vec![
        Field::new("row", TypeDescriptor::U8),
        Field::new("column", TypeDescriptor::U8),
    ])
}

/// `players: [publicKey; 2]`, `turn: u8`, `board: [[Option<Sign>; 3]; 3]`, `state: GameState`.
pub fn game_type() -> TypeDescriptor {
    TypeDescriptor::Struct(vec![
        Field::new("players", TypeDescriptor::array(TypeDescriptor::PUBLIC_KEY, 2)),
        Field::new("turn", TypeDescriptor::U8),
        Field::new(
            "board",
            TypeDescriptor::array(
                TypeDescriptor::array(TypeDescriptor::option(TypeDescriptor::defined("Sign")), 3),
                3,
            ),
        ),
        Field::new("state", TypeDescriptor::defined("GameState")),
    ])
}

pub fn tictactoe_idl() -> ProgramIdl {
    ProgramIdl::new("tictactoe")
        .with_type("Tile", tile_type())
        .with_type("Sign", sign_type())
        .with_type("GameState", game_state_type())
        .with_instruction(
            IdlInstruction::new("play")
                .arg("tile", TypeDescriptor::defined("Tile"))
                .account("game", false, true)
                .account("player", true, false),
        )
        .with_account("Game", game_type())
}

pub fn example_program_idl() -> ProgramIdl {
    ProgramIdl::new("example_program")
        .with_instruction(
            IdlInstruction::new("initialize")
                .account("state", true, true)
                .nested(
                    "nested",
                    vec![
                        IdlAccountItem::single("clock", false, false),
                        IdlAccountItem::single("rent", false, false),
                    ],
                )
                .account("payer", true, true)
                .account("system_program", false, false),
        )
        .with_instruction(IdlInstruction::new("causeError"))
}

// ---------------------------------------------------------------------------
// In-memory remote collaborator
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
#[error("fetcher offline")]
pub struct Offline;

/// Accounts held in memory, keyed by address.
#[derive(Debug, Default)]
pub struct MemoryAccounts {
    accounts: HashMap<Pubkey, RawAccount>,
    offline: bool,
    fetches: AtomicUsize,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, address: Pubkey, owner: Pubkey, data: Vec<u8>) -> Self {
        self.accounts.insert(address, RawAccount::new(owner, data));
        self
    }

    /// Every fetch fails with [`Offline`].
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AccountFetcher for MemoryAccounts {
    type Error = Offline;

    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, Offline> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        if self.offline {
            return Err(Offline);
        }
        Ok(self.accounts.get(address).cloned())
    }
}

/// Records submitted instructions and returns their index.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub submitted: Mutex<Vec<(Instruction, Vec<Pubkey>)>>,
}

#[async_trait]
impl InstructionSink for RecordingSink {
    type Signers = [Pubkey];
    type Output = usize;
    type Error = Offline;

    async fn submit(&self, instruction: Instruction, signers: &[Pubkey]) -> Result<usize, Offline> {
        let mut submitted = self.submitted.lock().map_err(|_| Offline)?;
        submitted.push((instruction, signers.to_vec()));
        Ok(submitted.len() - 1)
    }
}
