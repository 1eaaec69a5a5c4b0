//! IDL-driven binary codec for Anchor programs.
//!
//! An IDL describes the instructions a program accepts and the accounts it
//! owns. This crate compiles those descriptions into layouts and uses them to:
//! - build instructions (`discriminator || borsh(args)`)
//! - decode account data behind an ownership and discriminator check
//! - decode instruction data back to its arguments
//! - convert values to and from their JSON form
//!
//! # Example
//!
//! ```
//! use idl_codec::{IdlInstruction, Program, ProgramIdl, TypeDescriptor, Value, Accounts};
//! use solana_pubkey::Pubkey;
//!
//! let idl = ProgramIdl::new("basic_2").with_instruction(
//!     IdlInstruction::new("create")
//!         .arg("authority", TypeDescriptor::PUBLIC_KEY)
//!         .account("counter", true, true),
//! );
//! let program = Program::load(Pubkey::new_unique(), &idl).unwrap();
//! let ix = program
//!     .instruction("create")
//!     .unwrap()
//!     .build(
//!         &Value::structure([("authority", Value::from(Pubkey::default()))]),
//!         &Accounts::new().with("counter", Pubkey::new_unique()),
//!     )
//!     .unwrap();
//! assert_eq!(ix.data.len(), 40);
//! ```

pub mod account;
pub mod client;
pub mod config;
pub mod discriminator;
pub mod error;
pub mod formatter;
pub mod idl;
pub mod instruction;
pub mod json;
pub mod layout;
pub mod program;
pub mod types;
pub mod value;

pub use account::{decode_account, decode_accounts, AccountSlot, DecodedAccount, RawAccount};
pub use client::{AccountFetcher, ClientError, InstructionSink, ProgramClient};
pub use config::CodecConfig;
pub use discriminator::{
    discriminator_for, prepend_discriminator, strip_and_validate, Discriminator, DiscriminatorTable,
    Namespace, DISCRIMINATOR_LEN,
};
pub use error::{CodecError, CodecResult, ErrorKind};
pub use formatter::{format_account, format_instruction, instruction_snapshot, InstructionSnapshot};
pub use idl::{IdlAccountDef, IdlAccountItem, IdlInstruction, IdlTypeDef, ProgramIdl};
pub use instruction::{build_instruction, encode_instruction_data, Accounts, DecodedInstruction};
pub use json::{from_json, to_json};
pub use layout::Layout;
pub use program::{AccountCodec, InstructionCodec, Program};
pub use types::{EnumVariant, Field, PrimitiveKind, TypeDescriptor, TypeRegistry, VariantFields};
pub use solana_instruction::{AccountMeta, Instruction};
pub use solana_pubkey::Pubkey;
pub use value::{EnumValue, Value, VariantValue};
