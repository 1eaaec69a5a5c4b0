//! A program description compiled once from its IDL and shared by reference.
//!
//! [`Program::load`] resolves every defined type, compiles every argument and
//! account layout and registers every discriminator. Anything wrong with the
//! description (unknown type names, self-containing types, colliding
//! discriminators) fails here rather than on the first call.

use heck::ToSnakeCase;
use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::{
    account::{decode_account_with, decode_accounts_with, AccountSlot, DecodedAccount, RawAccount},
    config::CodecConfig,
    discriminator::{prepend_discriminator, strip_and_validate, Discriminator, DiscriminatorTable, Namespace, DISCRIMINATOR_LEN},
    error::{CodecError, CodecResult},
    idl::{IdlAccountItem, ProgramIdl},
    instruction::{flatten_account_names, resolve_account_metas, Accounts, DecodedInstruction},
    layout::Layout,
    types::{Field, TypeDescriptor, TypeRegistry},
    value::Value,
};

/// Encoder for one instruction of a loaded program.
#[derive(Debug, Clone)]
pub struct InstructionCodec {
    program_id: Pubkey,
    name: String,
    discriminator: Discriminator,
    args: Vec<Field>,
    layout: Layout,
    accounts: Vec<IdlAccountItem>,
}

impl InstructionCodec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn discriminator(&self) -> Discriminator {
        self.discriminator
    }

    pub fn args(&self) -> &[Field] {
        &self.args
    }

    /// Struct layout of the argument section.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn accounts(&self) -> &[IdlAccountItem] {
        &self.accounts
    }

    pub fn account_names(&self) -> Vec<String> {
        flatten_account_names(&self.accounts)
    }

    /// Encode `discriminator || args`.
    pub fn encode_data(&self, args: &Value) -> CodecResult<Vec<u8>> {
        let encoded = self.layout.encode(args)?;
        Ok(prepend_discriminator(&self.discriminator, &encoded))
    }

    pub fn build(&self, args: &Value, accounts: &Accounts) -> CodecResult<Instruction> {
        self.build_with_remaining(args, accounts, Vec::new())
    }

    /// Build the instruction, appending `remaining` metas after the IDL accounts.
    pub fn build_with_remaining(
        &self,
        args: &Value,
        accounts: &Accounts,
        remaining: Vec<AccountMeta>,
    ) -> CodecResult<Instruction> {
        let data = self.encode_data(args)?;
        let mut metas = resolve_account_metas(&self.accounts, accounts)?;
        metas.extend(remaining);
        tracing::trace!(
            program_id = %self.program_id,
            instruction = %self.name,
            accounts = metas.len(),
            len = data.len(),
            "built instruction"
        );
        Ok(Instruction {
            program_id: self.program_id,
            accounts: metas,
            data,
        })
    }

    /// Decode the argument section of instruction data carrying this instruction's discriminator.
    pub fn decode_args(&self, data: &[u8]) -> CodecResult<Value> {
        let body = strip_and_validate(&self.discriminator, data)?;
        self.layout
            .decode_exact(body)
            .map_err(|e| e.rebase(DISCRIMINATOR_LEN))
    }
}

/// Decoder for one account type of a loaded program.
#[derive(Debug, Clone)]
pub struct AccountCodec {
    program_id: Pubkey,
    name: String,
    discriminator: Discriminator,
    layout: Layout,
    config: CodecConfig,
}

impl AccountCodec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn discriminator(&self) -> Discriminator {
        self.discriminator
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn decode(&self, raw: &RawAccount) -> CodecResult<DecodedAccount> {
        self.decode_parts(&raw.owner, &raw.data)
    }

    pub fn decode_parts(&self, owner: &Pubkey, data: &[u8]) -> CodecResult<DecodedAccount> {
        decode_account_with(
            &self.config,
            owner,
            &self.program_id,
            &self.discriminator,
            &self.layout,
            data,
        )
    }

    /// Decode a fetched batch; see [`decode_accounts`](crate::account::decode_accounts).
    pub fn decode_many(&self, entries: &[Option<RawAccount>]) -> Vec<AccountSlot> {
        decode_accounts_with(
            &self.config,
            &self.program_id,
            &self.discriminator,
            &self.layout,
            entries,
        )
    }

    /// Encode account data (`discriminator || body`), as the program would store it.
    pub fn encode(&self, value: &Value) -> CodecResult<Vec<u8>> {
        let body = self.layout.encode(value)?;
        Ok(prepend_discriminator(&self.discriminator, &body))
    }
}

/// A loaded program: its address, defined types, instructions and accounts.
#[derive(Debug, Clone)]
pub struct Program {
    program_id: Pubkey,
    name: String,
    config: CodecConfig,
    types: TypeRegistry,
    instructions: Vec<InstructionCodec>,
    accounts: Vec<AccountCodec>,
    instruction_table: DiscriminatorTable,
    account_table: DiscriminatorTable,
}

impl Program {
    pub fn load(program_id: Pubkey, idl: &ProgramIdl) -> CodecResult<Self> {
        Self::load_with(program_id, idl, CodecConfig::default())
    }

    pub fn load_with(program_id: Pubkey, idl: &ProgramIdl, config: CodecConfig) -> CodecResult<Self> {
        let mut types = TypeRegistry::new();
        for def in &idl.types {
            if types.contains(&def.name) {
                return Err(CodecError::DuplicateTypeName {
                    name: def.name.clone(),
                });
            }
            types.register(def.name.clone(), def.ty.clone());
        }
        // Compile each defined type once so unresolved names and cycles surface at load.
        for def in &idl.types {
            Layout::compile_with(&TypeDescriptor::defined(def.name.clone()), &types)?;
        }

        let mut instruction_table = DiscriminatorTable::new(Namespace::Instruction);
        let mut instructions = Vec::with_capacity(idl.instructions.len());
        for ix in &idl.instructions {
            let discriminator = register_new(&mut instruction_table, &ix.name)?;
            instructions.push(InstructionCodec {
                program_id,
                name: ix.name.clone(),
                discriminator,
                args: ix.args.clone(),
                layout: Layout::compile_fields(&ix.args, &types)?,
                accounts: ix.accounts.clone(),
            });
        }

        let mut account_table = DiscriminatorTable::new(Namespace::Account);
        let mut accounts = Vec::with_capacity(idl.accounts.len());
        for def in &idl.accounts {
            let discriminator = register_new(&mut account_table, &def.name)?;
            accounts.push(AccountCodec {
                program_id,
                name: def.name.clone(),
                discriminator,
                layout: Layout::compile_with(&def.ty, &types)?,
                config: config.clone(),
            });
        }

        tracing::debug!(
            program = %idl.name,
            %program_id,
            instructions = instructions.len(),
            accounts = accounts.len(),
            types = types.len(),
            "loaded program description"
        );

        Ok(Self {
            program_id,
            name: idl.name.clone(),
            config,
            types,
            instructions,
            accounts,
            instruction_table,
            account_table,
        })
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn instructions(&self) -> &[InstructionCodec] {
        &self.instructions
    }

    pub fn accounts(&self) -> &[AccountCodec] {
        &self.accounts
    }

    /// Look up an instruction by IDL name; camelCase and snake_case spellings both match.
    pub fn instruction(&self, name: &str) -> CodecResult<&InstructionCodec> {
        let wanted = name.to_snake_case();
        self.instructions
            .iter()
            .find(|ix| ix.name == name || ix.name.to_snake_case() == wanted)
            .ok_or_else(|| CodecError::UnknownTypeName {
                name: name.to_string(),
            })
    }

    pub fn account(&self, name: &str) -> CodecResult<&AccountCodec> {
        self.accounts
            .iter()
            .find(|acc| acc.name == name)
            .ok_or_else(|| CodecError::UnknownTypeName {
                name: name.to_string(),
            })
    }

    /// Compiled layout of a defined type.
    pub fn type_layout(&self, name: &str) -> CodecResult<Layout> {
        Layout::compile_with(&TypeDescriptor::defined(name), &self.types)
    }

    /// Match instruction data to an instruction by its discriminator and decode the arguments.
    pub fn decode_instruction_data(&self, data: &[u8]) -> CodecResult<DecodedInstruction> {
        let discriminator = Discriminator::read(data)?;
        let name = self
            .instruction_table
            .name_of(&discriminator)
            .ok_or(CodecError::UnknownDiscriminator { discriminator })?;
        let codec = self.instruction(name)?;
        Ok(DecodedInstruction {
            name: codec.name.clone(),
            args: codec.decode_args(data)?,
            account_names: codec.account_names(),
        })
    }

    /// Decode an instruction addressed to this program.
    pub fn decode_instruction(&self, instruction: &Instruction) -> CodecResult<DecodedInstruction> {
        if instruction.program_id != self.program_id {
            return Err(CodecError::OwnershipMismatch {
                expected: self.program_id,
                actual: instruction.program_id,
            });
        }
        self.decode_instruction_data(&instruction.data)
    }

    /// Find the account type whose discriminator prefixes `data`.
    pub fn identify_account(&self, data: &[u8]) -> CodecResult<&AccountCodec> {
        let discriminator = Discriminator::read(data)?;
        let name = self
            .account_table
            .name_of(&discriminator)
            .ok_or(CodecError::UnknownDiscriminator { discriminator })?;
        self.account(name)
    }

    /// Decode an account of any type this program owns.
    pub fn decode_any_account(&self, raw: &RawAccount) -> CodecResult<(&str, DecodedAccount)> {
        if raw.owner != self.program_id {
            return Err(CodecError::OwnershipMismatch {
                expected: self.program_id,
                actual: raw.owner,
            });
        }
        let codec = self.identify_account(&raw.data)?;
        Ok((codec.name(), codec.decode(raw)?))
    }
}

/// Register a name that must not already be in `table`; a repeated definition
/// would otherwise shadow the later one on every lookup.
fn register_new(table: &mut DiscriminatorTable, name: &str) -> CodecResult<Discriminator> {
    if table.get(name).is_some() {
        return Err(CodecError::DuplicateDiscriminator {
            namespace: table.namespace(),
            name: name.to_string(),
            existing: name.to_string(),
        });
    }
    table.register_name(name)
}
