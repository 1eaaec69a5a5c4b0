//! Structural IDL input consumed by [`Program::load`](crate::program::Program::load).
//!
//! These are plain descriptors; reading them from an IDL document is the
//! loader's job and happens outside this crate.

use crate::types::{Field, TypeDescriptor};

/// Top-level description of one program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramIdl {
    pub name: String,
    pub instructions: Vec<IdlInstruction>,
    pub accounts: Vec<IdlAccountDef>,
    pub types: Vec<IdlTypeDef>,
}

impl ProgramIdl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_instruction(mut self, instruction: IdlInstruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn with_account(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.accounts.push(IdlAccountDef {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn with_type(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.types.push(IdlTypeDef {
            name: name.into(),
            ty,
        });
        self
    }
}

/// An instruction: ordered arguments and ordered accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdlInstruction {
    pub name: String,
    pub args: Vec<Field>,
    pub accounts: Vec<IdlAccountItem>,
}

impl IdlInstruction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: vec![],
            accounts: vec![],
        }
    }

    pub fn arg(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.args.push(Field::new(name, ty));
        self
    }

    pub fn account(mut self, name: impl Into<String>, is_signer: bool, is_writable: bool) -> Self {
        self.accounts.push(IdlAccountItem::Single {
            name: name.into(),
            is_signer,
            is_writable,
        });
        self
    }

    pub fn nested(mut self, name: impl Into<String>, accounts: Vec<IdlAccountItem>) -> Self {
        self.accounts.push(IdlAccountItem::Nested {
            name: name.into(),
            accounts,
        });
        self
    }
}

/// An account slot of an instruction, or a named group of slots.
///
/// Groups flatten depth-first into the instruction's account list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdlAccountItem {
    Single {
        name: String,
        is_signer: bool,
        is_writable: bool,
    },
    Nested {
        name: String,
        accounts: Vec<IdlAccountItem>,
    },
}

impl IdlAccountItem {
    pub fn single(name: impl Into<String>, is_signer: bool, is_writable: bool) -> Self {
        IdlAccountItem::Single {
            name: name.into(),
            is_signer,
            is_writable,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            IdlAccountItem::Single { name, .. } | IdlAccountItem::Nested { name, .. } => name,
        }
    }
}

/// An account type owned by the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdlAccountDef {
    pub name: String,
    pub ty: TypeDescriptor,
}

/// A named type other descriptors refer to through `TypeDescriptor::Defined`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdlTypeDef {
    pub name: String,
    pub ty: TypeDescriptor,
}
