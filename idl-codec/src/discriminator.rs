//! Anchor discriminators: `sha256("<namespace>:<name>")[..8]`.
//!
//! Instructions hash under the `global` namespace with their name converted to
//! snake_case (IDLs spell them in camelCase). Accounts hash under `account`
//! with the type name verbatim. The two namespaces never share a table.

use std::{collections::HashMap, fmt, str::FromStr};

use heck::ToSnakeCase;
use sha2::{Digest, Sha256};

use crate::error::{CodecError, CodecResult};

pub const DISCRIMINATOR_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Instruction,
    Account,
}

impl Namespace {
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Instruction => "global",
            Namespace::Account => "account",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Instruction => f.write_str("instruction"),
            Namespace::Account => f.write_str("account"),
        }
    }
}

/// 8-byte tag identifying one instruction or account kind of a program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Discriminator(pub [u8; DISCRIMINATOR_LEN]);

impl Discriminator {
    pub const fn new(bytes: [u8; DISCRIMINATOR_LEN]) -> Self {
        Self(bytes)
    }

    pub fn for_instruction(name: &str) -> Self {
        discriminator_for(Namespace::Instruction, name)
    }

    pub fn for_account(name: &str) -> Self {
        discriminator_for(Namespace::Account, name)
    }

    pub fn as_bytes(&self) -> &[u8; DISCRIMINATOR_LEN] {
        &self.0
    }

    /// Read the leading discriminator of `data`, failing when fewer than 8 bytes are present.
    pub fn read(data: &[u8]) -> CodecResult<Self> {
        let head = data
            .get(..DISCRIMINATOR_LEN)
            .ok_or_else(|| CodecError::truncated(0, DISCRIMINATOR_LEN, data.len()))?;
        let mut bytes = [0u8; DISCRIMINATOR_LEN];
        bytes.copy_from_slice(head);
        Ok(Self(bytes))
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Discriminator({self})")
    }
}

impl FromStr for Discriminator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix("0x").unwrap_or(s);
        if hex.len() != DISCRIMINATOR_LEN * 2 {
            return Err(format!(
                "Discriminator needs {} hex chars, got {}",
                DISCRIMINATOR_LEN * 2,
                hex.len()
            ));
        }
        let mut bytes = [0u8; DISCRIMINATOR_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|e| format!("Invalid hex at position {}: {}", i * 2, e))?;
        }
        Ok(Self(bytes))
    }
}

impl From<[u8; DISCRIMINATOR_LEN]> for Discriminator {
    fn from(bytes: [u8; DISCRIMINATOR_LEN]) -> Self {
        Self(bytes)
    }
}

/// Compute the discriminator of `name` in `namespace`.
pub fn discriminator_for(namespace: Namespace, name: &str) -> Discriminator {
    let preimage = match namespace {
        Namespace::Instruction => format!("{}:{}", namespace.prefix(), name.to_snake_case()),
        Namespace::Account => format!("{}:{}", namespace.prefix(), name),
    };
    let hash = Sha256::digest(preimage.as_bytes());
    let mut disc = [0u8; DISCRIMINATOR_LEN];
    disc.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
    Discriminator(disc)
}

pub fn prepend_discriminator(discriminator: &Discriminator, payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(DISCRIMINATOR_LEN + payload.len());
    data.extend_from_slice(discriminator.as_bytes());
    data.extend_from_slice(payload);
    data
}

/// Check the leading 8 bytes of `data` against `expected` and return the remainder.
pub fn strip_and_validate<'a>(expected: &Discriminator, data: &'a [u8]) -> CodecResult<&'a [u8]> {
    let actual = Discriminator::read(data)?;
    if actual != *expected {
        return Err(CodecError::DiscriminatorMismatch {
            expected: *expected,
            actual,
        });
    }
    Ok(&data[DISCRIMINATOR_LEN..])
}

/// Name ↔ discriminator lookup for one namespace of one program.
///
/// Filled once while a program description is loaded; a second name hashing
/// to an already registered discriminator is a configuration error.
#[derive(Debug, Clone)]
pub struct DiscriminatorTable {
    namespace: Namespace,
    by_name: HashMap<String, Discriminator>,
    by_discriminator: HashMap<Discriminator, String>,
}

impl DiscriminatorTable {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            by_name: HashMap::new(),
            by_discriminator: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Compute and register the discriminator of `name`.
    pub fn register_name(&mut self, name: &str) -> CodecResult<Discriminator> {
        let disc = discriminator_for(self.namespace, name);
        self.register(name, disc)?;
        Ok(disc)
    }

    pub fn register(&mut self, name: &str, discriminator: Discriminator) -> CodecResult<()> {
        if let Some(existing) = self.by_discriminator.get(&discriminator) {
            if existing != name {
                return Err(CodecError::DuplicateDiscriminator {
                    namespace: self.namespace,
                    name: name.to_string(),
                    existing: existing.clone(),
                });
            }
        }
        if let Some(previous) = self.by_name.get(name) {
            if *previous != discriminator {
                return Err(CodecError::DuplicateDiscriminator {
                    namespace: self.namespace,
                    name: name.to_string(),
                    existing: name.to_string(),
                });
            }
        }
        self.by_name.insert(name.to_string(), discriminator);
        self.by_discriminator.insert(discriminator, name.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Discriminator> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, discriminator: &Discriminator) -> Option<&str> {
        self.by_discriminator.get(discriminator).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
