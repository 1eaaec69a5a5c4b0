//! Abstract type descriptors consumed from the IDL.
//!
//! A [`TypeDescriptor`] describes the shape of a value, never its bytes. The
//! layout compiler turns descriptors into [`Layout`](crate::layout::Layout)s.

use std::{collections::HashMap, fmt};

use crate::error::{CodecError, CodecResult};

/// Fixed-width scalars and the length-prefixed string/bytes leaves of the Anchor IDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    F32,
    F64,
    Bool,
    /// 32 raw address bytes.
    PublicKey,
    /// u32 length prefix followed by UTF-8 bytes.
    String,
    /// u32 length prefix followed by raw bytes.
    Bytes,
}

impl PrimitiveKind {
    /// Encoded width, or `None` for the length-prefixed kinds.
    pub fn static_size(self) -> Option<usize> {
        match self {
            PrimitiveKind::U8 | PrimitiveKind::I8 | PrimitiveKind::Bool => Some(1),
            PrimitiveKind::U16 | PrimitiveKind::I16 => Some(2),
            PrimitiveKind::U32 | PrimitiveKind::I32 | PrimitiveKind::F32 => Some(4),
            PrimitiveKind::U64 | PrimitiveKind::I64 | PrimitiveKind::F64 => Some(8),
            PrimitiveKind::U128 | PrimitiveKind::I128 => Some(16),
            PrimitiveKind::PublicKey => Some(32),
            PrimitiveKind::String | PrimitiveKind::Bytes => None,
        }
    }

    /// Name used by the IDL for this primitive.
    pub fn idl_name(self) -> &'static str {
        match self {
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::U128 => "u128",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::I128 => "i128",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::PublicKey => "publicKey",
            PrimitiveKind::String => "string",
            PrimitiveKind::Bytes => "bytes",
        }
    }

    pub fn from_idl_name(name: &str) -> Option<Self> {
        let kind = match name {
            "u8" => PrimitiveKind::U8,
            "u16" => PrimitiveKind::U16,
            "u32" => PrimitiveKind::U32,
            "u64" => PrimitiveKind::U64,
            "u128" => PrimitiveKind::U128,
            "i8" => PrimitiveKind::I8,
            "i16" => PrimitiveKind::I16,
            "i32" => PrimitiveKind::I32,
            "i64" => PrimitiveKind::I64,
            "i128" => PrimitiveKind::I128,
            "f32" => PrimitiveKind::F32,
            "f64" => PrimitiveKind::F64,
            "bool" => PrimitiveKind::Bool,
            "publicKey" | "pubkey" => PrimitiveKind::PublicKey,
            "string" => PrimitiveKind::String,
            "bytes" => PrimitiveKind::Bytes,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.idl_name())
    }
}

/// A named struct field or instruction argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeDescriptor,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Payload shape of one enum variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantFields {
    Unit,
    Tuple(Vec<TypeDescriptor>),
    Struct(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    pub name: String,
    pub fields: VariantFields,
}

impl EnumVariant {
    pub fn unit(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: VariantFields::Unit,
        }
    }

    pub fn tuple(name: impl Into<String>, elements: Vec<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields: VariantFields::Tuple(elements),
        }
    }

    pub fn with_fields(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields: VariantFields::Struct(fields),
        }
    }
}

/// Schema-level description of a value's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    FixedArray(Box<TypeDescriptor>, usize),
    Vector(Box<TypeDescriptor>),
    Option(Box<TypeDescriptor>),
    Struct(Vec<Field>),
    Tuple(Vec<TypeDescriptor>),
    Enum(Vec<EnumVariant>),
    /// Reference to a type registered in a [`TypeRegistry`].
    Defined(String),
}

impl TypeDescriptor {
    pub const U8: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::U8);
    pub const U16: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::U16);
    pub const U32: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::U32);
    pub const U64: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::U64);
    pub const U128: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::U128);
    pub const I8: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::I8);
    pub const I16: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::I16);
    pub const I32: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::I32);
    pub const I64: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::I64);
    pub const I128: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::I128);
    pub const F32: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::F32);
    pub const F64: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::F64);
    pub const BOOL: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Bool);
    pub const PUBLIC_KEY: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::PublicKey);
    pub const STRING: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::String);
    pub const BYTES: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Bytes);

    pub fn array(element: TypeDescriptor, len: usize) -> Self {
        TypeDescriptor::FixedArray(Box::new(element), len)
    }

    pub fn vec(element: TypeDescriptor) -> Self {
        TypeDescriptor::Vector(Box::new(element))
    }

    pub fn option(element: TypeDescriptor) -> Self {
        TypeDescriptor::Option(Box::new(element))
    }

    pub fn defined(name: impl Into<String>) -> Self {
        TypeDescriptor::Defined(name.into())
    }
}

/// Name → descriptor table for the defined types of one program.
///
/// Built once from the IDL input and shared by reference; lookups of names
/// that were never registered fail with [`CodecError::UnknownTypeName`].
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a defined type. A later registration under the same name replaces the earlier one;
    /// `Program::load` rejects repeated names before they reach the registry.
    pub fn register(&mut self, name: impl Into<String>, ty: TypeDescriptor) {
        self.types.insert(name.into(), ty);
    }

    pub fn get(&self, name: &str) -> CodecResult<&TypeDescriptor> {
        self.types
            .get(name)
            .ok_or_else(|| CodecError::UnknownTypeName {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
