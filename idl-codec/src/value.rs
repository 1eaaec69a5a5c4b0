//! Dynamic values that layouts encode and decode.

use solana_pubkey::Pubkey;

/// An in-memory value of some [`TypeDescriptor`](crate::types::TypeDescriptor) shape.
///
/// Fixed arrays and vectors share the [`Value::Array`] representation; the
/// layout decides whether a length prefix goes on the wire. Struct fields are
/// kept in declared order so decoded values compare equal to hand-built ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    F32(f32),
    F64(f64),
    Bool(bool),
    PublicKey(Pubkey),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Option(Option<Box<Value>>),
    Struct(Vec<(String, Value)>),
    Tuple(Vec<Value>),
    Enum(EnumValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub variant: String,
    pub fields: VariantValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariantValue {
    Unit,
    Tuple(Vec<Value>),
    Struct(Vec<(String, Value)>),
}

impl Value {
    pub fn some(value: Value) -> Self {
        Value::Option(Some(Box::new(value)))
    }

    pub fn none() -> Self {
        Value::Option(None)
    }

    /// Build a struct value from `(name, value)` pairs.
    pub fn structure<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Struct(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    pub fn unit_variant(variant: impl Into<String>) -> Self {
        Value::Enum(EnumValue {
            variant: variant.into(),
            fields: VariantValue::Unit,
        })
    }

    pub fn tuple_variant(variant: impl Into<String>, elements: Vec<Value>) -> Self {
        Value::Enum(EnumValue {
            variant: variant.into(),
            fields: VariantValue::Tuple(elements),
        })
    }

    pub fn struct_variant<I, S>(variant: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Enum(EnumValue {
            variant: variant.into(),
            fields: VariantValue::Struct(
                fields
                    .into_iter()
                    .map(|(name, value)| (name.into(), value))
                    .collect(),
            ),
        })
    }

    /// Look up a struct field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => lookup(fields, name),
            Value::Enum(EnumValue {
                fields: VariantValue::Struct(fields),
                ..
            }) => lookup(fields, name),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_pubkey(&self) -> Option<&Pubkey> {
        match self {
            Value::PublicKey(key) => Some(key),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Variant name of an enum value.
    pub fn variant(&self) -> Option<&str> {
        match self {
            Value::Enum(e) => Some(&e.variant),
            _ => None,
        }
    }

    /// Short name of the value's kind, used in shape error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::U128(_) => "u128",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::I128(_) => "i128",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Bool(_) => "bool",
            Value::PublicKey(_) => "publicKey",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Option(_) => "option",
            Value::Struct(_) => "struct",
            Value::Tuple(_) => "tuple",
            Value::Enum(_) => "enum",
        }
    }
}

fn lookup<'a>(fields: &'a [(String, Value)], name: &str) -> Option<&'a Value> {
    fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    Pubkey => PublicKey,
    String => String,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Value::Option(v.map(|inner| Box::new(inner.into())))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
