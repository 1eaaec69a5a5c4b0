//! Type-layout compiler and the binary codec it produces.
//!
//! Wire format (borsh-compatible, as used by Anchor programs):
//! - scalars: fixed-width little-endian, `bool` as one byte `0`/`1`
//! - `publicKey`: 32 raw bytes
//! - `string` / `bytes` / vectors: `u32` little-endian length, then the items
//! - fixed arrays: the items, no length
//! - options: one flag byte (`0` absent, `1` present), then the payload if present
//! - structs and tuples: members in declared order, no padding, no names
//! - enums: variant index (`u8`, or `u16` past 256 variants), then the variant payload

use borsh::{BorshDeserialize, BorshSerialize};
use solana_pubkey::Pubkey;

use crate::{
    error::{CodecError, CodecResult},
    types::{EnumVariant, Field, PrimitiveKind, TypeDescriptor, TypeRegistry, VariantFields},
    value::{EnumValue, Value, VariantValue},
};

const LEN_PREFIX: usize = 4;
const MAX_U8_TAGGED_VARIANTS: usize = 256;
const MAX_U16_TAGGED_VARIANTS: usize = 1 << 16;

/// Compiled encoder/decoder bound to one [`TypeDescriptor`].
///
/// Layouts are immutable once compiled and hold no interior state, so a single
/// instance can be shared across threads for concurrent encode/decode calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Primitive(PrimitiveKind),
    FixedArray { element: Box<Layout>, len: usize },
    Vector(Box<Layout>),
    Option(Box<Layout>),
    Struct(Vec<FieldLayout>),
    Tuple(Vec<Layout>),
    Enum(Vec<VariantLayout>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: String,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantLayout {
    pub name: String,
    pub shape: VariantShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantShape {
    Unit,
    Tuple(Vec<Layout>),
    Struct(Vec<FieldLayout>),
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

impl Layout {
    /// Compile a descriptor that contains no `Defined` references.
    pub fn compile(descriptor: &TypeDescriptor) -> CodecResult<Layout> {
        Compiler::new(None).compile(descriptor)
    }

    /// Compile a descriptor, resolving `Defined` references through `registry`.
    pub fn compile_with(descriptor: &TypeDescriptor, registry: &TypeRegistry) -> CodecResult<Layout> {
        Compiler::new(Some(registry)).compile(descriptor)
    }

    /// Compile an ordered field list as a struct layout (instruction arguments).
    pub fn compile_fields(fields: &[Field], registry: &TypeRegistry) -> CodecResult<Layout> {
        let mut compiler = Compiler::new(Some(registry));
        Ok(Layout::Struct(compiler.fields(fields)?))
    }

    /// Encoded width when it does not depend on the value.
    pub fn static_size(&self) -> Option<usize> {
        match self {
            Layout::Primitive(kind) => kind.static_size(),
            Layout::FixedArray { len: 0, .. } => Some(0),
            Layout::FixedArray { element, len } => element.static_size()?.checked_mul(*len),
            Layout::Vector(_) | Layout::Option(_) => None,
            Layout::Struct(fields) => sum_sizes(fields.iter().map(|f| &f.layout)),
            Layout::Tuple(elements) => sum_sizes(elements.iter()),
            Layout::Enum(variants) => {
                // Only fieldless enums have a fixed width.
                if variants.iter().all(|v| v.shape == VariantShape::Unit) {
                    Some(tag_width(variants.len()))
                } else {
                    None
                }
            }
        }
    }
}

impl Layout {
    /// Fewest bytes any value of this layout encodes to.
    pub fn min_size(&self) -> usize {
        match self {
            Layout::Primitive(kind) => kind.static_size().unwrap_or(LEN_PREFIX),
            Layout::FixedArray { element, len } => element.min_size().saturating_mul(*len),
            Layout::Vector(_) => LEN_PREFIX,
            Layout::Option(_) => 1,
            Layout::Struct(fields) => sum_min_sizes(fields.iter().map(|f| &f.layout)),
            Layout::Tuple(elements) => sum_min_sizes(elements.iter()),
            Layout::Enum(variants) => {
                let payload = variants
                    .iter()
                    .map(|v| match &v.shape {
                        VariantShape::Unit => 0,
                        VariantShape::Tuple(elements) => sum_min_sizes(elements.iter()),
                        VariantShape::Struct(fields) => sum_min_sizes(fields.iter().map(|f| &f.layout)),
                    })
                    .min()
                    .unwrap_or(0);
                tag_width(variants.len()).saturating_add(payload)
            }
        }
    }
}

fn sum_min_sizes<'a>(layouts: impl Iterator<Item = &'a Layout>) -> usize {
    layouts.map(Layout::min_size).fold(0usize, usize::saturating_add)
}

fn sum_sizes<'a>(layouts: impl Iterator<Item = &'a Layout>) -> Option<usize> {
    layouts.map(Layout::static_size).try_fold(0usize, |acc, size| acc.checked_add(size?))
}

fn tag_width(variant_count: usize) -> usize {
    if variant_count <= MAX_U8_TAGGED_VARIANTS {
        1
    } else {
        2
    }
}

struct Compiler<'a> {
    registry: Option<&'a TypeRegistry>,
    resolving: Vec<String>,
}

impl<'a> Compiler<'a> {
    fn new(registry: Option<&'a TypeRegistry>) -> Self {
        Self {
            registry,
            resolving: Vec::new(),
        }
    }

    fn compile(&mut self, descriptor: &TypeDescriptor) -> CodecResult<Layout> {
        let layout = match descriptor {
            TypeDescriptor::Primitive(kind) => Layout::Primitive(*kind),
            TypeDescriptor::FixedArray(element, len) => Layout::FixedArray {
                element: Box::new(self.compile(element)?),
                len: *len,
            },
            TypeDescriptor::Vector(element) => Layout::Vector(Box::new(self.compile(element)?)),
            TypeDescriptor::Option(element) => Layout::Option(Box::new(self.compile(element)?)),
            TypeDescriptor::Struct(fields) => Layout::Struct(self.fields(fields)?),
            TypeDescriptor::Tuple(elements) => Layout::Tuple(
                elements
                    .iter()
                    .map(|e| self.compile(e))
                    .collect::<CodecResult<_>>()?,
            ),
            TypeDescriptor::Enum(variants) => {
                if variants.len() > MAX_U16_TAGGED_VARIANTS {
                    return Err(CodecError::shape(
                        "",
                        format!("enum with {} variants exceeds the u16 tag range", variants.len()),
                    ));
                }
                Layout::Enum(
                    variants
                        .iter()
                        .map(|v| self.variant(v))
                        .collect::<CodecResult<_>>()?,
                )
            }
            TypeDescriptor::Defined(name) => self.defined(name)?,
        };
        Ok(layout)
    }

    fn fields(&mut self, fields: &[Field]) -> CodecResult<Vec<FieldLayout>> {
        fields
            .iter()
            .map(|f| {
                Ok(FieldLayout {
                    name: f.name.clone(),
                    layout: self.compile(&f.ty)?,
                })
            })
            .collect()
    }

    fn variant(&mut self, variant: &EnumVariant) -> CodecResult<VariantLayout> {
        let shape = match &variant.fields {
            VariantFields::Unit => VariantShape::Unit,
            VariantFields::Tuple(elements) => VariantShape::Tuple(
                elements
                    .iter()
                    .map(|e| self.compile(e))
                    .collect::<CodecResult<_>>()?,
            ),
            VariantFields::Struct(fields) => VariantShape::Struct(self.fields(fields)?),
        };
        Ok(VariantLayout {
            name: variant.name.clone(),
            shape,
        })
    }

    fn defined(&mut self, name: &str) -> CodecResult<Layout> {
        if self.resolving.iter().any(|n| n == name) {
            return Err(CodecError::CyclicType {
                name: name.to_string(),
            });
        }
        let registry = self.registry.ok_or_else(|| CodecError::UnknownTypeName {
            name: name.to_string(),
        })?;
        let descriptor = registry.get(name)?;
        self.resolving.push(name.to_string());
        let layout = self.compile(descriptor);
        self.resolving.pop();
        layout
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

impl Layout {
    /// Encode `value`. The value is checked against the layout as it is
    /// written; on a shape error no bytes are returned.
    pub fn encode(&self, value: &Value) -> CodecResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.static_size().unwrap_or(64));
        self.write(value, "", &mut out)?;
        Ok(out)
    }

    /// Append the encoding of `value` to `out`. On error `out` is left unchanged.
    pub fn encode_into(&self, value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
        let bytes = self.encode(value)?;
        out.extend_from_slice(&bytes);
        Ok(())
    }

    /// Check that `value` conforms to this layout without keeping the bytes.
    pub fn validate(&self, value: &Value) -> CodecResult<()> {
        self.write(value, "", &mut Vec::new())
    }

    fn write(&self, value: &Value, path: &str, out: &mut Vec<u8>) -> CodecResult<()> {
        match (self, value) {
            (Layout::Primitive(kind), _) => write_primitive(*kind, value, path, out),
            (Layout::FixedArray { element, len }, Value::Array(items)) => {
                if items.len() != *len {
                    return Err(CodecError::shape(
                        path,
                        format!("expected {} elements, got {}", len, items.len()),
                    ));
                }
                for (i, item) in items.iter().enumerate() {
                    element.write(item, &index_path(path, i), out)?;
                }
                Ok(())
            }
            (Layout::Vector(element), Value::Array(items)) => {
                let len = u32::try_from(items.len()).map_err(|_| {
                    CodecError::shape(path, format!("{} elements exceed u32 length", items.len()))
                })?;
                if len > 0 && element.min_size() == 0 {
                    return Err(CodecError::shape(path, "vector of zero-width elements"));
                }
                write_scalar(&len, path, out)?;
                for (i, item) in items.iter().enumerate() {
                    element.write(item, &index_path(path, i), out)?;
                }
                Ok(())
            }
            (Layout::Option(_), Value::Option(None)) => {
                out.push(0);
                Ok(())
            }
            (Layout::Option(inner), Value::Option(Some(payload))) => {
                out.push(1);
                inner.write(payload, path, out)
            }
            (Layout::Struct(fields), Value::Struct(values)) => write_fields(fields, values, path, out),
            (Layout::Tuple(elements), Value::Tuple(values)) => write_tuple(elements, values, path, out),
            (Layout::Enum(variants), Value::Enum(value)) => write_enum(variants, value, path, out),
            (layout, value) => Err(CodecError::shape(
                path,
                format!("expected {}, got {}", layout.kind_name(), value.kind_name()),
            )),
        }
    }

    /// Short name of the layout's kind, used in shape error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Layout::Primitive(kind) => kind.idl_name(),
            Layout::FixedArray { .. } => "array",
            Layout::Vector(_) => "vec",
            Layout::Option(_) => "option",
            Layout::Struct(_) => "struct",
            Layout::Tuple(_) => "tuple",
            Layout::Enum(_) => "enum",
        }
    }
}

pub(crate) fn field_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

pub(crate) fn index_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

fn write_scalar<T: BorshSerialize>(value: &T, path: &str, out: &mut Vec<u8>) -> CodecResult<()> {
    value
        .serialize(out)
        .map_err(|e| CodecError::shape(path, e.to_string()))
}

fn write_primitive(kind: PrimitiveKind, value: &Value, path: &str, out: &mut Vec<u8>) -> CodecResult<()> {
    match (kind, value) {
        (PrimitiveKind::U8, Value::U8(v)) => write_scalar(v, path, out),
        (PrimitiveKind::U16, Value::U16(v)) => write_scalar(v, path, out),
        (PrimitiveKind::U32, Value::U32(v)) => write_scalar(v, path, out),
        (PrimitiveKind::U64, Value::U64(v)) => write_scalar(v, path, out),
        (PrimitiveKind::U128, Value::U128(v)) => write_scalar(v, path, out),
        (PrimitiveKind::I8, Value::I8(v)) => write_scalar(v, path, out),
        (PrimitiveKind::I16, Value::I16(v)) => write_scalar(v, path, out),
        (PrimitiveKind::I32, Value::I32(v)) => write_scalar(v, path, out),
        (PrimitiveKind::I64, Value::I64(v)) => write_scalar(v, path, out),
        (PrimitiveKind::I128, Value::I128(v)) => write_scalar(v, path, out),
        // borsh rejects NaN, matching what on-chain deserialization accepts.
        (PrimitiveKind::F32, Value::F32(v)) => write_scalar(v, path, out),
        (PrimitiveKind::F64, Value::F64(v)) => write_scalar(v, path, out),
        (PrimitiveKind::Bool, Value::Bool(v)) => write_scalar(v, path, out),
        (PrimitiveKind::PublicKey, Value::PublicKey(key)) => {
            out.extend_from_slice(key.as_ref());
            Ok(())
        }
        (PrimitiveKind::String, Value::String(s)) => write_scalar(s, path, out),
        (PrimitiveKind::Bytes, Value::Bytes(bytes)) => write_scalar(bytes, path, out),
        (kind, value) => Err(CodecError::shape(
            path,
            format!("expected {}, got {}", kind, value.kind_name()),
        )),
    }
}

fn write_fields(
    fields: &[FieldLayout],
    values: &[(String, Value)],
    path: &str,
    out: &mut Vec<u8>,
) -> CodecResult<()> {
    if let Some((unknown, _)) = values
        .iter()
        .find(|(name, _)| !fields.iter().any(|f| &f.name == name))
    {
        return Err(CodecError::shape(path, format!("unknown field `{unknown}`")));
    }
    for field in fields {
        let mut matches = values.iter().filter(|(name, _)| *name == field.name);
        let value = matches
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| CodecError::shape(path, format!("missing field `{}`", field.name)))?;
        if matches.next().is_some() {
            return Err(CodecError::shape(path, format!("duplicate field `{}`", field.name)));
        }
        field.layout.write(value, &field_path(path, &field.name), out)?;
    }
    Ok(())
}

fn write_tuple(elements: &[Layout], values: &[Value], path: &str, out: &mut Vec<u8>) -> CodecResult<()> {
    if elements.len() != values.len() {
        return Err(CodecError::shape(
            path,
            format!("expected {} tuple elements, got {}", elements.len(), values.len()),
        ));
    }
    for (i, (layout, value)) in elements.iter().zip(values).enumerate() {
        layout.write(value, &index_path(path, i), out)?;
    }
    Ok(())
}

fn write_enum(variants: &[VariantLayout], value: &EnumValue, path: &str, out: &mut Vec<u8>) -> CodecResult<()> {
    let (index, variant) = variants
        .iter()
        .enumerate()
        .find(|(_, v)| v.name == value.variant)
        .ok_or_else(|| CodecError::shape(path, format!("unknown variant `{}`", value.variant)))?;
    if tag_width(variants.len()) == 1 {
        out.push(index as u8);
    } else {
        let tag = u16::try_from(index)
            .map_err(|_| CodecError::shape(path, format!("variant index {index} exceeds u16 tag")))?;
        write_scalar(&tag, path, out)?;
    }
    let path = field_path(path, &variant.name);
    match (&variant.shape, &value.fields) {
        (VariantShape::Unit, VariantValue::Unit) => Ok(()),
        (VariantShape::Tuple(elements), VariantValue::Tuple(values)) => {
            write_tuple(elements, values, &path, out)
        }
        (VariantShape::Struct(fields), VariantValue::Struct(values)) => {
            write_fields(fields, values, &path, out)
        }
        (shape, _) => Err(CodecError::shape(
            &path,
            format!("variant `{}` expects {} payload", variant.name, shape.kind_name()),
        )),
    }
}

impl VariantShape {
    fn kind_name(&self) -> &'static str {
        match self {
            VariantShape::Unit => "no",
            VariantShape::Tuple(_) => "a tuple",
            VariantShape::Struct(_) => "a struct",
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        let available = self.remaining();
        if available < n {
            return Err(CodecError::truncated(self.pos, n, available));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn scalar<T: BorshDeserialize>(&mut self, width: usize) -> CodecResult<T> {
        let start = self.pos;
        let mut slice = self.take(width)?;
        T::deserialize(&mut slice).map_err(|e| CodecError::mismatch(start, e.to_string()))
    }

    fn flag(&mut self, what: &'static str) -> CodecResult<bool> {
        let start = self.pos;
        match self.take(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(CodecError::InvalidTag {
                offset: start,
                tag: tag.into(),
                what,
            }),
        }
    }

    fn len_prefix(&mut self) -> CodecResult<usize> {
        let len: u32 = self.scalar(LEN_PREFIX)?;
        Ok(len as usize)
    }
}

impl Layout {
    /// Decode one value starting at `offset`; returns the value and the number
    /// of bytes consumed. Error offsets are absolute positions in `bytes`.
    pub fn decode(&self, bytes: &[u8], offset: usize) -> CodecResult<(Value, usize)> {
        if offset > bytes.len() {
            return Err(CodecError::truncated(bytes.len(), offset - bytes.len(), 0));
        }
        let mut reader = Reader { bytes, pos: offset };
        let value = self.read(&mut reader)?;
        Ok((value, reader.pos - offset))
    }

    /// Decode a buffer that must hold exactly one value.
    pub fn decode_exact(&self, bytes: &[u8]) -> CodecResult<Value> {
        let (value, consumed) = self.decode(bytes, 0)?;
        if consumed != bytes.len() {
            return Err(CodecError::mismatch(
                consumed,
                format!("{} trailing bytes after value", bytes.len() - consumed),
            ));
        }
        Ok(value)
    }

    fn read(&self, r: &mut Reader<'_>) -> CodecResult<Value> {
        match self {
            Layout::Primitive(kind) => read_primitive(*kind, r),
            Layout::FixedArray { element, len } => {
                if let Some(size) = element.static_size() {
                    let needed = size.checked_mul(*len).unwrap_or(usize::MAX);
                    let available = r.remaining();
                    if available < needed {
                        return Err(CodecError::mismatch(
                            r.pos,
                            format!(
                                "fixed array of {len} x {size} bytes needs {needed}, {available} remain"
                            ),
                        ));
                    }
                }
                let mut items = Vec::with_capacity((*len).min(r.remaining().max(1)));
                for _ in 0..*len {
                    items.push(element.read(r)?);
                }
                Ok(Value::Array(items))
            }
            Layout::Vector(element) => {
                let start = r.pos;
                let len = r.len_prefix()?;
                // Every element takes at least `min_size` bytes, which bounds `len` by the input.
                let min = element.min_size();
                if len > 0 && min == 0 {
                    return Err(CodecError::mismatch(start, "vector of zero-width elements"));
                }
                let needed = min.checked_mul(len).unwrap_or(usize::MAX);
                let available = r.remaining();
                if available < needed {
                    return Err(CodecError::truncated(r.pos, needed, available));
                }
                let mut items = Vec::with_capacity(len.min(r.remaining()));
                for _ in 0..len {
                    items.push(element.read(r)?);
                }
                Ok(Value::Array(items))
            }
            Layout::Option(inner) => {
                if r.flag("option")? {
                    Ok(Value::some(inner.read(r)?))
                } else {
                    Ok(Value::none())
                }
            }
            Layout::Struct(fields) => Ok(Value::Struct(read_fields(fields, r)?)),
            Layout::Tuple(elements) => Ok(Value::Tuple(read_tuple(elements, r)?)),
            Layout::Enum(variants) => read_enum(variants, r),
        }
    }
}

fn read_primitive(kind: PrimitiveKind, r: &mut Reader<'_>) -> CodecResult<Value> {
    let value = match kind {
        PrimitiveKind::U8 => Value::U8(r.scalar(1)?),
        PrimitiveKind::U16 => Value::U16(r.scalar(2)?),
        PrimitiveKind::U32 => Value::U32(r.scalar(4)?),
        PrimitiveKind::U64 => Value::U64(r.scalar(8)?),
        PrimitiveKind::U128 => Value::U128(r.scalar(16)?),
        PrimitiveKind::I8 => Value::I8(r.scalar(1)?),
        PrimitiveKind::I16 => Value::I16(r.scalar(2)?),
        PrimitiveKind::I32 => Value::I32(r.scalar(4)?),
        PrimitiveKind::I64 => Value::I64(r.scalar(8)?),
        PrimitiveKind::I128 => Value::I128(r.scalar(16)?),
        PrimitiveKind::F32 => Value::F32(r.scalar(4)?),
        PrimitiveKind::F64 => Value::F64(r.scalar(8)?),
        PrimitiveKind::Bool => Value::Bool(r.flag("bool")?),
        PrimitiveKind::PublicKey => {
            let mut key = [0u8; 32];
            key.copy_from_slice(r.take(32)?);
            Value::PublicKey(Pubkey::new_from_array(key))
        }
        PrimitiveKind::String => {
            let len = r.len_prefix()?;
            let start = r.pos;
            let raw = r.take(len)?;
            let s = std::str::from_utf8(raw)
                .map_err(|e| CodecError::mismatch(start + e.valid_up_to(), "invalid UTF-8 in string"))?;
            Value::String(s.to_string())
        }
        PrimitiveKind::Bytes => {
            let len = r.len_prefix()?;
            Value::Bytes(r.take(len)?.to_vec())
        }
    };
    Ok(value)
}

fn read_fields(fields: &[FieldLayout], r: &mut Reader<'_>) -> CodecResult<Vec<(String, Value)>> {
    fields
        .iter()
        .map(|f| Ok((f.name.clone(), f.layout.read(r)?)))
        .collect()
}

fn read_tuple(elements: &[Layout], r: &mut Reader<'_>) -> CodecResult<Vec<Value>> {
    elements.iter().map(|e| e.read(r)).collect()
}

fn read_enum(variants: &[VariantLayout], r: &mut Reader<'_>) -> CodecResult<Value> {
    let start = r.pos;
    let index = if tag_width(variants.len()) == 1 {
        usize::from(r.scalar::<u8>(1)?)
    } else {
        usize::from(r.scalar::<u16>(2)?)
    };
    let variant = variants.get(index).ok_or(CodecError::InvalidTag {
        offset: start,
        tag: index as u64,
        what: "enum variant",
    })?;
    let fields = match &variant.shape {
        VariantShape::Unit => VariantValue::Unit,
        VariantShape::Tuple(elements) => VariantValue::Tuple(read_tuple(elements, r)?),
        VariantShape::Struct(fields) => VariantValue::Struct(read_fields(fields, r)?),
    };
    Ok(Value::Enum(EnumValue {
        variant: variant.name.clone(),
        fields,
    }))
}
