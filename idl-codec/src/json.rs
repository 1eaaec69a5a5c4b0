//! Structure ↔ JSON bridge.
//!
//! JSON shapes:
//! - integers up to 64 bits are numbers; `u128`/`i128` are decimal strings
//! - `publicKey` is its base58 string
//! - `bytes` is an array of numbers
//! - options are `null` or the unwrapped payload
//! - structs are objects, tuples and arrays are arrays
//! - enums are `{"kind": "Variant"}`, plus `"value"` (object or array) for variants with fields
//!
//! Because an option's payload is not wrapped, `Option<Option<T>>` cannot
//! tell `Some(None)` from `None` in JSON; both read back as `None`.

use serde_json::{Map, Number, Value as JsonValue};
use solana_pubkey::Pubkey;

use crate::{
    error::{CodecError, CodecResult},
    layout::{field_path, index_path, FieldLayout, Layout, VariantLayout, VariantShape},
    types::PrimitiveKind,
    value::{EnumValue, Value, VariantValue},
};

const KIND_KEY: &str = "kind";
const VALUE_KEY: &str = "value";

/// Convert `value` to its JSON form. A value that does not fit `layout` is an
/// `ArgumentShapeError`.
pub fn to_json(value: &Value, layout: &Layout) -> CodecResult<JsonValue> {
    value_to_json(value, layout, "")
}

/// Read a value of `layout`'s shape from JSON. Shapes that do not match are
/// rejected with `JsonShapeError`; nothing is coerced.
pub fn from_json(json: &JsonValue, layout: &Layout) -> CodecResult<Value> {
    json_to_value(json, layout, "")
}

// ---------------------------------------------------------------------------
// Value -> JSON
// ---------------------------------------------------------------------------

fn value_to_json(value: &Value, layout: &Layout, path: &str) -> CodecResult<JsonValue> {
    match (layout, value) {
        (Layout::Primitive(kind), _) => primitive_to_json(*kind, value, path),
        (Layout::FixedArray { element, len }, Value::Array(items)) => {
            if items.len() != *len {
                return Err(CodecError::shape(
                    path,
                    format!("expected {} elements, got {}", len, items.len()),
                ));
            }
            array_to_json(items, element, path)
        }
        (Layout::Vector(element), Value::Array(items)) => array_to_json(items, element, path),
        (Layout::Option(_), Value::Option(None)) => Ok(JsonValue::Null),
        (Layout::Option(inner), Value::Option(Some(payload))) => value_to_json(payload, inner, path),
        (Layout::Struct(fields), Value::Struct(values)) => fields_to_json(fields, values, path),
        (Layout::Tuple(elements), Value::Tuple(values)) => tuple_to_json(elements, values, path),
        (Layout::Enum(variants), Value::Enum(value)) => enum_to_json(variants, value, path),
        (layout, value) => Err(CodecError::shape(
            path,
            format!("expected {}, got {}", layout.kind_name(), value.kind_name()),
        )),
    }
}

fn primitive_to_json(kind: PrimitiveKind, value: &Value, path: &str) -> CodecResult<JsonValue> {
    let json = match (kind, value) {
        (PrimitiveKind::U8, Value::U8(v)) => JsonValue::from(*v),
        (PrimitiveKind::U16, Value::U16(v)) => JsonValue::from(*v),
        (PrimitiveKind::U32, Value::U32(v)) => JsonValue::from(*v),
        (PrimitiveKind::U64, Value::U64(v)) => JsonValue::from(*v),
        (PrimitiveKind::U128, Value::U128(v)) => JsonValue::String(v.to_string()),
        (PrimitiveKind::I8, Value::I8(v)) => JsonValue::from(*v),
        (PrimitiveKind::I16, Value::I16(v)) => JsonValue::from(*v),
        (PrimitiveKind::I32, Value::I32(v)) => JsonValue::from(*v),
        (PrimitiveKind::I64, Value::I64(v)) => JsonValue::from(*v),
        (PrimitiveKind::I128, Value::I128(v)) => JsonValue::String(v.to_string()),
        (PrimitiveKind::F32, Value::F32(v)) => float_to_json(f64::from(*v), path)?,
        (PrimitiveKind::F64, Value::F64(v)) => float_to_json(*v, path)?,
        (PrimitiveKind::Bool, Value::Bool(v)) => JsonValue::Bool(*v),
        (PrimitiveKind::PublicKey, Value::PublicKey(key)) => JsonValue::String(key.to_string()),
        (PrimitiveKind::String, Value::String(s)) => JsonValue::String(s.clone()),
        (PrimitiveKind::Bytes, Value::Bytes(bytes)) => {
            JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect())
        }
        (kind, value) => {
            return Err(CodecError::shape(
                path,
                format!("expected {}, got {}", kind, value.kind_name()),
            ))
        }
    };
    Ok(json)
}

fn float_to_json(v: f64, path: &str) -> CodecResult<JsonValue> {
    Number::from_f64(v)
        .map(JsonValue::Number)
        .ok_or_else(|| CodecError::shape(path, format!("{v} has no JSON representation")))
}

fn array_to_json(items: &[Value], element: &Layout, path: &str) -> CodecResult<JsonValue> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| value_to_json(item, element, &index_path(path, i)))
        .collect::<CodecResult<Vec<_>>>()
        .map(JsonValue::Array)
}

fn fields_to_json(fields: &[FieldLayout], values: &[(String, Value)], path: &str) -> CodecResult<JsonValue> {
    if let Some((unknown, _)) = values
        .iter()
        .find(|(name, _)| !fields.iter().any(|f| &f.name == name))
    {
        return Err(CodecError::shape(path, format!("unknown field `{unknown}`")));
    }
    let mut object = Map::new();
    for field in fields {
        let mut matches = values.iter().filter(|(name, _)| *name == field.name);
        let value = matches
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| CodecError::shape(path, format!("missing field `{}`", field.name)))?;
        if matches.next().is_some() {
            return Err(CodecError::shape(path, format!("duplicate field `{}`", field.name)));
        }
        object.insert(
            field.name.clone(),
            value_to_json(value, &field.layout, &field_path(path, &field.name))?,
        );
    }
    Ok(JsonValue::Object(object))
}

fn tuple_to_json(elements: &[Layout], values: &[Value], path: &str) -> CodecResult<JsonValue> {
    if elements.len() != values.len() {
        return Err(CodecError::shape(
            path,
            format!("expected {} tuple elements, got {}", elements.len(), values.len()),
        ));
    }
    elements
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (layout, value))| value_to_json(value, layout, &index_path(path, i)))
        .collect::<CodecResult<Vec<_>>>()
        .map(JsonValue::Array)
}

fn enum_to_json(variants: &[VariantLayout], value: &EnumValue, path: &str) -> CodecResult<JsonValue> {
    let variant = variants
        .iter()
        .find(|v| v.name == value.variant)
        .ok_or_else(|| CodecError::shape(path, format!("unknown variant `{}`", value.variant)))?;
    let mut object = Map::new();
    object.insert(KIND_KEY.to_string(), JsonValue::String(variant.name.clone()));
    let value_path = field_path(path, VALUE_KEY);
    match (&variant.shape, &value.fields) {
        (VariantShape::Unit, VariantValue::Unit) => {}
        (VariantShape::Tuple(elements), VariantValue::Tuple(values)) => {
            object.insert(VALUE_KEY.to_string(), tuple_to_json(elements, values, &value_path)?);
        }
        (VariantShape::Struct(fields), VariantValue::Struct(values)) => {
            object.insert(VALUE_KEY.to_string(), fields_to_json(fields, values, &value_path)?);
        }
        _ => {
            return Err(CodecError::shape(
                path,
                format!("payload of variant `{}` does not match its declaration", variant.name),
            ))
        }
    }
    Ok(JsonValue::Object(object))
}

// ---------------------------------------------------------------------------
// JSON -> Value
// ---------------------------------------------------------------------------

fn json_to_value(json: &JsonValue, layout: &Layout, path: &str) -> CodecResult<Value> {
    match layout {
        Layout::Primitive(kind) => json_to_primitive(json, *kind, path),
        Layout::FixedArray { element, len } => {
            let items = expect_array(json, path)?;
            if items.len() != *len {
                return Err(CodecError::json(
                    path,
                    format!("expected {} elements, got {}", len, items.len()),
                ));
            }
            json_to_array(items, element, path)
        }
        Layout::Vector(element) => json_to_array(expect_array(json, path)?, element, path),
        Layout::Option(inner) => match json {
            JsonValue::Null => Ok(Value::none()),
            payload => Ok(Value::some(json_to_value(payload, inner, path)?)),
        },
        Layout::Struct(fields) => Ok(Value::Struct(json_to_fields(json, fields, path)?)),
        Layout::Tuple(elements) => Ok(Value::Tuple(json_to_tuple(json, elements, path)?)),
        Layout::Enum(variants) => json_to_enum(json, variants, path),
    }
}

fn json_type(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn expected(json: &JsonValue, what: &str, path: &str) -> CodecError {
    CodecError::json(path, format!("expected {what}, got {}", json_type(json)))
}

fn expect_array<'a>(json: &'a JsonValue, path: &str) -> CodecResult<&'a Vec<JsonValue>> {
    json.as_array().ok_or_else(|| expected(json, "array", path))
}

fn expect_object<'a>(json: &'a JsonValue, path: &str) -> CodecResult<&'a Map<String, JsonValue>> {
    json.as_object().ok_or_else(|| expected(json, "object", path))
}

fn unsigned<T: TryFrom<u64>>(json: &JsonValue, kind: PrimitiveKind, path: &str) -> CodecResult<T> {
    let raw = json
        .as_u64()
        .ok_or_else(|| expected(json, &format!("{kind} integer"), path))?;
    T::try_from(raw).map_err(|_| CodecError::json(path, format!("{raw} out of range for {kind}")))
}

fn signed<T: TryFrom<i64>>(json: &JsonValue, kind: PrimitiveKind, path: &str) -> CodecResult<T> {
    let raw = json
        .as_i64()
        .ok_or_else(|| expected(json, &format!("{kind} integer"), path))?;
    T::try_from(raw).map_err(|_| CodecError::json(path, format!("{raw} out of range for {kind}")))
}

/// 128-bit integers come as decimal strings; plain JSON integers are accepted too.
fn wide<T>(json: &JsonValue, kind: PrimitiveKind, path: &str) -> CodecResult<T>
where
    T: std::str::FromStr + From<u64> + TryFrom<i64>,
{
    match json {
        JsonValue::String(s) => s
            .parse::<T>()
            .map_err(|_| CodecError::json(path, format!("`{s}` is not a valid {kind}"))),
        JsonValue::Number(n) => {
            if let Some(v) = n.as_u64() {
                Ok(T::from(v))
            } else if let Some(v) = n.as_i64() {
                T::try_from(v).map_err(|_| CodecError::json(path, format!("{v} out of range for {kind}")))
            } else {
                Err(expected(json, &format!("{kind} integer"), path))
            }
        }
        other => Err(expected(other, &format!("{kind} decimal string"), path)),
    }
}

fn json_to_primitive(json: &JsonValue, kind: PrimitiveKind, path: &str) -> CodecResult<Value> {
    let value = match kind {
        PrimitiveKind::U8 => Value::U8(unsigned(json, kind, path)?),
        PrimitiveKind::U16 => Value::U16(unsigned(json, kind, path)?),
        PrimitiveKind::U32 => Value::U32(unsigned(json, kind, path)?),
        PrimitiveKind::U64 => Value::U64(unsigned(json, kind, path)?),
        PrimitiveKind::U128 => Value::U128(wide(json, kind, path)?),
        PrimitiveKind::I8 => Value::I8(signed(json, kind, path)?),
        PrimitiveKind::I16 => Value::I16(signed(json, kind, path)?),
        PrimitiveKind::I32 => Value::I32(signed(json, kind, path)?),
        PrimitiveKind::I64 => Value::I64(signed(json, kind, path)?),
        PrimitiveKind::I128 => Value::I128(wide(json, kind, path)?),
        PrimitiveKind::F32 => {
            let v = json.as_f64().ok_or_else(|| expected(json, "number", path))?;
            let narrowed = v as f32;
            if narrowed.is_infinite() {
                return Err(CodecError::json(path, format!("{v} is out of range for f32")));
            }
            Value::F32(narrowed)
        }
        PrimitiveKind::F64 => Value::F64(json.as_f64().ok_or_else(|| expected(json, "number", path))?),
        PrimitiveKind::Bool => Value::Bool(json.as_bool().ok_or_else(|| expected(json, "boolean", path))?),
        PrimitiveKind::PublicKey => {
            let s = json
                .as_str()
                .ok_or_else(|| expected(json, "base58 address string", path))?;
            Value::PublicKey(parse_pubkey(s, path)?)
        }
        PrimitiveKind::String => Value::String(
            json.as_str()
                .ok_or_else(|| expected(json, "string", path))?
                .to_string(),
        ),
        PrimitiveKind::Bytes => {
            let items = expect_array(json, path)?;
            let bytes = items
                .iter()
                .enumerate()
                .map(|(i, item)| unsigned::<u8>(item, PrimitiveKind::U8, &index_path(path, i)))
                .collect::<CodecResult<Vec<u8>>>()?;
            Value::Bytes(bytes)
        }
    };
    Ok(value)
}

fn parse_pubkey(s: &str, path: &str) -> CodecResult<Pubkey> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| CodecError::json(path, format!("invalid base58 address `{s}`: {e}")))?;
    let array: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
        CodecError::json(path, format!("address decodes to {} bytes, expected 32", bytes.len()))
    })?;
    Ok(Pubkey::new_from_array(array))
}

fn json_to_array(items: &[JsonValue], element: &Layout, path: &str) -> CodecResult<Value> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| json_to_value(item, element, &index_path(path, i)))
        .collect::<CodecResult<Vec<_>>>()
        .map(Value::Array)
}

fn json_to_fields(json: &JsonValue, fields: &[FieldLayout], path: &str) -> CodecResult<Vec<(String, Value)>> {
    let object = expect_object(json, path)?;
    if let Some(unknown) = object.keys().find(|key| !fields.iter().any(|f| &f.name == *key)) {
        return Err(CodecError::json(path, format!("unknown field `{unknown}`")));
    }
    fields
        .iter()
        .map(|field| {
            let item = object
                .get(&field.name)
                .ok_or_else(|| CodecError::json(path, format!("missing field `{}`", field.name)))?;
            let value = json_to_value(item, &field.layout, &field_path(path, &field.name))?;
            Ok((field.name.clone(), value))
        })
        .collect()
}

fn json_to_tuple(json: &JsonValue, elements: &[Layout], path: &str) -> CodecResult<Vec<Value>> {
    let items = expect_array(json, path)?;
    if items.len() != elements.len() {
        return Err(CodecError::json(
            path,
            format!("expected {} tuple elements, got {}", elements.len(), items.len()),
        ));
    }
    items
        .iter()
        .zip(elements)
        .enumerate()
        .map(|(i, (item, layout))| json_to_value(item, layout, &index_path(path, i)))
        .collect()
}

fn json_to_enum(json: &JsonValue, variants: &[VariantLayout], path: &str) -> CodecResult<Value> {
    let object = expect_object(json, path)?;
    if let Some(unknown) = object.keys().find(|key| *key != KIND_KEY && *key != VALUE_KEY) {
        return Err(CodecError::json(path, format!("unexpected key `{unknown}` in enum object")));
    }
    let kind_path = field_path(path, KIND_KEY);
    let kind = object
        .get(KIND_KEY)
        .ok_or_else(|| CodecError::json(path, "missing `kind`"))?;
    let name = kind
        .as_str()
        .ok_or_else(|| expected(kind, "variant name string", &kind_path))?;
    let variant = variants
        .iter()
        .find(|v| v.name == name)
        .ok_or_else(|| CodecError::json(&kind_path, format!("unknown variant `{name}`")))?;

    let value_path = field_path(path, VALUE_KEY);
    let payload = object.get(VALUE_KEY);
    let fields = match (&variant.shape, payload) {
        (VariantShape::Unit, None) => VariantValue::Unit,
        (VariantShape::Unit, Some(_)) => {
            return Err(CodecError::json(
                &value_path,
                format!("unit variant `{name}` takes no value"),
            ))
        }
        (VariantShape::Tuple(elements), Some(payload)) => {
            VariantValue::Tuple(json_to_tuple(payload, elements, &value_path)?)
        }
        (VariantShape::Struct(fields), Some(payload)) => {
            VariantValue::Struct(json_to_fields(payload, fields, &value_path)?)
        }
        (_, None) => {
            return Err(CodecError::json(path, format!("variant `{name}` requires a value")))
        }
    };
    Ok(Value::Enum(EnumValue {
        variant: variant.name.clone(),
        fields,
    }))
}
