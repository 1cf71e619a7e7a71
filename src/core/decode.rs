//! Purpose: Type-directed decoding of JSON primitive trees into record instances.
//! Exports: `decode`, `from_dict`, `from_json`.
//! Role: Decoder core; walks a descriptor and the raw tree in lockstep.
//! Invariants: Already-typed primitives pass through unchanged; nothing is coerced except int to float.
//! Invariants: Fixed tuples with arity > 0 require exactly that many items.
//! Invariants: Mapping keys are asserted, never converted; mismatched keys are dropped.
//! Invariants: Undeclared input fields are ignored; missing declared fields fail construction.
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::core::error::{Error, ErrorKind};
use crate::core::matcher::Resolve;
use crate::core::record::Record;
use crate::core::scalar;
use crate::core::schema::RecordSchema;
use crate::core::types::{ScalarKind, TypeDescriptor};
use crate::core::value::{Value, ValueMap, ValueSet};
use crate::json::parse;

pub fn decode(
    descriptor: &TypeDescriptor,
    raw: &JsonValue,
    resolver: &dyn Resolve,
) -> Result<Value, Error> {
    match descriptor {
        TypeDescriptor::Scalar(kind) => decode_scalar(*kind, raw),
        TypeDescriptor::Record(schema) => match raw {
            JsonValue::Object(map) => from_dict(schema, map, resolver).map(Value::Record),
            other => Err(mismatch(descriptor, other)),
        },
        TypeDescriptor::Sequence(elem) => {
            let items = expect_array(descriptor, raw)?;
            let mut out = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                out.push(decode(elem, item, resolver).map_err(|err| err.within(&format!("[{idx}]")))?);
            }
            Ok(Value::Seq(out))
        }
        TypeDescriptor::FixedTuple(elems) => {
            let items = expect_array(descriptor, raw)?;
            if elems.is_empty() {
                return Ok(Value::Tuple(items.iter().cloned().map(Value::Opaque).collect()));
            }
            if items.len() != elems.len() {
                return Err(Error::new(ErrorKind::Schema).with_message(format!(
                    "invalid generic type args: `{descriptor}` expects {} items, got {}",
                    elems.len(),
                    items.len()
                )));
            }
            let mut out = Vec::with_capacity(items.len());
            for (idx, (elem, item)) in elems.iter().zip(items).enumerate() {
                out.push(decode(elem, item, resolver).map_err(|err| err.within(&format!("[{idx}]")))?);
            }
            Ok(Value::Tuple(out))
        }
        TypeDescriptor::Set(elem) => {
            let items = expect_array(descriptor, raw)?;
            let mut out = ValueSet::new();
            for (idx, item) in items.iter().enumerate() {
                let within = |err: Error| err.within(&format!("[{idx}]"));
                let value = decode(elem, item, resolver).map_err(within)?;
                out.insert(value).map_err(within)?;
            }
            Ok(Value::Set(out))
        }
        TypeDescriptor::Mapping(key_desc, value_desc) => {
            let JsonValue::Object(entries) = raw else {
                return Err(mismatch(descriptor, raw));
            };
            let mut out = ValueMap::new();
            for (key, item) in entries {
                let Some(key_value) = mapping_key(key_desc, key) else {
                    tracing::debug!(
                        key = key.as_str(),
                        key_type = %key_desc,
                        "dropping mapping entry whose key does not match the declared key type"
                    );
                    continue;
                };
                let value = decode(value_desc, item, resolver).map_err(|err| err.within(key))?;
                out.insert(key_value, value)?;
            }
            Ok(Value::Map(out))
        }
    }
}

/// Decodes declared fields present in `dictionary` and constructs the record.
pub fn from_dict(
    schema: &Arc<RecordSchema>,
    dictionary: &Map<String, JsonValue>,
    resolver: &dyn Resolve,
) -> Result<Record, Error> {
    let mut values = Vec::with_capacity(schema.fields().len());
    for decl in schema.fields() {
        let Some(raw) = dictionary.get(&decl.name) else {
            continue;
        };
        let descriptor = decl.classify(resolver)?;
        let value = decode(&descriptor, raw, resolver).map_err(|err| err.within(&decl.name))?;
        values.push((decl.name.clone(), value));
    }
    for key in dictionary.keys() {
        if schema.field(key).is_none() {
            tracing::trace!(record = schema.name(), key = key.as_str(), "ignoring undeclared input field");
        }
    }
    Record::new(Arc::clone(schema), values)
}

pub fn from_json(
    schema: &Arc<RecordSchema>,
    text: &str,
    resolver: &dyn Resolve,
) -> Result<Record, Error> {
    let raw: JsonValue = parse::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Json)
            .with_message("invalid json")
            .with_hint(parse::hint_for_error(&err, schema.name()))
            .with_source(err)
    })?;
    match raw {
        JsonValue::Object(map) => from_dict(schema, &map, resolver),
        other => Err(Error::new(ErrorKind::Mismatch).with_message(format!(
            "expected a JSON object for record `{}`, got {}",
            schema.name(),
            json_kind(&other)
        ))),
    }
}

fn decode_scalar(kind: ScalarKind, raw: &JsonValue) -> Result<Value, Error> {
    let descriptor = TypeDescriptor::Scalar(kind);
    match (kind, raw) {
        (ScalarKind::Opaque, any) => Ok(Value::Opaque(any.clone())),
        (ScalarKind::String, JsonValue::String(text)) => Ok(Value::Str(text.clone())),
        (ScalarKind::Integer, JsonValue::Number(n)) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| mismatch(&descriptor, raw)),
        (ScalarKind::Float, JsonValue::Number(n)) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| mismatch(&descriptor, raw)),
        (ScalarKind::Boolean, JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
        (ScalarKind::Uuid, JsonValue::String(text)) => scalar::parse_uuid(text).map(Value::Uuid),
        (ScalarKind::Date, JsonValue::String(text)) => scalar::parse_date(text).map(Value::Date),
        (ScalarKind::DateTime, JsonValue::String(text)) => {
            scalar::parse_datetime(text).map(Value::DateTime)
        }
        (ScalarKind::Time, JsonValue::String(text)) => scalar::parse_time(text).map(Value::Time),
        _ => Err(mismatch(&descriptor, raw)),
    }
}

/// Keys on the wire are text, so only text-accepting key types keep them.
fn mapping_key(key_desc: &TypeDescriptor, key: &str) -> Option<Value> {
    match key_desc {
        TypeDescriptor::Scalar(ScalarKind::String) => Some(Value::Str(key.to_string())),
        TypeDescriptor::Scalar(ScalarKind::Opaque) => Some(Value::Opaque(JsonValue::String(key.to_string()))),
        _ => None,
    }
}

fn expect_array<'a>(descriptor: &TypeDescriptor, raw: &'a JsonValue) -> Result<&'a Vec<JsonValue>, Error> {
    match raw {
        JsonValue::Array(items) => Ok(items),
        other => Err(mismatch(descriptor, other)),
    }
}

fn mismatch(descriptor: &TypeDescriptor, raw: &JsonValue) -> Error {
    Error::new(ErrorKind::Mismatch).with_message(format!(
        "expected {descriptor}, got {}",
        json_kind(raw)
    ))
}

fn json_kind(raw: &JsonValue) -> &'static str {
    match raw {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_f64() => "float",
        JsonValue::Number(_) => "integer",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
