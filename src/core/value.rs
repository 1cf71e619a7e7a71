//! Purpose: Runtime value tree for decoded records and its JSON projection.
//! Exports: `Value`, `ValueSet`, `ValueMap`.
//! Role: What the decoder produces, the synthesizer fills, and the typed facade converts.
//! Invariants: Equality is fallible (`try_eq`); records compare only through their own hooks.
//! Invariants: `try_hash` agrees with `try_eq`; set and map hashes ignore member order.
//! Invariants: Sets and maps keep insertion order; membership uses `try_eq`.
//! Invariants: Projection never fails; sets, tuples, and sequences all project to arrays.
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::{Map, Number, Value as JsonValue};
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

use crate::core::error::Error;
use crate::core::record::Record;
use crate::core::scalar;

#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Uuid(Uuid),
    Date(Date),
    DateTime(PrimitiveDateTime),
    Time(Time),
    /// Untyped JSON kept verbatim.
    Opaque(JsonValue),
    Record(Record),
    Seq(Vec<Value>),
    Tuple(Vec<Value>),
    Set(ValueSet),
    Map(ValueMap),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Uuid(_) => "UUID",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Time(_) => "time",
            Self::Opaque(_) => "Any",
            Self::Record(_) => "record",
            Self::Seq(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::Map(_) => "dict",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Elements of a sequence or tuple.
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Self::Seq(items) | Self::Tuple(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn try_eq(&self, other: &Value) -> Result<bool, Error> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Ok(a == b),
            (Self::Int(a), Self::Int(b)) => Ok(a == b),
            (Self::Float(a), Self::Float(b)) => Ok(a.to_bits() == b.to_bits()),
            (Self::Str(a), Self::Str(b)) => Ok(a == b),
            (Self::Uuid(a), Self::Uuid(b)) => Ok(a == b),
            (Self::Date(a), Self::Date(b)) => Ok(a == b),
            (Self::DateTime(a), Self::DateTime(b)) => Ok(a == b),
            (Self::Time(a), Self::Time(b)) => Ok(a == b),
            (Self::Opaque(a), Self::Opaque(b)) => Ok(a == b),
            (Self::Record(a), Self::Record(b)) => a.equals(b),
            (Self::Seq(a), Self::Seq(b)) | (Self::Tuple(a), Self::Tuple(b)) => items_eq(a, b),
            (Self::Set(a), Self::Set(b)) => a.try_eq(b),
            (Self::Map(a), Self::Map(b)) => a.try_eq(b),
            _ => Ok(false),
        }
    }

    /// Structural hash consistent with `try_eq`. Records hash through their own
    /// hooks, so a record without them fails `NotImplemented` here too.
    pub fn try_hash(&self) -> Result<u64, Error> {
        let mut hasher = DefaultHasher::new();
        match self {
            Self::Bool(b) => (0u8, b).hash(&mut hasher),
            Self::Int(n) => (1u8, n).hash(&mut hasher),
            Self::Float(n) => (2u8, n.to_bits()).hash(&mut hasher),
            Self::Str(text) => (3u8, text).hash(&mut hasher),
            Self::Uuid(id) => (4u8, id).hash(&mut hasher),
            Self::Date(date) => (5u8, date).hash(&mut hasher),
            Self::DateTime(dt) => (6u8, dt).hash(&mut hasher),
            Self::Time(t) => (7u8, t).hash(&mut hasher),
            Self::Opaque(raw) => (8u8, json_hash(raw)).hash(&mut hasher),
            Self::Record(record) => (9u8, record.compute_hash()?).hash(&mut hasher),
            Self::Seq(items) | Self::Tuple(items) => {
                let tag: u8 = if matches!(self, Self::Seq(_)) { 10 } else { 11 };
                (tag, items.len()).hash(&mut hasher);
                for item in items {
                    item.try_hash()?.hash(&mut hasher);
                }
            }
            Self::Set(set) => {
                let members = unordered(set.iter().map(Value::try_hash))?;
                (12u8, set.len(), members).hash(&mut hasher);
            }
            Self::Map(map) => {
                let entries = unordered(map.iter().map(|(key, value)| {
                    let mut entry = DefaultHasher::new();
                    key.try_hash()?.hash(&mut entry);
                    value.try_hash()?.hash(&mut entry);
                    Ok(entry.finish())
                }))?;
                (13u8, map.len(), entries).hash(&mut hasher);
            }
        }
        Ok(hasher.finish())
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(n) => JsonValue::from(*n),
            Self::Float(n) => Number::from_f64(*n).map(JsonValue::Number).unwrap_or(JsonValue::Null),
            Self::Str(text) => JsonValue::String(text.clone()),
            Self::Uuid(id) => JsonValue::String(id.hyphenated().to_string()),
            Self::Date(date) => JsonValue::String(scalar::format_date(*date)),
            Self::DateTime(dt) => JsonValue::String(scalar::format_datetime(*dt)),
            Self::Time(t) => JsonValue::String(scalar::format_time(*t)),
            Self::Opaque(raw) => raw.clone(),
            Self::Record(record) => JsonValue::Object(record.to_dict()),
            Self::Seq(items) | Self::Tuple(items) => {
                JsonValue::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Set(set) => JsonValue::Array(set.iter().map(Value::to_json).collect()),
            Self::Map(map) => {
                let mut out = Map::new();
                for (key, value) in map.iter() {
                    out.insert(key.key_text(), value.to_json());
                }
                JsonValue::Object(out)
            }
        }
    }

    /// Text used when this value is a mapping key on the wire.
    fn key_text(&self) -> String {
        match self {
            Self::Str(text) => text.clone(),
            Self::Opaque(JsonValue::String(text)) => text.clone(),
            other => match other.to_json() {
                JsonValue::String(text) => text,
                projected => projected.to_string(),
            },
        }
    }
}

// Order-independent combination of member hashes.
fn unordered(hashes: impl Iterator<Item = Result<u64, Error>>) -> Result<u64, Error> {
    hashes.fold(Ok(0u64), |acc, hash| Ok(acc?.wrapping_add(hash?)))
}

// JSON object equality ignores key order, so object entries combine unordered.
fn json_hash(raw: &JsonValue) -> u64 {
    let mut hasher = DefaultHasher::new();
    match raw {
        JsonValue::Null => 0u8.hash(&mut hasher),
        JsonValue::Bool(b) => (1u8, b).hash(&mut hasher),
        JsonValue::Number(n) => (2u8, n.to_string()).hash(&mut hasher),
        JsonValue::String(text) => (3u8, text).hash(&mut hasher),
        JsonValue::Array(items) => {
            (4u8, items.len()).hash(&mut hasher);
            for item in items {
                json_hash(item).hash(&mut hasher);
            }
        }
        JsonValue::Object(map) => {
            let entries = map.iter().fold(0u64, |acc, (key, value)| {
                let mut entry = DefaultHasher::new();
                (key, json_hash(value)).hash(&mut entry);
                acc.wrapping_add(entry.finish())
            });
            (5u8, map.len(), entries).hash(&mut hasher);
        }
    }
    hasher.finish()
}

fn items_eq(left: &[Value], right: &[Value]) -> Result<bool, Error> {
    if left.len() != right.len() {
        return Ok(false);
    }
    for (a, b) in left.iter().zip(right) {
        if !a.try_eq(b)? {
            return Ok(false);
        }
    }
    Ok(true)
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}

/// Insertion-ordered set; members equal under `try_eq` collapse.
#[derive(Clone, Debug, Default)]
pub struct ValueSet {
    items: Vec<Value>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Members the caller already knows are pairwise distinct (e.g. from a typed set).
    pub(crate) fn from_distinct(items: Vec<Value>) -> Self {
        Self { items }
    }

    /// Returns `false` when an equal member was already present.
    pub fn insert(&mut self, value: Value) -> Result<bool, Error> {
        if self.contains(&value)? {
            return Ok(false);
        }
        self.items.push(value);
        Ok(true)
    }

    pub fn contains(&self, value: &Value) -> Result<bool, Error> {
        for item in &self.items {
            if item.try_eq(value)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.items
    }

    fn try_eq(&self, other: &ValueSet) -> Result<bool, Error> {
        if self.len() != other.len() {
            return Ok(false);
        }
        for item in &self.items {
            if !other.contains(item)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Insertion-ordered mapping with unique keys under `try_eq`.
#[derive(Clone, Debug, Default)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries whose keys the caller already knows are pairwise distinct.
    pub(crate) fn from_distinct(entries: Vec<(Value, Value)>) -> Self {
        Self { entries }
    }

    /// Replaces the value of an equal key in place, returning the old value.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<Option<Value>, Error> {
        for (existing, slot) in self.entries.iter_mut() {
            if existing.try_eq(&key)? {
                return Ok(Some(std::mem::replace(slot, value)));
            }
        }
        self.entries.push((key, value));
        Ok(None)
    }

    pub fn get(&self, key: &Value) -> Result<Option<&Value>, Error> {
        for (existing, value) in &self.entries {
            if existing.try_eq(key)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    pub fn into_entries(self) -> Vec<(Value, Value)> {
        self.entries
    }

    fn try_eq(&self, other: &ValueMap) -> Result<bool, Error> {
        if self.len() != other.len() {
            return Ok(false);
        }
        for (key, value) in &self.entries {
            match other.get(key)? {
                Some(theirs) if value.try_eq(theirs)? => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }
}
