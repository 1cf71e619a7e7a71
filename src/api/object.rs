//! Purpose: The value-object facade for compile-time record types.
//! Exports: `ValueObject`, `Policy`, `Mutable`, `Immutable`.
//! Role: Public surface (`to_dict`, `to_json`, `from_dict`, `from_json`, `default`); delegates to the codec.
//! Invariants: Every value object names exactly one policy marker; there is no policy-less impl.
//! Invariants: The facade holds no logic beyond conversion to and from `Record`.
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::core::decode;
use crate::core::error::Error;
use crate::core::record::Record;
use crate::core::schema::{Mutability, RecordSchema};
use crate::core::synth;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Mutable {}
    impl Sealed for super::Immutable {}
}

/// Mutability policy marker, chosen once per record type.
pub trait Policy: sealed::Sealed {
    const MUTABILITY: Mutability;
}

/// Fields are public and freely reassignable.
#[derive(Debug)]
pub enum Mutable {}

/// Fields are private behind getters; no mutation path exists.
#[derive(Debug)]
pub enum Immutable {}

impl Policy for Mutable {
    const MUTABILITY: Mutability = Mutability::Mutable;
}

impl Policy for Immutable {
    const MUTABILITY: Mutability = Mutability::Immutable;
}

/// Typed schemas hold classified descriptors, so no name ever needs resolving.
struct Classified;

impl crate::core::matcher::Resolve for Classified {
    fn resolve(&self, _name: &str) -> Option<Arc<RecordSchema>> {
        None
    }
}

/// A record type with value-object semantics. Implemented by `record!`.
pub trait ValueObject: Sized {
    type Policy: Policy;

    fn schema() -> &'static Arc<RecordSchema>;
    fn to_record(&self) -> Record;
    fn from_record(record: Record) -> Result<Self, Error>;

    /// Public fields in declared order, nested records projected recursively.
    fn to_dict(&self) -> Map<String, JsonValue> {
        self.to_record().to_dict()
    }

    fn to_json(&self) -> Result<String, Error> {
        self.to_record().to_json()
    }

    fn from_dict(dictionary: &Map<String, JsonValue>) -> Result<Self, Error> {
        Self::from_record(decode::from_dict(Self::schema(), dictionary, &Classified)?)
    }

    fn from_json(text: &str) -> Result<Self, Error> {
        Self::from_record(decode::from_json(Self::schema(), text, &Classified)?)
    }

    /// Zero-valued instance: empty containers, zero scalars, fresh ids and clock reads.
    fn default() -> Result<Self, Error> {
        Self::from_record(synth::default_record(Self::schema(), &Classified)?)
    }
}
