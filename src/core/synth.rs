//! Purpose: Input-free "zero value" synthesis for declared types.
//! Exports: `default_of`, `default_record`.
//! Role: Default Synthesizer; shares classification with the decoder.
//! Invariants: Containers default empty; fixed tuples default element-wise.
//! Invariants: Well-known scalars are fresh per call (random ids, current UTC clock).
//! Invariants: A record reachable from itself through records/tuples fails instead of recursing.
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::core::error::{Error, ErrorKind};
use crate::core::matcher::Resolve;
use crate::core::record::Record;
use crate::core::scalar;
use crate::core::schema::RecordSchema;
use crate::core::types::{ScalarKind, TypeDescriptor};
use crate::core::value::{Value, ValueMap, ValueSet};

pub fn default_of(descriptor: &TypeDescriptor, resolver: &dyn Resolve) -> Result<Value, Error> {
    Synthesizer::new(resolver).value(descriptor)
}

pub fn default_record(schema: &Arc<RecordSchema>, resolver: &dyn Resolve) -> Result<Record, Error> {
    Synthesizer::new(resolver).record(schema)
}

/// Zero value for a scalar kind.
pub fn zero(kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::String => Value::Str(String::new()),
        ScalarKind::Integer => Value::Int(0),
        ScalarKind::Float => Value::Float(0.0),
        ScalarKind::Boolean => Value::Bool(false),
        ScalarKind::Uuid => Value::Uuid(scalar::new_uuid()),
        ScalarKind::Date => Value::Date(scalar::now_date()),
        ScalarKind::DateTime => Value::DateTime(scalar::now_datetime()),
        ScalarKind::Time => Value::Time(scalar::now_time()),
        ScalarKind::Opaque => Value::Opaque(JsonValue::Null),
    }
}

struct Synthesizer<'a> {
    resolver: &'a dyn Resolve,
    // Record types currently being synthesized, outermost first.
    active: Vec<String>,
}

impl<'a> Synthesizer<'a> {
    fn new(resolver: &'a dyn Resolve) -> Self {
        Self {
            resolver,
            active: Vec::new(),
        }
    }

    fn value(&mut self, descriptor: &TypeDescriptor) -> Result<Value, Error> {
        match descriptor {
            TypeDescriptor::Scalar(kind) => Ok(zero(*kind)),
            TypeDescriptor::Record(schema) => self.record(schema).map(Value::Record),
            TypeDescriptor::Sequence(_) => Ok(Value::Seq(Vec::new())),
            TypeDescriptor::Set(_) => Ok(Value::Set(ValueSet::new())),
            TypeDescriptor::Mapping(_, _) => Ok(Value::Map(ValueMap::new())),
            TypeDescriptor::FixedTuple(elems) => {
                let mut items = Vec::with_capacity(elems.len());
                for (idx, elem) in elems.iter().enumerate() {
                    items.push(self.value(elem).map_err(|err| err.within(&format!("[{idx}]")))?);
                }
                Ok(Value::Tuple(items))
            }
        }
    }

    fn record(&mut self, schema: &Arc<RecordSchema>) -> Result<Record, Error> {
        if self.active.iter().any(|name| name == schema.name()) {
            let mut cycle = self.active.clone();
            cycle.push(schema.name().to_string());
            return Err(Error::new(ErrorKind::Schema)
                .with_message(format!(
                    "recursive record type `{}` (via {})",
                    schema.name(),
                    cycle.join(" -> ")
                ))
                .with_hint("Break the cycle with a list, set, or dict field, which default empty.")
                .with_cycle(cycle));
        }

        self.active.push(schema.name().to_string());
        let values = self.fields(schema);
        self.active.pop();
        let values = values?;

        tracing::trace!(record = schema.name(), "synthesized default record");
        Record::new(Arc::clone(schema), values)
    }

    fn fields(&mut self, schema: &RecordSchema) -> Result<Vec<(String, Value)>, Error> {
        let mut values = Vec::with_capacity(schema.fields().len());
        for decl in schema.fields() {
            let descriptor = decl.classify(self.resolver)?;
            let value = self.value(&descriptor).map_err(|err| err.within(&decl.name))?;
            values.push((decl.name.clone(), value));
        }
        Ok(values)
    }
}
