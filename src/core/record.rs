//! Purpose: Record instances: construction, field access, the mutation gate, and projection.
//! Exports: `Record`, `Fields`.
//! Role: Runtime counterpart of `RecordSchema`; every decode/default path ends in `Record::new`.
//! Invariants: An instance holds exactly its type's declared fields, in declared order.
//! Invariants: Construction fails unless the most-derived type declared its own policy.
//! Invariants: Immutable instances reject every assignment for their whole lifetime.
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::core::error::{Error, ErrorKind};
use crate::core::schema::{Mutability, RecordSchema};
use crate::core::value::Value;
use crate::json;

#[derive(Clone, Debug)]
pub struct Record {
    schema: Arc<RecordSchema>,
    policy: Mutability,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Builds an instance from field values given in any order.
    pub fn new<I, S>(schema: Arc<RecordSchema>, values: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let mut supplied: Vec<(String, Value)> = Vec::new();
        for (name, value) in values {
            let name = name.into();
            if supplied.iter().any(|(existing, _)| *existing == name) {
                return Err(argument_error(&schema, format!("got multiple values for field `{name}`")));
            }
            if schema.field(&name).is_none() {
                return Err(argument_error(&schema, format!("got an unexpected field `{name}`")));
            }
            supplied.push((name, value));
        }

        let mut fields = Vec::with_capacity(schema.fields().len());
        let mut missing = Vec::new();
        for decl in schema.fields() {
            match supplied.iter().position(|(name, _)| *name == decl.name) {
                Some(idx) => fields.push(supplied.swap_remove(idx)),
                None => missing.push(format!("`{}`", decl.name)),
            }
        }
        if !missing.is_empty() {
            return Err(argument_error(
                &schema,
                format!("missing {} required field(s): {}", missing.len(), missing.join(", ")),
            ));
        }

        let policy = schema.require_policy()?;
        Ok(Self {
            schema,
            policy,
            fields,
        })
    }

    /// Builds an instance from values already in declared order under a known policy.
    /// Only typed records call this; they produce every field by construction.
    #[doc(hidden)]
    pub fn assemble(schema: &Arc<RecordSchema>, policy: Mutability, fields: Vec<(String, Value)>) -> Self {
        debug_assert_eq!(fields.len(), schema.fields().len());
        Self {
            schema: Arc::clone(schema),
            policy,
            fields,
        }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        self.schema.name()
    }

    pub fn mutability(&self) -> Mutability {
        self.policy
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), Error> {
        if self.policy == Mutability::Immutable {
            return Err(Error::new(ErrorKind::Frozen)
                .with_message(format!(
                    "cannot assign to field `{name}` of immutable record `{}`",
                    self.schema.name()
                ))
                .with_field(name));
        }
        let Some((_, slot)) = self.fields.iter_mut().find(|(field, _)| field == name) else {
            return Err(argument_error(&self.schema, format!("has no field `{name}`")));
        };
        *slot = value;
        Ok(())
    }

    pub fn into_fields(self) -> Fields {
        Fields {
            type_name: self.schema.name().to_string(),
            entries: self.fields,
        }
    }

    /// Moves the fields out after checking the instance is a `schema` (or derives from it).
    pub fn into_fields_of(self, schema: &RecordSchema) -> Result<Fields, Error> {
        if !self.schema.is_a(schema) {
            return Err(Error::new(ErrorKind::Mismatch).with_message(format!(
                "expected a `{}` record, got `{}`",
                schema.name(),
                self.schema.name()
            )));
        }
        Ok(self.into_fields())
    }

    pub fn equals(&self, other: &Record) -> Result<bool, Error> {
        match self.schema.comparison() {
            Some(comparison) => comparison.equals(self, other),
            None => Err(not_implemented(&self.schema, "equality")),
        }
    }

    pub fn compute_hash(&self) -> Result<u64, Error> {
        match self.schema.comparison() {
            Some(comparison) => comparison.hash(self),
            None => Err(not_implemented(&self.schema, "hashing")),
        }
    }

    /// Public fields in declared order, nested records projected recursively.
    pub fn to_dict(&self) -> Map<String, JsonValue> {
        let mut out = Map::new();
        for (decl, (name, value)) in self.schema.fields().iter().zip(&self.fields) {
            if decl.is_private() {
                continue;
            }
            out.insert(name.clone(), value.to_json());
        }
        out
    }

    pub fn to_json(&self) -> Result<String, Error> {
        json::encode::to_string(&JsonValue::Object(self.to_dict()))
    }
}

/// Field values moved out of a record, taken by name.
#[derive(Debug)]
pub struct Fields {
    type_name: String,
    entries: Vec<(String, Value)>,
}

impl Fields {
    pub fn take(&mut self, name: &str) -> Result<Value, Error> {
        match self.entries.iter().position(|(field, _)| field == name) {
            Some(idx) => Ok(self.entries.swap_remove(idx).1),
            None => Err(Error::new(ErrorKind::Argument)
                .with_message(format!("record `{}` has no field `{name}`", self.type_name))
                .with_field(name)),
        }
    }
}

fn argument_error(schema: &RecordSchema, detail: String) -> Error {
    Error::new(ErrorKind::Argument).with_message(format!("record `{}` {detail}", schema.name()))
}

fn not_implemented(schema: &RecordSchema, what: &str) -> Error {
    Error::new(ErrorKind::NotImplemented)
        .with_message(format!("record type `{}` does not implement {what}", schema.name()))
        .with_hint("Supply a comparison (e.g. compare_by) when declaring the type.")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Record;
    use crate::core::error::ErrorKind;
    use crate::core::schema::{Mutability, RecordSchema};
    use crate::core::types::{ScalarKind, TypeDescriptor};
    use crate::core::value::{Value, ValueSet};
    use serde_json::json;

    fn person(policy: Option<Mutability>) -> Arc<RecordSchema> {
        let mut builder = RecordSchema::builder("Person")
            .field("name", TypeDescriptor::Scalar(ScalarKind::String))
            .field("age", TypeDescriptor::Scalar(ScalarKind::Integer))
            .field("_token", TypeDescriptor::Scalar(ScalarKind::String));
        if let Some(policy) = policy {
            builder = builder.policy(policy);
        }
        builder.build().expect("schema")
    }

    fn john(schema: Arc<RecordSchema>) -> Result<Record, crate::core::error::Error> {
        Record::new(
            schema,
            [
                ("age", Value::Int(29)),
                ("name", Value::from("John")),
                ("_token", Value::from("secret")),
            ],
        )
    }

    #[test]
    fn fields_are_stored_in_declared_order() {
        let record = john(person(Some(Mutability::Immutable))).expect("record");
        let names: Vec<&str> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["name", "age", "_token"]);
    }

    #[test]
    fn missing_and_unexpected_fields_are_argument_errors() {
        let schema = person(Some(Mutability::Mutable));
        let err = Record::new(Arc::clone(&schema), [("name", Value::from("John"))]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert!(err.message().unwrap().contains("missing 2 required field(s)"));

        let err = Record::new(
            schema,
            [
                ("name", Value::from("John")),
                ("age", Value::Int(1)),
                ("_token", Value::from("")),
                ("job", Value::from("Doctor")),
            ],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn construction_without_policy_fails() {
        let err = john(person(None)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingPolicy);
    }

    #[test]
    fn mutable_records_accept_assignment() {
        let mut record = john(person(Some(Mutability::Mutable))).expect("record");
        record.set("name", Value::from("Sarah")).expect("set");
        assert_eq!(record.get("name").and_then(Value::as_str), Some("Sarah"));
        assert_eq!(
            record.set("job", Value::from("x")).unwrap_err().kind(),
            ErrorKind::Argument
        );
    }

    #[test]
    fn immutable_records_reject_every_assignment() {
        let mut record = john(person(Some(Mutability::Immutable))).expect("record");
        for (name, value) in [("name", Value::from("Sarah")), ("age", Value::Int(30)), ("job", Value::Bool(true))] {
            let err = record.set(name, value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Frozen);
        }
        assert_eq!(record.get("name").and_then(Value::as_str), Some("John"));
    }

    #[test]
    fn to_dict_skips_private_fields() {
        let record = john(person(Some(Mutability::Immutable))).expect("record");
        assert_eq!(
            serde_json::Value::Object(record.to_dict()),
            json!({"name": "John", "age": 29})
        );
        assert_eq!(record.to_json().unwrap(), r#"{"name":"John","age":29}"#);
    }

    #[test]
    fn equality_and_hash_require_opt_in() {
        let a = john(person(Some(Mutability::Mutable))).expect("a");
        let b = john(person(Some(Mutability::Mutable))).expect("b");
        assert_eq!(a.equals(&b).unwrap_err().kind(), ErrorKind::NotImplemented);
        assert_eq!(a.compute_hash().unwrap_err().kind(), ErrorKind::NotImplemented);
    }

    #[test]
    fn compare_by_fields_drives_equality_and_hash() {
        let schema = RecordSchema::builder("Test")
            .policy(Mutability::Immutable)
            .field("name", TypeDescriptor::Scalar(ScalarKind::String))
            .compare_by(["name"])
            .build()
            .expect("schema");
        let make = |name: &str| Record::new(Arc::clone(&schema), [("name", Value::from(name))]).unwrap();
        let (t1, t2, t3) = (make("John"), make("John"), make("Sarah"));
        assert!(t1.equals(&t2).unwrap());
        assert!(!t1.equals(&t3).unwrap());
        assert_eq!(t1.compute_hash().unwrap(), t2.compute_hash().unwrap());
        assert_ne!(t1.compute_hash().unwrap(), t3.compute_hash().unwrap());
    }

    #[test]
    fn equal_set_fields_hash_alike_in_any_order() {
        let schema = RecordSchema::builder("Tagged")
            .policy(Mutability::Immutable)
            .field("tags", TypeDescriptor::set(TypeDescriptor::Scalar(ScalarKind::String)))
            .compare_by(["tags"])
            .build()
            .expect("schema");
        let make = |tags: [&str; 2]| {
            let mut set = ValueSet::new();
            for tag in tags {
                set.insert(Value::from(tag)).unwrap();
            }
            Record::new(Arc::clone(&schema), [("tags", Value::Set(set))]).unwrap()
        };
        let (ab, ba) = (make(["a", "b"]), make(["b", "a"]));
        assert!(ab.equals(&ba).unwrap());
        assert_eq!(ab.compute_hash().unwrap(), ba.compute_hash().unwrap());
    }

    #[test]
    fn nested_records_hash_through_their_own_comparison() {
        let student = RecordSchema::builder("Student")
            .policy(Mutability::Immutable)
            .field("name", TypeDescriptor::Scalar(ScalarKind::String))
            .field("gpa", TypeDescriptor::Scalar(ScalarKind::Float))
            .compare_by(["name"])
            .build()
            .expect("student");
        let desk = RecordSchema::builder("Desk")
            .policy(Mutability::Immutable)
            .field("owner", TypeDescriptor::Record(Arc::clone(&student)))
            .compare_by(["owner"])
            .build()
            .expect("desk");
        let make = |gpa: f64| {
            let owner = Record::new(
                Arc::clone(&student),
                [("name", Value::from("Ana")), ("gpa", Value::Float(gpa))],
            )
            .unwrap();
            Record::new(Arc::clone(&desk), [("owner", Value::Record(owner))]).unwrap()
        };
        let (first, second) = (make(3.5), make(2.0));
        assert!(first.equals(&second).unwrap());
        assert_eq!(first.compute_hash().unwrap(), second.compute_hash().unwrap());
    }

    #[test]
    fn same_named_types_are_distinct() {
        let first = person(Some(Mutability::Immutable));
        let second = person(Some(Mutability::Immutable));
        let record = john(first).expect("record");
        let err = record.into_fields_of(&second).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mismatch);
    }
}
