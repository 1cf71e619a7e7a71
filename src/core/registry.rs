//! Purpose: Named record types and loading them from a JSON schema document.
//! Exports: `Registry`, `SchemaDocument`, `RecordDoc`, `FieldDoc`, `PolicyDoc`, `Rejected`, `RejectReason`.
//! Role: The `Resolve` implementation behind schema documents and the CLI.
//! Invariants: Names are unique; parents are registered before their children.
//! Invariants: Field types stay unclassified until a decode/default/check call.
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::core::error::{Error, ErrorKind};
use crate::core::matcher::Resolve;
use crate::core::schema::{Mutability, RecordSchema};
use crate::core::types::TypeExpr;
use crate::json::parse;

/// Top-level schema document: `{"records": [...]}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    pub records: Vec<RecordDoc>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordDoc {
    pub name: String,
    #[serde(default)]
    pub policy: Option<PolicyDoc>,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDoc>,
    #[serde(default)]
    pub compare_by: Option<Vec<String>>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyDoc {
    Mutable,
    Immutable,
}

impl From<PolicyDoc> for Mutability {
    fn from(value: PolicyDoc) -> Self {
        match value {
            PolicyDoc::Mutable => Mutability::Mutable,
            PolicyDoc::Immutable => Mutability::Immutable,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl SchemaDocument {
    pub fn from_json_str(text: &str) -> Result<Self, Error> {
        parse::from_str(text).map_err(|err| {
            Error::new(ErrorKind::Json)
                .with_message("invalid schema document")
                .with_hint(parse::hint_for_error(&err, "schema document"))
                .with_source(err)
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read schema document {}", path.display()))
                .with_source(err)
        })?;
        Self::from_json_str(&text)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RejectReason {
    DuplicateName,
    UnknownParent,
    Declaration,
}

impl RejectReason {
    pub fn code(self) -> &'static str {
        match self {
            Self::DuplicateName => "duplicate-record",
            Self::UnknownParent => "unknown-parent",
            Self::Declaration => "invalid-declaration",
        }
    }
}

/// A document record that could not be registered.
#[derive(Debug)]
pub struct Rejected {
    pub record: String,
    pub reason: RejectReason,
    pub error: Error,
}

#[derive(Clone, Debug, Default)]
pub struct Registry {
    by_name: HashMap<String, Arc<RecordSchema>>,
    order: Vec<String>,
}

impl Registry {
    pub fn register(&mut self, schema: Arc<RecordSchema>) -> Result<(), Error> {
        let name = schema.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(Error::new(ErrorKind::Schema)
                .with_message(format!("record type `{name}` is declared more than once")));
        }
        self.order.push(name.clone());
        self.by_name.insert(name, schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<RecordSchema>> {
        self.by_name.get(name).cloned()
    }

    /// Like `get`, but unknown names are a usage error naming the known types.
    pub fn require(&self, name: &str) -> Result<Arc<RecordSchema>, Error> {
        self.get(name).ok_or_else(|| {
            let known = if self.order.is_empty() {
                "none".to_string()
            } else {
                self.order.join(", ")
            };
            Error::new(ErrorKind::Usage)
                .with_message(format!("unknown record type `{name}`"))
                .with_hint(format!("Known record types: {known}."))
        })
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Arc<RecordSchema>> {
        self.order.iter().filter_map(|name| self.by_name.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Loads every record of `doc`, failing on the first rejected one.
    pub fn from_document(doc: &SchemaDocument) -> Result<Self, Error> {
        let (registry, rejected) = Self::load_document(doc);
        match rejected.into_iter().next() {
            Some(rejected) => Err(rejected.error),
            None => Ok(registry),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, Error> {
        Self::from_document(&SchemaDocument::from_json_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        Self::from_document(&SchemaDocument::from_path(path)?)
    }

    /// Registers what it can and reports the rest; used by eager checks.
    pub fn load_document(doc: &SchemaDocument) -> (Self, Vec<Rejected>) {
        let mut registry = Self::default();
        let mut rejected = Vec::new();
        for record in &doc.records {
            match registry.load_record(record) {
                Ok(()) => {}
                Err((reason, error)) => {
                    tracing::debug!(record = record.name.as_str(), code = reason.code(), error = %error, "rejected record");
                    rejected.push(Rejected {
                        record: record.name.clone(),
                        reason,
                        error,
                    });
                }
            }
        }
        tracing::debug!(
            loaded = registry.len(),
            rejected = rejected.len(),
            "loaded schema document"
        );
        (registry, rejected)
    }

    fn load_record(&mut self, doc: &RecordDoc) -> Result<(), (RejectReason, Error)> {
        if self.by_name.contains_key(&doc.name) {
            return Err((
                RejectReason::DuplicateName,
                Error::new(ErrorKind::Schema)
                    .with_message(format!("record type `{}` is declared more than once", doc.name)),
            ));
        }

        let mut builder = RecordSchema::builder(doc.name.clone());
        if let Some(parent) = &doc.extends {
            let Some(schema) = self.get(parent) else {
                return Err((
                    RejectReason::UnknownParent,
                    Error::new(ErrorKind::Schema)
                        .with_message(format!(
                            "record type `{}` extends unknown record type `{parent}`",
                            doc.name
                        ))
                        .with_hint("Declare parent records before their children."),
                ));
            };
            builder = builder.extends(schema);
        }
        if let Some(policy) = doc.policy {
            builder = builder.policy(policy.into());
        }
        for field in &doc.fields {
            let expr = TypeExpr::parse(&field.ty)
                .map_err(|err| (RejectReason::Declaration, err.within(&field.name)))?;
            builder = builder.field(field.name.clone(), expr);
        }
        if let Some(names) = &doc.compare_by {
            builder = builder.compare_by(names.iter().cloned());
        }

        let schema = builder.build().map_err(|err| (RejectReason::Declaration, err))?;
        tracing::debug!(record = schema.name(), fields = schema.fields().len(), "registered record type");
        self.register(schema).map_err(|err| (RejectReason::DuplicateName, err))
    }
}

impl Resolve for Registry {
    fn resolve(&self, name: &str) -> Option<Arc<RecordSchema>> {
        self.get(name)
    }
}
