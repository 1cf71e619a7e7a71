//! Purpose: Record type declarations: fields, mutability policy, inheritance, comparison hooks.
//! Exports: `RecordSchema`, `RecordSchemaBuilder`, `FieldDecl`, `FieldType`, `FieldSpec`,
//! `Mutability`, `Comparison`, `fields_of`.
//! Role: Type-graph introspection; `fields_of` is the only path from a record type to descriptors.
//! Invariants: Field order is ancestors first; redeclared fields keep their ancestor slot.
//! Invariants: A declared policy never contradicts an ancestor's declared policy.
//! Invariants: Unclassified field types are classified per call, never cached.
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::core::error::{Error, ErrorKind};
use crate::core::matcher::{Resolve, classify};
use crate::core::record::Record;
use crate::core::types::{TypeDescriptor, TypeExpr};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Mutability {
    Mutable,
    Immutable,
}

impl Mutability {
    pub fn name(self) -> &'static str {
        match self {
            Self::Mutable => "mutable",
            Self::Immutable => "immutable",
        }
    }
}

/// How a field's type was declared.
#[derive(Clone, Debug)]
pub enum FieldType {
    /// Already classified, as passed to `RecordSchemaBuilder::field`.
    Descriptor(TypeDescriptor),
    /// Written as a type expression; classified lazily against a resolver.
    Expr(TypeExpr),
    /// Produced on demand by typed records, so a record may name itself.
    Deferred(fn() -> TypeDescriptor),
}

impl From<TypeDescriptor> for FieldType {
    fn from(value: TypeDescriptor) -> Self {
        Self::Descriptor(value)
    }
}

impl From<TypeExpr> for FieldType {
    fn from(value: TypeExpr) -> Self {
        Self::Expr(value)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Descriptor(desc) => write!(f, "{desc}"),
            Self::Expr(expr) => write!(f, "{expr}"),
            Self::Deferred(descriptor) => write!(f, "{}", descriptor()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: String,
    pub ty: FieldType,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// Leading underscore marks a field private: kept on the instance, left out of `to_dict`.
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }

    pub fn classify(&self, resolver: &dyn Resolve) -> Result<TypeDescriptor, Error> {
        match &self.ty {
            FieldType::Descriptor(desc) => Ok(desc.clone()),
            FieldType::Expr(expr) => classify(expr, resolver).map_err(|err| err.within(&self.name)),
            FieldType::Deferred(descriptor) => Ok(descriptor()),
        }
    }
}

/// A field name paired with its classified type.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: String,
    pub descriptor: TypeDescriptor,
}

pub type EqualityFn = Arc<dyn Fn(&Record, &Record) -> Result<bool, Error> + Send + Sync>;
pub type HashFn = Arc<dyn Fn(&Record) -> Result<u64, Error> + Send + Sync>;

/// User-supplied equality and hash for a record type.
#[derive(Clone)]
pub struct Comparison {
    equality: EqualityFn,
    hash: HashFn,
}

impl Comparison {
    pub fn new<E, H>(equality: E, hash: H) -> Self
    where
        E: Fn(&Record, &Record) -> Result<bool, Error> + Send + Sync + 'static,
        H: Fn(&Record) -> Result<u64, Error> + Send + Sync + 'static,
    {
        Self {
            equality: Arc::new(equality),
            hash: Arc::new(hash),
        }
    }

    /// Compares and hashes on the named fields only.
    pub fn by_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Arc<Vec<String>> = Arc::new(fields.into_iter().map(Into::into).collect());
        let hashed = Arc::clone(&fields);
        Self::new(
            move |left, right| fields_equal(left, right, fields.iter().map(String::as_str)),
            move |record| hash_fields(record, hashed.iter().map(String::as_str)),
        )
    }

    /// Compares and hashes on every declared field; only instances of the exact
    /// same type can be equal.
    pub fn all_fields() -> Self {
        Self::new(
            |left, right| {
                if !Arc::ptr_eq(left.schema(), right.schema()) {
                    return Ok(false);
                }
                let names = left.schema().fields().iter().map(|f| f.name.as_str());
                fields_equal(left, right, names)
            },
            |record| {
                let names = record.schema().fields().iter().map(|f| f.name.as_str());
                hash_fields(record, names)
            },
        )
    }

    pub fn equals(&self, left: &Record, right: &Record) -> Result<bool, Error> {
        (self.equality)(left, right)
    }

    pub fn hash(&self, record: &Record) -> Result<u64, Error> {
        (self.hash)(record)
    }
}

impl fmt::Debug for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparison").finish_non_exhaustive()
    }
}

fn fields_equal<'a>(
    left: &Record,
    right: &Record,
    names: impl Iterator<Item = &'a str>,
) -> Result<bool, Error> {
    if !right.schema().is_a(left.schema()) {
        return Ok(false);
    }
    for name in names {
        match (left.get(name), right.get(name)) {
            (Some(a), Some(b)) => {
                if !a.try_eq(b).map_err(|err| err.within(name))? {
                    return Ok(false);
                }
            }
            (None, None) => {}
            _ => return Ok(false),
        }
    }
    Ok(true)
}

// Type names stay out of the hash: `fields_equal` lets a subtype equal its ancestor.
fn hash_fields<'a>(record: &Record, names: impl Iterator<Item = &'a str>) -> Result<u64, Error> {
    let mut hasher = DefaultHasher::new();
    for name in names {
        name.hash(&mut hasher);
        if let Some(value) = record.get(name) {
            value.try_hash().map_err(|err| err.within(name))?.hash(&mut hasher);
        }
    }
    Ok(hasher.finish())
}

pub struct RecordSchema {
    name: String,
    parent: Option<Arc<RecordSchema>>,
    fields: Vec<FieldDecl>,
    policy: Option<Mutability>,
    comparison: Option<Comparison>,
}

impl RecordSchema {
    pub fn builder(name: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            policy: None,
            comparison: None,
            compare_by: None,
        }
    }

    /// Schema of a compile-time record: deferred field descriptors, a declared
    /// policy, no parent, and field-wise comparison hooks.
    #[doc(hidden)]
    pub fn typed(name: &str, policy: Mutability, fields: Vec<(&str, fn() -> TypeDescriptor)>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            parent: None,
            fields: fields
                .into_iter()
                .map(|(field, descriptor)| FieldDecl::new(field, FieldType::Deferred(descriptor)))
                .collect(),
            policy: Some(policy),
            comparison: Some(Comparison::all_fields()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<RecordSchema>> {
        self.parent.as_ref()
    }

    /// Policy declared by this type itself. Ancestor declarations do not count.
    pub fn policy(&self) -> Option<Mutability> {
        self.policy
    }

    /// All fields in construction order, inherited ones included.
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn comparison(&self) -> Option<&Comparison> {
        self.comparison.as_ref()
    }

    /// True when `self` is `other` or derives from it.
    pub fn is_a(&self, other: &RecordSchema) -> bool {
        let mut current = Some(self);
        while let Some(schema) = current {
            if std::ptr::eq(schema, other) {
                return true;
            }
            current = schema.parent.as_deref();
        }
        false
    }

    /// Fails `MissingPolicy` unless this type declared its own policy.
    pub fn require_policy(&self) -> Result<Mutability, Error> {
        self.policy.ok_or_else(|| {
            Error::new(ErrorKind::MissingPolicy)
                .with_message(format!(
                    "record type `{}` does not declare a mutability policy",
                    self.name
                ))
                .with_hint("Declare the type as mutable or immutable; policies are not inherited.")
        })
    }
}

impl fmt::Debug for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|parent| parent.name()))
            .field("fields", &self.fields)
            .field("policy", &self.policy)
            .field("comparable", &self.comparison.is_some())
            .finish()
    }
}

pub struct RecordSchemaBuilder {
    name: String,
    parent: Option<Arc<RecordSchema>>,
    fields: Vec<FieldDecl>,
    policy: Option<Mutability>,
    comparison: Option<Comparison>,
    compare_by: Option<Vec<String>>,
}

impl RecordSchemaBuilder {
    pub fn extends(mut self, parent: Arc<RecordSchema>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn policy(mut self, policy: Mutability) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        self.fields.push(FieldDecl::new(name, ty));
        self
    }

    pub fn comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = Some(comparison);
        self
    }

    /// Shorthand for `Comparison::by_fields`; names are checked in `build`.
    pub fn compare_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compare_by = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> Result<Arc<RecordSchema>, Error> {
        for (idx, field) in self.fields.iter().enumerate() {
            if self.fields[..idx].iter().any(|prev| prev.name == field.name) {
                return Err(Error::new(ErrorKind::Schema)
                    .with_message(format!(
                        "record type `{}` declares field `{}` twice",
                        self.name, field.name
                    ))
                    .with_field(field.name.clone()));
            }
        }

        if let Some(policy) = self.policy {
            let mut ancestor = self.parent.as_deref();
            while let Some(schema) = ancestor {
                if let Some(declared) = schema.policy {
                    if declared != policy {
                        return Err(Error::new(ErrorKind::PolicyConflict).with_message(format!(
                            "record type `{}` declares {} but ancestor `{}` is {}",
                            self.name,
                            policy.name(),
                            schema.name,
                            declared.name()
                        )));
                    }
                }
                ancestor = schema.parent.as_deref();
            }
        }

        let mut fields = self
            .parent
            .as_ref()
            .map(|parent| parent.fields.clone())
            .unwrap_or_default();
        for field in self.fields {
            match fields.iter_mut().find(|existing| existing.name == field.name) {
                Some(existing) => existing.ty = field.ty,
                None => fields.push(field),
            }
        }

        let comparison = match self.compare_by {
            Some(names) => {
                if let Some(unknown) = names.iter().find(|name| !fields.iter().any(|f| &f.name == *name)) {
                    return Err(Error::new(ErrorKind::Schema)
                        .with_message(format!(
                            "record type `{}` compares by undeclared field `{unknown}`",
                            self.name
                        ))
                        .with_field(unknown.clone()));
                }
                Some(Comparison::by_fields(names))
            }
            None => self.comparison,
        };
        let comparison =
            comparison.or_else(|| self.parent.as_ref().and_then(|parent| parent.comparison.clone()));

        Ok(Arc::new(RecordSchema {
            name: self.name,
            parent: self.parent,
            fields,
            policy: self.policy,
            comparison,
        }))
    }
}

/// Classifies every declared field of `schema`, in construction order.
pub fn fields_of(schema: &RecordSchema, resolver: &dyn Resolve) -> Result<Vec<FieldSpec>, Error> {
    schema
        .fields()
        .iter()
        .map(|field| {
            Ok(FieldSpec {
                name: field.name.clone(),
                descriptor: field.classify(resolver)?,
            })
        })
        .collect()
}
