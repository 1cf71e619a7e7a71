//! Purpose: Define the stable public Rust API boundary for classy.
//! Exports: The value-object facade, the dynamic codec, schema types, and errors.
//! Role: Public, additive-only surface; the CLI and `record!` expansions go through it.
//! Invariants: This module is the only public path to the codec and schema layer.
//! Invariants: Internal modules remain private and are not directly exposed.

mod field;
mod object;
mod validation;

pub use crate::core::decode::{decode, from_dict, from_json};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::matcher::{Resolve, classify};
pub use crate::core::record::{Fields, Record};
pub use crate::core::registry::{
    FieldDoc, PolicyDoc, RecordDoc, Registry, RejectReason, Rejected, SchemaDocument,
};
pub use crate::core::schema::{
    Comparison, FieldDecl, FieldSpec, FieldType, Mutability, RecordSchema, RecordSchemaBuilder,
    fields_of,
};
pub use crate::core::synth::{default_of, default_record};
pub use crate::core::types::{ScalarKind, TypeDescriptor, TypeExpr};
pub use crate::core::value::{Value, ValueMap, ValueSet};
#[doc(hidden)]
pub use field::unexpected_value;
pub use field::{Field, MapKey};
pub use object::{Immutable, Mutable, Policy, ValueObject};
pub use validation::{SchemaIssue, SchemaReport, SchemaStatus, check_document};
