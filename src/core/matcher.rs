//! Purpose: Classify declared type expressions into `TypeDescriptor`s.
//! Exports: `Resolve`, `classify`.
//! Role: Container type matcher; the single place generic arity and origin kinds are checked.
//! Invariants: Parameterized origins are checked before scalar/record names.
//! Invariants: Arity violations and unknown origins are `Schema` errors, raised per call.
use std::sync::Arc;

use crate::core::error::{Error, ErrorKind};
use crate::core::schema::RecordSchema;
use crate::core::types::{ScalarKind, TypeDescriptor, TypeExpr};

/// Looks up record types by the name used in type expressions.
pub trait Resolve {
    fn resolve(&self, name: &str) -> Option<Arc<RecordSchema>>;
}

impl<F> Resolve for F
where
    F: Fn(&str) -> Option<Arc<RecordSchema>>,
{
    fn resolve(&self, name: &str) -> Option<Arc<RecordSchema>> {
        self(name)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Origin {
    Sequence,
    FixedTuple,
    Set,
    Mapping,
}

fn origin(name: &str) -> Option<Origin> {
    match name {
        "list" => Some(Origin::Sequence),
        "tuple" => Some(Origin::FixedTuple),
        "set" => Some(Origin::Set),
        "dict" => Some(Origin::Mapping),
        _ => None,
    }
}

pub fn classify(expr: &TypeExpr, resolver: &dyn Resolve) -> Result<TypeDescriptor, Error> {
    let Some(args) = &expr.args else {
        return classify_plain(&expr.name, resolver);
    };
    let Some(origin) = origin(&expr.name) else {
        return Err(Error::new(ErrorKind::Schema)
            .with_message(format!("unsupported generic type `{expr}`"))
            .with_hint("Supported containers are list[T], tuple[T, ...], set[T], and dict[K, V]."));
    };
    match origin {
        Origin::Sequence => {
            let [elem] = exact_args::<1>(expr, args)?;
            Ok(TypeDescriptor::sequence(classify(elem, resolver)?))
        }
        Origin::FixedTuple => Ok(TypeDescriptor::FixedTuple(
            args.iter()
                .map(|arg| classify(arg, resolver))
                .collect::<Result<_, _>>()?,
        )),
        Origin::Set => {
            let [elem] = exact_args::<1>(expr, args)?;
            Ok(TypeDescriptor::set(classify(elem, resolver)?))
        }
        Origin::Mapping => {
            let [key, value] = exact_args::<2>(expr, args)?;
            Ok(TypeDescriptor::mapping(
                classify(key, resolver)?,
                classify(value, resolver)?,
            ))
        }
    }
}

fn classify_plain(name: &str, resolver: &dyn Resolve) -> Result<TypeDescriptor, Error> {
    if let Some(kind) = ScalarKind::from_name(name) {
        return Ok(TypeDescriptor::Scalar(kind));
    }
    match origin(name) {
        Some(Origin::FixedTuple) => return Ok(TypeDescriptor::FixedTuple(Vec::new())),
        Some(_) => {
            return Err(invalid_arguments(name, 0));
        }
        None => {}
    }
    resolver
        .resolve(name)
        .map(TypeDescriptor::Record)
        .ok_or_else(|| {
            Error::new(ErrorKind::Schema)
                .with_message(format!("unsupported field type `{name}`"))
                .with_hint("Use a scalar name, a container, or a registered record type.")
        })
}

fn exact_args<'a, const N: usize>(
    expr: &TypeExpr,
    args: &'a [TypeExpr],
) -> Result<&'a [TypeExpr; N], Error> {
    <&[TypeExpr; N]>::try_from(args).map_err(|_| invalid_arguments(&expr.name, args.len()))
}

fn invalid_arguments(name: &str, got: usize) -> Error {
    let expected = match origin(name) {
        Some(Origin::Mapping) => 2,
        _ => 1,
    };
    Error::new(ErrorKind::Schema).with_message(format!(
        "invalid generic arguments: `{name}` takes {expected}, got {got}"
    ))
}
