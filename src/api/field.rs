//! Purpose: Map Rust field types onto type descriptors and runtime values.
//! Exports: `Field`, `MapKey`, `unexpected_value`.
//! Role: Compile-time introspection for typed records; replaces runtime type-hint reflection.
//! Invariants: `from_value(v)` accepts exactly what decoding `descriptor()` produces.
//! Invariants: Typed sets and maps are distinct by construction, so conversion never fails on equality.
//! Invariants: Typed map keys are text; JSON object keys can only decode into strings.
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use serde_json::Value as JsonValue;
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

use crate::core::error::{Error, ErrorKind};
use crate::core::types::{ScalarKind, TypeDescriptor};
use crate::core::value::{Value, ValueMap, ValueSet};

/// A Rust type usable as a record field.
pub trait Field: Sized {
    fn descriptor() -> TypeDescriptor;
    fn to_value(&self) -> Value;
    fn from_value(value: Value) -> Result<Self, Error>;
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for String {}
}

/// Key type of a typed map field.
///
/// Only `String` qualifies, so a record cannot declare a map whose entries would
/// be discarded on decode:
///
/// ```compile_fail
/// use std::collections::HashMap;
///
/// classy::record! {
///     #[immutable]
///     pub struct Numbered {
///         rooms: HashMap<i64, String>,
///     }
/// }
/// ```
pub trait MapKey: Field + sealed::Sealed {}

impl MapKey for String {}

#[doc(hidden)]
pub fn unexpected_value(expected: &TypeDescriptor, got: &Value) -> Error {
    Error::new(ErrorKind::Mismatch).with_message(format!(
        "expected {expected}, got {}",
        got.kind_name()
    ))
}

macro_rules! scalar_field {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl Field for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::Scalar(ScalarKind::$kind)
            }

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_value(value: Value) -> Result<Self, Error> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(unexpected_value(&Self::descriptor(), &other)),
                }
            }
        }
    };
}

scalar_field!(String, String, Str);
scalar_field!(i64, Integer, Int);
scalar_field!(f64, Float, Float);
scalar_field!(bool, Boolean, Bool);
scalar_field!(Uuid, Uuid, Uuid);
scalar_field!(Date, Date, Date);
scalar_field!(PrimitiveDateTime, DateTime, DateTime);
scalar_field!(Time, Time, Time);
scalar_field!(JsonValue, Opaque, Opaque);

macro_rules! narrow_int_field {
    ($ty:ty) => {
        impl Field for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::Scalar(ScalarKind::Integer)
            }

            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }

            fn from_value(value: Value) -> Result<Self, Error> {
                match value {
                    Value::Int(n) => <$ty>::try_from(n).map_err(|err| {
                        Error::new(ErrorKind::Mismatch)
                            .with_message(format!("{n} is out of range for {}", stringify!($ty)))
                            .with_source(err)
                    }),
                    other => Err(unexpected_value(&Self::descriptor(), &other)),
                }
            }
        }
    };
}

narrow_int_field!(i32);
narrow_int_field!(u32);

impl Field for f32 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::Float)
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Float(n) => Ok(n as f32),
            other => Err(unexpected_value(&Self::descriptor(), &other)),
        }
    }
}

impl<T: Field> Field for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence(T::descriptor())
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Field::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Seq(items) => items_from(items),
            other => Err(unexpected_value(&Self::descriptor(), &other)),
        }
    }
}

impl<T: Field + Ord> Field for BTreeSet<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::set(T::descriptor())
    }

    fn to_value(&self) -> Value {
        Value::Set(ValueSet::from_distinct(self.iter().map(Field::to_value).collect()))
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Set(set) => items_from(set.into_vec()),
            other => Err(unexpected_value(&Self::descriptor(), &other)),
        }
    }
}

impl<T: Field + Eq + Hash> Field for HashSet<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::set(T::descriptor())
    }

    fn to_value(&self) -> Value {
        Value::Set(ValueSet::from_distinct(self.iter().map(Field::to_value).collect()))
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Set(set) => items_from(set.into_vec()),
            other => Err(unexpected_value(&Self::descriptor(), &other)),
        }
    }
}

impl<K: MapKey + Ord, V: Field> Field for BTreeMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::mapping(K::descriptor(), V::descriptor())
    }

    fn to_value(&self) -> Value {
        Value::Map(ValueMap::from_distinct(
            self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect(),
        ))
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Map(map) => entries_from(map),
            other => Err(unexpected_value(&Self::descriptor(), &other)),
        }
    }
}

impl<K: MapKey + Eq + Hash, V: Field> Field for HashMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::mapping(K::descriptor(), V::descriptor())
    }

    fn to_value(&self) -> Value {
        Value::Map(ValueMap::from_distinct(
            self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect(),
        ))
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Map(map) => entries_from(map),
            other => Err(unexpected_value(&Self::descriptor(), &other)),
        }
    }
}

fn items_from<T: Field, C: FromIterator<T>>(items: Vec<Value>) -> Result<C, Error> {
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| T::from_value(item).map_err(|err| err.within(&format!("[{idx}]"))))
        .collect()
}

fn entries_from<K: Field, V: Field, C: FromIterator<(K, V)>>(map: ValueMap) -> Result<C, Error> {
    map.into_entries()
        .into_iter()
        .map(|(key, value)| {
            let segment = match key.to_json() {
                JsonValue::String(text) => text,
                other => other.to_string(),
            };
            let key = K::from_value(key).map_err(|err| err.within(&segment))?;
            let value = V::from_value(value).map_err(|err| err.within(&segment))?;
            Ok((key, value))
        })
        .collect()
}

fn next_item(items: &mut std::vec::IntoIter<Value>, idx: usize) -> Result<Value, Error> {
    items.next().ok_or_else(|| {
        Error::new(ErrorKind::Mismatch).with_message(format!("tuple is missing item {idx}"))
    })
}

macro_rules! tuple_field {
    ($len:expr; $($name:ident : $idx:tt),+) => {
        impl<$($name: Field),+> Field for ($($name,)+) {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::FixedTuple(vec![$($name::descriptor()),+])
            }

            fn to_value(&self) -> Value {
                Value::Tuple(vec![$(self.$idx.to_value()),+])
            }

            fn from_value(value: Value) -> Result<Self, Error> {
                let items = match value {
                    Value::Tuple(items) if items.len() == $len => items,
                    other => return Err(unexpected_value(&Self::descriptor(), &other)),
                };
                let mut items = items.into_iter();
                Ok(($(
                    $name::from_value(next_item(&mut items, $idx)?)
                        .map_err(|err| err.within(concat!("[", stringify!($idx), "]")))?,
                )+))
            }
        }
    };
}

tuple_field!(1; A: 0);
tuple_field!(2; A: 0, B: 1);
tuple_field!(3; A: 0, B: 1, C: 2);
tuple_field!(4; A: 0, B: 1, C: 2, D: 3);
tuple_field!(5; A: 0, B: 1, C: 2, D: 3, E: 4);
tuple_field!(6; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
tuple_field!(7; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
tuple_field!(8; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use serde_json::json;

    use super::Field;
    use crate::core::error::ErrorKind;
    use crate::core::value::Value;

    #[test]
    fn descriptors_render_like_declared_types() {
        assert_eq!(<Vec<String>>::descriptor().to_string(), "list[str]");
        assert_eq!(<BTreeMap<String, Vec<i32>>>::descriptor().to_string(), "dict[str, list[int]]");
        assert_eq!(<(String, f64, bool)>::descriptor().to_string(), "tuple[str, float, bool]");
        assert_eq!(<BTreeSet<uuid::Uuid>>::descriptor().to_string(), "set[UUID]");
    }

    #[test]
    fn values_convert_both_ways() {
        let tags: BTreeSet<String> = ["a".to_string(), "b".to_string()].into_iter().collect();
        let value = tags.to_value();
        assert_eq!(value.to_json(), json!(["a", "b"]));
        assert_eq!(BTreeSet::<String>::from_value(value).unwrap(), tags);

        let pair = (7_i32, "x".to_string());
        assert_eq!(<(i32, String)>::from_value(pair.to_value()).unwrap(), pair);
    }

    #[test]
    fn narrow_integers_reject_out_of_range_values() {
        let err = i32::from_value(Value::Int(i64::from(i32::MAX) + 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mismatch);
        let err = u32::from_value(Value::Int(-1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mismatch);
    }

    #[test]
    fn wrong_variants_report_the_item_path() {
        let err = <Vec<i64>>::from_value(Value::Seq(vec![Value::Int(1), Value::from("2")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mismatch);
        assert_eq!(err.field(), Some("[1]"));
    }
}
