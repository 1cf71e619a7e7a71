//! Purpose: `record!`, the declaration form for compile-time value objects.
//! Exports: `record!` (crate root).
//! Role: Generates the struct, its constructor, and `ValueObject` + `Field` impls.
//! Invariants: The first attribute is `#[immutable]` or `#[mutable]`; anything else fails to compile.
//! Invariants: Immutable records expose getters only; mutable records expose public fields.

/// Declares a value-object record.
///
/// ```
/// use classy::api::ValueObject;
///
/// classy::record! {
///     #[immutable]
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Student {
///         name: String,
///         age: i64,
///     }
/// }
///
/// let student = Student::from_json(r#"{"name": "Sarah", "age": 21}"#).unwrap();
/// assert_eq!(student.name(), "Sarah");
/// assert_eq!(student.to_json().unwrap(), r#"{"name":"Sarah","age":21}"#);
/// ```
///
/// A record without a policy does not compile:
///
/// ```compile_fail
/// classy::record! {
///     #[derive(Debug)]
///     pub struct Untagged {
///         name: String,
///     }
/// }
/// ```
///
/// Nor does assigning to an immutable record's field from outside its module:
///
/// ```compile_fail
/// mod school {
///     classy::record! {
///         #[immutable]
///         pub struct Student {
///             name: String,
///         }
///     }
/// }
///
/// let mut student = school::Student::new("John".to_string());
/// student.name = "Sarah".to_string();
/// ```
#[macro_export]
macro_rules! record {
    (@impl $name:ident, $policy:ident, $($field:ident : $ty:ty),*) => {
        impl $crate::api::ValueObject for $name {
            type Policy = $crate::api::$policy;

            fn schema() -> &'static ::std::sync::Arc<$crate::api::RecordSchema> {
                static SCHEMA: ::std::sync::OnceLock<::std::sync::Arc<$crate::api::RecordSchema>> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    $crate::api::RecordSchema::typed(
                        stringify!($name),
                        <$crate::api::$policy as $crate::api::Policy>::MUTABILITY,
                        vec![$((stringify!($field), <$ty as $crate::api::Field>::descriptor as fn() -> $crate::api::TypeDescriptor)),*],
                    )
                })
            }

            fn to_record(&self) -> $crate::api::Record {
                $crate::api::Record::assemble(
                    <Self as $crate::api::ValueObject>::schema(),
                    <$crate::api::$policy as $crate::api::Policy>::MUTABILITY,
                    vec![$((stringify!($field).to_string(), $crate::api::Field::to_value(&self.$field))),*],
                )
            }

            #[allow(unused_mut)]
            fn from_record(
                record: $crate::api::Record,
            ) -> ::std::result::Result<Self, $crate::api::Error> {
                let mut fields = record.into_fields_of(<Self as $crate::api::ValueObject>::schema())?;
                ::std::result::Result::Ok(Self {
                    $(
                        $field: <$ty as $crate::api::Field>::from_value(fields.take(stringify!($field))?)
                            .map_err(|err| err.within(stringify!($field)))?,
                    )*
                })
            }
        }

        impl $crate::api::Field for $name {
            fn descriptor() -> $crate::api::TypeDescriptor {
                $crate::api::TypeDescriptor::Record(::std::sync::Arc::clone(
                    <Self as $crate::api::ValueObject>::schema(),
                ))
            }

            fn to_value(&self) -> $crate::api::Value {
                $crate::api::Value::Record($crate::api::ValueObject::to_record(self))
            }

            fn from_value(
                value: $crate::api::Value,
            ) -> ::std::result::Result<Self, $crate::api::Error> {
                match value {
                    $crate::api::Value::Record(record) => {
                        <Self as $crate::api::ValueObject>::from_record(record)
                    }
                    other => ::std::result::Result::Err($crate::api::unexpected_value(
                        &<Self as $crate::api::Field>::descriptor(),
                        &other,
                    )),
                }
            }
        }
    };

    (
        #[immutable]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$fmeta:meta])* $field:ident : $ty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($(#[$fmeta])* $field: $ty,)*
        }

        impl $name {
            #[allow(clippy::too_many_arguments)]
            $vis fn new($($field: $ty),*) -> Self {
                Self { $($field),* }
            }

            $(
                $vis fn $field(&self) -> &$ty {
                    &self.$field
                }
            )*
        }

        $crate::record!(@impl $name, Immutable, $($field: $ty),*);
    };

    (
        #[mutable]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$fmeta:meta])* $field:ident : $ty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($(#[$fmeta])* pub $field: $ty,)*
        }

        impl $name {
            #[allow(clippy::too_many_arguments)]
            $vis fn new($($field: $ty),*) -> Self {
                Self { $($field),* }
            }
        }

        $crate::record!(@impl $name, Mutable, $($field: $ty),*);
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $($rest:tt)*
    ) => {
        compile_error!(concat!(
            "record `",
            stringify!($name),
            "` must declare #[mutable] or #[immutable] as its first attribute"
        ));
    };
}
