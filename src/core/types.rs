//! Purpose: Declared field types, both as written (`TypeExpr`) and as classified (`TypeDescriptor`).
//! Exports: `ScalarKind`, `TypeDescriptor`, `TypeExpr`.
//! Role: Vocabulary shared by the matcher, decoder, default synthesizer, and typed facade.
//! Invariants: Container descriptors carry exactly the arity their kind requires.
//! Invariants: `TypeExpr` display output parses back to an equal expression.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::error::{Error, ErrorKind};
use crate::core::schema::RecordSchema;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Time,
    Uuid,
    Opaque,
}

impl ScalarKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "str" => Some(Self::String),
            "int" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "bool" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            "datetime" => Some(Self::DateTime),
            "time" => Some(Self::Time),
            "UUID" | "uuid" => Some(Self::Uuid),
            "Any" | "any" => Some(Self::Opaque),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "str",
            Self::Integer => "int",
            Self::Float => "float",
            Self::Boolean => "bool",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Time => "time",
            Self::Uuid => "UUID",
            Self::Opaque => "Any",
        }
    }

    /// Identifier, date, datetime, and time: parsed from canonical text on decode.
    pub fn is_well_known(self) -> bool {
        matches!(self, Self::Date | Self::DateTime | Self::Time | Self::Uuid)
    }
}

/// A classified field type that drives decode and default recursion.
#[derive(Clone, Debug)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    Record(Arc<RecordSchema>),
    Sequence(Box<TypeDescriptor>),
    FixedTuple(Vec<TypeDescriptor>),
    Set(Box<TypeDescriptor>),
    Mapping(Box<TypeDescriptor>, Box<TypeDescriptor>),
}

impl TypeDescriptor {
    pub fn sequence(elem: TypeDescriptor) -> Self {
        Self::Sequence(Box::new(elem))
    }

    pub fn set(elem: TypeDescriptor) -> Self {
        Self::Set(Box::new(elem))
    }

    pub fn mapping(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Mapping(Box::new(key), Box::new(value))
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{}", kind.name()),
            Self::Record(schema) => write!(f, "{}", schema.name()),
            Self::Sequence(elem) => write!(f, "list[{elem}]"),
            Self::FixedTuple(elems) if elems.is_empty() => write!(f, "tuple"),
            Self::FixedTuple(elems) => {
                write!(f, "tuple[")?;
                write_joined(f, elems)?;
                write!(f, "]")
            }
            Self::Set(elem) => write!(f, "set[{elem}]"),
            Self::Mapping(key, value) => write!(f, "dict[{key}, {value}]"),
        }
    }
}

/// A declared type as written: a name plus optional generic arguments.
///
/// `args` is `None` for a bare name and `Some(vec![])` for an explicit empty
/// argument list such as `tuple[()]`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TypeExpr {
    pub name: String,
    pub args: Option<Vec<TypeExpr>>,
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        Self {
            name: name.into(),
            args: Some(args),
        }
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut parser = ExprParser {
            text,
            pos: 0,
        };
        let expr = parser.expr()?;
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(expr)
    }
}

impl FromStr for TypeExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match &self.args {
            None => Ok(()),
            Some(args) if args.is_empty() => write!(f, "[()]"),
            Some(args) => {
                write!(f, "[")?;
                write_joined(f, args)?;
                write!(f, "]")
            }
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

struct ExprParser<'a> {
    text: &'a str,
    pos: usize,
}

impl ExprParser<'_> {
    fn expr(&mut self) -> Result<TypeExpr, Error> {
        self.skip_ws();
        let name = self.name()?;
        self.skip_ws();
        if !self.eat('[') {
            return Ok(TypeExpr::named(name));
        }
        self.skip_ws();
        if self.eat('(') {
            self.skip_ws();
            if !self.eat(')') {
                return Err(self.error("expected `)`"));
            }
            self.skip_ws();
            if !self.eat(']') {
                return Err(self.error("expected `]`"));
            }
            return Ok(TypeExpr::generic(name, Vec::new()));
        }
        let mut args = vec![self.expr()?];
        loop {
            self.skip_ws();
            if self.eat(']') {
                return Ok(TypeExpr::generic(name, args));
            }
            if !self.eat(',') {
                return Err(self.error("expected `,` or `]`"));
            }
            args.push(self.expr()?);
        }
    }

    fn name(&mut self) -> Result<String, Error> {
        let rest = &self.text[self.pos..];
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '.'))
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        self.pos += len;
        Ok(rest[..len].to_string())
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.text[self.pos..].starts_with(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, message: &str) -> Error {
        Error::new(ErrorKind::Schema)
            .with_message(format!(
                "malformed type expression `{}`: {message} at offset {}",
                self.text, self.pos
            ))
            .with_hint("Type expressions look like `str`, `list[Student]`, or `dict[str, int]`.")
    }
}
