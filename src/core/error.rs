//! Purpose: Error taxonomy shared by the codec, schema layer, and CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: One error type for every failure; context is attached with builder setters.
//! Invariants: Errors are raised at the point of detection and never recovered locally.
//! Invariants: Exit code mapping is stable once published.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed type declaration: bad generic arity, unsupported container, unknown type.
    Schema,
    /// The most-derived record type never declared a mutability policy.
    MissingPolicy,
    /// A record type declared a policy opposite to an ancestor's.
    PolicyConflict,
    /// Malformed canonical text for a well-known scalar.
    Parse,
    /// Equality or hashing on a record type that never supplied it.
    NotImplemented,
    /// Field mutation on an immutable record.
    Frozen,
    /// Missing or unexpected constructor argument.
    Argument,
    /// Input value has the wrong shape for its declared type.
    Mismatch,
    /// JSON text could not be transcoded.
    Json,
    Usage,
    Io,
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    field: Option<String>,
    hint: Option<String>,
    // Record types forming a default-synthesis cycle, outermost first.
    cycle: Option<Vec<String>>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            field: None,
            hint: None,
            cycle: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Dotted path of the field being decoded when the error was raised.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// The record-type cycle that made default synthesis fail, if that is the cause.
    pub fn cycle(&self) -> Option<&[String]> {
        self.cycle.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_cycle(mut self, cycle: Vec<String>) -> Self {
        self.cycle = Some(cycle);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Prefixes the field path with an enclosing segment (`name` or `[3]`).
    pub fn within(mut self, segment: &str) -> Self {
        self.field = Some(match self.field.take() {
            None => segment.to_string(),
            Some(inner) if inner.starts_with('[') => format!("{segment}{inner}"),
            Some(inner) => format!("{segment}.{inner}"),
        });
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {field})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Io => 3,
        ErrorKind::Json => 4,
        ErrorKind::Schema => 5,
        ErrorKind::Mismatch => 6,
        ErrorKind::Parse => 7,
        ErrorKind::Argument => 8,
        ErrorKind::MissingPolicy => 9,
        ErrorKind::PolicyConflict => 10,
        ErrorKind::NotImplemented => 11,
        ErrorKind::Frozen => 12,
    }
}
