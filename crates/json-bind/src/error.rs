use std::fmt;

use json_bind_buffers::{ReadError, ReadErrorKind};
use thiserror::Error;

/// Problems found while building codecs. These are programming or
/// declaration mistakes, never caused by input data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Unable to find codec for {type_name}")]
    NoCodecFound { type_name: String },
    #[error("Unable to match constructor parameters of {type_name}: {reason}")]
    AmbiguousConstructor { type_name: String, reason: String },
    #[error("Too many mandatory properties on {type_name}: {count} declared, at most 64 supported")]
    TooManyMandatory { type_name: String, count: usize },
    #[error("Invalid declaration of {type_name}: {reason}")]
    InvalidDeclaration { type_name: String, reason: String },
    #[error("Codec for {type_name} was not ready within {timeout_ms}ms")]
    PlaceholderTimeout { type_name: String, timeout_ms: u64 },
    #[error("Analysis of {type_name} failed: {reason}")]
    PlaceholderAbandoned { type_name: String, reason: String },
    #[error("Codec for {type_name} used during its own analysis")]
    ReentrantPlaceholder { type_name: String },
    #[error("{type_name} does not support the {format} format")]
    MissingFormat { type_name: String, format: &'static str },
    #[error("{type_name} does not support binding into an existing instance")]
    BindUnsupported { type_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    #[error("{0}")]
    Syntax(String),
    #[error("Unexpected end of JSON input")]
    UnexpectedEnd,
    #[error("{}", describe_missing(.0))]
    MissingMandatory(Vec<String>),
    #[error("Unknown property detected: '{0}'")]
    UnknownProperty(String),
    #[error("Unknown type discriminator: '{0}'")]
    UnknownDiscriminator(String),
    #[error("Null key detected for map")]
    NullKey,
    #[error("Null value found for non-null attribute")]
    NullForNonNull,
    #[error("Unknown enum constant: '{0}'")]
    UnknownEnumConstant(String),
    #[error("Expecting {expected} elements, found {found}")]
    WrongArity { expected: usize, found: usize },
    #[error("Unable to construct instance: {0}")]
    Construction(String),
    #[error("Unexpected content after JSON value")]
    TrailingContent,
}

fn describe_missing(names: &[String]) -> String {
    let noun = if names.len() == 1 { "property" } else { "properties" };
    format!("Mandatory {noun} ({}) not found", names.join(", "))
}

/// A malformed or unexpected input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub offset: usize,
    pub field: Option<String>,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(offset: usize, kind: DecodeErrorKind) -> Self {
        Self {
            offset,
            field: None,
            kind,
        }
    }

    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::new(offset, DecodeErrorKind::Syntax(message.into()))
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(field) = &self.field {
            write!(f, " for '{field}'")?;
        }
        write!(f, " at position {}", self.offset)
    }
}

impl std::error::Error for DecodeError {}

impl From<ReadError> for DecodeError {
    fn from(err: ReadError) -> Self {
        let kind = match err.kind {
            ReadErrorKind::UnexpectedEnd => DecodeErrorKind::UnexpectedEnd,
            other => DecodeErrorKind::Syntax(other.to_string()),
        };
        DecodeError::new(err.offset, kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Unable to find encoder for runtime type {runtime_type}")]
    NoEncoder { runtime_type: String },
    #[error("{runtime_type} is not a registered variant of {union_type}")]
    UnregisteredVariant {
        union_type: String,
        runtime_type: String,
    },
    #[error("Expecting {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("Unable to read '{member}': {reason}")]
    Accessor { member: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl From<ReadError> for Error {
    fn from(err: ReadError) -> Self {
        Error::Decode(err.into())
    }
}

impl Error {
    pub fn as_decode(&self) -> Option<&DecodeError> {
        match self {
            Error::Decode(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_configuration(&self) -> Option<&ConfigurationError> {
        match self {
            Error::Configuration(e) => Some(e),
            _ => None,
        }
    }

    /// Attaches a field name to a decode error that does not have one yet.
    pub(crate) fn in_field(self, field: &str) -> Self {
        match self {
            Error::Decode(e) if e.field.is_none() => Error::Decode(e.with_field(field)),
            other => other,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
