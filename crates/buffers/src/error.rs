use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadErrorKind {
    #[error("unexpected end of JSON input")]
    UnexpectedEnd,
    #[error("{0}")]
    Syntax(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("invalid string: {0}")]
    InvalidString(String),
}

/// Failure raised by [`crate::Reader`], tagged with the byte offset where
/// the offending token started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at position {offset}")]
pub struct ReadError {
    pub offset: usize,
    pub kind: ReadErrorKind,
}

impl ReadError {
    pub fn new(offset: usize, kind: ReadErrorKind) -> Self {
        Self { offset, kind }
    }

    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::new(offset, ReadErrorKind::Syntax(message.into()))
    }
}
