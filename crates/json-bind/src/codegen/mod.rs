//! Codec construction.
//!
//! Every type gets one [`Codec`]. Containers and structural types are
//! assembled by analyzers from the codecs of their element and member
//! types; see [`crate::JsonBind::resolve`].

pub mod any;
pub mod binding;
pub mod containers;
pub mod format;
pub mod lazy;
pub mod mixin;
pub mod primitives;
pub mod registry;
pub mod structural;

use std::sync::Arc;

use json_bind_buffers::{Reader, Writer};

use crate::error::{ConfigurationError, Result};
use crate::type_def::TypeDescriptor;
use crate::value::Value;

pub use format::FormatDescription;

/// Encoder/decoder pair for one type.
///
/// `decode` is entered with the first byte of the value as the reader's
/// last token and returns with the whole value consumed.
pub trait Codec: Send + Sync {
    /// The type this codec was built for.
    fn manifest(&self) -> &TypeDescriptor;

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()>;

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value>;

    /// Decodes into an existing instance instead of creating one.
    fn bind(&self, reader: &mut Reader<'_>, instance: &mut Value) -> Result<()> {
        let _ = (reader, instance);
        Err(ConfigurationError::BindUnsupported {
            type_name: self.manifest().to_string(),
        }
        .into())
    }

    /// True while this is a placeholder whose real codec is not built yet.
    fn is_pending(&self) -> bool {
        false
    }

    /// Waits until the codec can be used; fails when it never will be.
    fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Object and array formats of a structural codec.
    fn formats(&self) -> Option<&FormatDescription> {
        None
    }
}

pub type CodecRef = Arc<dyn Codec>;

/// One wire format of a structural type: the object form or the
/// positional array form.
pub trait FormatConverter: Send + Sync {
    /// Writes the value with its delimiters. The value is not `null`.
    fn write(&self, writer: &mut Writer, value: &Value) -> Result<()>;

    /// Writes all members separated by commas, without delimiters.
    fn write_content_full(&self, writer: &mut Writer, value: &Value) -> Result<()>;

    /// Writes only members that differ from their defaults, each one
    /// followed by a comma. Returns whether anything was written.
    fn write_content_minimal(&self, writer: &mut Writer, value: &Value) -> Result<bool> {
        let mark = writer.mark();
        self.write_content_full(writer, value)?;
        if writer.mark() == mark {
            Ok(false)
        } else {
            writer.u8(b',');
            Ok(true)
        }
    }

    /// Whether [`FormatConverter::write`] skips default-valued members.
    fn omits_defaults(&self) -> bool {
        false
    }

    /// Reads a value whose opening delimiter is the last token.
    fn read(&self, reader: &mut Reader<'_>) -> Result<Value>;

    /// Reads the members of a value whose opening delimiter (and any
    /// discriminator) was already consumed. The last token is the first
    /// token of the content or the closing delimiter.
    fn read_content(&self, reader: &mut Reader<'_>) -> Result<Value>;

    /// Reads into an existing instance; the opening delimiter is the last
    /// token.
    fn bind(&self, reader: &mut Reader<'_>, instance: &mut Value) -> Result<()>;
}

pub type FormatRef = Arc<dyn FormatConverter>;

/// Decodes the literal `null` through `codec`, giving the type's default
/// value. Placeholders and codecs rejecting `null` yield `Value::Null`.
pub fn default_value(codec: &CodecRef) -> Value {
    if codec.is_pending() {
        return Value::Null;
    }
    let mut reader = Reader::new(b"null");
    if reader.next_token().is_err() {
        return Value::Null;
    }
    codec.decode(&mut reader).unwrap_or(Value::Null)
}
