//! Structural codec with an object form and an optional array form.
//!
//! Decoding looks at the first byte: `{` selects the object format, `[`
//! the array format. Encoding always uses the primary format.

use std::sync::Arc;

use json_bind_buffers::{Reader, Writer};

use super::{Codec, CodecRef, FormatRef};
use crate::error::{ConfigurationError, DecodeError, Result};
use crate::type_def::{FormatPolicy, TypeDescriptor};
use crate::value::Value;

pub struct FormatDescription {
    manifest: TypeDescriptor,
    object: Option<FormatRef>,
    array: Option<FormatRef>,
    object_first: bool,
}

impl FormatDescription {
    /// Combines the formats a declaration asked for. An array-primary
    /// policy falls back to the object form when array formats are
    /// disabled; array-only declarations then fail.
    pub fn build(
        manifest: &TypeDescriptor,
        policy: FormatPolicy,
        object: Option<FormatRef>,
        array: Option<FormatRef>,
    ) -> Result<Arc<Self>, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidDeclaration {
            type_name: manifest.to_string(),
            reason: reason.to_string(),
        };
        if policy.has_object() && object.is_none() {
            return Err(invalid("object format is missing"));
        }
        if policy == FormatPolicy::ArrayOnly && array.is_none() {
            return Err(invalid("array format is required but disabled"));
        }
        let object_first = policy.object_first() || array.is_none();
        Ok(Arc::new(Self {
            manifest: manifest.clone(),
            object: if policy.has_object() { object } else { None },
            array: if policy.has_array() { array } else { None },
            object_first,
        }))
    }

    pub fn object_format(&self) -> Option<&FormatRef> {
        self.object.as_ref()
    }

    pub fn array_format(&self) -> Option<&FormatRef> {
        self.array.as_ref()
    }

    pub fn object_first(&self) -> bool {
        self.object_first
    }

    fn primary(&self) -> Option<&FormatRef> {
        if self.object_first {
            self.object.as_ref()
        } else {
            self.array.as_ref()
        }
    }

    fn select(&self, reader: &Reader<'_>) -> Result<&FormatRef> {
        let found = match reader.last_token() {
            b'{' => self.object.as_ref(),
            b'[' => self.array.as_ref(),
            _ => None,
        };
        if let Some(format) = found {
            return Ok(format);
        }
        let expected = match (&self.object, &self.array) {
            (Some(_), Some(_)) => "Expecting '{' or '['",
            (Some(_), None) => "Expecting '{'",
            _ => "Expecting '['",
        };
        Err(DecodeError::syntax(
            reader.token_start(),
            format!(
                "{expected} for decoding {}. Found '{}'",
                self.manifest,
                reader.last_token() as char
            ),
        )
        .into())
    }
}

impl Codec for FormatDescription {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        if value.is_null() {
            writer.write_null();
            return Ok(());
        }
        match self.primary() {
            Some(format) => format.write(writer, value),
            None => Err(ConfigurationError::MissingFormat {
                type_name: self.manifest.to_string(),
                format: "primary",
            }
            .into()),
        }
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        if reader.was_null()? {
            return Ok(Value::Null);
        }
        self.select(reader)?.read(reader)
    }

    fn bind(&self, reader: &mut Reader<'_>, instance: &mut Value) -> Result<()> {
        if reader.was_null()? {
            *instance = Value::Null;
            return Ok(());
        }
        self.select(reader)?.bind(reader, instance)
    }

    fn formats(&self) -> Option<&FormatDescription> {
        Some(self)
    }
}

/// Shorthand for analyzers: the built description as a codec.
pub(crate) fn build_codec(
    manifest: &TypeDescriptor,
    policy: FormatPolicy,
    object: Option<FormatRef>,
    array: Option<FormatRef>,
) -> Result<CodecRef> {
    let codec: CodecRef = FormatDescription::build(manifest, policy, object, array)?;
    Ok(codec)
}
