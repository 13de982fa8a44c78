//! Per-member encoders and decoders.

use std::borrow::Cow;

use json_bind_buffers::Writer;

use crate::codegen::CodecRef;
use crate::error::{EncodeError, Result};
use crate::type_def::{Getter, Setter};
use crate::value::Value;

fn read<'a>(getter: &Getter, name: &str, instance: &'a Value) -> Result<Cow<'a, Value>> {
    getter(instance).map_err(|reason| {
        EncodeError::Accessor {
            member: name.to_string(),
            reason,
        }
        .into()
    })
}

/// Writes `"name":value` for one member.
pub struct AttributeEncoder {
    name: String,
    /// `"name":` with the name already escaped.
    quoted_name: Vec<u8>,
    getter: Getter,
    codec: CodecRef,
    /// When set, values equal to it are not written.
    default: Option<Value>,
}

impl AttributeEncoder {
    pub fn new(name: &str, getter: Getter, codec: CodecRef, default: Option<Value>) -> Self {
        let mut quoted = Writer::with_alloc_size(name.len() + 8);
        quoted.write_str(name);
        quoted.u8(b':');
        Self {
            name: name.to_string(),
            quoted_name: quoted.flush(),
            getter,
            codec,
            default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Writes the member unconditionally.
    pub fn write(&self, writer: &mut Writer, instance: &Value) -> Result<()> {
        let value = read(&self.getter, &self.name, instance)?;
        writer.buf(&self.quoted_name);
        self.codec.encode(writer, &value)
    }

    /// Writes the member unless it holds its default.
    pub fn write_minimal(&self, writer: &mut Writer, instance: &Value) -> Result<()> {
        let value = read(&self.getter, &self.name, instance)?;
        if self.default.as_ref() == Some(&*value) {
            return Ok(());
        }
        writer.buf(&self.quoted_name);
        self.codec.encode(writer, &value)
    }
}

/// Writes just the value of one member, for the array format.
pub struct ArrayAttributeEncoder {
    name: String,
    getter: Getter,
    codec: CodecRef,
}

impl ArrayAttributeEncoder {
    pub fn new(name: &str, getter: Getter, codec: CodecRef) -> Self {
        Self {
            name: name.to_string(),
            getter,
            codec,
        }
    }

    pub fn write(&self, writer: &mut Writer, instance: &Value) -> Result<()> {
        let value = read(&self.getter, &self.name, instance)?;
        self.codec.encode(writer, &value)
    }
}

/// Decodes a member and stores it through its setter.
pub struct AttributeDecoder {
    pub setter: Setter,
    pub codec: CodecRef,
}

/// Decodes a constructor argument into its slot. Members the constructor
/// does not take are decoded and dropped.
pub struct SlotDecoder {
    pub slot: Option<usize>,
    pub codec: CodecRef,
}
