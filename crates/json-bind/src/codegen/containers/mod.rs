//! Container codecs: sequences, maps, optionals and enums.
//!
//! Each analyzer resolves its element codecs through the engine and
//! returns `None` for descriptors it does not handle.

pub mod collection;
pub mod enums;
pub mod map;
pub mod optional;

use std::sync::Weak;

use json_bind_buffers::{Reader, Writer};

use super::any::{upgrade, RuntimeDispatch};
use super::CodecRef;
use crate::error::{DecodeError, Result};
use crate::json_bind::JsonBind;
use crate::type_def::{GenericsMapper, TypeDescriptor};
use crate::value::Value;

/// How a container writes one of its element positions.
#[derive(Clone)]
pub(crate) enum ElementEncoder {
    Static(CodecRef),
    /// The static element type is unknown; each value picks its codec.
    Dynamic(Weak<JsonBind>),
}

impl ElementEncoder {
    /// Dynamic for unknown element types, otherwise the resolved codec.
    pub fn for_type(json: &JsonBind, element: &TypeDescriptor, codec: &CodecRef) -> Self {
        if GenericsMapper::is_unknown(element) {
            ElementEncoder::Dynamic(json.handle())
        } else {
            ElementEncoder::Static(codec.clone())
        }
    }

    /// Encodes `values` in order, calling `separator` between elements.
    pub fn encode_all<'v>(
        &self,
        writer: &mut Writer,
        values: impl Iterator<Item = &'v Value>,
        mut separator: impl FnMut(&mut Writer, usize) -> Result<()>,
    ) -> Result<()> {
        match self {
            ElementEncoder::Static(codec) => {
                for (i, value) in values.enumerate() {
                    separator(writer, i)?;
                    codec.encode(writer, value)?;
                }
            }
            ElementEncoder::Dynamic(handle) => {
                let json = upgrade(handle)?;
                let mut dispatch = RuntimeDispatch::new(&json);
                for (i, value) in values.enumerate() {
                    separator(writer, i)?;
                    dispatch.encode(writer, value)?;
                }
            }
        }
        Ok(())
    }
}

/// Codec for an element type, with `any` for unknown ones.
pub(crate) fn element_codec(json: &JsonBind, element: &TypeDescriptor) -> Result<CodecRef> {
    if GenericsMapper::is_unknown(element) {
        json.resolve(&TypeDescriptor::any())
    } else {
        json.resolve(element)
    }
}

/// Writes `[a,b,...]`, or the two-byte `[]` for no elements.
pub(crate) fn write_sequence(
    writer: &mut Writer,
    encoder: &ElementEncoder,
    items: &[Value],
) -> Result<()> {
    if items.is_empty() {
        writer.buf(b"[]");
        return Ok(());
    }
    writer.u8(b'[');
    encoder.encode_all(writer, items.iter(), |w, i| {
        if i > 0 {
            w.u8(b',');
        }
        Ok(())
    })?;
    writer.u8(b']');
    Ok(())
}

/// Reads `[e,...]` with `each` decoding one element. The last token is
/// the opening bracket.
pub(crate) fn read_sequence(
    reader: &mut Reader<'_>,
    mut each: impl FnMut(&mut Reader<'_>) -> Result<Value>,
) -> Result<Vec<Value>> {
    if reader.last_token() != b'[' {
        return Err(DecodeError::syntax(
            reader.token_start(),
            "Expecting '[' for collection start",
        )
        .into());
    }
    let mut items = Vec::new();
    if reader.next_token()? == b']' {
        return Ok(items);
    }
    loop {
        items.push(each(reader)?);
        match reader.next_token()? {
            b',' => {
                reader.next_token()?;
            }
            b']' => return Ok(items),
            _ => {
                return Err(DecodeError::syntax(
                    reader.token_start(),
                    "Expecting ']' for collection end",
                )
                .into())
            }
        }
    }
}
