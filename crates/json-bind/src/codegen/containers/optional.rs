use std::sync::Arc;

use json_bind_buffers::{Reader, Writer};

use super::{element_codec, ElementEncoder};
use crate::codegen::{Codec, CodecRef};
use crate::error::Result;
use crate::json_bind::JsonBind;
use crate::type_def::{RawType, TypeDescriptor};
use crate::value::Value;

/// `optional<T>`: `null` or a `T`.
pub struct OptionalCodec {
    manifest: TypeDescriptor,
    inner: CodecRef,
    encoder: ElementEncoder,
}

impl Codec for OptionalCodec {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        if value.is_null() {
            writer.write_null();
            return Ok(());
        }
        self.encoder
            .encode_all(writer, std::iter::once(value), |_, _| Ok(()))
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        if reader.was_null()? {
            return Ok(Value::Null);
        }
        self.inner.decode(reader)
    }

    fn bind(&self, reader: &mut Reader<'_>, instance: &mut Value) -> Result<()> {
        if reader.was_null()? {
            *instance = Value::Null;
            return Ok(());
        }
        self.inner.bind(reader, instance)
    }
}

pub fn analyze(manifest: &TypeDescriptor, json: &JsonBind) -> Result<Option<CodecRef>> {
    let (RawType::Optional, [inner_type]) = (manifest.raw(), manifest.args()) else {
        return Ok(None);
    };
    let inner = element_codec(json, inner_type)?;
    let encoder = ElementEncoder::for_type(json, inner_type, &inner);
    Ok(Some(Arc::new(OptionalCodec {
        manifest: manifest.clone(),
        inner,
        encoder,
    })))
}
