use std::sync::Arc;

use json_bind_buffers::{Reader, Writer};
use log::debug;

use crate::codegen::binding::{PropertyBindingTable, PropertySpec};
use crate::codegen::primitives::mismatch;
use crate::codegen::{Codec, CodecRef};
use crate::error::{DecodeError, DecodeErrorKind, EncodeError, Result};
use crate::json_bind::JsonBind;
use crate::type_def::{Shape, TypeDescriptor};
use crate::value::{EnumValue, Value};

/// Enum constants travel as their names. Decoding dispatches on the name
/// hash through the same table structural types use.
pub struct EnumCodec {
    manifest: TypeDescriptor,
    constants: PropertyBindingTable<Arc<str>>,
}

impl Codec for EnumCodec {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        match value {
            Value::Null => writer.write_null(),
            Value::Enum(e) => {
                if !self.constants.entries().iter().any(|c| c.value == e.constant) {
                    return Err(EncodeError::TypeMismatch {
                        expected: self.manifest.to_string(),
                        found: format!("constant {}", e.constant),
                    }
                    .into());
                }
                writer.write_str(&e.constant);
            }
            other => return Err(mismatch(&self.manifest, other)),
        }
        Ok(())
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        if reader.was_null()? {
            return Ok(Value::Null);
        }
        let at = reader.token_start();
        let hash = reader.calc_hash()?;
        match self.constants.find(reader, hash, 0) {
            Some((_, entry)) => Ok(Value::Enum(EnumValue {
                type_: self.manifest.clone(),
                constant: entry.value.clone(),
            })),
            None => Err(DecodeError::new(
                at,
                DecodeErrorKind::UnknownEnumConstant(reader.last_name()),
            )
            .into()),
        }
    }
}

pub fn analyze(manifest: &TypeDescriptor, json: &JsonBind) -> Result<Option<CodecRef>> {
    let Some(declaration) = json.declaration(manifest) else {
        return Ok(None);
    };
    let Shape::Enum(shape) = &declaration.shape else {
        return Ok(None);
    };
    let specs = shape
        .constants
        .iter()
        .map(|c| PropertySpec::new(c, Arc::from(c.as_str())))
        .collect();
    let constants = PropertyBindingTable::build(&declaration.name, specs)?;
    debug!("built enum codec for {manifest}");
    Ok(Some(Arc::new(EnumCodec {
        manifest: manifest.clone(),
        constants,
    })))
}
