//! Lists, sets and arrays.

use std::sync::Arc;

use json_bind_buffers::{Reader, Writer};
use log::debug;

use super::{element_codec, read_sequence, write_sequence, ElementEncoder};
use crate::codegen::primitives::mismatch;
use crate::codegen::{Codec, CodecRef};
use crate::error::{DecodeError, DecodeErrorKind, EncodeError, Result};
use crate::json_bind::JsonBind;
use crate::type_def::{RawType, TypeDescriptor};
use crate::value::Value;

pub struct CollectionCodec {
    manifest: TypeDescriptor,
    element: CodecRef,
    encoder: ElementEncoder,
    /// Sets drop repeated elements on decode, keeping the first.
    distinct: bool,
    /// Exact element count of fixed-size arrays.
    arity: Option<usize>,
}

impl Codec for CollectionCodec {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        let items = match value {
            Value::Null => {
                writer.write_null();
                return Ok(());
            }
            Value::List(items) => items,
            other => return Err(mismatch(&self.manifest, other)),
        };
        if let Some(arity) = self.arity {
            if items.len() != arity {
                return Err(EncodeError::TypeMismatch {
                    expected: self.manifest.to_string(),
                    found: format!("{} elements", items.len()),
                }
                .into());
            }
        }
        write_sequence(writer, &self.encoder, items)
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        if reader.was_null()? {
            return Ok(Value::Null);
        }
        let element = &self.element;
        let mut items = read_sequence(reader, |r| element.decode(r))?;
        if self.distinct {
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !unique.contains(&item) {
                    unique.push(item);
                }
            }
            items = unique;
        }
        if let Some(arity) = self.arity {
            if items.len() != arity {
                return Err(DecodeError::new(
                    reader.position(),
                    DecodeErrorKind::WrongArity {
                        expected: arity,
                        found: items.len(),
                    },
                )
                .into());
            }
        }
        Ok(Value::List(items))
    }
}

pub fn analyze(manifest: &TypeDescriptor, json: &JsonBind) -> Result<Option<CodecRef>> {
    let (distinct, arity) = match manifest.raw() {
        RawType::List => (false, None),
        RawType::Set => (true, None),
        RawType::Array(arity) => (false, *arity),
        _ => return Ok(None),
    };
    let [element_type] = manifest.args() else {
        return Ok(None);
    };
    let element = element_codec(json, element_type)?;
    let encoder = ElementEncoder::for_type(json, element_type, &element);
    debug!("built collection codec for {manifest}");
    Ok(Some(Arc::new(CollectionCodec {
        manifest: manifest.clone(),
        element,
        encoder,
        distinct,
        arity,
    })))
}
