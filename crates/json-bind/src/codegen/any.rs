//! The `any` type: positions without a static type.
//!
//! Encoding looks up a codec from the runtime value; decoding produces the
//! generic value tree (objects become maps with string keys).

use std::sync::{Arc, Weak};

use json_bind_buffers::{Reader, Writer};

use super::{Codec, CodecRef};
use crate::error::{ConfigurationError, DecodeError, EncodeError, Error, Result};
use crate::json_bind::JsonBind;
use crate::type_def::TypeDescriptor;
use crate::value::Value;

/// Resolves encoders by runtime type, remembering the last one so runs of
/// same-typed elements pay for one lookup.
pub(crate) struct RuntimeDispatch<'a> {
    json: &'a JsonBind,
    last: Option<(TypeDescriptor, CodecRef)>,
}

impl<'a> RuntimeDispatch<'a> {
    pub fn new(json: &'a JsonBind) -> Self {
        Self { json, last: None }
    }

    pub fn encode(&mut self, writer: &mut Writer, value: &Value) -> Result<()> {
        let Some(runtime_type) = value.runtime_type() else {
            writer.write_null();
            return Ok(());
        };
        let codec = match &self.last {
            Some((cached, codec)) if *cached == runtime_type => codec.clone(),
            _ => {
                let codec = self.json.resolve(&runtime_type).map_err(|err| match err {
                    Error::Configuration(ConfigurationError::NoCodecFound { .. }) => {
                        Error::Encode(EncodeError::NoEncoder {
                            runtime_type: runtime_type.to_string(),
                        })
                    }
                    other => other,
                })?;
                self.last = Some((runtime_type, codec.clone()));
                codec
            }
        };
        codec.encode(writer, value)
    }
}

/// Upgrades the engine handle held by dynamically dispatching codecs.
pub(crate) fn upgrade(handle: &Weak<JsonBind>) -> Result<Arc<JsonBind>> {
    handle.upgrade().ok_or_else(|| {
        ConfigurationError::NoCodecFound {
            type_name: "any (engine dropped)".to_string(),
        }
        .into()
    })
}

pub struct AnyCodec {
    manifest: TypeDescriptor,
    json: Weak<JsonBind>,
}

impl AnyCodec {
    pub fn new(json: Weak<JsonBind>) -> Self {
        Self {
            manifest: TypeDescriptor::any(),
            json,
        }
    }
}

impl Codec for AnyCodec {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        let json = upgrade(&self.json)?;
        RuntimeDispatch::new(&json).encode(writer, value)
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        read_any(reader)
    }
}

/// Decodes any JSON value into the generic tree.
pub(crate) fn read_any(reader: &mut Reader<'_>) -> Result<Value> {
    match reader.last_token() {
        b'n' => {
            reader.was_null()?;
            Ok(Value::Null)
        }
        b't' | b'f' => Ok(Value::Bool(reader.read_bool()?)),
        b'"' => Ok(Value::Str(reader.read_string()?)),
        b'-' | b'0'..=b'9' => {
            let at = reader.token_start();
            let text = reader.read_number()?;
            let integral = !text.contains(|c: char| matches!(c, '.' | 'e' | 'E'));
            if integral {
                if let Ok(i) = text.parse::<i64>() {
                    return Ok(Value::Int(i));
                }
            }
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| DecodeError::syntax(at, format!("Invalid number '{text}'")).into())
        }
        b'[' => {
            let mut items = Vec::new();
            if reader.next_token()? != b']' {
                loop {
                    items.push(read_any(reader)?);
                    match reader.next_token()? {
                        b',' => {
                            reader.next_token()?;
                        }
                        b']' => break,
                        _ => {
                            return Err(DecodeError::syntax(
                                reader.token_start(),
                                "Expecting ']' or ',' while parsing array",
                            )
                            .into())
                        }
                    }
                }
            }
            Ok(Value::List(items))
        }
        b'{' => {
            let mut entries = Vec::new();
            if reader.next_token()? != b'}' {
                loop {
                    let key = reader.read_string()?;
                    if reader.next_token()? != b':' {
                        return Err(DecodeError::syntax(
                            reader.token_start(),
                            "Expecting ':' after attribute name",
                        )
                        .into());
                    }
                    reader.next_token()?;
                    let value = read_any(reader)?;
                    entries.push((Value::Str(key), value));
                    match reader.next_token()? {
                        b',' => {
                            reader.next_token()?;
                        }
                        b'}' => break,
                        _ => {
                            return Err(DecodeError::syntax(
                                reader.token_start(),
                                "Expecting '}' or ',' while parsing object",
                            )
                            .into())
                        }
                    }
                }
            }
            Ok(Value::Map(entries))
        }
        other => Err(DecodeError::syntax(
            reader.token_start(),
            format!("Unexpected character '{}'", other as char),
        )
        .into()),
    }
}
