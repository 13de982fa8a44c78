//! Maps. Keys are always JSON strings: string keys are written as they
//! are, other keys are encoded with their own codec and the result quoted
//! when it is not already a string.

use std::sync::Arc;

use json_bind_buffers::{Reader, Writer};
use log::debug;

use super::{element_codec, ElementEncoder};
use crate::codegen::primitives::mismatch;
use crate::codegen::{Codec, CodecRef};
use crate::error::{DecodeError, DecodeErrorKind, EncodeError, Error, Result};
use crate::json_bind::JsonBind;
use crate::type_def::{GenericsMapper, RawType, Shape, TypeDescriptor};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyMode {
    /// The key is the string itself.
    Text,
    /// The key codec reads and writes a JSON string.
    Quoted,
    /// The key codec's output is carried inside a JSON string.
    Embedded,
}

pub struct MapCodec {
    manifest: TypeDescriptor,
    key: CodecRef,
    key_encoder: ElementEncoder,
    key_mode: KeyMode,
    value: CodecRef,
    value_encoder: ElementEncoder,
}

impl MapCodec {
    fn write_key(&self, writer: &mut Writer, key: &Value) -> Result<()> {
        match key {
            Value::Str(s) if self.key_mode == KeyMode::Text => {
                writer.write_str(s);
                return Ok(());
            }
            Value::Null => {
                return Err(EncodeError::TypeMismatch {
                    expected: format!("non-null key of {}", self.manifest),
                    found: "null".to_string(),
                }
                .into())
            }
            _ => {}
        }
        let mut scratch = Writer::with_alloc_size(32);
        self.key_encoder
            .encode_all(&mut scratch, std::iter::once(key), |_, _| Ok(()))?;
        let bytes = scratch.flush();
        match self.key_mode {
            KeyMode::Quoted if bytes.first() == Some(&b'"') => writer.buf(&bytes),
            KeyMode::Quoted => {
                return Err(EncodeError::TypeMismatch {
                    expected: format!("string key of {}", self.manifest),
                    found: String::from_utf8_lossy(&bytes).into_owned(),
                }
                .into())
            }
            _ => writer.write_str(&String::from_utf8_lossy(&bytes)),
        }
        Ok(())
    }

    fn read_key(&self, reader: &mut Reader<'_>) -> Result<Value> {
        match self.key_mode {
            KeyMode::Text => Ok(Value::Str(reader.read_string()?)),
            KeyMode::Quoted => self.key.decode(reader),
            KeyMode::Embedded => {
                let at = reader.token_start();
                let text = reader.read_string()?;
                let mut inner = Reader::new(text.as_bytes());
                let shift = |err: DecodeError| DecodeError { offset: at, ..err };
                inner.next_token().map_err(|e| shift(e.into()))?;
                let key = self.key.decode(&mut inner).map_err(|e| match e {
                    Error::Decode(d) => Error::Decode(shift(d)),
                    other => other,
                })?;
                if !inner.is_end() {
                    return Err(DecodeError::syntax(at, format!("Invalid map key '{text}'")).into());
                }
                Ok(key)
            }
        }
    }
}

impl Codec for MapCodec {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        let entries = match value {
            Value::Null => {
                writer.write_null();
                return Ok(());
            }
            Value::Map(entries) => entries,
            other => return Err(mismatch(&self.manifest, other)),
        };
        if entries.is_empty() {
            writer.buf(b"{}");
            return Ok(());
        }
        writer.u8(b'{');
        let mut keys = entries.iter().map(|(k, _)| k);
        self.value_encoder.encode_all(
            writer,
            entries.iter().map(|(_, v)| v),
            |w, i| {
                if i > 0 {
                    w.u8(b',');
                }
                if let Some(key) = keys.next() {
                    self.write_key(w, key)?;
                }
                w.u8(b':');
                Ok(())
            },
        )?;
        writer.u8(b'}');
        Ok(())
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        if reader.was_null()? {
            return Ok(Value::Null);
        }
        if reader.last_token() != b'{' {
            return Err(
                DecodeError::syntax(reader.token_start(), "Expecting '{' for map start").into(),
            );
        }
        let mut entries = Vec::new();
        if reader.next_token()? == b'}' {
            return Ok(Value::Map(entries));
        }
        loop {
            if reader.last_token() != b'"' {
                return Err(DecodeError::syntax(
                    reader.token_start(),
                    "Expecting '\"' for map key start",
                )
                .into());
            }
            let at = reader.token_start();
            let key = self.read_key(reader)?;
            if key.is_null() {
                return Err(DecodeError::new(at, DecodeErrorKind::NullKey).into());
            }
            if reader.next_token()? != b':' {
                return Err(DecodeError::syntax(
                    reader.token_start(),
                    "Expecting ':' after map key",
                )
                .into());
            }
            reader.next_token()?;
            let value = self.value.decode(reader)?;
            entries.push((key, value));
            match reader.next_token()? {
                b',' => {
                    reader.next_token()?;
                }
                b'}' => return Ok(Value::Map(entries)),
                _ => {
                    return Err(DecodeError::syntax(
                        reader.token_start(),
                        "Expecting '}' for map end",
                    )
                    .into())
                }
            }
        }
    }
}

fn key_mode(json: &JsonBind, key: &TypeDescriptor) -> KeyMode {
    if let (RawType::Optional, [inner]) = (key.raw(), key.args()) {
        return key_mode(json, inner);
    }
    if GenericsMapper::is_unknown(key) || matches!(key.raw(), RawType::String) {
        return KeyMode::Text;
    }
    if matches!(key.raw(), RawType::Bytes) {
        return KeyMode::Quoted;
    }
    match json.declaration(key) {
        Some(declaration) if matches!(declaration.shape, Shape::Enum(_)) => KeyMode::Quoted,
        _ => KeyMode::Embedded,
    }
}

pub fn analyze(manifest: &TypeDescriptor, json: &JsonBind) -> Result<Option<CodecRef>> {
    let (RawType::Map, [key_type, value_type]) = (manifest.raw(), manifest.args()) else {
        return Ok(None);
    };
    let key = element_codec(json, key_type)?;
    let value = element_codec(json, value_type)?;
    debug!("built map codec for {manifest}");
    Ok(Some(Arc::new(MapCodec {
        manifest: manifest.clone(),
        key_encoder: ElementEncoder::for_type(json, key_type, &key),
        key_mode: key_mode(json, key_type),
        key,
        value_encoder: ElementEncoder::for_type(json, value_type, &value),
        value,
    })))
}
