//! Scalar codecs. All of them accept `null` and decode it to `Value::Null`,
//! which makes `null` the default of every scalar type.

use base64::Engine;
use json_bind_buffers::{Reader, Writer};

use super::Codec;
use crate::error::{DecodeError, EncodeError, Error, Result};
use crate::type_def::TypeDescriptor;
use crate::value::Value;

pub(crate) fn mismatch(expected: &TypeDescriptor, found: &Value) -> Error {
    EncodeError::TypeMismatch {
        expected: expected.to_string(),
        found: found.kind().to_string(),
    }
    .into()
}

pub struct BoolCodec {
    manifest: TypeDescriptor,
}

impl BoolCodec {
    pub fn new() -> Self {
        Self {
            manifest: TypeDescriptor::bool(),
        }
    }
}

impl Codec for BoolCodec {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        match value {
            Value::Bool(b) => writer.write_bool(*b),
            Value::Null => writer.write_null(),
            other => return Err(mismatch(&self.manifest, other)),
        }
        Ok(())
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        if reader.was_null()? {
            return Ok(Value::Null);
        }
        Ok(Value::Bool(reader.read_bool()?))
    }
}

pub struct IntCodec {
    manifest: TypeDescriptor,
}

impl IntCodec {
    pub fn new() -> Self {
        Self {
            manifest: TypeDescriptor::int(),
        }
    }
}

impl Codec for IntCodec {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        match value {
            Value::Int(i) => writer.write_i64(*i),
            Value::Null => writer.write_null(),
            other => return Err(mismatch(&self.manifest, other)),
        }
        Ok(())
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        if reader.was_null()? {
            return Ok(Value::Null);
        }
        Ok(Value::Int(reader.read_i64()?))
    }
}

pub struct FloatCodec {
    manifest: TypeDescriptor,
}

impl FloatCodec {
    pub fn new() -> Self {
        Self {
            manifest: TypeDescriptor::float(),
        }
    }
}

impl Codec for FloatCodec {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        match value {
            Value::Float(f) => writer.write_f64(*f),
            Value::Int(i) => writer.write_i64(*i),
            Value::Null => writer.write_null(),
            other => return Err(mismatch(&self.manifest, other)),
        }
        Ok(())
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        if reader.was_null()? {
            return Ok(Value::Null);
        }
        Ok(Value::Float(reader.read_f64()?))
    }
}

pub struct StringCodec {
    manifest: TypeDescriptor,
}

impl StringCodec {
    pub fn new() -> Self {
        Self {
            manifest: TypeDescriptor::string(),
        }
    }
}

impl Codec for StringCodec {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        match value {
            Value::Str(s) => writer.write_str(s),
            Value::Null => writer.write_null(),
            other => return Err(mismatch(&self.manifest, other)),
        }
        Ok(())
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        if reader.was_null()? {
            return Ok(Value::Null);
        }
        Ok(Value::Str(reader.read_string()?))
    }
}

/// Byte strings travel as standard base64 with padding.
pub struct BytesCodec {
    manifest: TypeDescriptor,
}

impl BytesCodec {
    pub fn new() -> Self {
        Self {
            manifest: TypeDescriptor::bytes(),
        }
    }
}

impl Codec for BytesCodec {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        match value {
            Value::Bytes(b) => {
                writer.write_str(&base64::engine::general_purpose::STANDARD.encode(b))
            }
            Value::Null => writer.write_null(),
            other => return Err(mismatch(&self.manifest, other)),
        }
        Ok(())
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        if reader.was_null()? {
            return Ok(Value::Null);
        }
        let at = reader.token_start();
        let text = reader.read_string()?;
        base64::engine::general_purpose::STANDARD
            .decode(text.as_bytes())
            .map(Value::Bytes)
            .map_err(|e| DecodeError::syntax(at, format!("Invalid base64: {e}")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(codec: &dyn Codec, value: &Value) -> String {
        let mut w = Writer::with_alloc_size(32);
        codec.encode(&mut w, value).unwrap();
        String::from_utf8(w.flush()).unwrap()
    }

    fn decode(codec: &dyn Codec, input: &str) -> Result<Value> {
        let mut r = Reader::new(input.as_bytes());
        r.next_token()?;
        codec.decode(&mut r)
    }

    #[test]
    fn scalars() {
        assert_eq!(encode(&BoolCodec::new(), &Value::Bool(true)), "true");
        assert_eq!(encode(&IntCodec::new(), &Value::Int(-3)), "-3");
        assert_eq!(encode(&FloatCodec::new(), &Value::Float(1.25)), "1.25");
        assert_eq!(encode(&StringCodec::new(), &Value::from("q\"")), "\"q\\\"\"");
        assert_eq!(decode(&IntCodec::new(), "42").unwrap(), Value::Int(42));
        assert_eq!(decode(&FloatCodec::new(), "1e2").unwrap(), Value::Float(100.0));
        assert_eq!(decode(&StringCodec::new(), "\"é\"").unwrap(), Value::from("é"));
    }

    #[test]
    fn null_is_the_default() {
        for codec in [
            &BoolCodec::new() as &dyn Codec,
            &IntCodec::new(),
            &StringCodec::new(),
        ] {
            assert_eq!(decode(codec, "null").unwrap(), Value::Null);
            assert_eq!(encode(codec, &Value::Null), "null");
        }
    }

    #[test]
    fn bytes_use_base64() {
        let codec = BytesCodec::new();
        assert_eq!(encode(&codec, &Value::Bytes(b"hi!".to_vec())), "\"aGkh\"");
        assert_eq!(
            decode(&codec, "\"aGkh\"").unwrap(),
            Value::Bytes(b"hi!".to_vec())
        );
        assert!(decode(&codec, "\"*\"").is_err());
    }

    #[test]
    fn wrong_value_kind() {
        let mut w = Writer::with_alloc_size(8);
        let err = IntCodec::new().encode(&mut w, &Value::from("1")).unwrap_err();
        assert_eq!(
            err,
            Error::Encode(EncodeError::TypeMismatch {
                expected: "int".into(),
                found: "string".into()
            })
        );
    }
}
