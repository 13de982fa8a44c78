//! Positional array format: `[v0,v1,...]` in member index order.

use std::sync::Arc;

use json_bind_buffers::{Reader, Writer};

use super::attribute::ArrayAttributeEncoder;
use crate::codegen::{CodecRef, FormatConverter};
use crate::error::{ConfigurationError, DecodeError, DecodeErrorKind, Result};
use crate::type_def::{Setter, TypeDescriptor};
use crate::value::Value;

/// Builds the instance from the decoded positions.
pub type Assemble = Arc<dyn Fn(&TypeDescriptor, Vec<Value>) -> Result<Value, String> + Send + Sync>;

pub struct PositionDecoder {
    pub name: String,
    pub codec: CodecRef,
    pub non_null: bool,
}

pub struct ArrayFormatDescription {
    manifest: TypeDescriptor,
    encoders: Vec<ArrayAttributeEncoder>,
    decoders: Vec<PositionDecoder>,
    assemble: Assemble,
    /// One setter per position when the type can be bound in place.
    binders: Option<Vec<Setter>>,
}

impl ArrayFormatDescription {
    pub fn new(
        manifest: TypeDescriptor,
        encoders: Vec<ArrayAttributeEncoder>,
        decoders: Vec<PositionDecoder>,
        assemble: Assemble,
        binders: Option<Vec<Setter>>,
    ) -> Self {
        Self {
            manifest,
            encoders,
            decoders,
            assemble,
            binders,
        }
    }

    fn expect_start(&self, reader: &mut Reader<'_>) -> Result<()> {
        if reader.last_token() != b'[' {
            return Err(DecodeError::syntax(
                reader.token_start(),
                format!("Expecting '[' for array start of {}", self.manifest),
            )
            .into());
        }
        reader.next_token()?;
        Ok(())
    }

    /// Reads exactly one value per position. Entered with the first
    /// element (or `]`) as the last token; leaves `]` consumed.
    fn read_elements(&self, reader: &mut Reader<'_>) -> Result<Vec<Value>> {
        let start = reader.token_start();
        let expected = self.decoders.len();
        let mut values = Vec::with_capacity(expected);
        let mut found = 0;
        if reader.last_token() != b']' {
            loop {
                match self.decoders.get(found) {
                    Some(decoder) => {
                        let at = reader.token_start();
                        let value = decoder
                            .codec
                            .decode(reader)
                            .map_err(|e| e.in_field(&decoder.name))?;
                        if decoder.non_null && value.is_null() {
                            return Err(DecodeError::new(at, DecodeErrorKind::NullForNonNull)
                                .with_field(&decoder.name)
                                .into());
                        }
                        values.push(value);
                    }
                    None => reader.skip()?,
                }
                found += 1;
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
        if found != expected {
            return Err(
                DecodeError::new(start, DecodeErrorKind::WrongArity { expected, found }).into(),
            );
        }
        Ok(values)
    }

    fn assemble(&self, reader: &Reader<'_>, values: Vec<Value>) -> Result<Value> {
        (self.assemble)(&self.manifest, values).map_err(|reason| {
            DecodeError::new(reader.position(), DecodeErrorKind::Construction(reason)).into()
        })
    }
}

impl FormatConverter for ArrayFormatDescription {
    fn write(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        writer.u8(b'[');
        self.write_content_full(writer, value)?;
        writer.u8(b']');
        Ok(())
    }

    fn write_content_full(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        for (i, encoder) in self.encoders.iter().enumerate() {
            if i > 0 {
                writer.u8(b',');
            }
            encoder.write(writer, value)?;
        }
        Ok(())
    }

    fn read(&self, reader: &mut Reader<'_>) -> Result<Value> {
        self.expect_start(reader)?;
        self.read_content(reader)
    }

    fn read_content(&self, reader: &mut Reader<'_>) -> Result<Value> {
        let values = self.read_elements(reader)?;
        self.assemble(reader, values)
    }

    fn bind(&self, reader: &mut Reader<'_>, instance: &mut Value) -> Result<()> {
        let Some(binders) = &self.binders else {
            return Err(ConfigurationError::BindUnsupported {
                type_name: self.manifest.to_string(),
            }
            .into());
        };
        self.expect_start(reader)?;
        let at = reader.token_start();
        let values = self.read_elements(reader)?;
        if instance.is_null() {
            *instance = self.assemble(reader, values)?;
            return Ok(());
        }
        for (setter, value) in binders.iter().zip(values) {
            setter(instance, value).map_err(|reason| {
                DecodeError::new(at, DecodeErrorKind::Construction(reason))
            })?;
        }
        Ok(())
    }
}
