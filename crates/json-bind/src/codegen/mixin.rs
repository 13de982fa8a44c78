//! Closed unions dispatched on a discriminator.
//!
//! The object form carries the tag as the first property,
//! `{"$type":"B","x":1}`; the array form as the first element,
//! `["B",1]`. Variants are looked up by the hash of the tag and decoded
//! through their own format's `read_content`.

use std::sync::Arc;

use json_bind_buffers::{name_hash, Reader, Writer};
use log::debug;

use super::binding::{PropertyBindingTable, PropertySpec};
use super::structural::with_placeholder;
use super::{Codec, CodecRef, FormatRef};
use crate::error::{ConfigurationError, DecodeError, DecodeErrorKind, EncodeError, Result};
use crate::json_bind::JsonBind;
use crate::type_def::{GenericsMapper, Shape, TypeDescriptor, UnionShape};
use crate::value::Value;

struct VariantSlot {
    type_: TypeDescriptor,
    codec: CodecRef,
    /// The tag as a JSON string.
    quoted_tag: Vec<u8>,
}

impl VariantSlot {
    fn format(&self, object: bool) -> Result<&FormatRef> {
        self.codec.ensure_ready()?;
        let formats = self.codec.formats();
        let format = if object {
            formats.and_then(|f| f.object_format())
        } else {
            formats.and_then(|f| f.array_format())
        };
        format.ok_or_else(|| {
            ConfigurationError::MissingFormat {
                type_name: self.type_.to_string(),
                format: if object { "object" } else { "array" },
            }
            .into()
        })
    }

    /// Object form unless the variant encodes as an array.
    fn prefers_object(&self) -> Result<bool> {
        self.codec.ensure_ready()?;
        Ok(self
            .codec
            .formats()
            .map_or(true, |f| f.object_first() || f.array_format().is_none()))
    }
}

pub struct MixinDescription {
    manifest: TypeDescriptor,
    discriminator: Vec<u8>,
    discriminator_hash: u32,
    /// `{"<discriminator>":`
    object_prefix: Vec<u8>,
    table: PropertyBindingTable<VariantSlot>,
}

impl MixinDescription {
    fn write_object(&self, writer: &mut Writer, slot: &VariantSlot, value: &Value) -> Result<()> {
        let format = slot.format(true)?;
        writer.buf(&self.object_prefix);
        writer.buf(&slot.quoted_tag);
        writer.u8(b',');
        if format.omits_defaults() {
            format.write_content_minimal(writer, value)?;
            writer.replace_last(b'}');
        } else {
            let mark = writer.mark();
            format.write_content_full(writer, value)?;
            if writer.mark() == mark {
                writer.replace_last(b'}');
            } else {
                writer.u8(b'}');
            }
        }
        Ok(())
    }

    fn write_array(&self, writer: &mut Writer, slot: &VariantSlot, value: &Value) -> Result<()> {
        let format = slot.format(false)?;
        writer.u8(b'[');
        writer.buf(&slot.quoted_tag);
        writer.u8(b',');
        let mark = writer.mark();
        format.write_content_full(writer, value)?;
        if writer.mark() == mark {
            writer.replace_last(b']');
        } else {
            writer.u8(b']');
        }
        Ok(())
    }

    /// Reads the tag at the current token and finds its variant.
    fn read_tag(&self, reader: &mut Reader<'_>) -> Result<&VariantSlot> {
        if reader.last_token() != b'"' {
            return Err(DecodeError::syntax(
                reader.token_start(),
                format!("Expecting '\"' for discriminator value of {}", self.manifest),
            )
            .into());
        }
        let at = reader.token_start();
        let hash = reader.calc_hash()?;
        match self.table.find(reader, hash, 0) {
            Some((_, entry)) => Ok(&entry.value),
            None => Err(DecodeError::new(
                at,
                DecodeErrorKind::UnknownDiscriminator(reader.last_name()),
            )
            .into()),
        }
    }

    /// Moves past the separator after the tag; `close` ends an empty body.
    fn after_tag(reader: &mut Reader<'_>, close: u8) -> Result<()> {
        match reader.next_token()? {
            b',' => {
                reader.next_token()?;
                Ok(())
            }
            t if t == close => Ok(()),
            _ => Err(DecodeError::syntax(
                reader.token_start(),
                format!("Expecting ',' or '{}' after discriminator", close as char),
            )
            .into()),
        }
    }

    fn read_object(&self, reader: &mut Reader<'_>) -> Result<Value> {
        reader.next_token()?;
        let first_is_discriminator = reader.last_token() == b'"'
            && reader.fill_name()? == self.discriminator_hash
            && reader.was_last_name(&self.discriminator);
        if !first_is_discriminator {
            return Err(DecodeError::syntax(
                reader.token_start(),
                format!(
                    "Expecting \"{}\" attribute as first element of {}",
                    String::from_utf8_lossy(&self.discriminator),
                    self.manifest
                ),
            )
            .into());
        }
        reader.next_token()?;
        let slot = self.read_tag(reader)?;
        let format = slot.format(true)?;
        Self::after_tag(reader, b'}')?;
        format.read_content(reader)
    }

    fn read_array(&self, reader: &mut Reader<'_>) -> Result<Value> {
        reader.next_token()?;
        let slot = self.read_tag(reader)?;
        let format = slot.format(false)?;
        Self::after_tag(reader, b']')?;
        format.read_content(reader)
    }
}

impl Codec for MixinDescription {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        let Some(runtime_type) = value.runtime_type() else {
            writer.write_null();
            return Ok(());
        };
        let slot = self
            .table
            .entries()
            .iter()
            .map(|entry| &entry.value)
            .find(|slot| slot.type_ == runtime_type)
            .ok_or_else(|| EncodeError::UnregisteredVariant {
                union_type: self.manifest.to_string(),
                runtime_type: runtime_type.to_string(),
            })?;
        if slot.prefers_object()? {
            self.write_object(writer, slot, value)
        } else {
            self.write_array(writer, slot, value)
        }
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        if reader.was_null()? {
            return Ok(Value::Null);
        }
        match reader.last_token() {
            b'{' => self.read_object(reader),
            b'[' => self.read_array(reader),
            t => Err(DecodeError::syntax(
                reader.token_start(),
                format!(
                    "Expecting '{{' or '[' for decoding {}. Found '{}'",
                    self.manifest, t as char
                ),
            )
            .into()),
        }
    }
}

fn build(
    json: &JsonBind,
    manifest: &TypeDescriptor,
    mapper: &GenericsMapper,
    shape: &UnionShape,
) -> Result<CodecRef> {
    let discriminator = shape
        .discriminator
        .clone()
        .unwrap_or_else(|| json.settings().discriminator.clone());
    let mut specs = Vec::with_capacity(shape.variants.len());
    for variant in &shape.variants {
        let type_ = mapper.make_concrete(&variant.type_);
        let codec = json.resolve(&type_)?;
        let tag = variant.tag();
        let mut quoted = Writer::with_alloc_size(tag.len() + 8);
        quoted.write_str(&tag);
        specs.push(PropertySpec::new(
            &tag,
            VariantSlot {
                type_,
                codec,
                quoted_tag: quoted.flush(),
            },
        ));
    }
    let table = PropertyBindingTable::build(&manifest.to_string(), specs)?;
    let mut prefix = Writer::with_alloc_size(discriminator.len() + 8);
    prefix.u8(b'{');
    prefix.write_str(&discriminator);
    prefix.u8(b':');
    debug!(
        "built union codec for {manifest} with {} variants on \"{discriminator}\"",
        table.len()
    );
    let codec: CodecRef = Arc::new(MixinDescription {
        manifest: manifest.clone(),
        discriminator_hash: name_hash(discriminator.as_bytes()),
        discriminator: discriminator.into_bytes(),
        object_prefix: prefix.flush(),
        table,
    });
    Ok(codec)
}

pub fn analyze(manifest: &TypeDescriptor, json: &JsonBind) -> Result<Option<CodecRef>> {
    let Some(declaration) = json.declaration(manifest) else {
        return Ok(None);
    };
    let Shape::Union(shape) = &declaration.shape else {
        return Ok(None);
    };
    let mapper = GenericsMapper::create(manifest, &declaration.params)?;
    with_placeholder(json, manifest, || build(json, manifest, &mapper, shape))
}
