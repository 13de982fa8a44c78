//! Types decoded through a separate mutable builder and finished into the
//! final value. Encoding reads the final value's members directly.

use std::sync::Arc;

use json_bind_buffers::{Reader, Writer};
use log::debug;

use super::write::WriteDescription;
use super::{resolve_members, with_placeholder};
use crate::codegen::format::build_codec;
use crate::codegen::{CodecRef, FormatConverter, FormatRef};
use crate::error::{ConfigurationError, DecodeError, DecodeErrorKind, Result};
use crate::json_bind::JsonBind;
use crate::type_def::{Finisher, GenericsMapper, Shape, TypeDescriptor};
use crate::value::Value;

pub struct BuilderFormat {
    manifest: TypeDescriptor,
    write: WriteDescription,
    builder: CodecRef,
    finisher: Finisher,
}

impl BuilderFormat {
    fn finish(&self, reader: &Reader<'_>, builder: Value) -> Result<Value> {
        (self.finisher)(&self.manifest, builder).map_err(|reason| {
            DecodeError::new(reader.position(), DecodeErrorKind::Construction(reason)).into()
        })
    }
}

impl FormatConverter for BuilderFormat {
    fn write(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        self.write.write(writer, value)
    }

    fn write_content_full(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        self.write.write_content_full(writer, value)
    }

    fn write_content_minimal(&self, writer: &mut Writer, value: &Value) -> Result<bool> {
        self.write.write_content_minimal(writer, value)
    }

    fn omits_defaults(&self) -> bool {
        self.write.omit_defaults()
    }

    fn read(&self, reader: &mut Reader<'_>) -> Result<Value> {
        let builder = self.builder.decode(reader)?;
        self.finish(reader, builder)
    }

    fn read_content(&self, reader: &mut Reader<'_>) -> Result<Value> {
        self.builder.ensure_ready()?;
        let object = self
            .builder
            .formats()
            .and_then(|formats| formats.object_format())
            .ok_or_else(|| ConfigurationError::MissingFormat {
                type_name: self.builder.manifest().to_string(),
                format: "object",
            })?;
        let builder = object.read_content(reader)?;
        self.finish(reader, builder)
    }

    fn bind(&self, _reader: &mut Reader<'_>, _instance: &mut Value) -> Result<()> {
        Err(ConfigurationError::BindUnsupported {
            type_name: self.manifest.to_string(),
        }
        .into())
    }
}

pub fn analyze(manifest: &TypeDescriptor, json: &JsonBind) -> Result<Option<CodecRef>> {
    let Some(declaration) = json.declaration(manifest) else {
        return Ok(None);
    };
    let Shape::Builder(shape) = &declaration.shape else {
        return Ok(None);
    };
    if declaration.formats.has_array() {
        return Err(ConfigurationError::InvalidDeclaration {
            type_name: manifest.to_string(),
            reason: "builder types only support the object format".to_string(),
        }
        .into());
    }
    let mapper = GenericsMapper::create(manifest, &declaration.params)?;
    with_placeholder(json, manifest, || {
        let builder = json.resolve(&mapper.make_concrete(&shape.builder))?;
        let settings = json.settings();
        let members = resolve_members(json, &mapper, &shape.members)?;
        let write = WriteDescription::new(
            members.iter().map(|m| m.encoder(settings.omit_defaults)).collect(),
            settings.omit_defaults,
        );
        debug!("built builder codec for {manifest} through {}", builder.manifest());
        let object: FormatRef = Arc::new(BuilderFormat {
            manifest: manifest.clone(),
            write,
            builder,
            finisher: shape.finisher.clone(),
        });
        build_codec(manifest, declaration.formats, Some(object), None)
    })
}
