//! Object format of a bean: create empty, then set members as they arrive.

use json_bind_buffers::{Reader, Writer};

use super::attribute::AttributeDecoder;
use super::write::WriteDescription;
use crate::codegen::binding::{read_members, PropertyBindingTable};
use crate::codegen::FormatConverter;
use crate::error::{DecodeError, DecodeErrorKind, Result};
use crate::settings::UnknownPolicy;
use crate::type_def::{Factory, TypeDescriptor};
use crate::value::Value;

pub struct ObjectFormatDescription {
    manifest: TypeDescriptor,
    write: WriteDescription,
    table: PropertyBindingTable<AttributeDecoder>,
    factory: Factory,
    unknown: UnknownPolicy,
}

impl ObjectFormatDescription {
    pub fn new(
        manifest: TypeDescriptor,
        write: WriteDescription,
        table: PropertyBindingTable<AttributeDecoder>,
        factory: Factory,
        unknown: UnknownPolicy,
    ) -> Self {
        Self {
            manifest,
            write,
            table,
            factory,
            unknown,
        }
    }

    fn create(&self, reader: &Reader<'_>) -> Result<Value> {
        (self.factory)(&self.manifest).map_err(|reason| {
            DecodeError::new(reader.position(), DecodeErrorKind::Construction(reason)).into()
        })
    }

    fn bind_content(&self, reader: &mut Reader<'_>, instance: &mut Value) -> Result<()> {
        read_members(reader, &self.table, self.unknown, |entry, reader| {
            let at = reader.token_start();
            let value = entry.value.codec.decode(reader)?;
            (entry.value.setter)(instance, value).map_err(|reason| {
                DecodeError::new(at, DecodeErrorKind::Construction(reason)).into()
            })
        })
    }
}

impl FormatConverter for ObjectFormatDescription {
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
        let mut instance = self.create(reader)?;
        self.bind(reader, &mut instance)?;
        Ok(instance)
    }

    fn read_content(&self, reader: &mut Reader<'_>) -> Result<Value> {
        let mut instance = self.create(reader)?;
        self.bind_content(reader, &mut instance)?;
        Ok(instance)
    }

    fn bind(&self, reader: &mut Reader<'_>, instance: &mut Value) -> Result<()> {
        if reader.last_token() != b'{' {
            return Err(DecodeError::syntax(
                reader.token_start(),
                format!("Expecting '{{' for object start of {}", self.manifest),
            )
            .into());
        }
        if instance.is_null() {
            *instance = self.create(reader)?;
        }
        reader.next_token()?;
        self.bind_content(reader, instance)
    }
}
