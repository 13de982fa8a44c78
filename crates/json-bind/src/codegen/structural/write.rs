use json_bind_buffers::Writer;

use super::attribute::AttributeEncoder;
use crate::error::Result;
use crate::value::Value;

/// Object-shaped writer shared by records, beans and builders.
pub struct WriteDescription {
    encoders: Vec<AttributeEncoder>,
    omit_defaults: bool,
}

impl WriteDescription {
    pub fn new(encoders: Vec<AttributeEncoder>, omit_defaults: bool) -> Self {
        Self {
            encoders,
            omit_defaults,
        }
    }

    pub fn omit_defaults(&self) -> bool {
        self.omit_defaults
    }

    pub fn write(&self, writer: &mut Writer, instance: &Value) -> Result<()> {
        writer.u8(b'{');
        if self.omit_defaults {
            if self.write_content_minimal(writer, instance)? {
                writer.replace_last(b'}');
            } else {
                writer.u8(b'}');
            }
        } else {
            self.write_content_full(writer, instance)?;
            writer.u8(b'}');
        }
        Ok(())
    }

    pub fn write_content_full(&self, writer: &mut Writer, instance: &Value) -> Result<()> {
        for (i, encoder) in self.encoders.iter().enumerate() {
            if i > 0 {
                writer.u8(b',');
            }
            encoder.write(writer, instance)?;
        }
        Ok(())
    }

    /// Each member that produced output is followed by a comma; the caller
    /// turns the last one into the closing delimiter.
    pub fn write_content_minimal(&self, writer: &mut Writer, instance: &Value) -> Result<bool> {
        let mut wrote = false;
        for encoder in &self.encoders {
            let mark = writer.mark();
            encoder.write_minimal(writer, instance)?;
            if writer.mark() != mark {
                writer.u8(b',');
                wrote = true;
            }
        }
        Ok(wrote)
    }
}
