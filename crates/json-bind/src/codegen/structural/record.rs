//! Immutable records: members are collected into constructor arguments
//! and the constructor runs once the closing delimiter is read.

use std::sync::Arc;

use json_bind_buffers::{Reader, Writer};
use log::debug;

use super::array_format::{ArrayFormatDescription, Assemble, PositionDecoder};
use super::attribute::SlotDecoder;
use super::write::WriteDescription;
use super::{positional_order, resolve_members, with_placeholder, ResolvedMember};
use crate::codegen::binding::{read_members, PropertyBindingTable, PropertySpec};
use crate::codegen::format::build_codec;
use crate::codegen::{CodecRef, FormatConverter, FormatRef};
use crate::error::{ConfigurationError, DecodeError, DecodeErrorKind, Result};
use crate::json_bind::JsonBind;
use crate::settings::UnknownPolicy;
use crate::type_def::{
    Constructor, FormatPolicy, GenericsMapper, Parameter, RecordShape, Shape, TypeDescriptor,
};
use crate::value::Value;

pub struct RecordObjectFormat {
    manifest: TypeDescriptor,
    write: WriteDescription,
    table: PropertyBindingTable<SlotDecoder>,
    /// Argument values used for members absent from the input.
    defaults: Vec<Value>,
    constructor: Constructor,
    unknown: UnknownPolicy,
}

impl RecordObjectFormat {
    fn construct(&self, reader: &Reader<'_>, args: Vec<Value>) -> Result<Value> {
        (self.constructor)(&self.manifest, args).map_err(|reason| {
            DecodeError::new(reader.position(), DecodeErrorKind::Construction(reason)).into()
        })
    }
}

impl FormatConverter for RecordObjectFormat {
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
        if reader.last_token() != b'{' {
            return Err(DecodeError::syntax(
                reader.token_start(),
                format!("Expecting '{{' for object start of {}", self.manifest),
            )
            .into());
        }
        reader.next_token()?;
        self.read_content(reader)
    }

    fn read_content(&self, reader: &mut Reader<'_>) -> Result<Value> {
        let mut args = self.defaults.clone();
        read_members(reader, &self.table, self.unknown, |entry, reader| {
            let value = entry.value.codec.decode(reader)?;
            if let Some(slot) = entry.value.slot {
                args[slot] = value;
            }
            Ok(())
        })?;
        self.construct(reader, args)
    }

    fn bind(&self, _reader: &mut Reader<'_>, _instance: &mut Value) -> Result<()> {
        Err(ConfigurationError::BindUnsupported {
            type_name: self.manifest.to_string(),
        }
        .into())
    }
}

/// Maps every constructor parameter to the member it initializes. Named
/// parameters match by name; unnamed ones by a type no other parameter or
/// member shares.
fn match_params(
    manifest: &TypeDescriptor,
    mapper: &GenericsMapper,
    params: &[Parameter],
    members: &[ResolvedMember<'_>],
) -> Result<Vec<usize>, ConfigurationError> {
    let ambiguous = |reason: String| ConfigurationError::AmbiguousConstructor {
        type_name: manifest.to_string(),
        reason,
    };
    let param_types: Vec<TypeDescriptor> =
        params.iter().map(|p| mapper.make_concrete(&p.type_)).collect();
    let mut matched: Vec<usize> = Vec::with_capacity(params.len());
    for (i, param) in params.iter().enumerate() {
        let member = match &param.name {
            Some(name) => members
                .iter()
                .position(|m| &m.member.name == name)
                .ok_or_else(|| ConfigurationError::InvalidDeclaration {
                    type_name: manifest.to_string(),
                    reason: format!("constructor parameter '{name}' has no matching member"),
                })?,
            None => {
                let type_ = &param_types[i];
                let same_params = param_types.iter().filter(|t| *t == type_).count();
                let candidates: Vec<usize> = members
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| &m.type_ == type_)
                    .map(|(j, _)| j)
                    .collect();
                match candidates.as_slice() {
                    [only] if same_params == 1 => *only,
                    _ => {
                        return Err(ambiguous(format!(
                            "unnamed parameter {i} of type {type_} matches {} members",
                            candidates.len()
                        )))
                    }
                }
            }
        };
        if matched.contains(&member) {
            return Err(ambiguous(format!(
                "member '{}' is initialized by more than one parameter",
                members[member].member.name
            )));
        }
        matched.push(member);
    }
    Ok(matched)
}

fn build(
    json: &JsonBind,
    manifest: &TypeDescriptor,
    mapper: &GenericsMapper,
    shape: &RecordShape,
    policy: FormatPolicy,
) -> Result<CodecRef> {
    let settings = json.settings();
    let members = resolve_members(json, mapper, &shape.members)?;
    let slots = match_params(manifest, mapper, &shape.params, &members)?;
    let slot_of = |member: usize| slots.iter().position(|&m| m == member);
    let defaults: Vec<Value> = slots.iter().map(|&m| members[m].default.clone()).collect();

    let write = WriteDescription::new(
        members.iter().map(|m| m.encoder(settings.omit_defaults)).collect(),
        settings.omit_defaults,
    );
    let order = positional_order(&members);
    let specs = order
        .iter()
        .map(|&i| {
            let m = &members[i];
            PropertySpec::new(
                &m.member.name,
                SlotDecoder {
                    slot: slot_of(i),
                    codec: m.codec.clone(),
                },
            )
            .flags(m.member.exact_name, m.member.mandatory, m.member.non_null)
        })
        .collect();
    let table = PropertyBindingTable::build(&manifest.to_string(), specs)?;
    let object: FormatRef = Arc::new(RecordObjectFormat {
        manifest: manifest.clone(),
        write,
        table,
        defaults: defaults.clone(),
        constructor: shape.constructor.clone(),
        unknown: settings.unknown_properties,
    });

    let array: Option<FormatRef> = if policy.has_array() && settings.allow_array_format {
        let positions: Vec<Option<usize>> = order.iter().map(|&m| slot_of(m)).collect();
        let constructor = shape.constructor.clone();
        let assemble: Assemble = Arc::new(move |type_: &TypeDescriptor, values: Vec<Value>| {
            let mut args = defaults.clone();
            for (slot, value) in positions.iter().zip(values) {
                if let Some(slot) = slot {
                    args[*slot] = value;
                }
            }
            constructor(type_, args)
        });
        Some(Arc::new(ArrayFormatDescription::new(
            manifest.clone(),
            order.iter().map(|&m| members[m].array_encoder()).collect(),
            order
                .iter()
                .map(|&m| PositionDecoder {
                    name: members[m].member.name.clone(),
                    codec: members[m].codec.clone(),
                    non_null: members[m].member.non_null,
                })
                .collect(),
            assemble,
            None,
        )))
    } else {
        None
    };
    debug!(
        "built record codec for {manifest} with {} members (array format: {})",
        members.len(),
        array.is_some()
    );
    build_codec(manifest, policy, Some(object), array)
}

pub fn analyze(manifest: &TypeDescriptor, json: &JsonBind) -> Result<Option<CodecRef>> {
    let Some(declaration) = json.declaration(manifest) else {
        return Ok(None);
    };
    let Shape::Record(shape) = &declaration.shape else {
        return Ok(None);
    };
    let mapper = GenericsMapper::create(manifest, &declaration.params)?;
    with_placeholder(json, manifest, || {
        build(json, manifest, &mapper, shape, declaration.formats)
    })
}
