//! Mutable beans: created by a factory, filled through member setters.

use std::sync::Arc;

use log::debug;

use super::array_format::{ArrayFormatDescription, Assemble, PositionDecoder};
use super::attribute::AttributeDecoder;
use super::object_format::ObjectFormatDescription;
use super::write::WriteDescription;
use super::{positional_order, resolve_members, with_placeholder};
use crate::codegen::binding::{PropertyBindingTable, PropertySpec};
use crate::codegen::format::build_codec;
use crate::codegen::{CodecRef, FormatRef};
use crate::error::{ConfigurationError, Result};
use crate::json_bind::JsonBind;
use crate::type_def::{BeanShape, FormatPolicy, GenericsMapper, Setter, Shape, TypeDescriptor};
use crate::value::Value;

fn build(
    json: &JsonBind,
    manifest: &TypeDescriptor,
    mapper: &GenericsMapper,
    shape: &BeanShape,
    policy: FormatPolicy,
) -> Result<CodecRef> {
    let settings = json.settings();
    let members = resolve_members(json, mapper, &shape.members)?;

    let write = WriteDescription::new(
        members.iter().map(|m| m.encoder(settings.omit_defaults)).collect(),
        settings.omit_defaults,
    );
    // Read-only members are written but never bound.
    let order = positional_order(&members);
    let specs = order
        .iter()
        .map(|&i| &members[i])
        .filter_map(|m| {
            let setter = m.member.setter.clone()?;
            Some(
                PropertySpec::new(
                    &m.member.name,
                    AttributeDecoder {
                        setter,
                        codec: m.codec.clone(),
                    },
                )
                .flags(m.member.exact_name, m.member.mandatory, m.member.non_null),
            )
        })
        .collect();
    let table = PropertyBindingTable::build(&manifest.to_string(), specs)?;
    let object: FormatRef = Arc::new(ObjectFormatDescription::new(
        manifest.clone(),
        write,
        table,
        shape.factory.clone(),
        settings.unknown_properties,
    ));

    let array: Option<FormatRef> = if policy.has_array() && settings.allow_array_format {
        let setters = order
            .iter()
            .map(|&m| {
                members[m].member.setter.clone().ok_or_else(|| {
                    ConfigurationError::InvalidDeclaration {
                        type_name: manifest.to_string(),
                        reason: format!(
                            "read-only member '{}' cannot take part in the array format",
                            members[m].member.name
                        ),
                    }
                })
            })
            .collect::<Result<Vec<Setter>, _>>()?;
        let factory = shape.factory.clone();
        let assigners = setters.clone();
        let assemble: Assemble = Arc::new(move |type_: &TypeDescriptor, values: Vec<Value>| {
            let mut instance = factory(type_)?;
            for (setter, value) in assigners.iter().zip(values) {
                setter(&mut instance, value)?;
            }
            Ok(instance)
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
            Some(setters),
        )))
    } else {
        None
    };
    debug!(
        "built bean codec for {manifest} with {} members (array format: {})",
        members.len(),
        array.is_some()
    );
    build_codec(manifest, policy, Some(object), array)
}

pub fn analyze(manifest: &TypeDescriptor, json: &JsonBind) -> Result<Option<CodecRef>> {
    let Some(declaration) = json.declaration(manifest) else {
        return Ok(None);
    };
    let Shape::Bean(shape) = &declaration.shape else {
        return Ok(None);
    };
    let mapper = GenericsMapper::create(manifest, &declaration.params)?;
    with_placeholder(json, manifest, || {
        build(json, manifest, &mapper, shape, declaration.formats)
    })
}
