//! Records, beans and builders.
//!
//! All three analyzers follow the same protocol: publish a placeholder for
//! the type, resolve member codecs (which may recurse back into the type),
//! assemble the formats, then replace the placeholder with the real codec.

pub mod array_format;
pub mod attribute;
pub mod bean;
pub mod builder;
pub mod object_format;
pub mod record;
pub mod write;

use log::warn;

use super::containers::element_codec;
use super::lazy::PlaceholderCodec;
use super::{default_value, CodecRef};
use crate::error::Result;
use crate::json_bind::JsonBind;
use crate::type_def::{GenericsMapper, Member, TypeDescriptor};
use crate::value::Value;

use self::attribute::{ArrayAttributeEncoder, AttributeEncoder};

/// Runs `build` with a placeholder published for `manifest`. On success
/// the real codec replaces it; on failure the previous registration is
/// restored and the placeholder abandoned so waiters fail fast.
pub(crate) fn with_placeholder(
    json: &JsonBind,
    manifest: &TypeDescriptor,
    build: impl FnOnce() -> Result<CodecRef>,
) -> Result<Option<CodecRef>> {
    let placeholder = PlaceholderCodec::new(
        manifest.clone(),
        json.settings().placeholder_timeout(),
        json.handle(),
    );
    let previous = json.register(manifest.clone(), Some(placeholder.clone()));
    match build() {
        Ok(codec) => {
            json.register(manifest.clone(), Some(codec.clone()));
            placeholder.resolve(codec.clone());
            Ok(Some(codec))
        }
        Err(err) => {
            warn!("analysis of {manifest} failed: {err}");
            json.register(manifest.clone(), previous);
            placeholder.abandon(err.to_string());
            Err(err)
        }
    }
}

/// A member with its concrete type, codec and default.
pub(crate) struct ResolvedMember<'m> {
    pub member: &'m Member,
    pub type_: TypeDescriptor,
    pub codec: CodecRef,
    pub default: Value,
}

impl ResolvedMember<'_> {
    pub fn encoder(&self, omit_defaults: bool) -> AttributeEncoder {
        AttributeEncoder::new(
            &self.member.name,
            self.member.getter.clone(),
            self.codec.clone(),
            omit_defaults.then(|| self.default.clone()),
        )
    }

    pub fn array_encoder(&self) -> ArrayAttributeEncoder {
        ArrayAttributeEncoder::new(&self.member.name, self.member.getter.clone(), self.codec.clone())
    }
}

/// Resolves the codec of every member in declaration order. Unknown
/// member types get the `any` codec.
pub(crate) fn resolve_members<'m>(
    json: &JsonBind,
    mapper: &GenericsMapper,
    members: &'m [Member],
) -> Result<Vec<ResolvedMember<'m>>> {
    members
        .iter()
        .map(|member| {
            let type_ = mapper.make_concrete(&member.type_);
            let codec = element_codec(json, &type_)?;
            let default = match &member.default {
                Some(value) => value.clone(),
                None => default_value(&codec),
            };
            Ok(ResolvedMember {
                member,
                type_,
                codec,
                default,
            })
        })
        .collect()
}

/// Indexes of `members` in array-format order.
pub(crate) fn positional_order(members: &[ResolvedMember<'_>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..members.len()).collect();
    order.sort_by_key(|&i| members[i].member.index.unwrap_or(usize::MAX));
    order
}
