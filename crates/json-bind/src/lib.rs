//! Runtime construction of JSON codecs from type declarations.
//!
//! A [`JsonBind`] engine holds a registry of codecs keyed by
//! [`TypeDescriptor`]. Asking for a type that has no codec yet runs the
//! analyzer pipeline: containers (`list`, `set`, `array`, `map`,
//! `optional`), enums, then declared records, beans, builders and unions.
//! Structural codecs bind properties through hash tables, can accept both
//! the object and the positional array form, and break recursive type
//! graphs with placeholders.

pub mod codegen;
mod error;
mod json_bind;
mod settings;
pub mod type_def;
mod value;

pub use codegen::lazy::PlaceholderCodec;
pub use codegen::{Codec, CodecRef, FormatConverter, FormatDescription, FormatRef};
pub use error::{ConfigurationError, DecodeError, DecodeErrorKind, EncodeError, Error, Result};
pub use json_bind::{default_analyzers, Analyzer, JsonBind};
pub use json_bind_buffers::{Reader, Writer};
pub use settings::{Settings, UnknownPolicy};
pub use type_def::{
    getter, BeanShape, BuilderShape, Constructor, EnumShape, Factory, Finisher,
    FormatPolicy, GenericsMapper, Getter, Member, Parameter, RawType, RecordShape, Setter, Shape,
    TypeDeclaration, TypeDescriptor, TypeParam, UnionShape, Variant,
};
pub use value::{EnumValue, Object, Value};
