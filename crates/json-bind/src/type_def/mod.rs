//! Type identifiers, declarations and generic substitution.

mod declaration;
mod descriptor;
mod generics;

pub use declaration::{
    getter, BeanShape, BuilderShape, Constructor, EnumShape, Factory, Finisher,
    FormatPolicy, Getter, Member, Parameter, RecordShape, Setter, Shape, TypeDeclaration,
    TypeParam, UnionShape, Variant,
};
pub use descriptor::{RawType, TypeDescriptor};
pub use generics::GenericsMapper;
