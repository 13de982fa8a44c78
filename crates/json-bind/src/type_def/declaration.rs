//! Declarative type descriptions consumed by the analyzers.
//!
//! A [`TypeDeclaration`] plays the role runtime reflection plays elsewhere:
//! it lists the members of a type with their types and accessors, and says
//! how instances are constructed. Analyzers turn declarations into codecs.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::TypeDescriptor;
use crate::value::{Object, Value};

/// Reads a member from an instance.
pub type Getter = Arc<dyn for<'a> Fn(&'a Value) -> Result<Cow<'a, Value>, String> + Send + Sync>;
/// Writes a member into an instance.
pub type Setter = Arc<dyn Fn(&mut Value, Value) -> Result<(), String> + Send + Sync>;
/// Builds a record from constructor arguments in parameter order.
pub type Constructor =
    Arc<dyn Fn(&TypeDescriptor, Vec<Value>) -> Result<Value, String> + Send + Sync>;
/// Creates an empty bean of the given concrete type.
pub type Factory = Arc<dyn Fn(&TypeDescriptor) -> Result<Value, String> + Send + Sync>;
/// Maps a decoded builder to the final value.
pub type Finisher = Arc<dyn Fn(&TypeDescriptor, Value) -> Result<Value, String> + Send + Sync>;

/// Wraps a closure as a [`Getter`]; pins the borrowed-return signature.
pub fn getter<F>(f: F) -> Getter
where
    F: for<'a> Fn(&'a Value) -> Result<Cow<'a, Value>, String> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn field_getter(name: &str) -> Getter {
    let name = name.to_string();
    getter(move |instance| match instance {
        Value::Object(o) => Ok(Cow::Borrowed(o.get(&name).unwrap_or(Value::null_ref()))),
        other => Err(format!("expected object, found {}", other.kind())),
    })
}

fn field_setter(name: &str) -> Setter {
    let name = name.to_string();
    Arc::new(move |instance: &mut Value, value: Value| match instance {
        Value::Object(o) => {
            o.set(&name, value);
            Ok(())
        }
        other => Err(format!("expected object, found {}", other.kind())),
    })
}

// ------------------------------------------------------------------ Member

/// One serializable member of a declared type.
#[derive(Clone)]
pub struct Member {
    pub name: String,
    pub type_: TypeDescriptor,
    pub getter: Getter,
    /// `None` for members that are only written, never bound.
    pub setter: Option<Setter>,
    pub mandatory: bool,
    pub non_null: bool,
    /// Always compare the full name, even without a hash collision.
    pub exact_name: bool,
    /// Position in the array format; declaration order when absent.
    pub index: Option<usize>,
    /// Overrides the default derived from the member's codec.
    pub default: Option<Value>,
}

impl Member {
    /// Member backed by the object field of the same name.
    pub fn new(name: &str, type_: TypeDescriptor) -> Self {
        Self {
            name: name.to_string(),
            type_,
            getter: field_getter(name),
            setter: Some(field_setter(name)),
            mandatory: false,
            non_null: false,
            exact_name: false,
            index: None,
            default: None,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn non_null(mut self) -> Self {
        self.non_null = true;
        self
    }

    pub fn exact_name(mut self) -> Self {
        self.exact_name = true;
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.setter = None;
        self
    }

    pub fn with_getter(mut self, getter: Getter) -> Self {
        self.getter = getter;
        self
    }

    pub fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("type", &self.type_)
            .field("mandatory", &self.mandatory)
            .field("non_null", &self.non_null)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

// ------------------------------------------------------------------ Shapes

#[derive(Debug, Clone)]
pub struct Parameter {
    /// Absent when the constructor's parameter names are not known; the
    /// parameter is then matched to a member by its type.
    pub name: Option<String>,
    pub type_: TypeDescriptor,
}

impl Parameter {
    pub fn named(name: &str, type_: TypeDescriptor) -> Self {
        Self {
            name: Some(name.to_string()),
            type_,
        }
    }

    pub fn unnamed(type_: TypeDescriptor) -> Self {
        Self { name: None, type_ }
    }
}

/// Immutable type built by one constructor call.
#[derive(Clone)]
pub struct RecordShape {
    pub members: Vec<Member>,
    pub params: Vec<Parameter>,
    pub constructor: Constructor,
}

impl RecordShape {
    /// One named parameter per member; the constructor builds an object
    /// with those fields.
    pub fn new(members: Vec<Member>) -> Self {
        let params: Vec<Parameter> = members
            .iter()
            .map(|m| Parameter::named(&m.name, m.type_.clone()))
            .collect();
        let names: Vec<String> = members.iter().map(|m| m.name.clone()).collect();
        let constructor: Constructor = Arc::new(move |type_: &TypeDescriptor, args: Vec<Value>| {
            let mut object = Object::new(type_.clone());
            for (name, value) in names.iter().zip(args) {
                object.set(name, value);
            }
            Ok(Value::Object(object))
        });
        Self {
            members,
            params,
            constructor,
        }
    }

    pub fn with_constructor(
        members: Vec<Member>,
        params: Vec<Parameter>,
        constructor: Constructor,
    ) -> Self {
        Self {
            members,
            params,
            constructor,
        }
    }
}

/// Mutable type created empty and filled member by member.
#[derive(Clone)]
pub struct BeanShape {
    pub members: Vec<Member>,
    pub factory: Factory,
}

impl BeanShape {
    /// The factory creates an object with every member at its declared
    /// default, or `null`.
    pub fn new(members: Vec<Member>) -> Self {
        let defaults: Vec<(String, Value)> = members
            .iter()
            .map(|m| (m.name.clone(), m.default.clone().unwrap_or_default()))
            .collect();
        let factory: Factory = Arc::new(move |type_: &TypeDescriptor| {
            let mut object = Object::new(type_.clone());
            for (name, value) in &defaults {
                object.set(name, value.clone());
            }
            Ok(Value::Object(object))
        });
        Self { members, factory }
    }

    pub fn with_factory(members: Vec<Member>, factory: Factory) -> Self {
        Self { members, factory }
    }
}

/// Decoded through a separate builder type, then finished into the final
/// value. Encoding reads the final value's own members.
#[derive(Clone)]
pub struct BuilderShape {
    pub builder: TypeDescriptor,
    pub members: Vec<Member>,
    pub finisher: Finisher,
}

#[derive(Debug, Clone)]
pub struct EnumShape {
    pub constants: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Variant {
    /// Discriminator value; the variant's type name when absent.
    pub tag: Option<String>,
    pub type_: TypeDescriptor,
}

impl Variant {
    pub fn new(type_: TypeDescriptor) -> Self {
        Self { tag: None, type_ }
    }

    pub fn tagged(tag: &str, type_: TypeDescriptor) -> Self {
        Self {
            tag: Some(tag.to_string()),
            type_,
        }
    }

    pub fn tag(&self) -> String {
        match &self.tag {
            Some(tag) => tag.clone(),
            None => self.type_.to_string(),
        }
    }
}

/// Closed set of variants sharing a discriminator.
#[derive(Debug, Clone)]
pub struct UnionShape {
    pub variants: Vec<Variant>,
    /// Overrides the engine-wide discriminator name.
    pub discriminator: Option<String>,
}

#[derive(Clone)]
pub enum Shape {
    Record(RecordShape),
    Bean(BeanShape),
    Builder(BuilderShape),
    Enum(EnumShape),
    Union(UnionShape),
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Record(_) => "record",
            Shape::Bean(_) => "bean",
            Shape::Builder(_) => "builder",
            Shape::Enum(_) => "enum",
            Shape::Union(_) => "union",
        }
    }
}

/// Which wire formats a structural type supports and which one is used
/// for encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatPolicy {
    #[default]
    ObjectOnly,
    ArrayOnly,
    ObjectPrimary,
    ArrayPrimary,
}

impl FormatPolicy {
    pub fn has_object(self) -> bool {
        !matches!(self, FormatPolicy::ArrayOnly)
    }

    pub fn has_array(self) -> bool {
        !matches!(self, FormatPolicy::ObjectOnly)
    }

    pub fn object_first(self) -> bool {
        matches!(self, FormatPolicy::ObjectOnly | FormatPolicy::ObjectPrimary)
    }
}

// ------------------------------------------------------------- Declaration

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    /// Used when the use site leaves the parameter unbound.
    pub bound: Option<TypeDescriptor>,
}

#[derive(Clone)]
pub struct TypeDeclaration {
    pub name: String,
    pub params: Vec<TypeParam>,
    pub shape: Shape,
    pub formats: FormatPolicy,
}

impl TypeDeclaration {
    pub fn new(name: &str, shape: Shape) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            shape,
            formats: FormatPolicy::default(),
        }
    }

    pub fn record(name: &str, members: Vec<Member>) -> Self {
        Self::new(name, Shape::Record(RecordShape::new(members)))
    }

    pub fn bean(name: &str, members: Vec<Member>) -> Self {
        Self::new(name, Shape::Bean(BeanShape::new(members)))
    }

    pub fn builder(
        name: &str,
        builder: TypeDescriptor,
        members: Vec<Member>,
        finisher: Finisher,
    ) -> Self {
        Self::new(
            name,
            Shape::Builder(BuilderShape {
                builder,
                members,
                finisher,
            }),
        )
    }

    pub fn enumeration(name: &str, constants: &[&str]) -> Self {
        Self::new(
            name,
            Shape::Enum(EnumShape {
                constants: constants.iter().map(|c| c.to_string()).collect(),
            }),
        )
    }

    pub fn union(name: &str, variants: Vec<Variant>) -> Self {
        Self::new(
            name,
            Shape::Union(UnionShape {
                variants,
                discriminator: None,
            }),
        )
    }

    /// Adds an unbounded type parameter.
    pub fn with_param(mut self, name: &str) -> Self {
        self.params.push(TypeParam {
            name: name.to_string(),
            bound: None,
        });
        self
    }

    pub fn with_bounded_param(mut self, name: &str, bound: TypeDescriptor) -> Self {
        self.params.push(TypeParam {
            name: name.to_string(),
            bound: Some(bound),
        });
        self
    }

    pub fn with_formats(mut self, formats: FormatPolicy) -> Self {
        self.formats = formats;
        self
    }

    /// Overrides the discriminator name of a union declaration.
    pub fn with_discriminator(mut self, name: &str) -> Self {
        if let Shape::Union(union) = &mut self.shape {
            union.discriminator = Some(name.to_string());
        }
        self
    }

    /// Descriptor of the declared type with no arguments.
    pub fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::named(&self.name)
    }
}

impl fmt::Debug for TypeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDeclaration")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("shape", &self.shape.kind())
            .field("formats", &self.formats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_field_accessors() {
        let m = Member::new("x", TypeDescriptor::int());
        let mut v = Value::Object(Object::new(TypeDescriptor::named("P")));
        assert_eq!(*(m.getter)(&v).unwrap(), Value::Null);
        (m.setter.as_ref().unwrap())(&mut v, Value::Int(3)).unwrap();
        assert_eq!(*(m.getter)(&v).unwrap(), Value::Int(3));
        assert!((m.getter)(&Value::Int(1)).is_err());
    }

    #[test]
    fn record_constructor_uses_param_order() {
        let shape = RecordShape::new(vec![
            Member::new("x", TypeDescriptor::int()),
            Member::new("y", TypeDescriptor::int()),
        ]);
        let t = TypeDescriptor::named("Pair");
        let v = (shape.constructor)(&t, vec![Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(v, Value::Object(Object::new(t).with("x", 1).with("y", 2)));
    }

    #[test]
    fn bean_factory_prefills_defaults() {
        let shape = BeanShape::new(vec![
            Member::new("n", TypeDescriptor::int()).default_value(7),
            Member::new("s", TypeDescriptor::string()),
        ]);
        let v = (shape.factory)(&TypeDescriptor::named("B")).unwrap();
        assert_eq!(v.field("n"), Some(&Value::Int(7)));
        assert_eq!(v.field("s"), Some(&Value::Null));
    }
}
