//! Canonical, interned type identifiers.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

/// The outermost shape of a type, without its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawType {
    /// Statically unknown; encoded by looking at the runtime value.
    Any,
    Bool,
    Int,
    Float,
    String,
    /// Base64 encoded byte string.
    Bytes,
    List,
    Set,
    /// Sequence with an optional fixed element count.
    Array(Option<usize>),
    Map,
    Optional,
    /// A declared record, bean, builder, enum or union.
    Named(Arc<str>),
    /// A formal type parameter inside a declaration body.
    Param(Arc<str>),
}

struct DescriptorInner {
    raw: RawType,
    args: Vec<TypeDescriptor>,
    hash: u64,
}

/// Identifier of a possibly generic type, e.g. `list<Pair>`.
///
/// Descriptors are interned: building the same shape twice yields the same
/// allocation, so equality is a pointer compare in the common case and the
/// descriptor can be used directly as a registry key.
#[derive(Clone)]
pub struct TypeDescriptor(Arc<DescriptorInner>);

type InternKey = (RawType, Vec<TypeDescriptor>);

fn interner() -> &'static DashMap<InternKey, TypeDescriptor> {
    static INTERNER: OnceLock<DashMap<InternKey, TypeDescriptor>> = OnceLock::new();
    INTERNER.get_or_init(DashMap::new)
}

fn intern(raw: RawType, args: Vec<TypeDescriptor>) -> TypeDescriptor {
    let key = (raw, args);
    if let Some(found) = interner().get(&key) {
        return found.value().clone();
    }
    let mut hasher = DefaultHasher::new();
    key.0.hash(&mut hasher);
    for arg in &key.1 {
        hasher.write_u64(arg.0.hash);
    }
    let hash = hasher.finish();
    interner()
        .entry(key.clone())
        .or_insert_with(|| {
            TypeDescriptor(Arc::new(DescriptorInner {
                raw: key.0,
                args: key.1,
                hash,
            }))
        })
        .value()
        .clone()
}

impl TypeDescriptor {
    pub fn new(raw: RawType, args: Vec<TypeDescriptor>) -> Self {
        intern(raw, args)
    }

    pub fn any() -> Self {
        intern(RawType::Any, Vec::new())
    }

    pub fn bool() -> Self {
        intern(RawType::Bool, Vec::new())
    }

    pub fn int() -> Self {
        intern(RawType::Int, Vec::new())
    }

    pub fn float() -> Self {
        intern(RawType::Float, Vec::new())
    }

    pub fn string() -> Self {
        intern(RawType::String, Vec::new())
    }

    pub fn bytes() -> Self {
        intern(RawType::Bytes, Vec::new())
    }

    pub fn list(element: TypeDescriptor) -> Self {
        intern(RawType::List, vec![element])
    }

    pub fn set(element: TypeDescriptor) -> Self {
        intern(RawType::Set, vec![element])
    }

    pub fn array(element: TypeDescriptor) -> Self {
        intern(RawType::Array(None), vec![element])
    }

    pub fn fixed_array(element: TypeDescriptor, len: usize) -> Self {
        intern(RawType::Array(Some(len)), vec![element])
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        intern(RawType::Map, vec![key, value])
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        intern(RawType::Optional, vec![inner])
    }

    pub fn named(name: &str) -> Self {
        intern(RawType::Named(Arc::from(name)), Vec::new())
    }

    pub fn generic(name: &str, args: Vec<TypeDescriptor>) -> Self {
        intern(RawType::Named(Arc::from(name)), args)
    }

    pub fn param(name: &str) -> Self {
        intern(RawType::Param(Arc::from(name)), Vec::new())
    }

    /// Same raw shape with different arguments.
    pub fn with_args(&self, args: Vec<TypeDescriptor>) -> Self {
        intern(self.0.raw.clone(), args)
    }

    pub fn raw(&self) -> &RawType {
        &self.0.raw
    }

    pub fn args(&self) -> &[TypeDescriptor] {
        &self.0.args
    }

    pub fn arg(&self, index: usize) -> Option<&TypeDescriptor> {
        self.0.args.get(index)
    }

    /// Declaration name of a named type.
    pub fn name(&self) -> Option<&str> {
        match &self.0.raw {
            RawType::Named(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self.0.raw, RawType::Any)
    }

    pub fn is_param(&self) -> bool {
        matches!(self.0.raw, RawType::Param(_))
    }

    /// True when any formal parameter remains anywhere in the tree.
    pub fn has_params(&self) -> bool {
        self.is_param() || self.0.args.iter().any(TypeDescriptor::has_params)
    }

    pub fn ptr_eq(&self, other: &TypeDescriptor) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.hash == other.0.hash
                && self.0.raw == other.0.raw
                && self.0.args == other.0.args)
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[TypeDescriptor]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self.args();
        let name = match self.raw() {
            RawType::Any => "any",
            RawType::Bool => "bool",
            RawType::Int => "int",
            RawType::Float => "float",
            RawType::String => "string",
            RawType::Bytes => "bytes",
            RawType::List => "list",
            RawType::Set => "set",
            RawType::Map => "map",
            RawType::Optional => "optional",
            RawType::Array(len) => {
                f.write_str("array<")?;
                write_args(f, args)?;
                if let Some(len) = len {
                    write!(f, "; {len}")?;
                }
                return f.write_str(">");
            }
            RawType::Named(name) | RawType::Param(name) => name,
        };
        f.write_str(name)?;
        if !args.is_empty() {
            f.write_str("<")?;
            write_args(f, args)?;
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({self})")
    }
}
