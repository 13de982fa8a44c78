//! Substitution of formal type parameters by use-site arguments.

use std::sync::Arc;

use super::{RawType, TypeDescriptor, TypeParam};
use crate::error::ConfigurationError;

/// Maps the formal parameters of one declaration to the arguments of one
/// use site, e.g. `T -> int` for `Box<T>` used as `Box<int>`.
#[derive(Debug, Clone, Default)]
pub struct GenericsMapper {
    bindings: Vec<(Arc<str>, TypeDescriptor)>,
}

impl GenericsMapper {
    /// A use site without arguments leaves every parameter unbound; those
    /// fall back to their bound, or to `any`.
    pub fn create(
        use_site: &TypeDescriptor,
        params: &[TypeParam],
    ) -> Result<Self, ConfigurationError> {
        let args = use_site.args();
        if !args.is_empty() && args.len() != params.len() {
            return Err(ConfigurationError::InvalidDeclaration {
                type_name: use_site.to_string(),
                reason: format!(
                    "expecting {} type arguments, found {}",
                    params.len(),
                    args.len()
                ),
            });
        }
        let bindings = params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let concrete = match args.get(i) {
                    Some(arg) if !Self::is_unknown(arg) => arg.clone(),
                    _ => param.bound.clone().unwrap_or_else(TypeDescriptor::any),
                };
                (Arc::from(param.name.as_str()), concrete)
            })
            .collect();
        Ok(Self { bindings })
    }

    pub fn binding(&self, name: &str) -> Option<&TypeDescriptor> {
        self.bindings
            .iter()
            .find(|(param, _)| &**param == name)
            .map(|(_, t)| t)
    }

    /// Substitutes parameters anywhere inside `type_`. Returns the input
    /// descriptor itself when nothing changed.
    pub fn make_concrete(&self, type_: &TypeDescriptor) -> TypeDescriptor {
        if let RawType::Param(name) = type_.raw() {
            return self
                .binding(name)
                .cloned()
                .unwrap_or_else(TypeDescriptor::any);
        }
        if type_.args().is_empty() {
            return type_.clone();
        }
        let mut changed = false;
        let args: Vec<TypeDescriptor> = type_
            .args()
            .iter()
            .map(|arg| {
                let concrete = self.make_concrete(arg);
                changed |= !concrete.ptr_eq(arg);
                concrete
            })
            .collect();
        if changed {
            type_.with_args(args)
        } else {
            type_.clone()
        }
    }

    /// Positions typed with these are encoded by runtime dispatch.
    pub fn is_unknown(type_: &TypeDescriptor) -> bool {
        type_.is_any() || type_.is_param()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(names: &[&str]) -> Vec<TypeParam> {
        names
            .iter()
            .map(|n| TypeParam {
                name: n.to_string(),
                bound: None,
            })
            .collect()
    }

    #[test]
    fn substitutes_nested_parameters() {
        let use_site = TypeDescriptor::generic(
            "Pair",
            vec![TypeDescriptor::int(), TypeDescriptor::string()],
        );
        let mapper = GenericsMapper::create(&use_site, &params(&["A", "B"])).unwrap();
        let body = TypeDescriptor::map(
            TypeDescriptor::param("B"),
            TypeDescriptor::list(TypeDescriptor::param("A")),
        );
        assert_eq!(
            mapper.make_concrete(&body),
            TypeDescriptor::map(
                TypeDescriptor::string(),
                TypeDescriptor::list(TypeDescriptor::int())
            )
        );
    }

    #[test]
    fn unchanged_types_are_shared() {
        let mapper = GenericsMapper::create(
            &TypeDescriptor::generic("Box", vec![TypeDescriptor::int()]),
            &params(&["T"]),
        )
        .unwrap();
        let body = TypeDescriptor::list(TypeDescriptor::map(
            TypeDescriptor::string(),
            TypeDescriptor::float(),
        ));
        assert!(mapper.make_concrete(&body).ptr_eq(&body));
    }

    #[test]
    fn unbound_parameters_fall_back() {
        let mut ps = params(&["T", "N"]);
        ps[1].bound = Some(TypeDescriptor::float());
        let mapper = GenericsMapper::create(&TypeDescriptor::named("Raw"), &ps).unwrap();
        assert_eq!(
            mapper.make_concrete(&TypeDescriptor::param("T")),
            TypeDescriptor::any()
        );
        assert_eq!(
            mapper.make_concrete(&TypeDescriptor::param("N")),
            TypeDescriptor::float()
        );
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let use_site = TypeDescriptor::generic("Box", vec![TypeDescriptor::int()]);
        assert!(matches!(
            GenericsMapper::create(&use_site, &params(&["A", "B"])),
            Err(ConfigurationError::InvalidDeclaration { .. })
        ));
    }
}
