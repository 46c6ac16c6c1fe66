//! Parsed type expressions.
//!
//! A [`TypeRef`] is the documentation-side view of a Rust type as it appears in a field,
//! a handler signature or on the command line: the path segments as written plus the
//! generic arguments. Lifetimes, const generics and trait bounds are dropped because they
//! never influence the serialized shape.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// Segment used for slices, fixed-size arrays and synthetic "array of" roots.
pub const ARRAY_SEGMENT: &str = "[]";
/// Segment used for tuples; the unit type is a tuple without arguments.
pub const TUPLE_SEGMENT: &str = "()";
/// Segment used for types that cannot be named (`impl Trait`, `dyn Trait`, `_`).
pub const OPAQUE_SEGMENT: &str = "_";

/// A possibly generic type expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Path segments as written (`["chrono", "DateTime"]`)
    pub segments: Vec<String>,
    /// Generic type arguments in declaration order
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    /// Create a TypeRef for a simple, non-generic name
    pub fn new(name: &str) -> Self {
        Self::with_args(name, Vec::new())
    }

    /// Create a TypeRef from a `::`-separated path and generic arguments
    pub fn with_args(path: &str, args: Vec<TypeRef>) -> Self {
        Self {
            segments: path.split("::").map(|s| s.trim().to_string()).collect(),
            args,
        }
    }

    /// Wrap a type into a synthetic array, used for endpoints returning collections
    pub fn array_of(element: TypeRef) -> Self {
        Self {
            segments: vec![ARRAY_SEGMENT.to_string()],
            args: vec![element],
        }
    }

    /// The unit type `()`
    pub fn unit() -> Self {
        Self {
            segments: vec![TUPLE_SEGMENT.to_string()],
            args: Vec::new(),
        }
    }

    /// Parse a type from its Rust spelling, e.g. `Page<Item>` or `Vec<Option<u32>>`
    pub fn parse(source: &str) -> Result<Self> {
        let ty: syn::Type = syn::parse_str(source)
            .map_err(|e| Error::InvalidArgument(format!("invalid type `{}`: {}", source, e)))?;
        Ok(Self::from_syn(&ty))
    }

    /// Convert a `syn::Type` into a TypeRef
    pub fn from_syn(ty: &syn::Type) -> Self {
        match ty {
            syn::Type::Path(type_path) => Self::from_path(&type_path.path),
            syn::Type::Reference(reference) => Self::from_syn(&reference.elem),
            syn::Type::Paren(paren) => Self::from_syn(&paren.elem),
            syn::Type::Group(group) => Self::from_syn(&group.elem),
            syn::Type::Ptr(ptr) => Self::from_syn(&ptr.elem),
            syn::Type::Slice(slice) => Self::array_of(Self::from_syn(&slice.elem)),
            syn::Type::Array(array) => Self::array_of(Self::from_syn(&array.elem)),
            syn::Type::Tuple(tuple) => Self {
                segments: vec![TUPLE_SEGMENT.to_string()],
                args: tuple.elems.iter().map(Self::from_syn).collect(),
            },
            _ => Self::new(OPAQUE_SEGMENT),
        }
    }

    /// Convert a `syn::Path` into a TypeRef, keeping generic arguments of the last segment
    pub fn from_path(path: &syn::Path) -> Self {
        let segments = path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();

        let args = path
            .segments
            .last()
            .map(|segment| match &segment.arguments {
                syn::PathArguments::AngleBracketed(generic) => generic
                    .args
                    .iter()
                    .filter_map(|arg| match arg {
                        syn::GenericArgument::Type(inner) => Some(Self::from_syn(inner)),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            })
            .unwrap_or_default();

        Self { segments, args }
    }

    /// The last path segment, i.e. the simple type name
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or(OPAQUE_SEGMENT)
    }

    /// The first generic argument, if any
    pub fn first_arg(&self) -> Option<&TypeRef> {
        self.args.first()
    }

    pub fn is_option(&self) -> bool {
        self.name() == "Option" && self.args.len() == 1
    }

    pub fn is_array(&self) -> bool {
        self.name() == ARRAY_SEGMENT
    }

    pub fn is_tuple(&self) -> bool {
        self.name() == TUPLE_SEGMENT
    }

    /// Path segments with leading `crate`, `self` and `super` removed
    pub fn significant_segments(&self) -> Vec<&str> {
        self.segments
            .iter()
            .map(String::as_str)
            .skip_while(|s| matches!(*s, "crate" | "self" | "super"))
            .collect()
    }

    /// Whether `other` appears anywhere in this type, including the type itself
    pub fn contains(&self, other: &TypeRef) -> bool {
        self == other || self.args.iter().any(|arg| arg.contains(other))
    }

    /// Replace generic parameters by concrete types
    pub fn substitute(&self, bindings: &HashMap<String, TypeRef>) -> TypeRef {
        if self.segments.len() == 1 && self.args.is_empty() {
            if let Some(bound) = bindings.get(&self.segments[0]) {
                return bound.clone();
            }
        }

        TypeRef {
            segments: self.segments.clone(),
            args: self.args.iter().map(|arg| arg.substitute(bindings)).collect(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |args: &[TypeRef]| {
            args.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };

        if self.is_array() {
            return write!(f, "[{}]", join(&self.args));
        }
        if self.is_tuple() {
            return write!(f, "({})", join(&self.args));
        }

        write!(f, "{}", self.segments.join("::"))?;
        if !self.args.is_empty() {
            write!(f, "<{}>", join(&self.args))?;
        }
        Ok(())
    }
}
