//! Type descriptors and service type identities
//!
//! The generator never inspects real Rust types. Providers are described
//! through the [`TypeDescriptor`] capability and every produced type gets a
//! [`TypeIdentity`], a canonical string that keys both the service registry
//! and the dependency graph.
//!
//! Value and pointer variants of the same type are different services:
//! `crate::db::Pool` and `Arc<crate::db::Pool>` never match each other.

use serde::Serialize;
use std::{
    borrow::Borrow,
    fmt::{Display, Formatter}
};

pub use signature::{parse_signature, from_signature, type_ref};

pub mod signature;

/// Describes what kind of type a descriptor refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A named struct, enum or any other nominal type
    Struct,
    /// A trait object, e.g. `dyn Cache`
    Interface,
    /// `bool`, `char`, numbers and strings
    Primitive,
    /// Sequences: `Vec<T>`, `[T]`, `[T; N]`
    Slice,
    /// Maps and sets
    Map,
    /// Function pointers and closures
    Func,
    /// Tuples, including `()`
    Tuple,
    /// `&T` and `&mut T`
    Reference,
    /// A named type with generic arguments
    Generic,
    /// A shared pointer such as `Arc<T>` or `Rc<T>`
    Pointer,
    /// The error half of a fallible provider
    Error,
    /// Anything else
    Other
}

impl Display for TypeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            TypeKind::Struct => "struct",
            TypeKind::Interface => "trait object",
            TypeKind::Primitive => "primitive",
            TypeKind::Slice => "slice",
            TypeKind::Map => "map",
            TypeKind::Func => "function",
            TypeKind::Tuple => "tuple",
            TypeKind::Reference => "reference",
            TypeKind::Generic => "generic type",
            TypeKind::Pointer => "pointer",
            TypeKind::Error => "error",
            TypeKind::Other => "unsupported type"
        };
        f.write_str(kind)
    }
}

/// A capability to describe a provider's parameter or return type.
///
/// Implementations report the type's kind, the module path it lives in,
/// its declared name and, for pointers, the type pointed to.
pub trait TypeDescriptor {
    /// Kind of the type itself (not of the pointee)
    fn kind(&self) -> TypeKind;

    /// Module path the type is declared in, e.g. `crate::db`.
    /// Empty if the type is referenced without a path.
    fn package_path(&self) -> &str;

    /// Declared name, e.g. `Pool`.
    ///
    /// For pointers this is the wrapper name (`Arc`), for errors and
    /// unsupported types the whole type as written.
    fn name(&self) -> &str;

    /// The pointee if this is a pointer
    fn elem(&self) -> Option<&Self>;

    /// Returns `true` if this type is a pointer to another type
    #[inline]
    fn is_pointer(&self) -> bool {
        self.kind() == TypeKind::Pointer
    }

    /// Returns `true` if this type can be used as the error of a fallible provider
    #[inline]
    fn is_error(&self) -> bool {
        self.kind() == TypeKind::Error
    }
}

/// Canonical key of a service type
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeIdentity(String);

impl TypeIdentity {
    /// Returns the identity as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TypeIdentity {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TypeIdentity {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeIdentity {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Computes the identity of a type.
///
/// - `crate::db::Pool` for a struct
/// - `dyn crate::cache::Cache` for a trait object
/// - `Arc<crate::db::Pool>` for a pointer
pub fn identity<D: TypeDescriptor>(ty: &D) -> TypeIdentity {
    TypeIdentity(identity_string(ty))
}

fn identity_string<D: TypeDescriptor>(ty: &D) -> String {
    match (ty.kind(), ty.elem()) {
        (TypeKind::Pointer, Some(elem)) => format!("{}<{}>", ty.name(), identity_string(elem)),
        (TypeKind::Interface, _) => format!("dyn {}", qualified_name(ty.package_path(), ty.name())),
        _ => qualified_name(ty.package_path(), ty.name())
    }
}

#[inline]
pub(crate) fn qualified_name(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_owned()
    } else {
        format!("{path}::{name}")
    }
}

/// Returns the type itself or, for a pointer, the type it points to
#[inline]
pub fn strip_pointer<D: TypeDescriptor>(ty: &D) -> &D {
    match ty.elem() {
        Some(elem) if ty.is_pointer() => elem,
        _ => ty
    }
}

/// Returns `true` if a type can be produced or consumed as a service.
///
/// After stripping at most one pointer the type must be a struct
/// or a trait object. Trait objects are unsized, so they are only
/// accepted behind a pointer.
#[inline]
pub fn is_eligible<D: TypeDescriptor>(ty: &D) -> bool {
    match strip_pointer(ty).kind() {
        TypeKind::Struct => true,
        TypeKind::Interface => ty.is_pointer(),
        _ => false
    }
}

/// An owned, concrete [`TypeDescriptor`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    kind: TypeKind,
    path: String,
    name: String,
    elem: Option<Box<TypeRef>>
}

impl TypeRef {
    /// Creates a descriptor of any kind without a pointee
    pub fn new(kind: TypeKind, path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            name: name.into(),
            elem: None
        }
    }

    /// Describes a named struct
    ///
    /// # Example
    /// ```
    /// use volga_di_gen::types::{TypeRef, identity};
    ///
    /// let pool = TypeRef::structure("crate::db", "Pool");
    /// assert_eq!(identity(&pool).as_str(), "crate::db::Pool");
    /// ```
    #[inline]
    pub fn structure(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(TypeKind::Struct, path, name)
    }

    /// Describes a trait object
    #[inline]
    pub fn interface(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(TypeKind::Interface, path, name)
    }

    /// Describes a primitive type such as `u32` or `String`
    #[inline]
    pub fn primitive(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Primitive, "", name)
    }

    /// Describes an error type, `expr` is the type as it must be written in code
    #[inline]
    pub fn error(expr: impl Into<String>) -> Self {
        Self::new(TypeKind::Error, "", expr)
    }

    /// Wraps `elem` into `std::sync::Arc`
    #[inline]
    pub fn arc(elem: TypeRef) -> Self {
        Self::pointer("std::sync", "Arc", elem)
    }

    /// Wraps `elem` into `std::rc::Rc`
    #[inline]
    pub fn rc(elem: TypeRef) -> Self {
        Self::pointer("std::rc", "Rc", elem)
    }

    /// Describes a pointer `wrapper<elem>`, where the wrapper lives in `path`
    pub fn pointer(path: impl Into<String>, wrapper: impl Into<String>, elem: TypeRef) -> Self {
        Self {
            kind: TypeKind::Pointer,
            path: path.into(),
            name: wrapper.into(),
            elem: Some(Box::new(elem))
        }
    }

    /// Copies any descriptor into an owned [`TypeRef`]
    pub fn of<D: TypeDescriptor>(ty: &D) -> Self {
        Self {
            kind: ty.kind(),
            path: ty.package_path().to_owned(),
            name: ty.name().to_owned(),
            elem: ty.elem().map(|elem| Box::new(Self::of(elem)))
        }
    }
}

impl TypeDescriptor for TypeRef {
    #[inline]
    fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    fn package_path(&self) -> &str {
        &self.path
    }

    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn elem(&self) -> Option<&Self> {
        self.elem.as_deref()
    }
}
