//! Reads provider shapes from Rust function signatures
//!
//! A provider is declared as a plain function signature, e.g.
//! `fn new_repo(pool: Arc<crate::db::Pool>) -> Result<Repo, std::io::Error>`.
//! The signature is classified into a [`ProviderDescriptor`]:
//!
//! - no return type or `()` produces nothing
//! - `Result<T, E>` produces `T` and reports `E` as the error
//! - a tuple produces each of its elements
//! - any other type is the single produced value

use crate::provider::ProviderDescriptor;
use super::{TypeKind, TypeRef, qualified_name};
use quote::ToTokens;
use syn::{
    AngleBracketedGenericArguments,
    FnArg,
    GenericArgument,
    Path,
    PathArguments,
    ReturnType,
    Signature,
    Token,
    Type,
    TypeParamBound,
    punctuated::Punctuated
};

const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "String",
    "i8", "i16", "i32", "i64", "i128", "isize",
    "u8", "u16", "u32", "u64", "u128", "usize",
    "f32", "f64",
];

const SEQUENCES: &[&str] = &["Vec", "VecDeque", "LinkedList", "BinaryHeap"];

const MAPS: &[&str] = &["HashMap", "BTreeMap", "IndexMap", "HashSet", "BTreeSet", "IndexSet"];

const FN_TRAITS: &[&str] = &["Fn", "FnMut", "FnOnce"];

/// Parses a provider signature such as `fn new_db() -> Arc<crate::db::Pool>`.
///
/// A trailing `;` is allowed.
///
/// # Example
/// ```
/// use volga_di_gen::types::parse_signature;
///
/// let provider = parse_signature("fn new_repo(db: Arc<crate::db::Pool>) -> Result<crate::repo::Repo, std::io::Error>").unwrap();
/// assert_eq!(provider.params().len(), 1);
/// assert_eq!(provider.returns().len(), 2);
/// ```
pub fn parse_signature(source: &str) -> syn::Result<ProviderDescriptor> {
    let source = source.trim().trim_end_matches(';');
    let signature: Signature = syn::parse_str(source)?;
    from_signature(&signature)
}

/// Converts a parsed signature into a [`ProviderDescriptor`]
pub fn from_signature(signature: &Signature) -> syn::Result<ProviderDescriptor> {
    if let Some(asyncness) = &signature.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "providers must not be async"));
    }
    if !signature.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&signature.generics, "providers must not be generic"));
    }
    if let Some(variadic) = &signature.variadic {
        return Err(syn::Error::new_spanned(variadic, "providers must not be variadic"));
    }

    let params = signature.inputs
        .iter()
        .map(|arg| match arg {
            FnArg::Typed(arg) => Ok(type_ref(&arg.ty)),
            FnArg::Receiver(receiver) => Err(syn::Error::new_spanned(receiver, "providers must not take `self`"))
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let returns = match &signature.output {
        ReturnType::Default => Vec::new(),
        ReturnType::Type(_, ty) => return_types(ty)
    };

    Ok(ProviderDescriptor::from_parts(params, returns))
}

/// Classifies a single Rust type
pub fn type_ref(ty: &Type) -> TypeRef {
    match ty {
        Type::Paren(inner) => type_ref(&inner.elem),
        Type::Group(inner) => type_ref(&inner.elem),
        Type::Path(path) if path.qself.is_none() => path_type_ref(&path.path, ty),
        Type::TraitObject(object) => trait_object_ref(&object.bounds, ty),
        Type::ImplTrait(bounds) if has_fn_bound(&bounds.bounds) => unnamed(TypeKind::Func, ty),
        Type::BareFn(_) => unnamed(TypeKind::Func, ty),
        Type::Reference(_) => unnamed(TypeKind::Reference, ty),
        Type::Slice(_) | Type::Array(_) => unnamed(TypeKind::Slice, ty),
        Type::Tuple(_) => unnamed(TypeKind::Tuple, ty),
        _ => unnamed(TypeKind::Other, ty)
    }
}

fn return_types(ty: &Type) -> Vec<TypeRef> {
    match ty {
        Type::Paren(inner) => return_types(&inner.elem),
        Type::Group(inner) => return_types(&inner.elem),
        Type::Tuple(tuple) => tuple.elems.iter().map(type_ref).collect(),
        Type::Path(path) if path.qself.is_none() => match result_parts(&path.path) {
            Some((ok, err)) => vec![type_ref(ok), err],
            None => vec![type_ref(ty)]
        },
        _ => vec![type_ref(ty)]
    }
}

fn result_parts(path: &Path) -> Option<(&Type, TypeRef)> {
    let last = path.segments.last()?;
    if last.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };

    let mut types = args.args
        .iter()
        .filter_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None
        });

    let ok = types.next()?;
    let err = match types.next() {
        Some(err) => TypeRef::error(compact(err)),
        // `io::Result<T>` style aliases take the `Error` of their module
        None => TypeRef::error(qualified_name(&module_path(path), "Error"))
    };
    Some((ok, err))
}

fn path_type_ref(path: &Path, ty: &Type) -> TypeRef {
    let Some(last) = path.segments.last() else {
        return unnamed(TypeKind::Other, ty);
    };
    let name = last.ident.to_string();
    let args = match &last.arguments {
        PathArguments::None => None,
        PathArguments::AngleBracketed(args) => Some(args),
        PathArguments::Parenthesized(_) => return unnamed(TypeKind::Func, ty)
    };

    let kind = match name.as_str() {
        n if PRIMITIVES.contains(&n) => TypeKind::Primitive,
        n if SEQUENCES.contains(&n) => TypeKind::Slice,
        n if MAPS.contains(&n) => TypeKind::Map,
        "Arc" | "Rc" => match args.and_then(single_type_arg) {
            Some(elem) => {
                let wrapper_path = if name == "Arc" { "std::sync" } else { "std::rc" };
                return TypeRef::pointer(wrapper_path, name, type_ref(elem));
            },
            None => TypeKind::Generic
        },
        "Box" if args.and_then(single_type_arg).is_some_and(is_fn_object) => TypeKind::Func,
        "Self" => TypeKind::Other,
        _ => TypeKind::Struct
    };

    // generic arguments stay part of the name: `Pool<Postgres>` is not `Pool<MySql>`
    match kind {
        TypeKind::Struct => TypeRef::structure(module_path(path), compact(last)),
        kind => unnamed(kind, ty)
    }
}

fn trait_object_ref(bounds: &Punctuated<TypeParamBound, Token![+]>, ty: &Type) -> TypeRef {
    if has_fn_bound(bounds) {
        return unnamed(TypeKind::Func, ty);
    }

    let principal = bounds
        .iter()
        .position(|bound| matches!(bound, TypeParamBound::Trait(_)));
    let Some(TypeParamBound::Trait(principal_bound)) = principal.map(|i| &bounds[i]) else {
        return unnamed(TypeKind::Other, ty);
    };

    let path = &principal_bound.path;
    let Some(last) = path.segments.last() else {
        return unnamed(TypeKind::Other, ty);
    };
    if matches!(last.arguments, PathArguments::Parenthesized(_)) {
        return unnamed(TypeKind::Other, ty);
    }

    // auto traits and lifetimes are part of the type: `dyn Cache + Send` is not `dyn Cache`,
    // but their order is not: `dyn Cache + Send + Sync` is `dyn Cache + Sync + Send`
    let mut extra = bounds
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != principal)
        .map(|(_, bound)| compact(bound))
        .collect::<Vec<_>>();
    extra.sort();

    let mut name = compact(last);
    for bound in extra {
        name.push_str(" + ");
        name.push_str(&bound);
    }

    TypeRef::interface(module_path(path), name)
}

fn has_fn_bound(bounds: &Punctuated<TypeParamBound, Token![+]>) -> bool {
    bounds.iter().any(|bound| match bound {
        TypeParamBound::Trait(bound) => bound.path.segments
            .last()
            .is_some_and(|last| FN_TRAITS.iter().any(|f| last.ident == f)),
        _ => false
    })
}

fn is_fn_object(ty: &Type) -> bool {
    matches!(ty, Type::TraitObject(object) if has_fn_bound(&object.bounds))
}

fn single_type_arg(args: &AngleBracketedGenericArguments) -> Option<&Type> {
    match args.args.first() {
        Some(GenericArgument::Type(ty)) if args.args.len() == 1 => Some(ty),
        _ => None
    }
}

fn module_path(path: &Path) -> String {
    let segments = path.segments.len().saturating_sub(1);
    let module = path.segments
        .iter()
        .take(segments)
        .map(|segment| segment.ident.to_string())
        .collect::<Vec<_>>()
        .join("::");

    if path.leading_colon.is_some() && !module.is_empty() {
        format!("::{module}")
    } else {
        module
    }
}

#[inline]
fn unnamed(kind: TypeKind, ty: &Type) -> TypeRef {
    TypeRef::new(kind, "", compact(ty))
}

/// Prints tokens the way they are usually written by hand
fn compact<T: ToTokens>(tokens: &T) -> String {
    tokens
        .to_token_stream()
        .to_string()
        .replace(" :: ", "::")
        .replace(":: ", "::")
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace("& ", "&")
}

#[cfg(test)]
mod tests {
    use super::{parse_signature, type_ref};
    use crate::types::{TypeDescriptor, TypeKind, identity};

    fn kind_of(ty: &str) -> TypeKind {
        let ty: syn::Type = syn::parse_str(ty).unwrap();
        type_ref(&ty).kind()
    }

    fn identity_of(ty: &str) -> String {
        let ty: syn::Type = syn::parse_str(ty).unwrap();
        identity(&type_ref(&ty)).to_string()
    }

    #[test]
    fn it_parses_provider_without_dependencies() {
        let provider = parse_signature("fn new_config() -> crate::config::Config").unwrap();

        assert!(provider.params().is_empty());
        assert_eq!(provider.returns().len(), 1);
        assert_eq!(identity(&provider.returns()[0]).as_str(), "crate::config::Config");
    }

    #[test]
    fn it_accepts_trailing_semicolon() {
        let provider = parse_signature("fn new_config() -> Config;").unwrap();

        assert_eq!(provider.returns().len(), 1);
    }

    #[test]
    fn it_splits_result_into_value_and_error() {
        let provider = parse_signature(
            "fn new_pool(config: Arc<crate::config::Config>) -> Result<Arc<crate::db::Pool>, std::io::Error>"
        ).unwrap();

        let returns = provider.returns();
        assert_eq!(returns.len(), 2);
        assert_eq!(identity(&returns[0]).as_str(), "Arc<crate::db::Pool>");
        assert!(returns[1].is_error());
        assert_eq!(returns[1].name(), "std::io::Error");
    }

    #[test]
    fn it_infers_error_of_result_alias() {
        let provider = parse_signature("fn load() -> std::io::Result<Loader>").unwrap();

        assert_eq!(provider.returns()[1].name(), "std::io::Error");
    }

    #[test]
    fn it_prints_boxed_error_compactly() {
        let provider = parse_signature(
            "fn load() -> Result<Loader, Box<dyn std::error::Error + Send + Sync>>"
        ).unwrap();

        assert_eq!(provider.returns()[1].name(), "Box<dyn std::error::Error + Send + Sync>");
    }

    #[test]
    fn it_reads_unit_as_no_value() {
        assert!(parse_signature("fn nothing()").unwrap().returns().is_empty());
        assert!(parse_signature("fn nothing() -> ()").unwrap().returns().is_empty());
    }

    #[test]
    fn it_reads_tuple_as_several_values() {
        let provider = parse_signature("fn pair() -> (Left, Right, Third)").unwrap();

        assert_eq!(provider.returns().len(), 3);
    }

    #[test]
    fn it_classifies_types() {
        assert_eq!(kind_of("u32"), TypeKind::Primitive);
        assert_eq!(kind_of("std::string::String"), TypeKind::Primitive);
        assert_eq!(kind_of("Vec<u8>"), TypeKind::Slice);
        assert_eq!(kind_of("[u8]"), TypeKind::Slice);
        assert_eq!(kind_of("[u8; 4]"), TypeKind::Slice);
        assert_eq!(kind_of("HashMap<String, u8>"), TypeKind::Map);
        assert_eq!(kind_of("fn(u8) -> u8"), TypeKind::Func);
        assert_eq!(kind_of("Box<dyn Fn()>"), TypeKind::Func);
        assert_eq!(kind_of("&Config"), TypeKind::Reference);
        assert_eq!(kind_of("(A, B)"), TypeKind::Tuple);
        assert_eq!(kind_of("Arc<Config, Extra>"), TypeKind::Generic);
        assert_eq!(kind_of("Arc<Config>"), TypeKind::Pointer);
        assert_eq!(kind_of("dyn Cache"), TypeKind::Interface);
        assert_eq!(kind_of("crate::app::Config"), TypeKind::Struct);
    }

    #[test]
    fn it_canonicalizes_pointer_paths() {
        assert_eq!(identity_of("std::sync::Arc<crate::db::Pool>"), "Arc<crate::db::Pool>");
        assert_eq!(identity_of("Arc<crate::db::Pool>"), "Arc<crate::db::Pool>");
        assert_eq!(identity_of("Rc<Pool>"), "Rc<Pool>");
    }

    #[test]
    fn it_keeps_extra_trait_object_bounds() {
        assert_eq!(
            identity_of("Arc<dyn crate::cache::Cache + Send + Sync>"),
            "Arc<dyn crate::cache::Cache + Send + Sync>"
        );
        assert_ne!(identity_of("Arc<dyn Cache + Send>"), identity_of("Arc<dyn Cache>"));
    }

    #[test]
    fn it_ignores_order_of_extra_bounds() {
        assert_eq!(
            identity_of("Arc<dyn crate::cache::Cache + Sync + Send>"),
            identity_of("Arc<dyn crate::cache::Cache + Send + Sync>")
        );
        assert_eq!(
            identity_of("Arc<dyn Cache + 'static + Sync + Send>"),
            "Arc<dyn Cache + 'static + Send + Sync>"
        );
    }

    #[test]
    fn it_keeps_generic_arguments_of_named_types() {
        let pool = type_ref(&syn::parse_str("sqlx::Pool<sqlx::Postgres>").unwrap());

        assert_eq!(pool.kind(), TypeKind::Struct);
        assert_eq!(pool.package_path(), "sqlx");
        assert_eq!(pool.name(), "Pool<sqlx::Postgres>");
        assert_eq!(identity_of("Arc<sqlx::Pool<sqlx::Postgres>>"), "Arc<sqlx::Pool<sqlx::Postgres>>");
        assert_ne!(identity_of("sqlx::Pool<sqlx::Postgres>"), identity_of("sqlx::Pool<sqlx::MySql>"));
        assert_eq!(identity_of("Arc<dyn crate::repo::Repo<User> + Send>"), "Arc<dyn crate::repo::Repo<User> + Send>");
    }

    #[test]
    fn it_rejects_methods() {
        assert!(parse_signature("fn build(&self) -> Config").is_err());
    }

    #[test]
    fn it_rejects_generic_and_async_providers() {
        assert!(parse_signature("fn build<T>() -> Config").is_err());
        assert!(parse_signature("async fn build() -> Config").is_err());
    }

    #[test]
    fn it_rejects_malformed_signature() {
        assert!(parse_signature("struct Config;").is_err());
        assert!(parse_signature("fn (").is_err());
    }
}
