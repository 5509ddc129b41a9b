//! Generation model
//!
//! The ordered, fully wired data handed to the renderer. Services come in
//! construction order: emitting them top to bottom never references a
//! service that has not been constructed yet.

use crate::{
    config::{GeneratorConfig, is_ident},
    error::Error,
    registry::{Registry, ServiceDescriptor},
    types::{TypeDescriptor, TypeKind, TypeRef, qualified_name, strip_pointer}
};
use serde::ser::{Serialize, Serializer, SerializeStruct};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Module paths that cannot be imported with a plain `use`
const PATH_ROOTS: &[&str] = &["crate", "self", "super"];

/// Names the default template uses itself
const RESERVED_ALIASES: &[&str] = &["std", "core", "alloc", "fmt", "StdError", "ProviderError"];

/// A module imported by the generated code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    path: String,
    alias: String
}

impl Import {
    /// Full module path, e.g. `crate::db`
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Local name of the module in generated code, e.g. `db`
    #[inline]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns `true` if the alias differs from the last path segment
    #[inline]
    pub fn is_renamed(&self) -> bool {
        last_segment(&self.path) != self.alias
    }

    /// Returns `true` if the module is reachable without a `use`,
    /// which is the case for crates imported under their own name
    #[inline]
    pub fn is_bare(&self) -> bool {
        !self.path.contains("::") && !self.is_renamed()
    }
}

impl Serialize for Import {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer
            .serialize_struct("Import", 4)?;

        state.serialize_field("path", &self.path)?;
        state.serialize_field("alias", &self.alias)?;
        state.serialize_field("renamed", &self.is_renamed())?;
        state.serialize_field("bare", &self.is_bare())?;
        state.end()
    }
}

/// Modules imported by the generated code, ordered by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    imports: BTreeMap<String, String>
}

impl ImportSet {
    /// Builds aliases for the given module paths.
    ///
    /// The alias is the last path segment. When several paths end with the
    /// same segment, each of them is aliased by joining all its segments
    /// with `_`, e.g. `crate::api::model` becomes `api_model`.
    ///
    /// Aliases are unique and never shadow the names the generated code
    /// uses itself, like `std` or `fmt`. A clashing alias keeps the path
    /// root (`crate_api_model`) and, if that is still taken, gets a
    /// numeric suffix.
    #[inline]
    pub fn from_paths<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a str>
    {
        Self::with_reserved(paths, std::iter::empty())
    }

    /// Same as [`ImportSet::from_paths`], also keeping aliases clear of `reserved`
    pub fn with_reserved<'a, I, R>(paths: I, reserved: R) -> Self
    where
        I: IntoIterator<Item = &'a str>,
        R: IntoIterator<Item = &'a str>
    {
        let paths = paths
            .into_iter()
            .filter(|path| !path.is_empty() && !PATH_ROOTS.contains(path))
            .collect::<BTreeSet<_>>();

        let mut segments = HashMap::<&str, usize>::new();
        for path in &paths {
            *segments.entry(last_segment(path)).or_default() += 1;
        }

        let preferred = paths
            .iter()
            .map(|path| {
                let alias = if segments[last_segment(path)] > 1 {
                    joined_alias(path)
                } else {
                    last_segment(path).to_owned()
                };
                if alias.is_empty() || PATH_ROOTS.contains(&alias.as_str()) {
                    rooted_alias(path)
                } else {
                    alias
                }
            })
            .collect::<Vec<_>>();

        let mut clashes = HashMap::<&str, usize>::new();
        for alias in &preferred {
            *clashes.entry(alias.as_str()).or_default() += 1;
        }

        let mut taken = RESERVED_ALIASES
            .iter()
            .copied()
            .chain(reserved)
            .map(str::to_owned)
            .collect::<HashSet<_>>();

        let mut imports = BTreeMap::new();
        for (path, alias) in paths.into_iter().zip(&preferred) {
            let mut alias = if clashes[alias.as_str()] > 1 || taken.contains(alias) {
                rooted_alias(path)
            } else {
                alias.clone()
            };

            let base = alias.clone();
            let mut n = 2;
            while taken.contains(&alias) {
                alias = format!("{base}_{n}");
                n += 1;
            }

            taken.insert(alias.clone());
            imports.insert(path.to_owned(), alias);
        }

        Self { imports }
    }

    /// Returns the alias of a module path
    #[inline]
    pub fn alias(&self, path: &str) -> Option<&str> {
        self.imports.get(path).map(String::as_str)
    }

    /// Iterates over imports ordered by path
    pub fn iter(&self) -> impl Iterator<Item = Import> + '_ {
        self.imports
            .iter()
            .map(|(path, alias)| Import { path: path.clone(), alias: alias.clone() })
    }

    /// Number of imported modules
    #[inline]
    pub fn len(&self) -> usize {
        self.imports.len()
    }

    /// Returns `true` if nothing is imported
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    /// Writes a type the way generated code refers to it
    pub fn qualify(&self, ty: &TypeRef) -> String {
        match (ty.kind(), ty.elem()) {
            (TypeKind::Pointer, Some(elem)) => format!(
                "{}<{}>",
                qualified_name(ty.package_path(), ty.name()),
                self.qualify(elem)
            ),
            (TypeKind::Interface, _) => format!("dyn {}", self.named(ty)),
            (TypeKind::Struct, _) => self.named(ty),
            _ => ty.name().to_owned()
        }
    }

    fn named(&self, ty: &TypeRef) -> String {
        match self.alias(ty.package_path()) {
            Some(alias) => format!("{alias}::{}", ty.name()),
            None => qualified_name(ty.package_path(), ty.name())
        }
    }
}

impl Serialize for ImportSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// The fully resolved data used to emit a container
#[derive(Debug, Clone, serde::Serialize)]
pub struct GenerationModel {
    package_name: String,
    container_name: String,
    imports: ImportSet,
    services: Vec<ServiceDescriptor>
}

impl GenerationModel {
    /// Orders the registry and wires every service.
    ///
    /// # Errors
    /// Fails if the configuration names are invalid
    /// or if services depend on each other in a cycle.
    pub fn assemble(registry: Registry, config: &GeneratorConfig) -> Result<Self, Error> {
        config.validate()?;

        let (mut services, graph) = registry.into_parts();
        let order = graph
            .sort_by(|a, b| a.cmp(b))
            .map_err(|cycle| {
                let names = cycle
                    .path()
                    .iter()
                    .map(|ty| services.get(ty).map_or_else(|| ty.to_string(), |s| s.name().to_owned()))
                    .collect();
                Error::CyclicDependency(names)
            })?;

        // crates named by error types are used unqualified
        let reserved = services
            .values()
            .filter_map(ServiceDescriptor::error)
            .filter_map(|err| root_segment(err.name()))
            .chain([config.container_name()]);
        let imports = ImportSet::with_reserved(
            services.values().map(|service| strip_pointer(service.produced()).package_path()),
            reserved
        );
        let idents = services
            .values()
            .map(|service| (service.name().to_owned(), service.ident().to_owned()))
            .collect::<HashMap<_, _>>();

        // every edge target has a producer once the registry is built
        let services = order
            .into_iter()
            .filter_map(|ty| services.remove(&ty))
            .map(|mut service| {
                let type_expr = imports.qualify(service.produced());
                let param_exprs = service.param_types()
                    .iter()
                    .map(|ty| imports.qualify(ty))
                    .collect();
                let error_expr = service.error().map(|err| imports.qualify(err));
                let arg_idents = service.dependency_args()
                    .iter()
                    .filter_map(|name| idents.get(name).cloned())
                    .collect();

                tracing::debug!(
                    service = %service.name(),
                    ty = %type_expr,
                    dependencies = ?service.dependency_args(),
                    "service ordered"
                );

                service.set_exprs(type_expr, param_exprs, error_expr, arg_idents);
                service
            })
            .collect();

        Ok(Self {
            package_name: config.package_name().to_owned(),
            container_name: config.container_name().to_owned(),
            imports,
            services
        })
    }

    /// Name of the generated module
    #[inline]
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Name of the generated container type
    #[inline]
    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    /// Modules imported by the generated code
    #[inline]
    pub fn imports(&self) -> &ImportSet {
        &self.imports
    }

    /// Services in construction order
    #[inline]
    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// Service names in construction order
    pub fn order(&self) -> Vec<&str> {
        self.services
            .iter()
            .map(ServiceDescriptor::name)
            .collect()
    }
}

#[inline]
fn last_segment(path: &str) -> &str {
    path.rsplit("::")
        .next()
        .unwrap_or(path)
}

fn joined_alias(path: &str) -> String {
    path.split("::")
        .filter(|segment| !segment.is_empty() && !PATH_ROOTS.contains(segment))
        .collect::<Vec<_>>()
        .join("_")
}

fn rooted_alias(path: &str) -> String {
    path.split("::")
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// First segment of a path expression, e.g. `anyhow` in `anyhow::Error`
fn root_segment(expr: &str) -> Option<&str> {
    expr.split_once("::")
        .map(|(root, _)| root)
        .filter(|root| is_ident(root))
}
