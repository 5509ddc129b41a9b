//! Service registry
//!
//! Turns named provider descriptors into [`ServiceDescriptor`]s and the
//! dependency graph between their produced types.
//!
//! Providers are processed in name order, so both the registry contents
//! and the first reported error do not depend on the order the caller
//! supplied them in.

use crate::{
    config::is_ident,
    error::Error,
    provider::ProviderDescriptor,
    types::{TypeDescriptor, TypeIdentity, TypeRef, identity, is_eligible, strip_pointer}
};
use heck::ToSnakeCase;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use volga_di_graph::DiGraph;

/// Generated code names the provider closure of a service `provide_<ident>`
const PROVIDER_PREFIX: &str = "provide_";

/// A registered service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDescriptor {
    /// Caller supplied name
    name: String,

    /// Identifier used for the service in generated code
    ident: String,

    /// Identity of the produced type
    produced_type: TypeIdentity,

    /// Identities of the dependencies, in parameter order
    parameters: Vec<TypeIdentity>,

    /// Whether the provider can fail
    returns_error: bool,

    /// Names of the services passed as arguments, in parameter order
    dependency_args: Vec<String>,

    /// Module the produced type is declared in
    package_path: String,

    #[serde(skip)]
    produced: TypeRef,
    #[serde(skip)]
    param_types: Vec<TypeRef>,
    #[serde(skip)]
    error: Option<TypeRef>,

    // filled in once import aliases are known
    type_expr: String,
    param_exprs: Vec<String>,
    error_expr: Option<String>,
    arg_idents: Vec<String>
}

impl ServiceDescriptor {
    /// Caller supplied name of the service
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the service in generated code
    #[inline]
    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// Identity of the produced type
    #[inline]
    pub fn produced_type(&self) -> &TypeIdentity {
        &self.produced_type
    }

    /// Identities of the dependencies in parameter order
    #[inline]
    pub fn parameters(&self) -> &[TypeIdentity] {
        &self.parameters
    }

    /// Returns `true` if the provider returns an error that must be checked
    #[inline]
    pub fn returns_error(&self) -> bool {
        self.returns_error
    }

    /// Names of the services passed to the provider, matching [`Self::parameters`]
    #[inline]
    pub fn dependency_args(&self) -> &[String] {
        &self.dependency_args
    }

    /// Module the produced type is declared in
    #[inline]
    pub fn package_path(&self) -> &str {
        &self.package_path
    }

    /// Produced type as written in generated code
    #[inline]
    pub fn type_expr(&self) -> &str {
        &self.type_expr
    }

    /// Parameter types as written in generated code
    #[inline]
    pub fn param_exprs(&self) -> &[String] {
        &self.param_exprs
    }

    /// Error type as written in generated code
    #[inline]
    pub fn error_expr(&self) -> Option<&str> {
        self.error_expr.as_deref()
    }

    #[inline]
    pub(crate) fn produced(&self) -> &TypeRef {
        &self.produced
    }

    #[inline]
    pub(crate) fn param_types(&self) -> &[TypeRef] {
        &self.param_types
    }

    #[inline]
    pub(crate) fn error(&self) -> Option<&TypeRef> {
        self.error.as_ref()
    }

    pub(crate) fn set_exprs(
        &mut self,
        type_expr: String,
        param_exprs: Vec<String>,
        error_expr: Option<String>,
        arg_idents: Vec<String>
    ) {
        self.type_expr = type_expr;
        self.param_exprs = param_exprs;
        self.error_expr = error_expr;
        self.arg_idents = arg_idents;
    }
}

/// Registered services keyed by their produced type,
/// together with the dependency graph between them
#[derive(Debug)]
pub struct Registry {
    services: BTreeMap<TypeIdentity, ServiceDescriptor>,
    graph: DiGraph<TypeIdentity>
}

impl Registry {
    /// Validates providers and builds the registry.
    ///
    /// # Errors
    /// Fails on the first invalid name, malformed provider shape, ineligible type,
    /// duplicate produced type or dependency without a provider.
    ///
    /// # Example
    /// ```
    /// use volga_di_gen::{ProviderDescriptor, Registry};
    ///
    /// let registry = Registry::build([
    ///     ("Config", "fn new_config() -> Arc<crate::Config>".parse::<ProviderDescriptor>().unwrap()),
    ///     ("Server", "fn new_server(config: Arc<crate::Config>) -> crate::Server".parse().unwrap()),
    /// ]).unwrap();
    ///
    /// let server = registry.by_name("Server").unwrap();
    /// assert_eq!(server.dependency_args(), ["Config"]);
    /// ```
    pub fn build<I, N, D>(providers: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (N, ProviderDescriptor<D>)>,
        N: Into<String>,
        D: TypeDescriptor
    {
        let mut providers = providers
            .into_iter()
            .map(|(name, provider)| (name.into(), provider))
            .collect::<Vec<(String, ProviderDescriptor<D>)>>();
        providers.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut registry = Self {
            services: BTreeMap::new(),
            graph: DiGraph::new()
        };
        let mut idents = HashMap::<String, String>::with_capacity(providers.len());

        for (name, provider) in providers {
            let ident = service_ident(&name, &idents)?;
            let service = registry.register(name, ident.clone(), &provider)?;
            idents.insert(ident, service);
        }
        check_provider_names(&idents)?;

        registry.resolve()?;
        Ok(registry)
    }

    fn register<D: TypeDescriptor>(
        &mut self,
        name: String,
        ident: String,
        provider: &ProviderDescriptor<D>
    ) -> Result<String, Error> {
        let returns = provider.returns();
        let error = match returns {
            [] => return Err(Error::NoReturnValue(name)),
            [_] => None,
            [_, err] if err.is_error() => Some(TypeRef::of(err)),
            [_, _] => return Err(Error::SecondReturnNotError(name)),
            _ => return Err(Error::TooManyReturnValues { provider: name, count: returns.len() })
        };

        let produced = &returns[0];
        let produced_type = identity(produced);
        if !is_eligible(produced) {
            return Err(Error::IneligibleReturn {
                provider: name,
                kind: strip_pointer(produced).kind(),
                ty: produced_type.to_string()
            });
        }

        self.graph.add_vertex(produced_type.clone());

        let mut parameters = Vec::with_capacity(provider.params().len());
        for (index, param) in provider.params().iter().enumerate() {
            let param_type = identity(param);
            if !is_eligible(param) {
                return Err(Error::IneligibleParameter {
                    provider: name,
                    index,
                    kind: strip_pointer(param).kind(),
                    ty: param_type.to_string()
                });
            }
            tracing::trace!(provider = %name, from = %produced_type, to = %param_type, "dependency edge");
            self.graph.add_edge(produced_type.clone(), param_type.clone());
            parameters.push(param_type);
        }

        if let Some(existing) = self.services.get(&produced_type) {
            return Err(Error::DuplicateProducer {
                ty: produced_type.to_string(),
                existing: existing.name.clone(),
                provider: name
            });
        }

        tracing::debug!(
            provider = %name,
            produces = %produced_type,
            dependencies = parameters.len(),
            fallible = error.is_some(),
            "provider registered"
        );

        let service = ServiceDescriptor {
            package_path: strip_pointer(produced).package_path().to_owned(),
            produced: TypeRef::of(produced),
            param_types: provider.params().iter().map(TypeRef::of).collect(),
            returns_error: error.is_some(),
            dependency_args: Vec::with_capacity(parameters.len()),
            type_expr: String::new(),
            param_exprs: Vec::new(),
            error_expr: None,
            arg_idents: Vec::new(),
            produced_type: produced_type.clone(),
            name: name.clone(),
            parameters,
            ident,
            error
        };
        self.services.insert(produced_type, service);
        Ok(name)
    }

    /// Maps every dependency to the name of the service producing it
    fn resolve(&mut self) -> Result<(), Error> {
        let producers = self.services
            .iter()
            .map(|(ty, service)| (ty.clone(), service.name.clone()))
            .collect::<HashMap<_, _>>();

        for service in self.services.values_mut() {
            for (index, dependency) in service.parameters.iter().enumerate() {
                let Some(producer) = producers.get(dependency) else {
                    return Err(Error::UnregisteredDependency {
                        provider: service.name.clone(),
                        dependency: dependency.to_string(),
                        index
                    });
                };
                service.dependency_args.push(producer.clone());
            }
        }
        Ok(())
    }

    /// Number of registered services
    #[inline]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Returns the service producing `ty`
    #[inline]
    pub fn get(&self, ty: &str) -> Option<&ServiceDescriptor> {
        self.services.get(ty)
    }

    /// Returns the service registered under `name`
    pub fn by_name(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services
            .values()
            .find(|service| service.name == name)
    }

    /// Iterates over services ordered by produced type
    #[inline]
    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.values()
    }

    /// Dependency graph between produced types
    #[inline]
    pub fn graph(&self) -> &DiGraph<TypeIdentity> {
        &self.graph
    }

    #[inline]
    pub(crate) fn into_parts(self) -> (BTreeMap<TypeIdentity, ServiceDescriptor>, DiGraph<TypeIdentity>) {
        (self.services, self.graph)
    }
}

/// Derives the identifier of a service and checks it is unique
fn service_ident(name: &str, idents: &HashMap<String, String>) -> Result<String, Error> {
    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    let ident = name.to_snake_case();
    if !is_ident(&ident) {
        return Err(Error::InvalidName { provider: name.into(), ident });
    }

    match idents.get(&ident) {
        Some(other) if other == name => Err(Error::DuplicateName(name.into())),
        Some(other) => Err(Error::NameCollision {
            first: other.clone(),
            second: name.into(),
            ident
        }),
        None => Ok(ident)
    }
}

/// Rejects a service whose identifier is the provider closure name of another,
/// e.g. `ProvideA` next to `A`
fn check_provider_names(idents: &HashMap<String, String>) -> Result<(), Error> {
    let shadowed = idents
        .iter()
        .filter_map(|(ident, name)| {
            let target = ident.strip_prefix(PROVIDER_PREFIX)?;
            idents.get(target).map(|other| (other, name, ident))
        })
        .min();

    match shadowed {
        Some((first, second, ident)) => Err(Error::NameCollision {
            first: first.clone(),
            second: second.clone(),
            ident: ident.clone()
        }),
        None => Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::{error::Error, provider::ProviderDescriptor, types::{TypeDescriptor, TypeKind, TypeRef}};

    fn provider(signature: &str) -> ProviderDescriptor {
        signature.parse().unwrap()
    }

    #[test]
    fn it_registers_service_without_dependencies() {
        let registry = Registry::build([("A", provider("fn a() -> Arc<crate::x::X>"))]).unwrap();

        let a = registry.get("Arc<crate::x::X>").unwrap();

        assert_eq!(a.name(), "A");
        assert_eq!(a.ident(), "a");
        assert!(a.parameters().is_empty());
        assert!(!a.returns_error());
        assert_eq!(a.package_path(), "crate::x");
    }

    #[test]
    fn it_resolves_dependency_args() {
        let registry = Registry::build([
            ("B", provider("fn b(x: Arc<crate::x::X>) -> Arc<crate::y::Y>")),
            ("A", provider("fn a() -> Arc<crate::x::X>")),
        ]).unwrap();

        let b = registry.by_name("B").unwrap();

        assert_eq!(b.parameters()[0].as_str(), "Arc<crate::x::X>");
        assert_eq!(b.dependency_args(), ["A"]);
        assert_eq!(registry.graph().dependencies(b.produced_type()), b.parameters());
    }

    #[test]
    fn it_marks_fallible_provider() {
        let registry = Registry::build([
            ("A", provider("fn a() -> Result<Arc<crate::x::X>, std::io::Error>"))
        ]).unwrap();

        let a = registry.by_name("A").unwrap();

        assert!(a.returns_error());
        assert_eq!(a.error().unwrap().kind(), TypeKind::Error);
    }

    #[test]
    fn it_snake_cases_identifiers() {
        let registry = Registry::build([
            ("UserRepository", provider("fn repo() -> crate::Repo")),
            ("HTTPClient", provider("fn client() -> crate::Client")),
        ]).unwrap();

        assert_eq!(registry.by_name("UserRepository").unwrap().ident(), "user_repository");
        assert_eq!(registry.by_name("HTTPClient").unwrap().ident(), "http_client");
    }

    #[test]
    fn it_rejects_empty_name() {
        let err = Registry::build([("", provider("fn a() -> X"))]).unwrap_err();

        assert!(matches!(err, Error::EmptyName));
    }

    #[test]
    fn it_rejects_name_that_is_not_an_identifier() {
        let err = Registry::build([("type", provider("fn a() -> X"))]).unwrap_err();

        assert!(matches!(err, Error::InvalidName { .. }));
    }

    #[test]
    fn it_rejects_duplicate_name() {
        let err = Registry::build([
            ("A", provider("fn a() -> X")),
            ("A", provider("fn a() -> Y")),
        ]).unwrap_err();

        assert!(matches!(err, Error::DuplicateName(name) if name == "A"));
    }

    #[test]
    fn it_rejects_names_sharing_an_identifier() {
        let err = Registry::build([
            ("MyDb", provider("fn a() -> X")),
            ("my_db", provider("fn b() -> Y")),
        ]).unwrap_err();

        assert!(matches!(err, Error::NameCollision { ident, .. } if ident == "my_db"));
    }

    #[test]
    fn it_rejects_name_shadowing_provider_closure() {
        let err = Registry::build([
            ("ProvideA", provider("fn p() -> Arc<crate::y::Y>")),
            ("A", provider("fn a() -> Arc<crate::x::X>")),
        ]).unwrap_err();

        match err {
            Error::NameCollision { first, second, ident } => {
                assert_eq!(first, "A");
                assert_eq!(second, "ProvideA");
                assert_eq!(ident, "provide_a");
            },
            err => panic!("unexpected error: {err}")
        }
    }

    #[test]
    fn it_accepts_provide_prefix_without_shadowing() {
        let registry = Registry::build([
            ("ProvideConfig", provider("fn p() -> Arc<crate::x::X>")),
        ]).unwrap();

        assert_eq!(registry.by_name("ProvideConfig").unwrap().ident(), "provide_config");
    }

    #[test]
    fn it_rejects_provider_without_value() {
        let err = Registry::build([("A", provider("fn a()"))]).unwrap_err();

        assert!(matches!(err, Error::NoReturnValue(name) if name == "A"));
    }

    #[test]
    fn it_rejects_second_return_that_is_not_an_error() {
        let err = Registry::build([("A", provider("fn a() -> (X, Y)"))]).unwrap_err();

        assert!(matches!(err, Error::SecondReturnNotError(name) if name == "A"));
    }

    #[test]
    fn it_rejects_more_than_two_returns() {
        let err = Registry::build([("A", provider("fn a() -> (X, Y, Z)"))]).unwrap_err();

        assert!(matches!(err, Error::TooManyReturnValues { count: 3, .. }));
    }

    #[test]
    fn it_rejects_ineligible_produced_type() {
        let err = Registry::build([("A", provider("fn a() -> Vec<u8>"))]).unwrap_err();

        assert!(matches!(err, Error::IneligibleReturn { kind: TypeKind::Slice, .. }));
    }

    #[test]
    fn it_rejects_trait_object_produced_by_value() {
        let err = Registry::build([("C", provider("fn c() -> dyn crate::cache::Cache"))]).unwrap_err();

        assert!(matches!(err, Error::IneligibleReturn { kind: TypeKind::Interface, .. }));
    }

    #[test]
    fn it_rejects_trait_object_parameter_by_value() {
        let err = Registry::build([
            ("C", provider("fn c() -> Arc<dyn crate::cache::Cache>")),
            ("R", provider("fn r(cache: dyn crate::cache::Cache) -> crate::repo::Repo")),
        ]).unwrap_err();

        assert!(matches!(
            err,
            Error::IneligibleParameter { index: 0, kind: TypeKind::Interface, ref provider, .. } if provider == "R"
        ));
    }

    #[test]
    fn it_accepts_trait_object_behind_pointer() {
        let registry = Registry::build([
            ("C", provider("fn c() -> Arc<dyn crate::cache::Cache>")),
            ("R", provider("fn r(cache: Arc<dyn crate::cache::Cache>) -> crate::repo::Repo")),
        ]).unwrap();

        assert_eq!(registry.by_name("R").unwrap().dependency_args(), ["C"]);
    }

    #[test]
    fn it_rejects_ineligible_parameter_with_index() {
        let err = Registry::build([
            ("A", provider("fn a(x: X, port: u16) -> Y")),
            ("B", provider("fn b() -> X")),
        ]).unwrap_err();

        assert!(matches!(
            err,
            Error::IneligibleParameter { index: 1, kind: TypeKind::Primitive, ref provider, .. } if provider == "A"
        ));
    }

    #[test]
    fn it_rejects_duplicate_producer() {
        let err = Registry::build([
            ("B", provider("fn b() -> Arc<crate::X>")),
            ("A", provider("fn a() -> Arc<crate::X>")),
        ]).unwrap_err();

        match err {
            Error::DuplicateProducer { ty, existing, provider } => {
                assert_eq!(ty, "Arc<crate::X>");
                assert_eq!(existing, "A");
                assert_eq!(provider, "B");
            },
            err => panic!("unexpected error: {err}")
        }
    }

    #[test]
    fn it_rejects_unregistered_dependency() {
        let err = Registry::build([("B", provider("fn b(x: Arc<crate::X>) -> crate::Y"))]).unwrap_err();

        match err {
            Error::UnregisteredDependency { provider, dependency, index } => {
                assert_eq!(provider, "B");
                assert_eq!(dependency, "Arc<crate::X>");
                assert_eq!(index, 0);
            },
            err => panic!("unexpected error: {err}")
        }
    }

    #[test]
    fn it_does_not_match_value_and_pointer() {
        let err = Registry::build([
            ("A", provider("fn a() -> crate::X")),
            ("B", provider("fn b(x: Arc<crate::X>) -> crate::Y")),
        ]).unwrap_err();

        assert!(matches!(err, Error::UnregisteredDependency { .. }));
    }

    #[test]
    fn it_accepts_custom_descriptors() {
        let pool = TypeRef::arc(TypeRef::structure("crate::db", "Pool"));
        let registry = Registry::build([
            ("Pool", ProviderDescriptor::new().with_return(pool.clone())),
            ("Repo", ProviderDescriptor::new()
                .with_param(pool)
                .with_return(TypeRef::structure("crate::repo", "Repo"))
                .with_return(TypeRef::error("std::io::Error"))),
        ]).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.by_name("Repo").unwrap().returns_error());
    }
}
