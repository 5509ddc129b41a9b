//! Compile-time dependency injection container generator
//!
//! Takes a set of named providers, wires them into a dependency graph keyed
//! by the produced types, orders the graph so that every dependency is built
//! before its dependents, and emits a Rust module with a container that
//! calls each provider exactly once.
//!
//! # Example
//! ```no_run
//! use volga_di_gen::{ProviderDescriptor, generate};
//!
//! # fn main() -> Result<(), volga_di_gen::Error> {
//! let providers = [
//!     ("Pool", "fn pool() -> Result<Arc<crate::db::Pool>, std::io::Error>"),
//!     ("Repo", "fn repo(pool: Arc<crate::db::Pool>) -> crate::repo::Repo"),
//! ];
//! let providers = providers
//!     .into_iter()
//!     .map(|(name, sig)| sig.parse::<ProviderDescriptor>().map(|provider| (name, provider)))
//!     .collect::<Result<Vec<_>, syn::Error>>()
//!     .expect("valid signatures");
//!
//! // writes src/generated/di.rs
//! generate(providers, "src/generated")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

pub mod config;
pub mod error;
pub mod manifest;
pub mod model;
pub mod output;
pub mod registry;
pub mod render;
pub mod types;
mod provider;

pub use config::{GeneratorConfig, TemplateSource};
pub use error::Error;
pub use manifest::Manifest;
pub use model::GenerationModel;
pub use provider::ProviderDescriptor;
pub use registry::{Registry, ServiceDescriptor};
pub use types::{TypeDescriptor, TypeIdentity, TypeKind, TypeRef};

/// Generates a container module named `di` into the `output` directory
///
/// See [`generate_with_config`].
pub fn generate<I, N, D>(providers: I, output: impl AsRef<Path>) -> Result<PathBuf, Error>
where
    I: IntoIterator<Item = (N, ProviderDescriptor<D>)>,
    N: Into<String>,
    D: TypeDescriptor
{
    let config = GeneratorConfig::default().with_output(output);
    generate_with_config(&config, providers)
}

/// Generates a container module and writes it to
/// `<output>/<package_name>.rs`.
///
/// Returns the path of the written file.
///
/// # Errors
/// Any invalid provider, missing dependency, cycle or template error
/// is reported before the file is touched.
pub fn generate_with_config<I, N, D>(config: &GeneratorConfig, providers: I) -> Result<PathBuf, Error>
where
    I: IntoIterator<Item = (N, ProviderDescriptor<D>)>,
    N: Into<String>,
    D: TypeDescriptor
{
    let source = render(config, providers)?;
    output::write_source(config.output(), config.package_name(), &source)
}

/// Builds the ordered generation model without rendering or writing anything
pub fn generate_model<I, N, D>(config: &GeneratorConfig, providers: I) -> Result<GenerationModel, Error>
where
    I: IntoIterator<Item = (N, ProviderDescriptor<D>)>,
    N: Into<String>,
    D: TypeDescriptor
{
    let registry = Registry::build(providers)?;
    GenerationModel::assemble(registry, config)
}

/// Renders the container module source without writing it
pub fn render<I, N, D>(config: &GeneratorConfig, providers: I) -> Result<String, Error>
where
    I: IntoIterator<Item = (N, ProviderDescriptor<D>)>,
    N: Into<String>,
    D: TypeDescriptor
{
    let renderer = render::Renderer::new(config.template())?;
    let model = generate_model(config, providers)?;
    renderer.render(&model)
}

/// Reads a JSON [`Manifest`] and generates the container it describes
pub fn generate_from_manifest(path: impl AsRef<Path>) -> Result<PathBuf, Error> {
    let manifest = Manifest::from_path(path)?;
    let providers = manifest.descriptors()?;
    generate_with_config(manifest.config(), providers)
}
