//! JSON manifest declaring providers and generator settings
//!
//! # Example
//! ```json
//! {
//!     "package_name": "di",
//!     "output": "src/generated",
//!     "providers": [
//!         { "name": "Pool", "provider": "fn pool() -> Result<Arc<crate::db::Pool>, std::io::Error>" },
//!         { "name": "Repo", "provider": "fn repo(pool: Arc<crate::db::Pool>) -> crate::repo::Repo" }
//!     ]
//! }
//! ```
//!
//! Every [`GeneratorConfig`] field is optional. Relative `output` and
//! template file paths are resolved against the manifest directory.

use crate::{config::GeneratorConfig, error::Error, provider::ProviderDescriptor};
use serde::Deserialize;
use std::{fs, path::Path};

/// A provider declared by name and Rust function signature
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderEntry {
    name: String,
    provider: String
}

impl ProviderEntry {
    /// Creates a provider entry
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into()
        }
    }

    /// Provider name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider signature, e.g. `fn pool() -> Arc<crate::db::Pool>`
    #[inline]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Parses the provider signature
    pub fn descriptor(&self) -> Result<ProviderDescriptor, Error> {
        self.provider
            .parse()
            .map_err(|err: syn::Error| Error::InvalidSignature {
                provider: self.name.clone(),
                message: err.to_string()
            })
    }
}

/// Generator settings and providers read from a JSON document
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(flatten)]
    config: GeneratorConfig,
    #[serde(default)]
    providers: Vec<ProviderEntry>
}

impl Manifest {
    /// Parses a manifest from a JSON string
    #[inline]
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(Error::from)
    }

    /// Reads a manifest file, resolving relative paths against its directory
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let manifest = Self::from_json(&fs::read_to_string(path)?)?;

        tracing::debug!(
            path = %path.display(),
            providers = manifest.providers.len(),
            "manifest loaded"
        );

        let base = path.parent().unwrap_or(Path::new(""));
        Ok(Self {
            config: manifest.config.relative_to(base),
            providers: manifest.providers
        })
    }

    /// Generator settings
    #[inline]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Declared providers in manifest order
    #[inline]
    pub fn providers(&self) -> &[ProviderEntry] {
        &self.providers
    }

    /// Parses every provider signature
    ///
    /// # Errors
    /// Fails on the first signature that cannot be parsed.
    pub fn descriptors(&self) -> Result<Vec<(String, ProviderDescriptor)>, Error> {
        self.providers
            .iter()
            .map(|entry| Ok((entry.name.clone(), entry.descriptor()?)))
            .collect()
    }
}
