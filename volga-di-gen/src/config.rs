//! Generator configuration

use crate::error::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_PACKAGE_NAME: &str = "di";
const DEFAULT_CONTAINER_NAME: &str = "Container";
const DEFAULT_OUTPUT: &str = ".";

/// Where the container template comes from
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSource {
    /// The template compiled into this crate
    #[default]
    Default,
    /// A template passed as a string
    Inline(String),
    /// A template read from a file
    File(PathBuf)
}

/// Represents a container generation configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Name of the generated module, also used as the output file name
    ///
    /// Default: `di`
    package_name: String,

    /// Name of the generated container type
    ///
    /// Default: `Container`
    container_name: String,

    /// Template used to render the container
    ///
    /// Default: [`TemplateSource::Default`]
    template: TemplateSource,

    /// Directory the generated file is written to
    ///
    /// Default: `.`
    output: PathBuf
}

impl Default for GeneratorConfig {
    #[inline]
    fn default() -> Self {
        Self {
            package_name: DEFAULT_PACKAGE_NAME.into(),
            container_name: DEFAULT_CONTAINER_NAME.into(),
            template: TemplateSource::Default,
            output: PathBuf::from(DEFAULT_OUTPUT)
        }
    }
}

impl GeneratorConfig {
    /// Creates a default generator configuration
    ///
    /// Defaults:
    /// - package_name: `di`
    /// - container_name: `Container`
    /// - template: built-in
    /// - output: `.`
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the generated module name
    ///
    /// Default: `di`
    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = name.into();
        self
    }

    /// Sets the generated container type name
    ///
    /// Default: `Container`
    pub fn with_container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = name.into();
        self
    }

    /// Sets the template used to render the container
    ///
    /// # Example
    /// ```no_run
    /// use volga_di_gen::{GeneratorConfig, TemplateSource};
    ///
    /// let config = GeneratorConfig::new()
    ///     .with_template(TemplateSource::File("templates/container.rs.hbs".into()));
    /// ```
    pub fn with_template(mut self, template: TemplateSource) -> Self {
        self.template = template;
        self
    }

    /// Sets the output directory
    ///
    /// Default: `.`
    pub fn with_output(mut self, output: impl AsRef<Path>) -> Self {
        self.output = output.as_ref().to_path_buf();
        self
    }

    /// Generated module name
    #[inline]
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Generated container type name
    #[inline]
    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    /// Template source
    #[inline]
    pub fn template(&self) -> &TemplateSource {
        &self.template
    }

    /// Output directory
    #[inline]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Resolves relative paths against `base`
    pub(crate) fn relative_to(mut self, base: &Path) -> Self {
        if self.output.is_relative() {
            self.output = base.join(&self.output);
        }
        if let TemplateSource::File(path) = &mut self.template
            && path.is_relative() {
            *path = base.join(&*path);
        }
        self
    }

    /// Checks that names can be used in generated code
    pub fn validate(&self) -> Result<(), Error> {
        if !is_ident(&self.package_name) {
            return Err(Error::InvalidPackageName(self.package_name.clone()));
        }
        if !is_ident(&self.container_name) {
            return Err(Error::InvalidContainerName(self.container_name.clone()));
        }
        Ok(())
    }
}

/// Returns `true` if `value` is a non-keyword Rust identifier
#[inline]
pub(crate) fn is_ident(value: &str) -> bool {
    syn::parse_str::<syn::Ident>(value).is_ok()
}
