//! Describes container generation errors

use crate::types::TypeKind;
use handlebars::{RenderError, TemplateError};
use std::{
    fmt::{Display, Formatter},
    io::Error as IoError,
    error::Error as StdError
};

/// An error that stops container generation.
///
/// Every error is a configuration mistake detected before any output is written.
#[derive(Debug)]
pub enum Error {
    /// A provider was registered with an empty name
    EmptyName,
    /// A provider name does not produce a valid Rust identifier
    InvalidName {
        /// Provider name
        provider: String,
        /// Identifier derived from the name
        ident: String
    },
    /// The same provider name was registered twice
    DuplicateName(String),
    /// Two provider names map to the same identifier
    NameCollision {
        /// First provider name
        first: String,
        /// Second provider name
        second: String,
        /// The shared identifier
        ident: String
    },
    /// A provider signature could not be read
    InvalidSignature {
        /// Provider name
        provider: String,
        /// Parser message
        message: String
    },
    /// A provider returns nothing
    NoReturnValue(String),
    /// The second return value of a provider is not an error
    SecondReturnNotError(String),
    /// A provider returns more than two values
    TooManyReturnValues {
        /// Provider name
        provider: String,
        /// Number of returned values
        count: usize
    },
    /// A provider produces a type that cannot be a service
    IneligibleReturn {
        /// Provider name
        provider: String,
        /// Kind of the produced type
        kind: TypeKind,
        /// The produced type
        ty: String
    },
    /// A provider depends on a type that cannot be a service
    IneligibleParameter {
        /// Provider name
        provider: String,
        /// Position of the parameter
        index: usize,
        /// Kind of the parameter type
        kind: TypeKind,
        /// The parameter type
        ty: String
    },
    /// Two providers produce the same type
    DuplicateProducer {
        /// The produced type
        ty: String,
        /// Provider registered first
        existing: String,
        /// Provider registered second
        provider: String
    },
    /// A provider depends on a type no provider produces
    UnregisteredDependency {
        /// Provider name
        provider: String,
        /// Position of the parameter
        index: usize,
        /// The missing type
        dependency: String
    },
    /// Services depend on each other in a cycle
    CyclicDependency(Vec<String>),
    /// The package name is not a valid module name
    InvalidPackageName(String),
    /// The container name is not a valid type name
    InvalidContainerName(String),
    /// The template could not be compiled
    Template(Box<TemplateError>),
    /// The template could not be rendered
    Render(Box<RenderError>),
    /// A manifest could not be parsed
    Manifest(serde_json::Error),
    /// Reading or writing files failed
    Io(IoError)
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::EmptyName => f.write_str("Generator Error: provider name must not be empty"),
            Error::InvalidName { provider, ident } => write!(
                f,
                "Generator Error: provider name `{provider}` does not map to a valid identifier (got `{ident}`)"
            ),
            Error::DuplicateName(provider) => write!(
                f,
                "Generator Error: provider `{provider}` is registered more than once"
            ),
            Error::NameCollision { first, second, ident } => write!(
                f,
                "Generator Error: providers `{first}` and `{second}` both map to the identifier `{ident}`"
            ),
            Error::InvalidSignature { provider, message } => write!(
                f,
                "Generator Error: provider `{provider}` has an invalid signature: {message}"
            ),
            Error::NoReturnValue(provider) => write!(
                f,
                "Generator Error: provider `{provider}` must produce a value"
            ),
            Error::SecondReturnNotError(provider) => write!(
                f,
                "Generator Error: the second return value of provider `{provider}` must be an error"
            ),
            Error::TooManyReturnValues { provider, count } => write!(
                f,
                "Generator Error: provider `{provider}` returns {count} values, expected a value and an optional error"
            ),
            Error::IneligibleReturn { provider, kind, ty } => write!(
                f,
                "Generator Error: provider `{provider}` must return a struct or a trait object but returns {kind} `{ty}`"
            ),
            Error::IneligibleParameter { provider, index, kind, ty } => write!(
                f,
                "Generator Error: dependency at index {index} of provider `{provider}` must be a struct or a trait object but got {kind} `{ty}`"
            ),
            Error::DuplicateProducer { ty, existing, provider } => write!(
                f,
                "Generator Error: `{ty}` is produced by both `{existing}` and `{provider}`"
            ),
            Error::UnregisteredDependency { provider, index, dependency } => write!(
                f,
                "Generator Error: dependency `{dependency}` at index {index} of provider `{provider}` is not a registered service"
            ),
            Error::CyclicDependency(services) => write!(
                f,
                "Generator Error: cyclic dependency between services: {}",
                services.join(" -> ")
            ),
            Error::InvalidPackageName(name) => write!(
                f,
                "Generator Error: `{name}` is not a valid package name"
            ),
            Error::InvalidContainerName(name) => write!(
                f,
                "Generator Error: `{name}` is not a valid container name"
            ),
            Error::Template(err) => write!(f, "Generator Error: invalid template: {err}"),
            Error::Render(err) => write!(f, "Generator Error: unable to render the container: {err}"),
            Error::Manifest(err) => write!(f, "Generator Error: invalid manifest: {err}"),
            Error::Io(err) => write!(f, "Generator Error: {err}")
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Template(err) => Some(err.as_ref()),
            Error::Render(err) => Some(err.as_ref()),
            Error::Manifest(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None
        }
    }
}

impl From<IoError> for Error {
    #[inline]
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    #[inline]
    fn from(err: serde_json::Error) -> Self {
        Self::Manifest(err)
    }
}

impl From<TemplateError> for Error {
    #[inline]
    fn from(err: TemplateError) -> Self {
        Self::Template(Box::new(err))
    }
}

impl From<RenderError> for Error {
    #[inline]
    fn from(err: RenderError) -> Self {
        Self::Render(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use crate::types::TypeKind;

    #[test]
    fn it_names_provider_and_index() {
        let err = Error::IneligibleParameter {
            provider: "Repo".into(),
            index: 1,
            kind: TypeKind::Primitive,
            ty: "u32".into()
        };

        assert_eq!(
            err.to_string(),
            "Generator Error: dependency at index 1 of provider `Repo` must be a struct or a trait object but got primitive `u32`"
        );
    }

    #[test]
    fn it_names_missing_dependency_and_requester() {
        let err = Error::UnregisteredDependency {
            provider: "Repo".into(),
            index: 0,
            dependency: "Arc<crate::db::Pool>".into()
        };

        let message = err.to_string();

        assert!(message.contains("`Arc<crate::db::Pool>`"));
        assert!(message.contains("`Repo`"));
    }

    #[test]
    fn it_displays_cycle() {
        let err = Error::CyclicDependency(vec!["A".into(), "B".into(), "A".into()]);

        assert_eq!(err.to_string(), "Generator Error: cyclic dependency between services: A -> B -> A");
    }
}
