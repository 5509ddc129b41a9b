//! Provider descriptors

use crate::types::{TypeRef, parse_signature};
use std::str::FromStr;

/// Describes the shape of a provider: the ordered types it takes
/// and the ordered types it returns.
///
/// A fallible provider has two returns, the produced value and an error.
///
/// # Example
/// ```
/// use volga_di_gen::{ProviderDescriptor, types::TypeRef};
///
/// let repo = ProviderDescriptor::new()
///     .with_param(TypeRef::arc(TypeRef::structure("crate::db", "Pool")))
///     .with_return(TypeRef::structure("crate::repo", "Repo"))
///     .with_return(TypeRef::error("std::io::Error"));
///
/// assert_eq!(repo.params().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor<D = TypeRef> {
    params: Vec<D>,
    returns: Vec<D>
}

impl<D> Default for ProviderDescriptor<D> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<D> ProviderDescriptor<D> {
    /// Creates a provider that takes and returns nothing
    #[inline]
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            returns: Vec::new()
        }
    }

    /// Creates a provider from its parameter and return types
    #[inline]
    pub fn from_parts(params: Vec<D>, returns: Vec<D>) -> Self {
        Self { params, returns }
    }

    /// Appends a parameter
    pub fn with_param(mut self, param: D) -> Self {
        self.params.push(param);
        self
    }

    /// Appends a return value
    pub fn with_return(mut self, ret: D) -> Self {
        self.returns.push(ret);
        self
    }

    /// Parameter types in declaration order
    #[inline]
    pub fn params(&self) -> &[D] {
        &self.params
    }

    /// Return types in declaration order
    #[inline]
    pub fn returns(&self) -> &[D] {
        &self.returns
    }
}

impl FromStr for ProviderDescriptor {
    type Err = syn::Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_signature(s)
    }
}
