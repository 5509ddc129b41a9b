//! Describes graph ordering errors

use std::fmt::{Debug, Display, Formatter};

/// A dependency cycle found while ordering a [`DiGraph`](crate::DiGraph).
///
/// The path starts and ends with the same vertex, e.g. `a -> b -> a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle<T> {
    path: Vec<T>
}

impl<T> Cycle<T> {
    #[inline]
    pub(crate) fn new(path: Vec<T>) -> Self {
        Self { path }
    }

    /// Returns the vertices forming the cycle, the first one repeated at the end
    #[inline]
    pub fn path(&self) -> &[T] {
        &self.path
    }

    /// Consumes the error and returns the cycle path
    #[inline]
    pub fn into_path(self) -> Vec<T> {
        self.path
    }
}

impl<T: Display> Display for Cycle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Graph Error: cycle detected: ")?;
        for (i, vertex) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{vertex}")?;
        }
        Ok(())
    }
}

impl<T: Debug + Display> std::error::Error for Cycle<T> {}
