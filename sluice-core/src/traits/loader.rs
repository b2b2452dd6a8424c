//! Reader interface.

use async_trait::async_trait;

use crate::{Document, Result};

/// Loads documents from a data source.
///
/// The pipeline calls [`load`](Loader::load) once per run, without
/// arguments, and appends the result to its input.
///
/// # Examples
///
/// ```rust
/// use sluice_core::traits::Loader;
/// use sluice_core::{Document, Result};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct StaticLoader;
///
/// #[async_trait]
/// impl Loader for StaticLoader {
///     async fn load(&self) -> Result<Vec<Document>> {
///         Ok(vec![Document::new("Sample content")])
///     }
/// }
/// ```
#[async_trait]
pub trait Loader: Send + Sync + std::fmt::Debug {
    /// Load documents from the data source.
    ///
    /// # Errors
    ///
    /// Returns an error if the data source cannot be accessed.
    async fn load(&self) -> Result<Vec<Document>>;

    /// Get a human-readable name for this loader.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
