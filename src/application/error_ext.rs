//! Error conversion helpers for remote calls
//!
//! Provides an extension trait that names the failed operation.

use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::RemoteResult;

/// Extension trait for converting `RemoteResult` to `ApplicationResult` with context.
pub trait RemoteResultExt<T> {
    /// Name the operation a remote error belongs to.
    ///
    /// # Example
    /// ```ignore
    /// tasks.list_tasklists(10, None)
    ///     .with_operation("list task lists")?;
    /// ```
    fn with_operation(self, operation: &str) -> ApplicationResult<T>;
}

impl<T> RemoteResultExt<T> for RemoteResult<T> {
    fn with_operation(self, operation: &str) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::Remote {
            operation: operation.to_string(),
            source,
        })
    }
}
