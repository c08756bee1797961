//! The provider adapter contract.
//!
//! An adapter is the single seam between the uniform task model and one
//! vendor's bespoke API. [`TaskClient`](crate::client::TaskClient) depends
//! only on this trait, never on a concrete vendor.

use async_trait::async_trait;

use crate::error::Error;
use crate::params::TaskParams;
use crate::types::{Provider, Task, TaskCapabilities, TaskKind};

/// One vendor integration.
///
/// Implementations must be cheap to share (`Arc`) and must tolerate
/// concurrent `get_task_status` calls for different task ids: the polling
/// engine runs one in-flight request per poll, but several independent polls
/// may reference the same adapter instance simultaneously.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which vendor this adapter talks to.
    fn provider(&self) -> Provider;

    /// The fixed capability set, populated at construction.
    fn capabilities(&self) -> &TaskCapabilities;

    /// Membership test against the capability set.
    fn supports(&self, kind: TaskKind) -> bool {
        self.capabilities().supports(kind)
    }

    /// Submit a task and return the vendor task identifier.
    ///
    /// Rejects with [`Error::UnsupportedOperation`] before any network call
    /// when `params.kind()` is outside the capability set, and with
    /// [`Error::InvalidInput`] when image input classification fails. Vendor
    /// rejections surface as normalized [`Error::ApiError`]s with the raw
    /// vendor payload preserved.
    async fn create_task(&self, params: TaskParams) -> Result<String, Error>;

    /// Fetch and normalize the vendor's current representation of `task_id`.
    ///
    /// Returns a [`Task`] in the shared vocabulary; `error` is populated only
    /// on Failed/Canceled, `artifacts` only on Succeeded. Transport failures
    /// and vendor rejections surface as errors, never as fabricated task
    /// states.
    async fn get_task_status(&self, task_id: &str) -> Result<Task, Error>;
}
