//! Upload-before-referencing seam.
//!
//! Some deployments prefer handing the vendor a fetchable URL instead of an
//! inline payload. The actual object-storage signer lives outside this crate;
//! input preparation only needs this interface.

use async_trait::async_trait;

use crate::error::Error;

/// Uploads raw bytes to object storage and returns a vendor-fetchable URL.
///
/// Called at most once per task creation. Implementations must either succeed
/// with a usable URL or fail; partial results are not handled here.
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, object_key: &str) -> Result<String, Error>;
}
