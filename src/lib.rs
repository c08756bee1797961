//! meshforge
//!
//! A unified interface for asynchronous 3D-generation task APIs.
//!
//! Vendors expose wildly different request shapes, authentication schemes,
//! status vocabularies and error taxonomies. This crate normalizes them behind
//! one adapter contract ([`ProviderAdapter`]) and one task model ([`Task`]),
//! and drives submitted tasks to a terminal outcome with a timer-based polling
//! engine ([`TaskClient::poll_until_done`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use meshforge::prelude::*;
//!
//! async fn example() -> Result<(), Error> {
//!     let client = TaskClient::tripo(TripoConfig::new("tsk_..."))?;
//!     let id = client
//!         .create_task(TaskParams::text_to_model("a weathered bronze statue"))
//!         .await?;
//!     let task = client.poll_until_done(&id, PollOptions::default()).await?;
//!     println!("model: {}", task.artifacts.unwrap().model);
//!     Ok(())
//! }
//! ```
#![deny(unsafe_code)]

pub mod adapter;
pub mod auth;
pub mod client;
pub mod error;
pub mod input;
pub mod params;
pub mod providers;
pub mod types;
pub mod utils;

pub use adapter::ProviderAdapter;
pub use client::{PollOptions, TaskClient};
pub use error::Error;
pub use types::{Task, TaskKind, TaskStatus};

/// Convenience re-exports for the common path.
pub mod prelude {
    pub use crate::adapter::ProviderAdapter;
    pub use crate::client::{PollOptions, TaskClient};
    pub use crate::error::{Error, ErrorCategory};
    pub use crate::input::{ImageSourceKind, classify};
    pub use crate::params::TaskParams;
    pub use crate::providers::hunyuan::{HunyuanAdapter, HunyuanConfig};
    pub use crate::providers::tripo::{TripoAdapter, TripoConfig};
    pub use crate::types::{
        Artifacts, ErrorCode, ModelFormat, Provider, Task, TaskCapabilities, TaskError, TaskKind,
        TaskStatus,
    };
    pub use crate::utils::cancel::CancelHandle;
}
