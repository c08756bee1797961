//! Vendor integrations.
//!
//! Each submodule implements [`ProviderAdapter`](crate::adapter::ProviderAdapter)
//! for one vendor: its configuration, wire types, error-normalization tables
//! and the adapter itself.

pub mod hunyuan;
pub mod tripo;
