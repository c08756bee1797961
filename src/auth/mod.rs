//! Authentication helpers.
//!
//! Tripo uses a static bearer token applied directly by its adapter; the only
//! non-trivial scheme is Hunyuan's TC3-HMAC-SHA256 request signing,
//! implemented in [`tc3`].

pub mod tc3;

pub use tc3::{SignedHeaders, Tc3Request, sign};
