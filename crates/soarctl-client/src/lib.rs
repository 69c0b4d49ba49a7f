//! # soarctl-client
//!
//! HTTP transport for the soarctl resource adapters.
//!
//! This crate wraps [`reqwest`] with the conventions of the SOAR platform's
//! REST administration API: a static API key sent as the `Authorization`
//! header, JSON request/response bodies, and optional tenant-account URL
//! namespacing (`/acc_<name>/...`).
//!
//! The client also owns the dry-run switch. Mutating verbs (`post_json`,
//! `put_json`, `delete` and their root-scoped variants) are suppressed when
//! dry-run is enabled and report success without touching the network; read
//! verbs always execute. This gives every adapter the same check-mode
//! behavior without per-adapter guards.
//!
//! ## Example
//!
//! ```ignore
//! use soarctl_client::ApiClient;
//!
//! let client = ApiClient::builder("https://soar.example.org")
//!     .api_key("47A424BF668FD7BF0443184314104BC3")
//!     .account("Client01")
//!     .build()?;
//!
//! let keys = client.get_json("apikeys").await?;
//! ```

mod client;
mod error;

pub use client::{ApiClient, ApiClientBuilder};
pub use error::ClientError;

/// Type alias for a transport result.
pub type ClientResult<T> = Result<T, ClientError>;
