//! HTTP client layer for the topic-selection backend.
//!
//! `HttpClient` is the per-partition client: it attaches the bearer token
//! from the session on every request and unwraps the JSON body. The
//! endpoint modules (`security`, `thesis`, `intern`, `selection`) are thin
//! typed functions over it, and `ApiClient` bundles the auth and business
//! partitions together with the session.

pub mod client;
pub mod envelope;
pub mod error;
pub mod http;
pub mod intern;
pub mod security;
pub mod selection;
pub mod thesis;

pub use client::ApiClient;
pub use envelope::{Envelope, SUCCESS_CODE};
pub use error::ApiError;
pub use http::{ClientConfig, HttpClient};
