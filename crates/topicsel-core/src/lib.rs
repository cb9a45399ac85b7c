//! Core library for topicsel.
//!
//! Provides the pieces a topic-selection front end is built on:
//!
//! - `auth`: session token stores (memory, file, OS keychain)
//! - `api`: the HTTP client factory, response envelope and typed endpoints
//! - `router`: the static route table and the authentication guard
//! - `models`: wire types for theses, students and selections
//! - `config`: startup configuration for the service partitions

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod router;

pub use api::{ApiClient, ApiError, ClientConfig, Envelope, HttpClient};
pub use auth::{SharedSession, TokenStore};
pub use config::Config;
pub use router::{Navigation, RouteDescriptor, Router};
