//! OpenCTI MCP Agent Library
//!
//! Exposes OpenCTI threat intelligence queries as agent tools. The agent
//! only ever sees rendered results; the bearer token stays inside the client.
//!
//! ## Layers
//!
//! - [`config`]: endpoint and token, validated once
//! - [`client`]: GraphQL round trip and error classification
//! - [`catalog`]: fixed queries with edges/node unwrapping
//! - [`tools`]: text rendering for agents
//! - [`server`]: MCP registration over stdio

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod tools;

pub use client::{OpenCtiClient, Record};
pub use config::OpenCtiConfig;
pub use error::OpenCtiError;
pub use server::OpenCtiServer;
pub use tools::OpenCtiTools;
