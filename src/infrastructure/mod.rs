//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements the I/O boundary traits (remote task service,
//! credential store, authorization prompt) and wires up services.

pub mod auth;
pub mod credentials;
pub mod di;
pub mod error;
pub mod google;
pub mod traits;

pub use error::{InfraError, InfraResult, RemoteError, RemoteResult};
