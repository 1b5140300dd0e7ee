//! Domain layer: entities and the command grammar
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod command;
pub mod entities;
pub mod error;

pub use command::Command;
pub use entities::*;
pub use error::DomainError;
