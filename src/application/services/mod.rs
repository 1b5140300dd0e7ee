//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the `TaskService` boundary trait but are themselves
//! concrete structs, not traits.

mod mover;
mod tasklists;

pub use mover::{MoveReport, MoveService, MoveStep, MovedTask};
pub use tasklists::TaskListService;
