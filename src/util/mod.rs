//! Utilities

pub mod testing;
