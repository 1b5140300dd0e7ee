//! gtask: manage Google Tasks lists from the command line
//!
//! Layers:
//! - `domain`: task entities and the command grammar
//! - `application`: name resolution, listing and move services
//! - `infrastructure`: REST client, OAuth, credential store, DI container
//! - `cli`: argument parsing, dispatch and terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
