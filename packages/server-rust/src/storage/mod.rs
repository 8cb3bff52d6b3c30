//! Storage collaborators shipped with the server.
//!
//! The dispatcher only depends on [`crudmux_core::Store`]; [`MemoryStore`]
//! is the in-process implementation used by the demo binary and tests.

pub mod memory;

pub use memory::{MemoryStore, DEFAULT_USER, INITIAL_REVISION};
