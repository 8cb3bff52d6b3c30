//! `crudmux` Server — binds typed stores and custom operations to HTTP
//! routes and dispatches requests to them without per-type handler code.

pub mod config;
pub mod dispatch;
pub mod network;
pub mod registry;
pub mod storage;

pub use config::ServerArgs;
pub use dispatch::{DispatchError, Endpoint};
pub use network::{NetworkConfig, NetworkModule};
pub use registry::{Registry, RegistryError};
pub use storage::MemoryStore;
