//! `crudmux` Core — item envelope, payload shapes, validation capability, and
//! the store / operation contracts consumed by the dispatcher.

pub mod shape;
pub mod traits;
pub mod types;

pub use shape::{Shape, ValidationError};
pub use traits::{Oper, Store, StoreError};
pub use types::{ItemId, ItemInfo, UserId, TIMESTAMP_HEADER_FORMAT};
