//! Key-value storage over IndexedDB
//!
//! A storage is an IndexedDB database holding a fixed set of kinds. Each kind is an object store
//! of records keyed by their `id` attribute. [`create`] opens a storage, [`remove`] deletes one,
//! and [`Storage`] reads and writes records, one transaction per operation.
//!
//! The lower-level wrappers ([`Factory`], [`Database`], [`Transaction`], [`ObjectStore`]) are
//! exposed as well. Their transactions abort unless their body returns `Ok`.

// Internal helper
macro_rules! error_name {
    ($v:expr) => {
        crate::error::name($v).as_ref().map(|s| s as &str)
    };
}

mod database;
mod error;
mod factory;
mod kinds;
mod object_store;
mod storage;
mod transaction;
mod utils;

pub use database::{Database, ObjectStoreBuilder};
pub use error::{Error, Result};
pub use factory::{Factory, VersionChangeEvent};
pub use kinds::Kinds;
pub use object_store::ObjectStore;
pub use storage::{create, remove, Storage, ID_FIELD};
pub use transaction::{Transaction, TransactionBuilder};
