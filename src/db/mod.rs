pub mod database;
pub mod store;

pub use database::{Database, KeyValueStore};
pub use store::{load_snapshot, PersistQueue, StoreKey};
