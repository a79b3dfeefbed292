mod backend;
mod config;
mod error;
mod memory;
mod timeout;
mod traits;


pub use backend::ObjectStoreBackend;
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use timeout::TimedStore;
pub use traits::KeyValueStore;
