// # Store Implementations
//
// This module provides the two persistence tiers behind the registry
// facade and the handle that owns the secondary connection lifecycle.

pub mod file;
pub mod handle;
pub mod memory;

pub use file::FileStore;
pub use handle::SecondaryHandle;
pub use memory::{MemoryConnector, MemoryDocumentStore};
