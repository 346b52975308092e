pub mod memory_store;
pub mod search_store;

pub use memory_store::MemorySearchStore;
pub use search_store::{MockSearchStore, SearchStore};
