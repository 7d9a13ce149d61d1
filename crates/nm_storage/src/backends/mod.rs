pub mod json;
pub mod memory;

pub use json::JsonDirStore;
pub use memory::MemoryStore;
