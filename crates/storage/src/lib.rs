//! Storage backend implementations for Mentora.

pub mod in_memory;

pub use in_memory::InMemoryStorage;
