pub mod mapping;

mod cache;
mod models;
mod repository;
mod store;

pub use cache::InMemoryCacheStore;
pub use repository::*;
pub use store::MemoryStore;
