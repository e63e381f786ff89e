pub mod cache_config;
pub mod repository;
pub mod store;

#[cfg(test)]
pub mod testutil;

pub use cache_config::GitCacheConfig;
pub use repository::GitRepository;
pub use store::{DepotStore, GitDepotStore, SharedStore};
