//! Property persistence.
//!
//! The crawl only needs lookup by id and an upserting sink; every
//! repository provides both.

mod json_file;
mod memory;

pub use json_file::JsonFileRepository;
pub use memory::MemoryRepository;

use crate::models::Property;
use crate::scrapers::traits::{PropertyLookup, RecordSink};
use anyhow::Result;
use async_trait::async_trait;

/// Key-value store of properties keyed by namespaced listing id.
/// Implementations must be safe to call concurrently for different ids.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Property>>;

    /// Insert or overwrite the property with the same id.
    async fn save(&self, property: &Property) -> Result<()>;

    /// Every stored property, ordered by id.
    async fn all(&self) -> Result<Vec<Property>>;

    /// Returns whether anything was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

#[async_trait]
impl<T: PropertyRepository + ?Sized> PropertyLookup for T {
    async fn lookup(&self, id: &str) -> Result<Option<Property>> {
        self.get(id).await
    }
}

#[async_trait]
impl<T: PropertyRepository + ?Sized> RecordSink for T {
    async fn emit(&self, property: &Property) -> Result<()> {
        self.save(property).await
    }
}
