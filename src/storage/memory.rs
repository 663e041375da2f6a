use super::PropertyRepository;
use crate::models::Property;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Process-local repository, used for dry runs and tests
#[derive(Default)]
pub struct MemoryRepository {
    properties: RwLock<BTreeMap<String, Property>>,
}

impl MemoryRepository {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties(properties: impl IntoIterator<Item = Property>) -> Self {
        let properties = properties.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            properties: RwLock::new(properties),
        }
    }
}

#[async_trait]
impl PropertyRepository for MemoryRepository {
    async fn get(&self, id: &str) -> Result<Option<Property>> {
        Ok(self.properties.read().await.get(id).cloned())
    }

    async fn save(&self, property: &Property) -> Result<()> {
        self.properties
            .write()
            .await
            .insert(property.id.clone(), property.clone());
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Property>> {
        Ok(self.properties.read().await.values().cloned().collect())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.properties.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use crate::scrapers::traits::{PropertyLookup, RecordSink};

    #[tokio::test]
    async fn emit_upserts_by_id() {
        let repo = MemoryRepository::new();
        let mut property = fixtures::property("RM-1");
        repo.emit(&property).await.unwrap();

        property.summary = "Updated".to_string();
        repo.emit(&property).await.unwrap();

        let all = repo.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(repo.lookup("RM-1").await.unwrap().unwrap().summary, "Updated");
    }

    #[tokio::test]
    async fn delete_reports_removal() {
        let repo = MemoryRepository::with_properties([fixtures::property("RM-1")]);
        assert!(repo.delete("RM-1").await.unwrap());
        assert!(!repo.delete("RM-1").await.unwrap());
        assert!(repo.get("RM-1").await.unwrap().is_none());
    }
}
