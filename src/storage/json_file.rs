use super::PropertyRepository;
use crate::models::Property;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// One pretty-printed JSON file per property, named after its id
pub struct JsonFileRepository {
    dir: PathBuf,
    write_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl JsonFileRepository {
    /// Open (and create if needed) the repository directory
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        Ok(Self {
            dir,
            write_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids are percent-encoded so distinct ids never share a file.
    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(id)))
    }

    fn write_lock(&self, id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .write_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(id.to_string()).or_default())
    }

    async fn read(path: &Path) -> Result<Option<Property>> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => {
                let property = serde_json::from_str(&json)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                Ok(Some(property))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

#[async_trait]
impl PropertyRepository for JsonFileRepository {
    async fn get(&self, id: &str) -> Result<Option<Property>> {
        Self::read(&self.path_for(id)).await
    }

    async fn save(&self, property: &Property) -> Result<()> {
        let lock = self.write_lock(&property.id);
        let _guard = lock.lock().await;

        let path = self.path_for(&property.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(property)?;

        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to move {} into place", path.display()))?;

        debug!(id = %property.id, path = %path.display(), "Saved property");
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Property>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to list {}", self.dir.display()))?;

        let mut properties = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path).await {
                Ok(Some(property)) => properties.push(property),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable property file"),
            }
        }

        properties.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(properties)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.path_for(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    #[tokio::test]
    async fn saves_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path().join("raw_scrape")).await.unwrap();

        let mut property = fixtures::property("RM-86519010");
        property.favorite = true;
        property.to_work = Some(serde_json::json!({"duration": {"value": 1500}}));
        repo.save(&property).await.unwrap();

        assert!(repo.dir().join("RM-86519010.json").exists());
        assert_eq!(repo.get("RM-86519010").await.unwrap(), Some(property));
        assert_eq!(repo.get("RM-0").await.unwrap(), None);
    }

    #[tokio::test]
    async fn lists_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path()).await.unwrap();
        repo.save(&fixtures::property("RM-2")).await.unwrap();
        repo.save(&fixtures::property("RM-1")).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let ids: Vec<String> = repo.all().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["RM-1", "RM-2"]);

        assert!(repo.delete("RM-1").await.unwrap());
        assert!(!repo.delete("RM-1").await.unwrap());
        assert_eq!(repo.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn similar_ids_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path()).await.unwrap();
        for id in ["RM.1", "RM_1", "RM/1"] {
            repo.save(&fixtures::property(id)).await.unwrap();
        }

        let ids: Vec<String> = repo.all().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["RM.1", "RM/1", "RM_1"]);
        assert_eq!(repo.get("RM/1").await.unwrap().unwrap().id, "RM/1");
        assert!(repo.dir().join("RM%2F1.json").exists());
    }

    #[tokio::test]
    async fn concurrent_saves_of_one_id_leave_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(JsonFileRepository::open(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                let mut property = fixtures::property("RM-1");
                property.bedrooms = i;
                repo.save(&property).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = repo.get("RM-1").await.unwrap().unwrap();
        assert!(stored.bedrooms < 8);
    }
}
