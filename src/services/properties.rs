use crate::error::ServiceError;
use crate::models::Property;
use crate::storage::PropertyRepository;
use std::sync::Arc;
use tracing::info;

/// Filters for [`PropertyService::find`]
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
    /// Highest monthly rent to include
    pub max_price: Option<i64>,
    pub favorite: Option<bool>,
    pub limit: Option<usize>,
}

/// User operations on stored properties
pub struct PropertyService {
    repository: Arc<dyn PropertyRepository>,
}

impl PropertyService {
    pub fn new(repository: Arc<dyn PropertyRepository>) -> Self {
        Self { repository }
    }

    /// Non-banned properties matching `query`, cheapest first
    pub async fn find(&self, query: &FindQuery) -> Result<Vec<Property>, ServiceError> {
        if query.limit == Some(0) {
            return Err(ServiceError::InvalidQuery("limit must be positive".to_string()));
        }

        let mut properties: Vec<Property> = self
            .repository
            .all()
            .await?
            .into_iter()
            .filter(|p| !p.banned)
            .filter(|p| query.max_price.map_or(true, |max| p.price.amount <= max))
            .filter(|p| query.favorite.map_or(true, |fav| p.favorite == fav))
            .collect();

        properties.sort_by(|a, b| a.price.amount.cmp(&b.price.amount).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = query.limit {
            properties.truncate(limit);
        }
        Ok(properties)
    }

    pub async fn favorite(&self, id: &str, favorite: bool) -> Result<(), ServiceError> {
        self.update(id, |p| {
            let changed = p.favorite != favorite;
            p.favorite = favorite;
            changed
        })
        .await
    }

    /// Banned properties are hidden from `find` and skipped by future crawls.
    pub async fn ban(&self, id: &str, banned: bool) -> Result<(), ServiceError> {
        self.update(id, |p| {
            let changed = p.banned != banned;
            p.banned = banned;
            changed
        })
        .await
    }

    /// Correct the floor area by hand, e.g. when OCR misread the plan
    pub async fn set_area(&self, id: &str, floor_area: f64) -> Result<(), ServiceError> {
        self.update(id, |p| {
            let changed = p.floor_area != floor_area;
            p.floor_area = floor_area;
            changed
        })
        .await
    }

    /// Delete stored properties. Banned and favorite ones survive unless asked for.
    pub async fn clear(&self, banned: bool, favorites: bool) -> Result<usize, ServiceError> {
        let mut removed = 0;
        for property in self.repository.all().await? {
            if property.banned && !banned {
                continue;
            }
            if property.favorite && !favorites {
                continue;
            }
            if self.repository.delete(&property.id).await? {
                removed += 1;
            }
        }
        info!(removed, "Cleared properties");
        Ok(removed)
    }

    async fn update(
        &self,
        id: &str,
        change: impl FnOnce(&mut Property) -> bool,
    ) -> Result<(), ServiceError> {
        let mut property = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::EntityNotFound(id.to_string()))?;

        if change(&mut property) {
            self.repository.save(&property).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use crate::storage::MemoryRepository;

    fn priced(id: &str, amount: i64) -> Property {
        let mut property = fixtures::property(id);
        property.price.amount = amount;
        property
    }

    fn service(properties: Vec<Property>) -> (PropertyService, Arc<MemoryRepository>) {
        let repo = Arc::new(MemoryRepository::with_properties(properties));
        (PropertyService::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn find_filters_and_sorts_by_price() {
        let mut banned = priced("RM-4", 900);
        banned.banned = true;
        let mut favorite = priced("RM-2", 1400);
        favorite.favorite = true;
        let (service, _) = service(vec![priced("RM-1", 2000), favorite, priced("RM-3", 1200), banned]);

        let all = service.find(&FindQuery::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["RM-3", "RM-2", "RM-1"]);

        let cheap = service
            .find(&FindQuery { max_price: Some(1500), limit: Some(1), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(cheap.len(), 1);
        assert_eq!(cheap[0].id, "RM-3");

        let favorites = service
            .find(&FindQuery { favorite: Some(true), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, "RM-2");
    }

    #[tokio::test]
    async fn zero_limit_is_rejected() {
        let (service, _) = service(vec![]);
        let err = service
            .find(&FindQuery { limit: Some(0), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn marks_favorite_ban_and_area() {
        let (service, repo) = service(vec![fixtures::property("RM-1")]);

        service.favorite("RM-1", true).await.unwrap();
        service.ban("RM-1", true).await.unwrap();
        service.set_area("RM-1", 64.5).await.unwrap();

        let stored = repo.get("RM-1").await.unwrap().unwrap();
        assert!(stored.favorite);
        assert!(stored.banned);
        assert_eq!(stored.floor_area, 64.5);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (service, _) = service(vec![]);
        let err = service.favorite("RM-404", true).await.unwrap_err();
        assert!(matches!(err, ServiceError::EntityNotFound(id) if id == "RM-404"));
    }

    #[tokio::test]
    async fn clear_keeps_banned_and_favorites_by_default() {
        let mut banned = fixtures::property("RM-1");
        banned.banned = true;
        let mut favorite = fixtures::property("RM-2");
        favorite.favorite = true;
        let (service, repo) = service(vec![banned, favorite, fixtures::property("RM-3")]);

        assert_eq!(service.clear(false, false).await.unwrap(), 1);
        assert_eq!(repo.all().await.unwrap().len(), 2);

        assert_eq!(service.clear(true, true).await.unwrap(), 2);
        assert!(repo.all().await.unwrap().is_empty());
    }
}
