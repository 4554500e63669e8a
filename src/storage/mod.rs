use crate::{
    domain::{ordering::key_between, Study, StudyId},
    error::Result,
};
use async_trait::async_trait;

pub mod file_storage;

#[cfg(feature = "sqlite-storage")]
pub mod sqlite_storage;

pub use file_storage::FileStorage;

#[cfg(feature = "sqlite-storage")]
pub use sqlite_storage::SqliteStorage;

/// Storage trait for persisting studies
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initializes the storage backend
    async fn initialize(&self) -> Result<()>;

    /// Saves a study, replacing any previous version
    async fn save_study(&self, study: &Study) -> Result<()>;

    /// Loads a study by ID
    async fn load_study(&self, id: &StudyId) -> Result<Study>;

    /// Lists all studies in display order
    async fn list_studies(&self) -> Result<Vec<Study>>;

    /// Case-insensitive search over title, subtitle and tag names
    async fn search_studies(&self, query: &str) -> Result<Vec<Study>>;

    /// Deletes a study
    async fn delete_study(&self, id: &StudyId) -> Result<()>;

    /// Studies carrying the given tag, in display order
    async fn list_studies_by_tag(&self, tag_id: &str) -> Result<Vec<Study>> {
        let studies = self.list_studies().await?;
        Ok(studies
            .into_iter()
            .filter(|s| s.tags.iter().any(|t| t.id == tag_id))
            .collect())
    }

    /// Studies without any tag, in display order
    async fn list_untagged_studies(&self) -> Result<Vec<Study>> {
        let studies = self.list_studies().await?;
        Ok(studies.into_iter().filter(|s| s.tags.is_empty()).collect())
    }

    /// Sort key that places a new study after every existing one.
    ///
    /// `head_key` is used when the store is empty.
    async fn next_order(&self, head_key: f64) -> Result<f64> {
        let studies = self.list_studies().await?;
        Ok(key_between(studies.last().map(|s| s.order), None, head_key))
    }

    /// Checks if the storage has been initialized
    async fn is_initialized(&self) -> bool;
}

/// The single write a reorder needs: replace one item's sort key
#[async_trait]
pub trait OrderKeyStore<Id: Send + Sync>: Send + Sync {
    async fn update_order_key(&self, id: &Id, key: f64) -> Result<()>;
}
