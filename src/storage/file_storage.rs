use crate::{
    config::ConsoleConfig,
    domain::{ordering::compare_items, Study, StudyId},
    error::{ConsoleError, Result},
    storage::{OrderKeyStore, Storage},
};
use async_trait::async_trait;
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::fs;
use tracing::debug;

/// File-based storage: one JSON document per study
pub struct FileStorage {
    root_path: PathBuf,
}

impl FileStorage {
    const CHARTQ_DIR: &'static str = ".chartq";
    const STUDIES_DIR: &'static str = "studies";

    /// Creates a new FileStorage instance for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::CHARTQ_DIR),
        }
    }

    /// Directory holding studies and the console config
    pub fn data_dir(&self) -> &Path {
        &self.root_path
    }

    pub fn config_file(&self) -> PathBuf {
        ConsoleConfig::path_in(&self.root_path)
    }

    fn studies_dir(&self) -> PathBuf {
        self.root_path.join(Self::STUDIES_DIR)
    }

    fn study_file(&self, id: &StudyId) -> PathBuf {
        self.studies_dir().join(format!("{}.json", id))
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    async fn list_study_ids(&self) -> Result<Vec<StudyId>> {
        let studies_dir = self.studies_dir();

        if !studies_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&studies_dir).await?;
        let mut ids = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if let Ok(id) = StudyId::from_str(stem) {
                        ids.push(id);
                    }
                }
            }
        }

        Ok(ids)
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;
        self.ensure_directory_exists(&self.studies_dir()).await?;

        if !self.config_file().exists() {
            ConsoleConfig::default().save(self.config_file()).await?;
        }

        Ok(())
    }

    async fn save_study(&self, study: &Study) -> Result<()> {
        self.ensure_directory_exists(&self.studies_dir()).await?;

        let json = serde_json::to_string_pretty(study)?;
        fs::write(self.study_file(&study.id), json).await?;
        Ok(())
    }

    async fn load_study(&self, id: &StudyId) -> Result<Study> {
        let file_path = self.study_file(id);

        if !file_path.exists() {
            return Err(ConsoleError::StudyNotFound(id.to_string()));
        }

        let contents = fs::read_to_string(&file_path).await?;
        let study: Study = serde_json::from_str(&contents)?;

        Ok(study)
    }

    async fn list_studies(&self) -> Result<Vec<Study>> {
        let mut studies = Vec::new();
        for id in self.list_study_ids().await? {
            studies.push(self.load_study(&id).await?);
        }

        studies.sort_by(compare_items);
        Ok(studies)
    }

    async fn search_studies(&self, query: &str) -> Result<Vec<Study>> {
        let studies = self.list_studies().await?;
        Ok(studies.into_iter().filter(|s| s.matches(query)).collect())
    }

    async fn delete_study(&self, id: &StudyId) -> Result<()> {
        let file_path = self.study_file(id);

        if !file_path.exists() {
            return Err(ConsoleError::StudyNotFound(id.to_string()));
        }

        fs::remove_file(file_path).await?;
        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        self.root_path.exists() && self.studies_dir().exists()
    }
}

#[async_trait]
impl OrderKeyStore<StudyId> for FileStorage {
    async fn update_order_key(&self, id: &StudyId, key: f64) -> Result<()> {
        let mut study = self.load_study(id).await?;
        study.set_order(key);
        self.save_study(&study).await?;

        debug!(%id, key, "Stored study order");
        Ok(())
    }
}
