use std::collections::BTreeMap;
use std::sync::Arc;

use storyboard_core::import::StoryAnalyzer;
use storyboard_core::model::StoryboardProject;
use storyboard_core::CoreError;
use storyboard_pipeline::Orchestrator;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::{DataDirs, ServerConfig};

/// One open project. Generation holds the lock only around its bookkeeping.
pub type SharedProject = Arc<Mutex<StoryboardProject>>;

/// Open projects keyed by a server-assigned id.
///
/// Ids are UUIDv7, so listings come out roughly in the order projects were
/// opened.
#[derive(Default)]
pub struct ProjectRegistry {
    projects: RwLock<BTreeMap<Uuid, SharedProject>>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `project` and return its id.
    pub async fn insert(&self, project: StoryboardProject) -> Uuid {
        let id = Uuid::now_v7();
        tracing::info!(project_id = %id, project = %project.name, "Project opened");
        self.projects
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(project)));
        id
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedProject, CoreError> {
        self.projects
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("project", id))
    }

    /// Close a project. In-flight generations keep their own handle.
    pub async fn remove(&self, id: Uuid) -> Result<(), CoreError> {
        match self.projects.write().await.remove(&id) {
            Some(_) => {
                tracing::info!(project_id = %id, "Project closed");
                Ok(())
            }
            None => Err(CoreError::not_found("project", id)),
        }
    }

    pub async fn entries(&self) -> Vec<(Uuid, SharedProject)> {
        self.projects
            .read()
            .await
            .iter()
            .map(|(id, p)| (*id, Arc::clone(p)))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.projects.read().await.len()
    }
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub dirs: Arc<DataDirs>,
    pub projects: Arc<ProjectRegistry>,
    /// Drives the configured image backend.
    pub orchestrator: Arc<Orchestrator>,
    /// External story analyzer; `None` means imports use the default outline.
    pub analyzer: Option<Arc<dyn StoryAnalyzer>>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        orchestrator: Orchestrator,
        analyzer: Option<Arc<dyn StoryAnalyzer>>,
    ) -> Self {
        let dirs = DataDirs::new(&config.data_dir);
        Self {
            config: Arc::new(config),
            dirs: Arc::new(dirs),
            projects: Arc::new(ProjectRegistry::new()),
            orchestrator: Arc::new(orchestrator),
            analyzer,
        }
    }

    /// Look up an open project.
    pub async fn project(&self, id: Uuid) -> Result<SharedProject, CoreError> {
        self.projects.get(id).await
    }
}
