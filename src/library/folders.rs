use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::gateway::Engine;
use crate::model::IndexedFolder;
use crate::notice::Notices;

/// Indexer work started from the settings view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderTask {
    Index(String),
    Reindex(String),
    Remove(i64),
}

impl fmt::Display for FolderTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderTask::Index(path) => write!(f, "Indexing {path}"),
            FolderTask::Reindex(path) => write!(f, "Re-indexing {path}"),
            FolderTask::Remove(id) => write!(f, "Removing folder #{id}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderState {
    pub folders: Vec<IndexedFolder>,
    /// The indexer saw files change since the last scan.
    pub has_changes: bool,
    /// Folder work in progress. At most one at a time.
    pub task: Option<FolderTask>,
    pub is_checking: bool,
}

impl FolderState {
    pub fn is_busy(&self) -> bool {
        self.task.is_some()
    }
}

/// Read-only view of the indexer's folders. Cheap to clone.
#[derive(Clone)]
pub struct FolderCatalog {
    state: Arc<watch::Sender<FolderState>>,
    engine: Engine,
    notices: Notices,
}

impl FolderCatalog {
    pub fn new(engine: Engine, notices: Notices) -> Self {
        let (tx, _rx) = watch::channel(FolderState::default());
        Self {
            state: Arc::new(tx),
            engine,
            notices,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FolderState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FolderState {
        self.state.borrow().clone()
    }

    pub async fn refresh(&self) {
        match self.engine.indexed_folders().await {
            Ok(folders) => {
                debug!(count = folders.len(), "indexed folders loaded");
                self.state.send_modify(|s| s.folders = folders);
            }
            Err(e) => self
                .notices
                .error(format!("Could not load folders: {}", e.reason())),
        }
    }

    /// Ask the indexer whether any indexed folder changed on disk.
    pub async fn check_changes(&self) {
        self.state.send_modify(|s| s.is_checking = true);
        let result = self.engine.check_for_changes().await;
        self.state.send_modify(|s| {
            s.is_checking = false;
            if let Ok(changed) = &result {
                s.has_changes = *changed;
            }
        });
        if let Err(e) = result {
            warn!("change check failed: {e}");
        }
    }

    /// Claim the folder slot for `task`. Returns `false` while another task
    /// is running.
    pub fn begin_task(&self, task: FolderTask) -> bool {
        let mut claimed = false;
        self.state.send_if_modified(|s| {
            if s.task.is_some() {
                return false;
            }
            s.task = Some(task);
            claimed = true;
            true
        });
        claimed
    }

    pub fn finish_task(&self) {
        self.state.send_if_modified(|s| s.task.take().is_some());
    }
}
