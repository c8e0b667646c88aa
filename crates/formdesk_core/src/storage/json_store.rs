use crate::error::AppError;
use crate::model::Task;
use crate::storage::TaskStore;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))
}

/// Writes the array to a sibling temp file and renames it over `path`, so a
/// reader sees either the previous array or the new one, never a partial file.
pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let content =
        serde_json::to_string_pretty(tasks).map_err(|err| AppError::invalid_data(err.to_string()))?;
    let staging = staging_path(path);
    std::fs::write(&staging, content)
        .map_err(|err| AppError::io(format!("{}: {}", staging.display(), err)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&staging, permissions)
            .map_err(|err| AppError::io(err.to_string()))?;
    }

    std::fs::rename(&staging, path).map_err(|err| {
        std::fs::remove_file(&staging).ok();
        AppError::io(format!("{}: {}", path.display(), err))
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Reads the array, pushes one task, writes the whole array back.
pub fn append_task(path: &Path, task: Task) -> Result<usize, AppError> {
    let mut tasks = load_tasks(path)?;
    tasks.push(task);
    save_tasks(path, &tasks)?;
    Ok(tasks.len())
}

/// File-backed [`TaskStore`]. Appends are serialized within the process so
/// concurrent submissions cannot overwrite each other's read-modify-write.
/// The lock is held by the blocking write itself, so it stays taken until the
/// file is replaced even if the caller is dropped first.
#[derive(Debug)]
pub struct JsonTaskStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest id currently on disk, used to seed the id generator.
    pub async fn last_id(&self) -> Result<Option<i64>, AppError> {
        let tasks = self.list_all().await?;
        Ok(tasks.iter().map(|task| task.id).max())
    }
}

#[async_trait]
impl TaskStore for JsonTaskStore {
    async fn append(&self, task: Task) -> Result<(), AppError> {
        let guard = Arc::clone(&self.write_lock).lock_owned().await;
        let path = self.path.clone();
        let id = task.id;
        let count = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            append_task(&path, task)
        })
            .await
            .map_err(|err| AppError::io(err.to_string()))??;
        debug!(id, count, path = %self.path.display(), "appended task");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Task>, AppError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_tasks(&path))
            .await
            .map_err(|err| AppError::io(err.to_string()))?
    }
}
