// src/store/file.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::Result;
use crate::store::record::{SessionRecord, StoreRecord, StoreSnapshot};
use crate::store::{BoxFuture, PlannerStore};
use crate::types::{EntityKind, StoreId};

/// Store backed by a single TOML file holding the whole snapshot.
///
/// Every write rewrites the file. Ids count up per kind and are never
/// reused. A missing file is an empty store.
#[derive(Debug)]
pub struct TomlFileStore {
    path: PathBuf,
    data: Option<StoreSnapshot>,
}

impl TomlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn snapshot(&mut self) -> Result<&mut StoreSnapshot> {
        if self.data.is_none() {
            let loaded = read_snapshot(&self.path).await?;
            self.data = Some(loaded);
        }
        Ok(self.data.get_or_insert_with(StoreSnapshot::default))
    }

    async fn persist(&self) -> Result<()> {
        let Some(data) = &self.data else { return Ok(()) };
        let contents = toml::to_string(data)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, contents).await?;
        debug!(path = ?self.path, "store file written");
        Ok(())
    }
}

async fn read_snapshot(path: &Path) -> Result<StoreSnapshot> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(?path, "store file missing; starting empty");
            Ok(StoreSnapshot::default())
        }
        Err(e) => Err(e.into()),
    }
}

impl PlannerStore for TomlFileStore {
    fn load(&mut self) -> BoxFuture<'_, Result<StoreSnapshot>> {
        Box::pin(async move { Ok(self.snapshot().await?.clone()) })
    }

    fn insert(&mut self, record: StoreRecord) -> BoxFuture<'_, Result<StoreId>> {
        Box::pin(async move {
            let data = self.snapshot().await?;
            let id = data.allocate_id(record.kind());
            data.insert(record, id);
            self.persist().await?;
            Ok(id)
        })
    }

    fn update(&mut self, record: StoreRecord) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let kind = record.kind();
            let id = record.id();
            if !self.snapshot().await?.update(record) {
                return Err(crate::errors::PlannerError::Store(format!(
                    "no {kind} with id {id:?} to update"
                )));
            }
            self.persist().await
        })
    }

    fn delete(&mut self, kind: EntityKind, id: StoreId) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if !self.snapshot().await?.delete(kind, id) {
                return Err(crate::errors::PlannerError::Store(format!(
                    "no {kind} with id {id} to delete"
                )));
            }
            self.persist().await
        })
    }

    fn save_session(&mut self, session: SessionRecord) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.snapshot().await?.session = Some(session);
            self.persist().await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::record::{EventRecord, TaskRecord};

    fn task_record(name: &str) -> StoreRecord {
        StoreRecord::Task(TaskRecord {
            id: None,
            name: name.to_string(),
            duration_minutes: 30,
            created_epoch_day: 20_000,
            due_epoch_day: Some(20_003),
            parents: String::new(),
            children: String::new(),
            completed_epoch_day: None,
            actual_minutes: None,
            tracked_minutes: 0,
            project: None,
            labels: String::new(),
        })
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TomlFileStore::new(dir.path().join("none.toml"));
        let snap = store.load().await.unwrap();
        assert!(snap.tasks.is_empty());
        assert!(snap.session.is_none());
    }

    #[tokio::test]
    async fn writes_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("plan.toml");

        let mut store = TomlFileStore::new(&path);
        let a = store.insert(task_record("a")).await.unwrap();
        let b = store.insert(task_record("b")).await.unwrap();
        assert_eq!((a, b), (StoreId(1), StoreId(2)));
        let e = store
            .insert(StoreRecord::Event(EventRecord {
                id: None,
                name: "gym".into(),
                epoch_day: 20_001,
                start_minute: 1080,
                end_minute: 1140,
            }))
            .await
            .unwrap();
        assert_eq!(e, StoreId(1));
        store.delete(EntityKind::Task, a).await.unwrap();
        store
            .save_session(SessionRecord {
                epoch_day: 20_000,
                today_minutes: 25,
                timer_task: None,
                timer_started_unix: None,
            })
            .await
            .unwrap();

        let mut reopened = TomlFileStore::new(&path);
        let snap = reopened.load().await.unwrap();
        assert_eq!(snap.tasks.len(), 1);
        assert_eq!(snap.tasks[0].id, Some(StoreId(2)));
        assert_eq!(snap.tasks[0].due_epoch_day, Some(20_003));
        assert_eq!(snap.events[0].name, "gym");
        assert_eq!(snap.session.unwrap().today_minutes, 25);
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TomlFileStore::new(dir.path().join("plan.toml"));
        let mut record = task_record("ghost");
        record.set_id(StoreId(9));
        assert!(store.update(record).await.is_err());
    }
}
