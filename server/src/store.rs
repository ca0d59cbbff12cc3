//! In-memory todo store backed by a single JSON file.
//!
//! # Design
//! One `RwLock` guards the map. Reads share it; every mutation takes the
//! write lock once and holds it across lookup, mutation and persist, so
//! mutations are linearized in lock acquisition order and the file always
//! reflects the last committed state. The whole map is rewritten on every
//! mutation through a temp file and a rename. If the write fails the
//! in-memory change is undone before the error is returned.

use std::{
    collections::HashMap,
    ffi::OsString,
    path::{Path, PathBuf},
};

use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::todo::{generate_id, now_nanos, NewTodo, Todo, TodoPatch};

pub type Todos = HashMap<String, Todo>;

#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    todos: RwLock<Todos>,
}

impl Store {
    /// Loads the store from `path`. A missing or malformed file is an error;
    /// there is no fallback to an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let bytes = tokio::fs::read(&path).await.map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        let todos: Todos = serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), count = todos.len(), "loaded todos");
        Ok(Self {
            path,
            todos: RwLock::new(todos),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of every todo, in the map's iteration order.
    pub async fn list(&self) -> Vec<Todo> {
        self.todos.read().await.values().cloned().collect()
    }

    pub async fn create(&self, input: NewTodo) -> Result<Todo, StoreError> {
        let mut todos = self.todos.write().await;

        let mut id = generate_id();
        while todos.contains_key(&id) {
            id = generate_id();
        }
        let todo = Todo {
            title: input.title,
            id: id.clone(),
            is_done: false,
            date: now_nanos(),
        };
        todos.insert(id.clone(), todo.clone());

        if let Err(e) = self.persist(&todos).await {
            todos.remove(&id);
            return Err(e);
        }
        Ok(todo)
    }

    pub async fn update(&self, id: &str, patch: TodoPatch) -> Result<Todo, StoreError> {
        let mut todos = self.todos.write().await;

        let todo = todos
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let previous = todo.clone();
        todo.apply(patch);
        let updated = todo.clone();

        if let Err(e) = self.persist(&todos).await {
            todos.insert(id.to_string(), previous);
            return Err(e);
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<Todo, StoreError> {
        let mut todos = self.todos.write().await;

        let removed = todos
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Err(e) = self.persist(&todos).await {
            todos.insert(id.to_string(), removed);
            return Err(e);
        }
        Ok(removed)
    }

    /// Overwrites the backing file with the full map. Callers hold the write lock.
    async fn persist(&self, todos: &Todos) -> Result<(), StoreError> {
        let mut bytes = serde_json::to_vec(todos)?;
        bytes.push(b'\n');

        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), count = todos.len(), "persisted todos");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn empty_store(dir: &tempfile::TempDir) -> Store {
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{}").unwrap();
        Store::load(path).await.unwrap()
    }

    fn on_disk(store: &Store) -> Todos {
        let bytes = std::fs::read(store.path()).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn new_todo(title: &str) -> NewTodo {
        NewTodo {
            title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn load_fails_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = Store::load(dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[tokio::test]
    async fn load_fails_when_file_is_not_a_todo_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let err = Store::load(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn load_reads_existing_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"{"a":{"title":"t","id":"a","isDone":true,"date":"1"}}"#).unwrap();
        let store = Store::load(&path).await.unwrap();
        let todos = store.list().await;
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].id, "a");
        assert!(todos[0].is_done);
    }

    #[tokio::test]
    async fn load_fills_missing_record_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"{"a":{"id":"a","title":null}}"#).unwrap();
        let store = Store::load(&path).await.unwrap();
        let todos = store.list().await;
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].id, "a");
        assert!(todos[0].title.is_empty());
        assert!(!todos[0].is_done);
        assert!(todos[0].date.is_empty());
    }

    #[tokio::test]
    async fn create_assigns_server_fields_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;

        let todo = store.create(new_todo("buy milk")).await.unwrap();
        assert_eq!(todo.title, "buy milk");
        assert!(!todo.is_done);
        assert!(!todo.id.is_empty());
        assert!(todo.date.parse::<u128>().is_ok());

        let disk = on_disk(&store);
        assert_eq!(disk.get(&todo.id), Some(&todo));
        assert!(!tmp_path(store.path()).exists());
    }

    #[tokio::test]
    async fn update_overwrites_done_and_keeps_title_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;
        let todo = store.create(new_todo("walk dog")).await.unwrap();

        let patch = TodoPatch {
            title: String::new(),
            is_done: true,
        };
        let updated = store.update(&todo.id, patch).await.unwrap();
        assert_eq!(updated.title, "walk dog");
        assert!(updated.is_done);
        assert_eq!(updated.date, todo.date);
        assert_eq!(on_disk(&store)[&todo.id], updated);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found_and_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;

        let err = store.update("nope", TodoPatch::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "nope"));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{}");
    }

    #[tokio::test]
    async fn delete_removes_and_returns_item() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;
        let todo = store.create(new_todo("x")).await.unwrap();

        let removed = store.delete(&todo.id).await.unwrap();
        assert_eq!(removed, todo);
        assert!(store.list().await.is_empty());
        assert!(on_disk(&store).is_empty());

        let err = store.delete(&todo.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_persist_rolls_back_the_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;
        let kept = store.create(new_todo("kept")).await.unwrap();

        // A directory where the temp file should go makes the write fail.
        std::fs::create_dir(tmp_path(store.path())).unwrap();

        assert!(matches!(
            store.create(new_todo("lost")).await,
            Err(StoreError::Io(_))
        ));
        assert!(matches!(
            store.delete(&kept.id).await,
            Err(StoreError::Io(_))
        ));
        let patch = TodoPatch {
            title: "changed".to_string(),
            is_done: true,
        };
        assert!(matches!(
            store.update(&kept.id, patch).await,
            Err(StoreError::Io(_))
        ));

        assert_eq!(store.list().await, vec![kept]);
    }

    #[tokio::test]
    async fn concurrent_creates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(empty_store(&dir).await);

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.create(new_todo(&format!("t{i}"))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.list().await.len(), 50);
        assert_eq!(on_disk(&store).len(), 50);
    }
}
