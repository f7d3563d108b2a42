//! Template persistence.
//!
//! Templates are stored as plain `.docx` files next to a JSON index that
//! holds their metadata and the active-template pointer.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

use super::model::{Template, TemplateMeta, TemplateSummary};

const INDEX_FILE: &str = "index.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("template {0} not found")]
    NotFound(Uuid),
    #[error("template storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("template index is corrupt: {0}")]
    Index(#[from] serde_json::Error),
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn save(&self, meta: TemplateMeta, content: Vec<u8>) -> Result<TemplateMeta, StoreError>;
    async fn list(&self) -> Result<Vec<TemplateSummary>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<TemplateMeta, StoreError>;
    /// Metadata and bytes of one template.
    async fn content(&self, id: Uuid) -> Result<Template, StoreError>;
    /// Remove a template. Deleting the active template leaves none active.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
    async fn activate(&self, id: Uuid) -> Result<TemplateMeta, StoreError>;
    async fn active(&self) -> Result<Option<TemplateMeta>, StoreError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TemplateIndex {
    templates: Vec<TemplateMeta>,
    active: Option<Uuid>,
}

impl TemplateIndex {
    fn find(&self, id: Uuid) -> Option<&TemplateMeta> {
        self.templates.iter().find(|meta| meta.id == id)
    }
}

/// Filesystem-backed store: `<dir>/<id>.docx` plus `<dir>/index.json`.
pub struct FsTemplateStore {
    dir: PathBuf,
    index: RwLock<TemplateIndex>,
    writer: tokio::sync::Mutex<()>,
}

impl FsTemplateStore {
    /// Open (or create) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let index = match tokio::fs::read(dir.join(INDEX_FILE)).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => TemplateIndex::default(),
            Err(e) => return Err(e.into()),
        };
        log::info!(
            "Template store opened at {} with {} template(s)",
            dir.display(),
            index.templates.len()
        );

        Ok(Self {
            dir,
            index: RwLock::new(index),
            writer: tokio::sync::Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.docx", id))
    }

    fn snapshot(&self) -> TemplateIndex {
        self.index.read().clone()
    }

    /// Persist `index` on the blocking pool, then publish it to readers.
    async fn commit(&self, index: TemplateIndex) -> Result<(), StoreError> {
        let dir = self.dir.clone();
        let snapshot = index.clone();
        tokio::task::spawn_blocking(move || write_index(&dir, &snapshot))
            .await
            .map_err(|e| StoreError::Io(io::Error::new(io::ErrorKind::Other, e)))??;
        *self.index.write() = index;
        Ok(())
    }
}

/// Write the index to a temp file in `dir`, then rename it into place.
fn write_index(dir: &Path, index: &TemplateIndex) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(index)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(&json)?;
    file.as_file().sync_all()?;
    file.persist(dir.join(INDEX_FILE))
        .map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl TemplateStore for FsTemplateStore {
    async fn save(&self, meta: TemplateMeta, content: Vec<u8>) -> Result<TemplateMeta, StoreError> {
        let _guard = self.writer.lock().await;
        let path = self.blob_path(meta.id);
        tokio::fs::write(&path, &content).await?;

        let mut index = self.snapshot();
        index.templates.push(meta.clone());
        if let Err(e) = self.commit(index).await {
            log::error!("Failed to record template {} in index: {}", meta.id, e);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }

        log::info!("Stored template {} ({}, {} bytes)", meta.id, meta.name, meta.size);
        Ok(meta)
    }

    async fn list(&self) -> Result<Vec<TemplateSummary>, StoreError> {
        let index = self.index.read();
        Ok(index
            .templates
            .iter()
            .map(|meta| TemplateSummary {
                active: index.active == Some(meta.id),
                meta: meta.clone(),
            })
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<TemplateMeta, StoreError> {
        self.index
            .read()
            .find(id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn content(&self, id: Uuid) -> Result<Template, StoreError> {
        let meta = self.get(id).await?;
        let content = tokio::fs::read(self.blob_path(id)).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                log::warn!("Template {} is indexed but its file is missing", id);
                StoreError::NotFound(id)
            } else {
                StoreError::Io(e)
            }
        })?;
        Ok(Template { meta, content })
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let _guard = self.writer.lock().await;
        let mut index = self.snapshot();
        let before = index.templates.len();
        index.templates.retain(|meta| meta.id != id);
        if index.templates.len() == before {
            return Err(StoreError::NotFound(id));
        }
        if index.active == Some(id) {
            log::info!("Deleted template {} was active; no template is active now", id);
            index.active = None;
        }
        self.commit(index).await?;

        match tokio::fs::remove_file(self.blob_path(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Template {} removed from index but file remains: {}", id, e),
        }
        log::info!("Deleted template {}", id);
        Ok(())
    }

    async fn activate(&self, id: Uuid) -> Result<TemplateMeta, StoreError> {
        let _guard = self.writer.lock().await;
        let mut index = self.snapshot();
        let meta = index.find(id).cloned().ok_or(StoreError::NotFound(id))?;
        index.active = Some(id);
        self.commit(index).await?;
        log::info!("Template {} ({}) is now active", id, meta.name);
        Ok(meta)
    }

    async fn active(&self) -> Result<Option<TemplateMeta>, StoreError> {
        let index = self.index.read();
        Ok(index.active.and_then(|id| index.find(id).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str) -> TemplateMeta {
        TemplateMeta::new(name.to_string(), 3, vec!["KOTA".to_string()])
    }

    #[tokio::test]
    async fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTemplateStore::open(dir.path()).await.unwrap();
        let saved = store.save(meta("a.docx"), b"abc".to_vec()).await.unwrap();
        store.activate(saved.id).await.unwrap();

        let reopened = FsTemplateStore::open(dir.path()).await.unwrap();
        let template = reopened.content(saved.id).await.unwrap();
        assert_eq!(template.content, b"abc");
        assert_eq!(template.meta, saved);
        assert_eq!(reopened.active().await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_delete_active_clears_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTemplateStore::open(dir.path()).await.unwrap();
        let first = store.save(meta("a.docx"), b"a".to_vec()).await.unwrap();
        let second = store.save(meta("b.docx"), b"b".to_vec()).await.unwrap();
        store.activate(first.id).await.unwrap();

        store.delete(first.id).await.unwrap();
        assert!(store.active().await.unwrap().is_none());
        assert!(!dir.path().join(format!("{}.docx", first.id)).exists());

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].meta.id, second.id);
        assert!(!listed[0].active);
    }

    #[tokio::test]
    async fn test_activation_is_a_pointer_swap() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTemplateStore::open(dir.path()).await.unwrap();
        let first = store.save(meta("a.docx"), b"a".to_vec()).await.unwrap();
        let second = store.save(meta("b.docx"), b"b".to_vec()).await.unwrap();

        store.activate(first.id).await.unwrap();
        store.activate(second.id).await.unwrap();

        let flags: Vec<bool> = store.list().await.unwrap().iter().map(|s| s.active).collect();
        assert_eq!(flags, vec![false, true]);
        assert_eq!(store.get(first.id).await.unwrap(), first);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_index_file_matches_memory_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTemplateStore::open(dir.path()).await.unwrap();
        let saved = store.save(meta("a.docx"), b"a".to_vec()).await.unwrap();
        store.activate(saved.id).await.unwrap();

        let bytes = std::fs::read(dir.path().join(INDEX_FILE)).unwrap();
        let on_disk: TemplateIndex = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(on_disk.active, Some(saved.id));
        assert_eq!(on_disk.templates, vec![saved]);
        assert_eq!(store.snapshot().active, on_disk.active);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTemplateStore::open(dir.path()).await.unwrap();
        let id = Uuid::new_v4();
        assert!(matches!(store.get(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.activate(id).await, Err(StoreError::NotFound(_))));
    }
}
