//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::document::{Composer, TemplateRenderer};
use crate::template::{FsTemplateStore, StoreError, TemplateStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub templates: Arc<dyn TemplateStore>,
    pub renderer: Arc<TemplateRenderer>,
    pub composer: Arc<Composer>,
    /// HTML previews by template id. Stored templates never change, so
    /// entries only leave on delete or expiry.
    pub preview_cache: Cache<Uuid, String>,
}

impl AppState {
    /// State backed by the filesystem store in `config.template_dir`.
    pub async fn new(config: AppConfig) -> Result<Self, StoreError> {
        let store = FsTemplateStore::open(config.template_dir.clone()).await?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: AppConfig, templates: Arc<dyn TemplateStore>) -> Self {
        let preview_cache = Cache::builder()
            .time_to_live(Duration::from_secs(60 * 60))
            .max_capacity(100)
            .build();

        Self {
            composer: Arc::new(Composer::new(config.institution.clone())),
            renderer: Arc::new(TemplateRenderer::new()),
            config: Arc::new(config),
            templates,
            preview_cache,
        }
    }
}
