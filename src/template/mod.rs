//! Uploaded Word templates: model, storage and HTTP routes.

pub mod model;
pub mod routes;
pub mod store;

pub use model::{Template, TemplateMeta, TemplateSummary};
pub use store::{FsTemplateStore, StoreError, TemplateStore};
