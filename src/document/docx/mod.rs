//! Word template support: placeholder extraction, rendering and preview.

mod context;
pub mod expr;
mod package;
mod preview;
mod render;
mod text;
mod xml;

pub use context::{RenderContext, StudentRow};
pub use expr::Helpers;
pub use preview::preview_html;
pub use render::TemplateRenderer;
pub use text::extract_variables;
