//! Document generation core.
//!
//! Two independent pipelines live here:
//! - `docx` - placeholder discovery and template filling for uploaded Word templates
//! - `pdf` - fixed-layout letters, certificates and reports drawn without a template file
//!
//! Both produce a [`RenderedDocument`] that the HTTP layer hands straight to the user.

pub mod common;
pub mod docx;
pub mod pdf;
pub mod traits;
pub mod validation;

pub use docx::{extract_variables, preview_html, RenderContext, StudentRow, TemplateRenderer};
pub use pdf::{Canvas, Composer};
pub use traits::{Generator, Validator};

use thiserror::Error;

/// Content type of Word (OOXML) documents.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Content type of PDF documents.
pub const PDF_MIME: &str = "application/pdf";

/// The uploaded bytes could not be read as a Word document.
#[derive(Debug, Error)]
pub enum TemplateReadError {
    #[error("template is not a valid zip container: {0}")]
    Container(#[source] zip::result::ZipError),
    #[error("failed to read template part {part}: {source}")]
    Part {
        part: String,
        #[source]
        source: std::io::Error,
    },
    #[error("template is missing part {0}")]
    MissingPart(String),
    #[error("template part {0} is not valid UTF-8")]
    Encoding(String),
}

/// Filling a template failed. No partial output is ever returned.
#[derive(Debug, Error)]
pub enum TemplateRenderError {
    #[error(transparent)]
    Read(#[from] TemplateReadError),
    #[error("invalid template expression `{expression}`: {message}")]
    Syntax { expression: String, message: String },
    #[error("placeholder starting with `{0}` is never closed")]
    Unterminated(String),
    #[error("unknown template function `{0}`")]
    UnknownHelper(String),
    #[error("template function `{name}` failed: {message}")]
    Helper { name: String, message: String },
    #[error("invalid repeating block: {0}")]
    Loop(String),
    #[error("failed to write rendered document: {0}")]
    Write(#[source] zip::result::ZipError),
    #[error("failed to write rendered document: {0}")]
    Io(#[source] std::io::Error),
}

/// The PDF drawing backend failed.
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("failed to load PDF font: {0}")]
    Font(String),
    #[error("failed to serialize PDF document: {0}")]
    Save(String),
}

/// Result of a successful render or composition.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Suggested download name, e.g. `Sertifikat_Budi_Santoso.pdf`.
    pub filename: String,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

impl RenderedDocument {
    pub fn docx(filename: String, data: Vec<u8>) -> Self {
        Self {
            filename,
            content_type: DOCX_MIME,
            data,
        }
    }

    pub fn pdf(filename: String, data: Vec<u8>) -> Self {
        Self {
            filename,
            content_type: PDF_MIME,
            data,
        }
    }
}
