//! Input validation for uploads and generation requests.
//!
//! Errors are collected rather than returned one at a time so the user sees
//! every problem with a form in a single response.

use std::fmt;

use super::DOCX_MIME;

const MSWORD_MIME: &str = "application/msword";

/// One rejected field, with an Indonesian message and an optional hint.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn empty_field(field: &str, label: &str) -> Self {
        let hint = format!("Isi {} terlebih dahulu", label.to_lowercase());
        Self::new(field, format!("{} wajib diisi", label)).with_suggestion(hint)
    }

    pub fn invalid_template_type(field: &str, filename: &str) -> Self {
        Self::new(
            field,
            format!("File '{}' bukan dokumen Word", filename),
        )
        .with_suggestion("Unggah template dengan ekstensi .docx")
    }

    pub fn empty_file(field: &str) -> Self {
        Self::new(field, "File template kosong")
    }

    pub fn file_too_large(field: &str, limit: usize) -> Self {
        Self::new(
            field,
            format!("Ukuran file melebihi batas {} KB", limit / 1024),
        )
    }

    pub fn score_out_of_range(field: &str, value: f64) -> Self {
        Self::new(field, format!("Nilai {} berada di luar rentang 0-100", value))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.suggestion {
            Some(hint) => write!(f, "[{}] {}. {}", self.field, self.message, hint),
            None => write!(f, "[{}] {}", self.field, self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Accumulates field errors for one request.
#[derive(Debug, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Validasi gagal: N kesalahan ditemukan` followed by a numbered list.
    pub fn to_message(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let items = self
            .0
            .iter()
            .enumerate()
            .map(|(index, error)| format!("{}. {}", index + 1, error))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Validasi gagal: {} kesalahan ditemukan\n\n{}", self.0.len(), items)
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.is_empty() {
            return Ok(());
        }
        Err(self.to_message())
    }
}

/// Blank or whitespace-only values are rejected.
pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

/// Accept Word documents by extension or declared content type.
pub fn validate_template_file(
    filename: &str,
    content_type: Option<&str>,
    size: usize,
    max_size: usize,
    errors: &mut ValidationErrors,
) {
    let lower = filename.to_lowercase();
    let by_type = matches!(content_type, Some(DOCX_MIME) | Some(MSWORD_MIME));
    if !(by_type || lower.ends_with(".docx") || lower.ends_with(".doc")) {
        errors.add(ValidationError::invalid_template_type("file", filename));
    }

    if size == 0 {
        errors.add(ValidationError::empty_file("file"));
    } else if size > max_size {
        errors.add(ValidationError::file_too_large("file", max_size));
    }
}

/// Validate an optional score; absent is fine.
pub fn validate_score(value: Option<f64>, field: &str, errors: &mut ValidationErrors) {
    if let Some(score) = value {
        if !score.is_finite() || !(0.0..=100.0).contains(&score) {
            errors.add(ValidationError::score_out_of_range(field, score));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_file_by_extension() {
        let mut errors = ValidationErrors::new();
        validate_template_file("surat.DOCX", None, 10, 100, &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_template_file_by_content_type() {
        let mut errors = ValidationErrors::new();
        validate_template_file("upload", Some(DOCX_MIME), 10, 100, &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_template_file_rejects_pdf_and_empty() {
        let mut errors = ValidationErrors::new();
        validate_template_file("surat.pdf", Some("application/pdf"), 0, 100, &mut errors);
        assert_eq!(errors.len(), 2);
        let msg = errors.to_message();
        assert!(msg.contains("bukan dokumen Word"));
        assert!(msg.contains("kosong"));
    }

    #[test]
    fn test_score_range() {
        let mut errors = ValidationErrors::new();
        validate_score(None, "nilai", &mut errors);
        validate_score(Some(0.0), "nilai", &mut errors);
        assert!(errors.is_empty());
        validate_score(Some(120.0), "nilai", &mut errors);
        assert_eq!(errors.len(), 1);
    }
}
