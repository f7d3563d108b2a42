//! Reading and writing the OOXML zip container.

use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::document::{TemplateReadError, TemplateRenderError};

/// Main document body part.
pub const DOCUMENT_PART: &str = "word/document.xml";

struct PackageEntry {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
}

/// All parts of a Word document held in memory, in archive order.
pub struct DocxPackage {
    entries: Vec<PackageEntry>,
}

impl DocxPackage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TemplateReadError> {
        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(TemplateReadError::Container)?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(TemplateReadError::Container)?;
            let name = file.name().to_string();
            let is_dir = file.is_dir();
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|source| TemplateReadError::Part {
                    part: name.clone(),
                    source,
                })?;
            entries.push(PackageEntry { name, data, is_dir });
        }

        let package = Self { entries };
        if package.part(DOCUMENT_PART).is_none() {
            return Err(TemplateReadError::MissingPart(DOCUMENT_PART.to_string()));
        }
        Ok(package)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.data.as_slice())
    }

    pub fn part_str(&self, name: &str) -> Result<&str, TemplateReadError> {
        let data = self
            .part(name)
            .ok_or_else(|| TemplateReadError::MissingPart(name.to_string()))?;
        std::str::from_utf8(data).map_err(|_| TemplateReadError::Encoding(name.to_string()))
    }

    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry {
                name: name.to_string(),
                data,
                is_dir: false,
            }),
        }
    }

    /// Parts that carry user-visible text: body first, then headers and footers.
    pub fn content_parts(&self) -> Vec<String> {
        let mut parts = vec![DOCUMENT_PART.to_string()];
        parts.extend(
            self.entries
                .iter()
                .map(|entry| entry.name.as_str())
                .filter(|name| {
                    (name.starts_with("word/header") || name.starts_with("word/footer"))
                        && name.ends_with(".xml")
                })
                .map(str::to_string),
        );
        parts
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TemplateRenderError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            if entry.is_dir {
                writer
                    .add_directory(entry.name.as_str(), options)
                    .map_err(TemplateRenderError::Write)?;
                continue;
            }
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(TemplateRenderError::Write)?;
            writer
                .write_all(&entry.data)
                .map_err(TemplateRenderError::Io)?;
        }

        let cursor = writer.finish().map_err(TemplateRenderError::Write)?;
        Ok(cursor.into_inner())
    }
}
