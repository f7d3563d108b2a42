//! Shared fixtures for the integration tests.
//!
//! Word templates are built in memory so every test states exactly which
//! XML it feeds to the renderer.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

/// One paragraph with a single run.
pub fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text)
}

/// One paragraph whose text is spread over several runs.
pub fn split_paragraph(pieces: &[&str]) -> String {
    let runs: String = pieces
        .iter()
        .map(|piece| format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, piece))
        .collect();
    format!("<w:p>{}</w:p>", runs)
}

/// A table row with one paragraph per cell.
pub fn table_row(cells: &[&str]) -> String {
    let cells: String = cells
        .iter()
        .map(|cell| format!("<w:tc>{}</w:tc>", paragraph(cell)))
        .collect();
    format!("<w:tr>{}</w:tr>", cells)
}

pub fn table(rows: &[String]) -> String {
    format!("<w:tbl>{}</w:tbl>", rows.concat())
}

/// Wrap body XML into a complete `word/document.xml`.
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    )
}

/// Build a minimal `.docx` around the given body XML.
pub fn docx(body: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();

    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(document_xml(body).as_bytes()).unwrap();

    writer.finish().unwrap().into_inner()
}

/// Read `word/document.xml` back out of rendered bytes.
pub fn document_part(bytes: &[u8]) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut part = archive.by_name("word/document.xml").unwrap();
    let mut xml = String::new();
    part.read_to_string(&mut xml).unwrap();
    xml
}

/// Concatenated text of every `<w:t>` node, in document order.
pub fn visible_text(xml: &str) -> String {
    let mut text = String::new();
    let mut rest = xml;
    while let Some(start) = rest.find("<w:t") {
        let after = &rest[start + 4..];
        // skip <w:tbl>, <w:tc>, <w:tr> and friends
        if !(after.starts_with('>') || after.starts_with(' ')) {
            rest = after;
            continue;
        }
        let Some(open_end) = after.find('>') else { break };
        let body = &after[open_end + 1..];
        let Some(close) = body.find("</w:t>") else { break };
        text.push_str(&body[..close]);
        rest = &body[close + 6..];
    }
    text
}
