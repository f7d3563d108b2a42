//! Plain-text conversion and placeholder discovery.

use lazy_static::lazy_static;
use regex::Regex;

use super::package::{DocxPackage, DOCUMENT_PART};
use super::xml::{unescape, Token, Tokens};
use crate::document::TemplateReadError;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\$\{([^}]+)\}").expect("valid placeholder pattern");
}

/// Plain text of a WordprocessingML part. Paragraphs end with a blank line.
pub fn raw_text(xml: &str) -> String {
    let mut out = String::new();
    let mut in_text = false;
    let mut in_paragraph_props = false;

    for node in Tokens::new(xml) {
        match node.token {
            Token::Start { name: "w:pPr", empty: false, .. } => in_paragraph_props = true,
            Token::End { name: "w:pPr" } => in_paragraph_props = false,
            Token::Start { name: "w:t", empty, .. } => in_text = !empty,
            Token::End { name: "w:t" } => in_text = false,
            Token::Text(text) if in_text => out.push_str(&unescape(text)),
            Token::Start { name: "w:tab", .. } if !in_paragraph_props => out.push('\t'),
            Token::Start { name: "w:br" | "w:cr", .. } => out.push('\n'),
            Token::Start { name: "w:p", empty: true, .. } | Token::End { name: "w:p" } => {
                out.push_str("\n\n")
            }
            _ => {}
        }
    }
    out
}

/// Distinct `${NAME}` contents in first-seen order.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for capture in PLACEHOLDER.captures_iter(text) {
        let name = &capture[1];
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Placeholder names referenced by the body of a Word document.
pub fn extract_variables(bytes: &[u8]) -> Result<Vec<String>, TemplateReadError> {
    let package = DocxPackage::from_bytes(bytes)?;
    let text = raw_text(package.part_str(DOCUMENT_PART)?);
    let names = placeholders(&text);
    log::debug!("Extracted {} template variables", names.len());
    Ok(names)
}
