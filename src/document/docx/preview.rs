//! Lightweight HTML rendering of a template for in-browser preview.

use super::package::{DocxPackage, DOCUMENT_PART};
use super::xml::{escape, unescape, Token, Tokens};
use crate::document::TemplateReadError;

/// HTML fragment of the document body: paragraphs, tables, bold and italic.
pub fn preview_html(bytes: &[u8]) -> Result<String, TemplateReadError> {
    let package = DocxPackage::from_bytes(bytes)?;
    Ok(document_html(package.part_str(DOCUMENT_PART)?))
}

#[derive(Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
}

fn toggled_on(raw: &str) -> bool {
    !(raw.contains(r#"w:val="0""#) || raw.contains(r#"w:val="false""#))
}

pub fn document_html(xml: &str) -> String {
    let mut out = String::new();
    let mut style = RunStyle::default();
    let mut in_run_props = false;
    let mut in_paragraph_props = false;
    let mut in_text = false;

    for node in Tokens::new(xml) {
        match node.token {
            Token::Start { name: "w:p", empty, .. } => {
                out.push_str(if empty { "<p></p>" } else { "<p>" })
            }
            Token::End { name: "w:p" } => out.push_str("</p>"),
            Token::Start { name: "w:tbl", empty: false, .. } => out.push_str("<table>"),
            Token::End { name: "w:tbl" } => out.push_str("</table>"),
            Token::Start { name: "w:tr", empty: false, .. } => out.push_str("<tr>"),
            Token::End { name: "w:tr" } => out.push_str("</tr>"),
            Token::Start { name: "w:tc", empty: false, .. } => out.push_str("<td>"),
            Token::End { name: "w:tc" } => out.push_str("</td>"),

            Token::Start { name: "w:pPr", empty: false, .. } => in_paragraph_props = true,
            Token::End { name: "w:pPr" } => in_paragraph_props = false,
            Token::Start { name: "w:r", empty: false, .. } => style = RunStyle::default(),
            Token::Start { name: "w:rPr", empty: false, .. } => in_run_props = true,
            Token::End { name: "w:rPr" } => in_run_props = false,
            Token::Start { name: "w:b", raw, .. } if in_run_props => style.bold = toggled_on(raw),
            Token::Start { name: "w:i", raw, .. } if in_run_props => {
                style.italic = toggled_on(raw)
            }

            Token::Start { name: "w:t", empty, .. } => in_text = !empty,
            Token::End { name: "w:t" } => in_text = false,
            Token::Text(text) if in_text => {
                let mut html = escape(&unescape(text));
                if style.italic {
                    html = format!("<em>{}</em>", html);
                }
                if style.bold {
                    html = format!("<strong>{}</strong>", html);
                }
                out.push_str(&html);
            }
            Token::Start { name: "w:br" | "w:cr", .. } => out.push_str("<br/>"),
            Token::Start { name: "w:tab", .. } if !in_paragraph_props => out.push_str("&emsp;"),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_and_formatting() {
        let xml = concat!(
            "<w:body><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>SURAT</w:t></w:r>",
            "<w:r><w:rPr><w:b w:val=\"0\"/><w:i/></w:rPr><w:t xml:space=\"preserve\"> A &amp; B</w:t></w:r>",
            "</w:p><w:p/></w:body>"
        );
        assert_eq!(
            document_html(xml),
            "<p><strong>SURAT</strong><em> A &amp; B</em></p><p></p>"
        );
    }

    #[test]
    fn test_table_preview() {
        let xml = "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>${COL_NO}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>";
        assert_eq!(
            document_html(xml),
            "<table><tr><td><p>${COL_NO}</p></td></tr></table>"
        );
    }
}
