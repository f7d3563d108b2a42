//! Fills a Word template with a data context.
//!
//! Rendering runs in three passes over each text-bearing part:
//! 1. placeholders that Word split across several runs are merged back
//!    into the run where they start;
//! 2. the part is cut into literal segments and `FOR`/`END-FOR` blocks;
//! 3. segments are emitted, repeating loop bodies once per list item and
//!    substituting `${...}` inside `<w:t>` text nodes.

use std::ops::Range;

use chrono::{Local, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::context::RenderContext;
use super::expr::{evaluate, parse_expression, parse_path, Helpers, Scope};
use super::package::DocxPackage;
use super::text::raw_text;
use super::xml::{element_bounds, escape, unescape, Token, Tokens};
use crate::document::common::{download_filename, underscore_spaces, value_to_text};
use crate::document::{RenderedDocument, TemplateRenderError};
use crate::template::model::Template;

lazy_static! {
    static ref FOR_MARKER: Regex =
        Regex::new(r"\$\{\s*FOR\s+\$?([A-Za-z_][A-Za-z0-9_]*)\s+IN\s+([^}]*?)\s*\}")
            .expect("valid FOR pattern");
    static ref END_FOR_MARKER: Regex =
        Regex::new(r"\$\{\s*END-FOR\s+\$?([A-Za-z_][A-Za-z0-9_]*)\s*\}")
            .expect("valid END-FOR pattern");
    static ref TEXT_NODE: Regex =
        Regex::new(r"(<w:t(?:\s[^>]*)?>)([^<]*)(</w:t>)").expect("valid text node pattern");
}

/// Template renderer with its table of expression helpers.
#[derive(Clone, Default)]
pub struct TemplateRenderer {
    helpers: Helpers,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_helpers(helpers: Helpers) -> Self {
        Self { helpers }
    }

    /// Render a stored template with today's date as `CURRENT_DATE`.
    pub fn render(
        &self,
        template: &Template,
        context: &RenderContext,
    ) -> Result<RenderedDocument, TemplateRenderError> {
        self.render_on(template, context, Local::now().date_naive())
    }

    pub fn render_on(
        &self,
        template: &Template,
        context: &RenderContext,
        today: NaiveDate,
    ) -> Result<RenderedDocument, TemplateRenderError> {
        let data = context.to_data(today);
        let bytes = self.render_bytes(&template.content, &data)?;

        let label = template.meta.name.trim_end_matches(".docx");
        let filename = download_filename(
            &underscore_spaces(label),
            context.nama_perusahaan.as_deref().unwrap_or_default(),
            "docx",
        );
        log::info!(
            "Rendered template {} ({} bytes) as {}",
            template.meta.id,
            bytes.len(),
            filename
        );
        Ok(RenderedDocument::docx(filename, bytes))
    }

    /// Render raw template bytes against an arbitrary JSON data object.
    pub fn render_bytes(&self, template: &[u8], data: &Value) -> Result<Vec<u8>, TemplateRenderError> {
        let mut package = DocxPackage::from_bytes(template)?;
        for part in package.content_parts() {
            let xml = package.part_str(&part)?.to_string();
            let rendered = self.render_xml(&xml, data)?;
            package.set_part(&part, rendered.into_bytes());
        }
        package.to_bytes()
    }

    /// Render one WordprocessingML part.
    pub fn render_xml(&self, xml: &str, data: &Value) -> Result<String, TemplateRenderError> {
        let merged = merge_split_placeholders(xml);
        let segments = parse_segments(&merged)?;
        let mut out = String::with_capacity(merged.len());
        emit(&segments, &Scope::new(data), &self.helpers, &mut out)?;
        Ok(out)
    }
}

#[derive(Debug)]
enum Segment {
    Literal(String),
    Loop {
        var: String,
        source: Vec<String>,
        body: Vec<Segment>,
    },
}

struct TextNode {
    tag: Range<usize>,
    content: Range<usize>,
    text: String,
}

/// Move the pieces of every `${...}` that Word spread over several runs into
/// the run where the placeholder opens, so each placeholder lives in a single
/// `<w:t>` node afterwards.
fn merge_split_placeholders(xml: &str) -> String {
    let mut groups: Vec<Vec<TextNode>> = Vec::new();
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut open_tag: Option<Range<usize>> = None;

    for node in Tokens::new(xml) {
        match node.token {
            Token::Start { name: "w:p", empty: false, .. } => groups.push(Vec::new()),
            Token::End { name: "w:p" } => {
                if let Some(group) = groups.pop() {
                    edits.extend(merge_group(group));
                }
            }
            Token::Start { name: "w:t", empty: false, .. } => open_tag = Some(node.start..node.end),
            Token::End { name: "w:t" } => {
                if let (Some(tag), Some(group)) = (open_tag.take(), groups.last_mut()) {
                    let content = tag.end..node.start;
                    group.push(TextNode {
                        text: unescape(&xml[content.clone()]),
                        tag,
                        content,
                    });
                }
            }
            _ => {}
        }
    }

    if edits.is_empty() {
        return xml.to_string();
    }

    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(xml.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.push_str(&xml[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&xml[cursor..]);
    out
}

fn merge_group(group: Vec<TextNode>) -> Vec<(Range<usize>, String)> {
    let joined: String = group.iter().map(|node| node.text.as_str()).collect();
    if group.len() < 2 || !joined.contains("${") {
        return Vec::new();
    }

    let mut texts = vec![String::new(); group.len()];
    let mut owner: Option<usize> = None;
    let mut dollar_in: Option<usize> = None;

    for (index, node) in group.iter().enumerate() {
        for ch in node.text.chars() {
            if let Some(target) = owner {
                texts[target].push(ch);
                if ch == '}' {
                    owner = None;
                }
                continue;
            }
            if ch == '{' {
                if let Some(target) = dollar_in.take() {
                    texts[target].push(ch);
                    owner = Some(target);
                    continue;
                }
            }
            texts[index].push(ch);
            dollar_in = (ch == '$').then_some(index);
        }
    }

    let mut edits = Vec::new();
    for (node, text) in group.into_iter().zip(texts) {
        if text == node.text {
            continue;
        }
        log::debug!("Merging split placeholder run into `{}`", text);
        edits.push((node.tag, r#"<w:t xml:space="preserve">"#.to_string()));
        edits.push((node.content, escape(&text)));
    }
    edits
}

fn parse_segments(xml: &str) -> Result<Vec<Segment>, TemplateRenderError> {
    let mut segments = Vec::new();
    let mut rest = xml.to_string();

    loop {
        let (marker, var, source) = match FOR_MARKER.captures(&rest) {
            Some(open) => (
                open.get(0).map(|m| m.range()).unwrap_or_default(),
                open[1].to_string(),
                parse_path(&open[2])?,
            ),
            None => break,
        };

        let close = matching_end(&rest, marker.end, &var)?;
        let region = loop_region(&rest, marker, close)?;

        let mut literal = rest[..region.span.start].to_string();
        literal.push_str(&region.before);
        segments.push(Segment::Literal(literal));
        segments.push(Segment::Loop {
            body: parse_segments(&region.body)?,
            var,
            source,
        });
        rest = format!("{}{}", region.after, &rest[region.span.end..]);
    }

    segments.push(Segment::Literal(rest));
    Ok(segments)
}

/// Range of the `END-FOR` closing the loop over `var` opened before `from`.
fn matching_end(xml: &str, from: usize, var: &str) -> Result<Range<usize>, TemplateRenderError> {
    let mut depth = 1;
    let mut pos = from;
    loop {
        let next_open = next_marker(&FOR_MARKER, xml, pos, var);
        let next_close = next_marker(&END_FOR_MARKER, xml, pos, var);

        match (next_open, next_close) {
            (Some(open), Some(close)) if open.start < close.start => {
                depth += 1;
                pos = open.end;
            }
            (_, Some(close)) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(close);
                }
                pos = close.end;
            }
            (_, None) => {
                return Err(TemplateRenderError::Loop(format!(
                    "FOR {} tanpa END-FOR {}",
                    var, var
                )))
            }
        }
    }
}

fn next_marker(pattern: &Regex, xml: &str, mut pos: usize, var: &str) -> Option<Range<usize>> {
    while let Some(capture) = pattern.captures_at(xml, pos) {
        let whole = capture.get(0)?.range();
        if &capture[1] == var {
            return Some(whole);
        }
        pos = whole.end;
    }
    None
}

struct LoopRegion {
    /// Span of the input the loop replaces.
    span: Range<usize>,
    /// What is left of the opening marker's element, emitted once before the loop.
    before: String,
    body: String,
    /// What is left of the closing marker's element, emitted once after the loop.
    after: String,
}

/// Element the loop repeats: table rows when the markers sit in a table,
/// paragraphs otherwise. Markers in separate paragraphs of one cell repeat
/// those paragraphs and leave the row alone.
fn repeat_tag(
    xml: &str,
    open: &Range<usize>,
    close: &Range<usize>,
) -> Result<&'static str, TemplateRenderError> {
    let open_row = element_bounds(xml, open.start, "w:tr");
    let close_row = element_bounds(xml, close.start, "w:tr");

    match (&open_row, &close_row) {
        (Some(a), Some(b)) => {
            let same_table = element_bounds(xml, a.start, "w:tbl")
                == element_bounds(xml, b.start, "w:tbl");
            if !same_table {
                return Err(TemplateRenderError::Loop(
                    "FOR dan END-FOR harus berada di tabel yang sama".to_string(),
                ));
            }
            let open_cell = element_bounds(xml, open.start, "w:tc");
            let shared_cell =
                open_cell.is_some() && open_cell == element_bounds(xml, close.start, "w:tc");
            let same_paragraph = element_bounds(xml, open.start, "w:p")
                == element_bounds(xml, close.start, "w:p");
            if shared_cell && !same_paragraph {
                Ok("w:p")
            } else {
                Ok("w:tr")
            }
        }
        (None, None) => Ok("w:p"),
        _ => Err(TemplateRenderError::Loop(
            "FOR dan END-FOR harus sama-sama berada di dalam tabel atau di luar tabel".to_string(),
        )),
    }
}

/// Region replaced by the loop and the body repeated for each item.
///
/// When both markers share one element that element is the body, minus the
/// markers. Otherwise everything between the two marker elements repeats;
/// a marker element is removed when the marker was its only text and kept
/// without the marker when it carries anything else.
fn loop_region(
    xml: &str,
    open: Range<usize>,
    close: Range<usize>,
) -> Result<LoopRegion, TemplateRenderError> {
    let tag = repeat_tag(xml, &open, &close)?;

    let (first, last) = match (
        element_bounds(xml, open.start, tag),
        element_bounds(xml, close.start, tag),
    ) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(TemplateRenderError::Loop(
                "penanda FOR/END-FOR harus berada di dalam paragraf".to_string(),
            ))
        }
    };

    if first == last {
        let mut body = String::with_capacity(first.len());
        body.push_str(&xml[first.start..open.start]);
        body.push_str(&xml[open.end..close.start]);
        body.push_str(&xml[close.end..first.end]);
        return Ok(LoopRegion {
            span: first,
            before: String::new(),
            body,
            after: String::new(),
        });
    }

    if first.end > last.start {
        return Err(TemplateRenderError::Loop(
            "END-FOR harus berada setelah FOR".to_string(),
        ));
    }
    Ok(LoopRegion {
        before: without_marker(xml, &first, &open),
        body: xml[first.end..last.start].to_string(),
        after: without_marker(xml, &last, &close),
        span: first.start..last.end,
    })
}

/// `element` with `marker` cut out, or nothing when no visible text remains.
fn without_marker(xml: &str, element: &Range<usize>, marker: &Range<usize>) -> String {
    let kept = format!(
        "{}{}",
        &xml[element.start..marker.start],
        &xml[marker.end..element.end]
    );
    if raw_text(&kept).trim().is_empty() {
        String::new()
    } else {
        log::debug!("Keeping text beside loop marker `{}`", &xml[marker.clone()]);
        kept
    }
}

fn emit(
    segments: &[Segment],
    scope: &Scope<'_>,
    helpers: &Helpers,
    out: &mut String,
) -> Result<(), TemplateRenderError> {
    for segment in segments {
        match segment {
            Segment::Literal(xml) => substitute(xml, scope, helpers, out)?,
            Segment::Loop { var, source, body } => match scope.lookup(source) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => {
                    log::debug!("Repeating block `{}` for {} items", var, items.len());
                    for item in items {
                        emit(body, &scope.with(var, item), helpers, out)?;
                    }
                }
                Some(_) => {
                    return Err(TemplateRenderError::Loop(format!(
                        "`{}` bukan sebuah daftar",
                        source.join(".")
                    )))
                }
            },
        }
    }
    Ok(())
}

fn substitute(
    xml: &str,
    scope: &Scope<'_>,
    helpers: &Helpers,
    out: &mut String,
) -> Result<(), TemplateRenderError> {
    let mut cursor = 0;
    for capture in TEXT_NODE.captures_iter(xml) {
        let content = match capture.get(2) {
            Some(content) => content,
            None => continue,
        };
        let text = unescape(content.as_str());
        if !text.contains("${") {
            continue;
        }
        out.push_str(&xml[cursor..content.start()]);
        out.push_str(&escape(&fill_text(&text, scope, helpers)?));
        cursor = content.end();
    }
    out.push_str(&xml[cursor..]);
    Ok(())
}

fn fill_text(text: &str, scope: &Scope<'_>, helpers: &Helpers) -> Result<String, TemplateRenderError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| TemplateRenderError::Unterminated(rest[start..].chars().take(30).collect()))?;
        let inner = after[..end].trim();

        if inner.starts_with("FOR ") || inner.starts_with("END-FOR") {
            return Err(TemplateRenderError::Loop(format!(
                "penanda `{}` tidak berpasangan",
                inner
            )));
        }

        let expr = parse_expression(inner)?;
        let value = evaluate(&expr, scope, helpers)?;
        out.push_str(&value_to_text(&value));
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(text: &str) -> String {
        format!("<w:r><w:t>{}</w:t></w:r>", text)
    }

    fn para(runs: &[&str]) -> String {
        format!(
            "<w:p>{}</w:p>",
            runs.iter().map(|r| run(r)).collect::<String>()
        )
    }

    #[test]
    fn test_merge_split_placeholder() {
        let xml = para(&["Yth. $", "{NAMA", "PERUSAHAAN} di ", "${KOTA}"]);
        let merged = merge_split_placeholders(&xml);
        assert!(merged.contains(r#"<w:t xml:space="preserve">Yth. ${NAMAPERUSAHAAN}</w:t>"#));
        assert!(merged.contains(r#"<w:t xml:space="preserve"> di </w:t>"#));
        assert!(merged.contains("<w:t>${KOTA}</w:t>"));
    }

    #[test]
    fn test_substitution_escapes_values() {
        let renderer = TemplateRenderer::new();
        let xml = para(&["${NAMAPERUSAHAAN}"]);
        let out = renderer
            .render_xml(&xml, &json!({ "NAMAPERUSAHAAN": "PT <A & B>" }))
            .unwrap();
        assert!(out.contains("PT &lt;A &amp; B&gt;"));
    }

    #[test]
    fn test_missing_value_renders_empty() {
        let renderer = TemplateRenderer::new();
        let out = renderer
            .render_xml(&para(&["Alamat: ${ALAMATPERUSAHAAN}."]), &json!({}))
            .unwrap();
        assert!(out.contains("<w:t>Alamat: .</w:t>"));
    }

    #[test]
    fn test_paragraph_loop() {
        let renderer = TemplateRenderer::new();
        let xml = format!(
            "{}{}{}",
            para(&["${FOR s IN SISWA_LIST}"]),
            para(&["${formatNumber($s.no)}. ${upperCase($s.nama)}"]),
            para(&["${END-FOR s}"])
        );
        let data = json!({ "SISWA_LIST": [{ "no": 1, "nama": "ani" }, { "no": 2, "nama": "budi" }] });
        let out = renderer.render_xml(&xml, &data).unwrap();
        assert_eq!(out, format!("{}{}", para(&["01. ANI"]), para(&["02. BUDI"])));
    }

    fn row(cells: &[&str]) -> String {
        format!(
            "<w:tr>{}</w:tr>",
            cells
                .iter()
                .map(|c| format!("<w:tc>{}</w:tc>", para(&[c])))
                .collect::<String>()
        )
    }

    #[test]
    fn test_single_row_loop_repeats_row() {
        let renderer = TemplateRenderer::new();
        let xml = format!(
            "<w:tbl>{}{}</w:tbl>",
            row(&["${COL_NAMA}", "${COL_KELAS}"]),
            row(&["${FOR s IN SISWA_LIST}${$s.nama}", "${$s.kelas}${END-FOR s}"])
        );
        let data = json!({
            "COL_NAMA": "Nama",
            "COL_KELAS": "Kelas",
            "SISWA_LIST": [
                { "nama": "Ani", "kelas": "XII TKJ 1" },
                { "nama": "Budi", "kelas": "XII TKJ 2" }
            ]
        });
        let out = renderer.render_xml(&xml, &data).unwrap();
        assert_eq!(
            out,
            format!(
                "<w:tbl>{}{}{}</w:tbl>",
                row(&["Nama", "Kelas"]),
                row(&["Ani", "XII TKJ 1"]),
                row(&["Budi", "XII TKJ 2"])
            )
        );
    }

    #[test]
    fn test_marker_rows_are_dropped() {
        let renderer = TemplateRenderer::new();
        let xml = format!(
            "<w:tbl>{}{}{}</w:tbl>",
            row(&["${FOR s IN SISWA_LIST}"]),
            row(&["${$s.nama}"]),
            row(&["${END-FOR s}"])
        );
        let out = renderer
            .render_xml(&xml, &json!({ "SISWA_LIST": [{ "nama": "Ani" }] }))
            .unwrap();
        assert_eq!(out, format!("<w:tbl>{}</w:tbl>", row(&["Ani"])));

        let empty = renderer.render_xml(&xml, &json!({ "SISWA_LIST": [] })).unwrap();
        assert_eq!(empty, "<w:tbl></w:tbl>");
    }

    #[test]
    fn test_marker_row_with_other_cells_is_kept() {
        let renderer = TemplateRenderer::new();
        let xml = format!(
            "<w:tbl>{}{}{}</w:tbl>",
            row(&["Siswa", "${FOR s IN SISWA_LIST}"]),
            row(&["${$s.nama}"]),
            row(&["${END-FOR s}"])
        );
        let out = renderer
            .render_xml(&xml, &json!({ "SISWA_LIST": [{ "nama": "Ani" }] }))
            .unwrap();
        assert_eq!(
            out,
            format!("<w:tbl>{}{}</w:tbl>", row(&["Siswa", ""]), row(&["Ani"]))
        );
    }

    #[test]
    fn test_paragraph_loop_inside_cell_keeps_row() {
        let renderer = TemplateRenderer::new();
        let cell = format!(
            "<w:tc>{}{}{}</w:tc>",
            para(&["${FOR s IN SISWA_LIST}"]),
            para(&["${$s.nama}"]),
            para(&["${END-FOR s}"])
        );
        let xml = format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc>{}</w:tr></w:tbl>",
            para(&["Header"]),
            cell
        );
        let data = json!({ "SISWA_LIST": [{ "nama": "Ani" }, { "nama": "Budi" }] });
        let out = renderer.render_xml(&xml, &data).unwrap();
        assert_eq!(
            out,
            format!(
                "<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}{}</w:tc></w:tr></w:tbl>",
                para(&["Header"]),
                para(&["Ani"]),
                para(&["Budi"])
            )
        );
    }

    #[test]
    fn test_unbalanced_markers_fail() {
        let renderer = TemplateRenderer::new();
        let err = renderer
            .render_xml(&para(&["${FOR s IN SISWA_LIST}"]), &json!({}))
            .unwrap_err();
        assert!(matches!(err, TemplateRenderError::Loop(_)));

        let err = renderer
            .render_xml(&para(&["${END-FOR s}"]), &json!({}))
            .unwrap_err();
        assert!(matches!(err, TemplateRenderError::Loop(_)));
    }

    #[test]
    fn test_unterminated_placeholder_fails() {
        let renderer = TemplateRenderer::new();
        let err = renderer
            .render_xml(&para(&["${KOTA"]), &json!({}))
            .unwrap_err();
        assert!(matches!(err, TemplateRenderError::Unterminated(_)));
    }

    #[test]
    fn test_loop_over_scalar_fails() {
        let renderer = TemplateRenderer::new();
        let xml = para(&["${FOR s IN KOTA}${s}${END-FOR s}"]);
        let err = renderer
            .render_xml(&xml, &json!({ "KOTA": "Sidoarjo" }))
            .unwrap_err();
        assert!(matches!(err, TemplateRenderError::Loop(_)));
    }
}
