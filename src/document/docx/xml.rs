//! Minimal WordprocessingML scanner.
//!
//! Word parts are flat enough that a tag-level tokenizer is all the
//! renderer needs: it never builds a tree, it only locates elements and
//! rewrites text node contents in place.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    /// Opening or self-closing tag. `raw` is the whole tag including `<` and `>`.
    Start {
        name: &'a str,
        raw: &'a str,
        empty: bool,
    },
    End {
        name: &'a str,
    },
    Text(&'a str),
    /// Declarations, processing instructions, comments, CDATA.
    Other(&'a str),
}

#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    pub start: usize,
    pub end: usize,
    pub token: Token<'a>,
}

pub struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let src = self.src;
        let start = self.pos;
        if start >= src.len() {
            return None;
        }
        let rest = &src[start..];

        if !rest.starts_with('<') {
            let len = rest.find('<').unwrap_or(rest.len());
            self.pos = start + len;
            return Some(Node {
                start,
                end: self.pos,
                token: Token::Text(&rest[..len]),
            });
        }

        let terminator = if rest.starts_with("<!--") {
            "-->"
        } else if rest.starts_with("<![CDATA[") {
            "]]>"
        } else {
            ">"
        };
        let len = match rest.find(terminator) {
            Some(idx) => idx + terminator.len(),
            None => rest.len(),
        };
        self.pos = start + len;
        let raw = &rest[..len];

        let token = if raw.starts_with("<?") || raw.starts_with("<!") || !raw.ends_with('>') {
            Token::Other(raw)
        } else if let Some(name) = raw.strip_prefix("</") {
            Token::End {
                name: name.trim_end_matches('>').trim(),
            }
        } else {
            let body = &raw[1..];
            let name_len = body
                .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
                .unwrap_or(body.len());
            Token::Start {
                name: &body[..name_len],
                raw,
                empty: raw.ends_with("/>"),
            }
        };

        Some(Node {
            start,
            end: self.pos,
            token,
        })
    }
}

/// Byte range of the innermost `tag` element that contains `pos`.
pub fn element_bounds(xml: &str, pos: usize, tag: &str) -> Option<Range<usize>> {
    let mut open: Vec<usize> = Vec::new();
    for node in Tokens::new(xml) {
        match node.token {
            Token::Start { name, empty, .. } if name == tag => {
                if empty {
                    if node.start <= pos && pos < node.end {
                        return Some(node.start..node.end);
                    }
                } else {
                    open.push(node.start);
                }
            }
            Token::End { name } if name == tag => {
                if let Some(start) = open.pop() {
                    if start <= pos && pos < node.end {
                        return Some(start..node.end);
                    }
                }
            }
            _ => {}
        }
        if node.start > pos && open.is_empty() {
            return None;
        }
    }
    None
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        let xml = r#"<?xml version="1.0"?><w:p><w:r><w:t xml:space="preserve">Hi &amp; bye</w:t></w:r><w:p/></w:p>"#;
        let tokens: Vec<Token> = Tokens::new(xml).map(|n| n.token).collect();
        assert!(matches!(tokens[0], Token::Other(_)));
        assert!(matches!(tokens[1], Token::Start { name: "w:p", empty: false, .. }));
        assert!(matches!(tokens[4], Token::Text("Hi &amp; bye")));
        assert!(matches!(tokens[7], Token::Start { name: "w:p", empty: true, .. }));
        assert_eq!(tokens[8], Token::End { name: "w:p" });
    }

    #[test]
    fn test_element_bounds_picks_innermost() {
        let xml = "<w:tbl><w:tr><w:tc>A</w:tc></w:tr><w:tr><w:tc>B</w:tc></w:tr></w:tbl>";
        let pos = xml.find('B').unwrap();
        let row = element_bounds(xml, pos, "w:tr").unwrap();
        assert_eq!(&xml[row], "<w:tr><w:tc>B</w:tc></w:tr>");
        assert!(element_bounds(xml, pos, "w:p").is_none());
    }

    #[test]
    fn test_element_bounds_ignores_prefix_names() {
        let xml = "<w:tr><w:trPr/><w:tc>X</w:tc></w:tr>";
        let row = element_bounds(xml, xml.find('X').unwrap(), "w:tr").unwrap();
        assert_eq!(row, 0..xml.len());
    }

    #[test]
    fn test_escape_roundtrip_entities() {
        assert_eq!(unescape("a &lt;b&gt; &#65;&#x42; &unknown;"), "a <b> AB &unknown;");
        assert_eq!(escape("<PT & Co>"), "&lt;PT &amp; Co&gt;");
    }
}
