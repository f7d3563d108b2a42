//! Placeholder expressions and the helper functions templates may call.
//!
//! Grammar (inside `${ ... }`, an optional leading `=` is ignored):
//!
//! ```text
//! expr := string | number | call | path
//! call := IDENT "(" [expr ("," expr)*] ")"
//! path := ["$"] IDENT ("." IDENT | "[" DIGITS "]")*
//! ```

use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::Value;

use crate::document::common::{reformat_date, value_to_text};
use crate::document::TemplateRenderError;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(Vec<String>),
    Text(String),
    Number(f64),
    Call { name: String, args: Vec<Expr> },
}

/// A function exposed to template expressions.
pub type HelperFn = fn(&[Value]) -> Result<Value, String>;

/// Table of functions callable from placeholders.
#[derive(Clone)]
pub struct Helpers {
    table: HashMap<&'static str, HelperFn>,
}

impl Helpers {
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// `formatNumber`, `upperCase` and `formatDate`.
    pub fn standard() -> Self {
        let mut helpers = Self::empty();
        helpers.register("formatNumber", format_number);
        helpers.register("upperCase", upper_case);
        helpers.register("formatDate", format_date);
        helpers
    }

    pub fn register(&mut self, name: &'static str, helper: HelperFn) {
        self.table.insert(name, helper);
    }

    pub fn get(&self, name: &str) -> Option<HelperFn> {
        self.table.get(name).copied()
    }
}

impl Default for Helpers {
    fn default() -> Self {
        Self::standard()
    }
}

fn single_arg<'v>(args: &'v [Value]) -> Result<&'v Value, String> {
    match args {
        [value] => Ok(value),
        _ => Err(format!("membutuhkan 1 argumen, diberikan {}", args.len())),
    }
}

fn format_number(args: &[Value]) -> Result<Value, String> {
    let text = value_to_text(single_arg(args)?);
    let width = text.chars().count();
    let padded = if width < 2 {
        format!("{}{}", "0".repeat(2 - width), text)
    } else {
        text
    };
    Ok(Value::String(padded))
}

fn upper_case(args: &[Value]) -> Result<Value, String> {
    Ok(Value::String(value_to_text(single_arg(args)?).to_uppercase()))
}

fn format_date(args: &[Value]) -> Result<Value, String> {
    Ok(Value::String(reformat_date(&value_to_text(single_arg(args)?))))
}

/// Variable bindings visible while rendering. Loop variables shadow the root.
#[derive(Clone)]
pub struct Scope<'a> {
    root: &'a Value,
    locals: Vec<(String, &'a Value)>,
}

impl<'a> Scope<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            locals: Vec::new(),
        }
    }

    pub fn with(&self, name: &str, value: &'a Value) -> Self {
        let mut scope = self.clone();
        scope.locals.push((name.to_string(), value));
        scope
    }

    pub fn lookup(&self, path: &[String]) -> Option<&'a Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self
            .locals
            .iter()
            .rev()
            .find(|(name, _)| name == first)
            .map(|(_, value)| *value)
            .or_else(|| self.root.get(first.as_str()))?;

        for segment in rest {
            current = match current {
                Value::Object(map) => map.get(segment.as_str())?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

pub fn evaluate<'a>(
    expr: &Expr,
    scope: &Scope<'a>,
    helpers: &Helpers,
) -> Result<Cow<'a, Value>, TemplateRenderError> {
    match expr {
        Expr::Path(path) => Ok(Cow::Borrowed(scope.lookup(path).unwrap_or(&NULL))),
        Expr::Text(text) => Ok(Cow::Owned(Value::String(text.clone()))),
        Expr::Number(n) => Ok(Cow::Owned(
            serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        )),
        Expr::Call { name, args } => {
            let helper = helpers
                .get(name)
                .ok_or_else(|| TemplateRenderError::UnknownHelper(name.clone()))?;
            let values = args
                .iter()
                .map(|arg| evaluate(arg, scope, helpers).map(Cow::into_owned))
                .collect::<Result<Vec<_>, _>>()?;
            helper(&values)
                .map(Cow::Owned)
                .map_err(|message| TemplateRenderError::Helper {
                    name: name.clone(),
                    message,
                })
        }
    }
}

pub fn parse_expression(source: &str) -> Result<Expr, TemplateRenderError> {
    let trimmed = source.trim();
    let body = trimmed.strip_prefix('=').unwrap_or(trimmed);
    let mut parser = Parser {
        source,
        chars: body.chars().collect(),
        pos: 0,
    };
    let expr = parser.expr()?;
    parser.skip_ws();
    if parser.pos < parser.chars.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

/// Parse a dotted variable path such as `SISWA_LIST` or `$data.rows`.
pub fn parse_path(source: &str) -> Result<Vec<String>, TemplateRenderError> {
    match parse_expression(source)? {
        Expr::Path(path) => Ok(path),
        _ => Err(TemplateRenderError::Syntax {
            expression: source.to_string(),
            message: "expected a variable path".to_string(),
        }),
    }
}

struct Parser<'s> {
    source: &'s str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> TemplateRenderError {
        TemplateRenderError::Syntax {
            expression: self.source.to_string(),
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expr(&mut self) -> Result<Expr, TemplateRenderError> {
        self.skip_ws();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.string(quote),
            Some(c) if c.is_ascii_digit() || c == '-' => self.number(),
            Some(c) if c == '$' || c == '_' || c.is_alphabetic() => self.path_or_call(),
            Some(c) => Err(self.error(&format!("unexpected character '{}'", c))),
            None => Err(self.error("empty expression")),
        }
    }

    fn string(&mut self, quote: char) -> Result<Expr, TemplateRenderError> {
        self.pos += 1;
        let mut text = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => {
                    if let Some(escaped) = self.peek() {
                        text.push(escaped);
                        self.pos += 1;
                    }
                }
                c if c == quote => return Ok(Expr::Text(text)),
                c => text.push(c),
            }
        }
        Err(self.error("unterminated string literal"))
    }

    fn number(&mut self) -> Result<Expr, TemplateRenderError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map(Expr::Number)
            .map_err(|_| self.error(&format!("invalid number '{}'", literal)))
    }

    fn ident(&mut self) -> Result<String, TemplateRenderError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c == '_' || c.is_alphanumeric())
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn path_or_call(&mut self) -> Result<Expr, TemplateRenderError> {
        let sigil = self.peek() == Some('$');
        if sigil {
            self.pos += 1;
        }
        let head = self.ident()?;

        self.skip_ws();
        if !sigil && self.peek() == Some('(') {
            self.pos += 1;
            let mut args = Vec::new();
            self.skip_ws();
            if self.peek() == Some(')') {
                self.pos += 1;
                return Ok(Expr::Call { name: head, args });
            }
            loop {
                args.push(self.expr()?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some(')') => {
                        self.pos += 1;
                        return Ok(Expr::Call { name: head, args });
                    }
                    _ => return Err(self.error("expected ',' or ')'")),
                }
            }
        }

        let mut path = vec![head];
        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    path.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    let start = self.pos;
                    while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        self.pos += 1;
                    }
                    if start == self.pos || self.peek() != Some(']') {
                        return Err(self.error("expected a numeric index"));
                    }
                    path.push(self.chars[start..self.pos].iter().collect());
                    self.pos += 1;
                }
                _ => return Ok(Expr::Path(path)),
            }
        }
    }
}
