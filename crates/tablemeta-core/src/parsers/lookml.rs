//! Parser for LookML files
//!
//! Produces a `serde_json::Value` tree in the shape other LookML tooling uses:
//! repeatable keys (`view`, `dimension`, `measure`, ...) are collected into plural
//! lists (`views`, `dimensions`, `measures`), named blocks get a `name` key, and
//! expression keys (`sql`, `sql_table_name`, `html`, ...) hold the raw text up to
//! the `;;` terminator.
//!
//! Only the syntax is handled here; typed views live in [`crate::models::lookml`].

use crate::error::{CoreError, Result};
use crate::models::LookmlModel;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Keys that may appear more than once and are gathered into a plural list
const REPEATABLE_KEYS: &[&str] = &[
    "access_filter",
    "access_grant",
    "action",
    "aggregate_table",
    "allowed_value",
    "analysis",
    "assert",
    "column",
    "constant",
    "datagroup",
    "derived_column",
    "dimension",
    "dimension_group",
    "explore",
    "filter",
    "form_param",
    "include",
    "join",
    "link",
    "local_dependency",
    "map_layer",
    "measure",
    "named_value_format",
    "option",
    "override_constant",
    "parameter",
    "query",
    "remote_dependency",
    "set",
    "test",
    "view",
];

/// Deepest allowed nesting of blocks and lists
const MAX_DEPTH: usize = 64;

/// Syntax error with a 1-based line number
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct LookmlSyntaxError {
    pub line: usize,
    pub message: String,
}

/// LookML parser entry points
pub struct LookmlParser;

impl LookmlParser {
    /// Parse LookML source into a generic tree
    pub fn parse_str(content: &str) -> std::result::Result<Value, LookmlSyntaxError> {
        let mut cursor = Cursor::new(content);
        let body = cursor.parse_pairs(false)?;
        Ok(Value::Object(body))
    }

    /// Read and parse a LookML file into a generic tree
    pub fn parse_file(path: &Path) -> Result<Value> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CoreError::from_read(path, e))?;

        let tree = Self::parse_str(&content).map_err(|e| CoreError::LookmlParse {
            path: path.to_path_buf(),
            line: e.line,
            message: e.message,
        })?;

        debug!(path = %path.display(), "Parsed LookML file");
        Ok(tree)
    }

    /// Read and parse a LookML file into typed views
    pub fn load_model(path: &Path) -> Result<LookmlModel> {
        let tree = Self::parse_file(path)?;
        serde_json::from_value(tree).map_err(|e| CoreError::LookmlModel {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Plural list key for a repeatable key (`dimension` → `dimensions`)
fn plural_key(key: &str) -> String {
    if let Some(stem) = key.strip_suffix("sis") {
        format!("{stem}ses")
    } else if let Some(stem) = key.strip_suffix('y') {
        format!("{stem}ies")
    } else {
        format!("{key}s")
    }
}

/// Keys whose value is raw text terminated by `;;`
fn is_expression_key(key: &str) -> bool {
    key == "sql"
        || key == "html"
        || key.starts_with("sql_")
        || key.ends_with("_sql")
        || key.starts_with("expression")
}

fn is_bare_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '{' | '}' | '[' | ']' | ',' | ':' | '"' | '#')
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    depth: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> LookmlSyntaxError {
        LookmlSyntaxError {
            line: self.line,
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: char) -> std::result::Result<(), LookmlSyntaxError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> std::result::Result<T, LookmlSyntaxError>,
    ) -> std::result::Result<T, LookmlSyntaxError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nesting too deep (limit {MAX_DEPTH})")));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Skip whitespace and `#` comments
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    /// Key/value pairs until end of input, or until `}` when inside a block
    fn parse_pairs(
        &mut self,
        in_block: bool,
    ) -> std::result::Result<Map<String, Value>, LookmlSyntaxError> {
        let mut object = Map::new();
        let mut collected = HashSet::new();

        loop {
            self.skip_trivia();
            let line = self.line;
            match self.peek() {
                None if in_block => return Err(self.error("unclosed block, expected '}'")),
                None => break,
                Some('}') if in_block => {
                    self.bump();
                    break;
                }
                Some('}') => return Err(self.error("unexpected '}'")),
                Some(_) => {
                    let (key, value) = self.parse_pair()?;
                    insert_value(&mut object, &mut collected, key, value)
                        .map_err(|message| LookmlSyntaxError { line, message })?;
                }
            }
        }

        Ok(object)
    }

    fn parse_pair(&mut self) -> std::result::Result<(String, Value), LookmlSyntaxError> {
        let key = self.parse_bare_word()?;
        self.skip_trivia();
        self.expect(':')?;
        let value = self.parse_value(&key)?;
        Ok((key, value))
    }

    fn parse_value(&mut self, key: &str) -> std::result::Result<Value, LookmlSyntaxError> {
        if is_expression_key(key) {
            return self.parse_expression();
        }

        self.skip_trivia();
        match self.peek() {
            Some('"') => self.parse_quoted().map(Value::String),
            Some('[') => self.nested(Self::parse_list),
            Some('{') => {
                self.bump();
                self.nested(|c| c.parse_pairs(true)).map(Value::Object)
            }
            Some(_) => {
                let word = self.parse_bare_word()?;
                self.skip_trivia();
                if self.peek() == Some('{') {
                    // Named block: `dimension: id { ... }`
                    self.bump();
                    let body = self.nested(|c| c.parse_pairs(true))?;
                    let mut named = Map::new();
                    named.insert("name".to_string(), Value::String(word));
                    named.extend(body);
                    Ok(Value::Object(named))
                } else {
                    Ok(Value::String(word))
                }
            }
            None => Err(self.error(format!("missing value for '{key}'"))),
        }
    }

    /// Raw text up to `;;`, trimmed
    fn parse_expression(&mut self) -> std::result::Result<Value, LookmlSyntaxError> {
        let start_line = self.line;
        let rest = &self.src[self.pos..];
        let Some(end) = rest.find(";;") else {
            return Err(LookmlSyntaxError {
                line: start_line,
                message: "expression is missing its ';;' terminator".to_string(),
            });
        };

        let text = rest[..end].trim().to_string();
        let consumed = end + 2;
        self.line += rest[..consumed].matches('\n').count();
        self.pos += consumed;
        Ok(Value::String(text))
    }

    fn parse_quoted(&mut self) -> std::result::Result<String, LookmlSyntaxError> {
        let start_line = self.line;
        self.expect('"')?;
        let mut out = String::new();

        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => break,
                },
                Some(c) => out.push(c),
                None => break,
            }
        }

        Err(LookmlSyntaxError {
            line: start_line,
            message: "unterminated string".to_string(),
        })
    }

    fn parse_bare_word(&mut self) -> std::result::Result<String, LookmlSyntaxError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_bare_char(c) {
                break;
            }
            self.bump();
        }

        if self.pos == start {
            return match self.peek() {
                Some(c) => Err(self.error(format!("unexpected '{c}'"))),
                None => Err(self.error("unexpected end of input")),
            };
        }
        Ok(self.src[start..self.pos].to_string())
    }

    /// `[a, "b", key: value, { ... }]`, trailing comma allowed
    fn parse_list(&mut self) -> std::result::Result<Value, LookmlSyntaxError> {
        self.expect('[')?;
        let mut items = Vec::new();

        loop {
            self.skip_trivia();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(',') if !items.is_empty() => {
                    self.bump();
                    continue;
                }
                Some('"') => items.push(Value::String(self.parse_quoted()?)),
                Some('{') => {
                    self.bump();
                    items.push(Value::Object(self.nested(|c| c.parse_pairs(true))?));
                }
                Some(_) => {
                    let word = self.parse_bare_word()?;
                    self.skip_trivia();
                    if self.peek() == Some(':') {
                        self.bump();
                        let value = self.parse_value(&word)?;
                        let mut pair = Map::new();
                        pair.insert(word, value);
                        items.push(Value::Object(pair));
                    } else {
                        items.push(Value::String(word));
                    }
                }
                None => return Err(self.error("unclosed list, expected ']'")),
            }
        }

        Ok(Value::Array(items))
    }
}

/// Insert a pair into `object`; `collected` tracks plural lists built from
/// repeatable keys, which a plain key of the same name may not replace
fn insert_value(
    object: &mut Map<String, Value>,
    collected: &mut HashSet<String>,
    key: String,
    value: Value,
) -> std::result::Result<(), String> {
    if REPEATABLE_KEYS.contains(&key.as_str()) {
        let plural = plural_key(&key);
        if object.contains_key(&plural) && !collected.contains(&plural) {
            return Err(format!("'{key}' conflicts with an earlier '{plural}' value"));
        }
        let list = object
            .entry(plural.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = list {
            items.push(value);
        }
        collected.insert(plural);
        return Ok(());
    }

    if collected.contains(&key) {
        return Err(format!("'{key}' conflicts with earlier repeated entries"));
    }
    if object.insert(key.clone(), value).is_some() {
        debug!(key = %key, "Duplicate LookML key, keeping last value");
    }
    Ok(())
}
