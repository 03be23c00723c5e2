//! The `---` delimited YAML block at the top of a thread file.
//!
//! Fields are kept as an ordered mapping so keys this crate does not know
//! about survive a rewrite unchanged and in their original position.

use serde_yaml::{Mapping, Value};

pub const DELIMITER: &str = "---";

/// Split raw content into the YAML text and the byte offset where the body starts.
///
/// The content must open with `---\n` and contain a line that is exactly `---`.
pub fn split(content: &str) -> Result<(&str, usize), String> {
    let rest = content
        .strip_prefix("---\n")
        .ok_or_else(|| "missing frontmatter delimiter".to_string())?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.strip_suffix('\n').unwrap_or(line) == DELIMITER {
            return Ok((&rest[..offset], 4 + offset + line.len()));
        }
        offset += line.len();
    }
    Err("unclosed frontmatter".to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    fields: Mapping,
}

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the YAML between the delimiters. Empty YAML is an empty mapping.
    pub fn parse(yaml: &str) -> Result<Self, String> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Mapping(fields)) => Ok(Frontmatter { fields }),
            Ok(Value::Null) => Ok(Self::default()),
            Ok(_) => Err("frontmatter is not a mapping".to_string()),
            Err(e) => Err(format!("parsing YAML: {}", e)),
        }
    }

    /// Serialize as YAML lines, each ending in a newline; empty for no fields.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        if self.fields.is_empty() {
            return Ok(String::new());
        }
        let mut yaml = serde_yaml::to_string(&self.fields)?;
        if !yaml.ends_with('\n') {
            yaml.push('\n');
        }
        Ok(yaml)
    }

    /// The full delimited block, ready to be followed by a body.
    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        Ok(format!("{d}\n{}{d}\n", self.to_yaml()?, d = DELIMITER))
    }

    /// Scalar value of `key` as text. Sequences and mappings read as absent.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Set `key`, keeping its position if present, appending otherwise.
    pub fn set(&mut self, key: &str, value: &str) {
        self.fields
            .insert(Value::String(key.to_string()), Value::String(value.to_string()));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().filter_map(Value::as_str)
    }

    pub fn id(&self) -> Option<String> {
        self.get("id")
    }

    pub fn name(&self) -> String {
        self.get("name").unwrap_or_default()
    }

    pub fn desc(&self) -> String {
        self.get("desc").unwrap_or_default()
    }

    pub fn status(&self) -> String {
        self.get("status").unwrap_or_default()
    }
}
