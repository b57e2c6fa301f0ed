//! Property values and lazy attribute references
//!
//! Resource attributes such as a bucket ARN only exist once the engine has
//! created the resource. They are carried as interpolation expressions
//! (`${bucket.arn}`) that the engine resolves; literal text is escaped so that
//! it never reads as an expression.

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Component, Path};

/// A property value: a literal or an engine-resolved reference
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Output(Value);

impl Output {
    /// Literal string
    pub fn string(s: impl AsRef<str>) -> Self {
        Self(Value::String(escape(s.as_ref())))
    }

    /// Reference to a resource or variable attribute (`${name.path}`)
    pub fn reference(name: &str, path: Option<&str>) -> Self {
        match path {
            Some(path) => Self(Value::String(format!("${{{}.{}}}", name, path))),
            None => Self(Value::String(format!("${{{}}}", name))),
        }
    }

    /// Reference to a stack configuration value (`${key}`)
    pub fn config(key: &str) -> Self {
        Self::reference(key, None)
    }

    /// Concatenate literals and references into one string
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Output>,
    {
        let mut out = String::new();
        for part in parts {
            match part.into().0 {
                Value::String(s) => out.push_str(&s),
                Value::Null => {}
                other => out.push_str(&other.to_string()),
            }
        }
        Self(Value::String(out))
    }

    /// List of values
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Output>,
    {
        Self(Value::Array(items.into_iter().map(|i| i.into().0).collect()))
    }

    /// List of literal strings
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::list(items.into_iter().map(|s| Output::string(s)))
    }

    /// Nested object
    pub fn object(properties: Properties) -> Self {
        Self(Value::Object(properties.into_map()))
    }

    /// Archive built from a local file or directory
    pub fn file_archive(path: impl AsRef<str>) -> Self {
        Self::function("fn::fileArchive", Output::string(path))
    }

    /// Asset read from a local file
    pub fn file_asset(path: impl AsRef<str>) -> Self {
        Self::function("fn::fileAsset", Output::string(path))
    }

    fn function(name: &str, arg: Output) -> Self {
        let mut map = Map::new();
        map.insert(name.to_string(), arg.0);
        Self(Value::Object(map))
    }

    /// Whether the value is exactly one reference
    pub fn is_reference(&self) -> bool {
        match &self.0 {
            Value::String(s) => {
                s.starts_with("${") && s.ends_with('}') && s[2..].find("${").is_none()
            }
            _ => false,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Escape `${` so literal text is not read as interpolation
fn escape(s: &str) -> String {
    if s.contains("${") {
        s.replace("${", "$${")
    } else {
        s.to_string()
    }
}

/// Anchor a template path to the project root
///
/// The engine runs the rendered program from `.stratoform/<stack>/program`,
/// so archive and asset paths must not stay relative to the project.
pub fn project_path(root: &Path, path: &str) -> String {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.display().to_string();
    }
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .fold(root.to_path_buf(), |acc, c| acc.join(c))
        .display()
        .to_string()
}

impl From<&str> for Output {
    fn from(s: &str) -> Self {
        Output::string(s)
    }
}

impl From<String> for Output {
    fn from(s: String) -> Self {
        Output::string(s)
    }
}

impl From<&String> for Output {
    fn from(s: &String) -> Self {
        Output::string(s)
    }
}

impl From<bool> for Output {
    fn from(b: bool) -> Self {
        Self(Value::Bool(b))
    }
}

impl From<u32> for Output {
    fn from(n: u32) -> Self {
        Self(Value::from(n))
    }
}

impl From<i64> for Output {
    fn from(n: i64) -> Self {
        Self(Value::from(n))
    }
}

impl From<Properties> for Output {
    fn from(p: Properties) -> Self {
        Output::object(p)
    }
}

impl From<&Output> for Output {
    fn from(o: &Output) -> Self {
        o.clone()
    }
}

/// Property map of a resource or invoke
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Properties(Map<String, Value>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`
    pub fn with(mut self, key: &str, value: impl Into<Output>) -> Self {
        self.set(key, value);
        self
    }

    /// Set `key` when `value` is `Some`
    pub fn with_opt(mut self, key: &str, value: Option<impl Into<Output>>) -> Self {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    /// Set `key` unless `value` is empty
    pub fn with_non_empty(mut self, key: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.set(key, value);
        }
        self
    }

    /// Set `key` to a string list unless `values` is empty
    pub fn with_strings<S: AsRef<str>>(mut self, key: &str, values: &[S]) -> Self {
        if !values.is_empty() {
            self.set(key, Output::strings(values));
        }
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Output>) {
        self.0.insert(key.to_string(), value.into().0);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Value at a `/`-separated path, e.g. `extendedS3Configuration/prefix`
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('/');
        let first = self.0.get(parts.next()?)?;
        parts.try_fold(first, |value, part| match value {
            Value::Object(map) => map.get(part),
            Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl<K: AsRef<str>, V: Into<Output>> FromIterator<(K, V)> for Properties {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.set(k.as_ref(), v);
        }
        props
    }
}
