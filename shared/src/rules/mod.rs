//! Named validation rules
//!
//! A rule is a pure function of a field value and a string parameter. Rules
//! live in a [`RuleRegistry`] keyed by name; request types reference them by
//! name through tag strings such as `"required,maxlen=50"`.
//!
//! The registry is built once (usually [`RuleRegistry::default`], which holds
//! every built-in rule), optionally extended with custom rules, and then
//! shared behind an `Arc`. Nothing mutates it after that point.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::RuleError;

pub mod evaluators;

/// A single field value as seen by a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    /// An optional field that was not supplied.
    Absent,
    Text(&'a str),
    Integer(i64),
    Float(f64),
    /// A collection; rules only ever look at its length.
    List { element: &'static str, len: usize },
}

impl<'a> FieldValue<'a> {
    pub fn list<T>(items: &[T]) -> Self {
        FieldValue::List {
            element: short_type_name::<T>(),
            len: items.len(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Absent => "absent",
            FieldValue::Text(_) => "string",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::List { .. } => "collection",
        }
    }

    /// Empty strings, absent optionals and empty collections.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Absent => true,
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::List { len, .. } => *len == 0,
            FieldValue::Integer(_) | FieldValue::Float(_) => false,
        }
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        FieldValue::Text(value)
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(value: &'a String) -> Self {
        FieldValue::Text(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for FieldValue<'a> {
    fn from(value: &'a Option<String>) -> Self {
        match value {
            Some(text) => FieldValue::Text(text.as_str()),
            None => FieldValue::Absent,
        }
    }
}

impl<'a, T> From<&'a Vec<T>> for FieldValue<'a> {
    fn from(value: &'a Vec<T>) -> Self {
        FieldValue::list(value)
    }
}

impl From<i64> for FieldValue<'_> {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue<'_> {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue<'_> {
    fn from(value: u32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue<'_> {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<Option<i64>> for FieldValue<'_> {
    fn from(value: Option<i64>) -> Self {
        value.map_or(FieldValue::Absent, FieldValue::Integer)
    }
}

/// Signature every rule implements.
pub type RuleFn = Arc<dyn Fn(&FieldValue<'_>, &str) -> Result<(), RuleError> + Send + Sync>;

/// A rule reference: registry key plus rule-specific parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescriptor {
    pub name: String,
    pub parameter: String,
}

impl RuleDescriptor {
    pub fn new(name: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter: parameter.into(),
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }

    /// Parse a tag such as `required,maxlen=50,enum=A|B`.
    ///
    /// Rules are separated by commas; `\,` puts a literal comma into a
    /// parameter. The first `=` splits name from parameter. Blank segments
    /// are ignored.
    pub fn parse_tag(tag: &str) -> Vec<RuleDescriptor> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = tag.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&',') => {
                    current.push(',');
                    chars.next();
                }
                ',' => segments.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        segments.push(current);

        segments
            .into_iter()
            .filter_map(|segment| {
                let segment = segment.trim();
                if segment.is_empty() {
                    return None;
                }
                Some(match segment.split_once('=') {
                    Some((name, parameter)) => RuleDescriptor::new(name.trim(), parameter),
                    None => RuleDescriptor::bare(segment),
                })
            })
            .collect()
    }
}

impl fmt::Display for RuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameter.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}={}", self.name, self.parameter)
        }
    }
}

/// Mapping from rule name to rule function.
#[derive(Clone)]
pub struct RuleRegistry {
    rules: HashMap<String, RuleFn>,
}

impl RuleRegistry {
    /// A registry with no rules at all.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Install `rule` under `name`, replacing any previous rule of that name.
    pub fn register<F>(&mut self, name: impl Into<String>, rule: F) -> &mut Self
    where
        F: Fn(&FieldValue<'_>, &str) -> Result<(), RuleError> + Send + Sync + 'static,
    {
        self.rules.insert(name.into(), Arc::new(rule));
        self
    }

    pub fn resolve(&self, name: &str) -> Option<&RuleFn> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Registered rule names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        evaluators::register_builtin(&mut registry);
        registry
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}
