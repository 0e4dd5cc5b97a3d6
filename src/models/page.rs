//! Web page model and its free-form attributes

use crate::selector::scan::{tokenize, TagKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A user-defined attribute value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
    List(Vec<String>),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Integer(n) => write!(f, "{}", n),
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::Flag(b) => write!(f, "{}", b),
            AttrValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Integer(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::List(value)
    }
}

/// Named attributes attached to a page, kept sorted by name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, returning the previous value if there was one
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    /// Returns the value of `name` only if it is text
    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(AttrValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A fetched (or extracted) piece of markup with a name and source URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebPage {
    pub name: String,
    pub url: String,
    pub html: String,
    pub attributes: Attributes,
}

impl WebPage {
    pub fn new(name: impl Into<String>, url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            html: html.into(),
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.set(name, value);
        self
    }

    /// The page markup laid out by [`format_markup`] with 4-space indents
    pub fn pretty_html(&self) -> String {
        format_markup(&self.html, 4, 0)
    }
}

/// Lays markup out one tag or text run per line, indented by nesting depth
///
/// Each opening tag indents what follows by `indent_size` spaces and its
/// closing tag dedents; void and self-closed tags leave the depth alone.
/// Whitespace-only text runs are dropped, other text is trimmed. Nesting
/// starts at `initial_indent` levels.
///
/// # Example
///
/// ```
/// use sumi_sieve::models::format_markup;
///
/// assert_eq!(
///     format_markup("<ul><li>One</li><br></ul>", 2, 0),
///     "<ul>\n  <li>\n    One\n  </li>\n  <br>\n</ul>"
/// );
/// ```
pub fn format_markup(markup: &str, indent_size: usize, initial_indent: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut depth = initial_indent;
    let mut cursor = 0;

    let mut push_line = |depth: usize, text: &str| {
        let text = text.trim();
        if !text.is_empty() {
            lines.push(format!("{}{}", " ".repeat(depth * indent_size), text));
        }
    };

    for token in tokenize(markup) {
        push_line(depth, &markup[cursor..token.start]);

        let tag = &markup[token.start..token.end];
        match token.kind {
            TagKind::Open => {
                push_line(depth, tag);
                depth += 1;
            }
            TagKind::Close => {
                depth = depth.saturating_sub(1).max(initial_indent);
                push_line(depth, tag);
            }
            TagKind::SelfContained => push_line(depth, tag),
        }
        cursor = token.end;
    }
    push_line(depth, &markup[cursor..]);

    lines.join("\n")
}
