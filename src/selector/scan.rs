//! Flat tag scanner over raw markup
//!
//! This module turns a markup string into a sequence of tag tokens and,
//! from those, into element spans. It never builds a tree: an element is
//! just the byte range from its opening tag to its matching closing tag.
//!
//! The scanner is deliberately forgiving:
//! - Comments, doctypes and processing instructions are skipped
//! - `<script>` and `<style>` bodies are treated as raw text
//! - A tag missing its `>` runs to end of input
//! - An element missing its closing tag runs to end of input

use std::collections::HashMap;

/// Elements that never have a closing tag in HTML
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is not markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// The shape of a scanned tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagKind {
    /// `<name ...>`
    Open,
    /// `</name>`
    Close,
    /// `<name .../>` or a void element
    SelfContained,
}

/// One tag found in the markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TagToken {
    /// Lowercased tag name
    pub name: String,
    pub kind: TagKind,
    /// Byte offset of the `<`
    pub start: usize,
    /// Byte offset just past the `>` (or end of input)
    pub end: usize,
}

/// A matched element: opening tag through its closing tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    /// Lowercased tag name
    pub name: String,
    pub start: usize,
    /// End of the opening tag
    pub open_end: usize,
    /// End of the whole element
    pub end: usize,
}

impl Element {
    /// The raw markup of the opening tag
    pub fn open_tag<'a>(&self, markup: &'a str) -> &'a str {
        &markup[self.start..self.open_end]
    }

    /// The raw markup of the whole element
    pub fn fragment<'a>(&self, markup: &'a str) -> &'a str {
        &markup[self.start..self.end]
    }
}

pub(crate) fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':')
}

/// Returns true if `name` is a plausible tag or attribute name
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(is_name_byte)
}

/// Finds the end of a tag starting at `from`, honouring quoted attribute values
///
/// A quote only opens a quoted value when it is the first character after
/// `=` (whitespace allowed in between); a stray apostrophe in an unquoted
/// value such as `title=don't` is plain text. Returns the offset just past
/// the closing `>`, or the input length if the tag never closes.
fn find_tag_end(bytes: &[u8], from: usize) -> usize {
    let mut quote: Option<u8> = None;
    let mut after_equals = false;
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if after_equals && (b == b'"' || b == b'\'') => quote = Some(b),
            None if b == b'>' => return i + 1,
            None => {}
        }
        if quote.is_none() && !b.is_ascii_whitespace() {
            after_equals = b == b'=';
        }
        i += 1;
    }
    bytes.len()
}

/// Finds `needle` in `haystack` starting at `from`, ASCII case-insensitively
fn find_ignore_case(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Scans markup into tag tokens in document order
pub(crate) fn tokenize(markup: &str) -> Vec<TagToken> {
    let bytes = markup.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }

        let rest = &bytes[i + 1..];

        // Comments
        if rest.starts_with(b"!--") {
            i = match find_ignore_case(bytes, b"-->", i + 4) {
                Some(pos) => pos + 3,
                None => bytes.len(),
            };
            continue;
        }

        // Doctype, CDATA, processing instructions
        if rest.first().is_some_and(|&b| b == b'!' || b == b'?') {
            i = find_tag_end(bytes, i + 1);
            continue;
        }

        let (kind, name_start) = match rest.first() {
            Some(b'/') => (TagKind::Close, i + 2),
            Some(b) if b.is_ascii_alphabetic() => (TagKind::Open, i + 1),
            _ => {
                // A stray '<' in text
                i += 1;
                continue;
            }
        };

        let mut name_end = name_start;
        while name_end < bytes.len() && is_name_byte(bytes[name_end]) {
            name_end += 1;
        }
        if name_end == name_start {
            i += 1;
            continue;
        }

        let name = markup[name_start..name_end].to_ascii_lowercase();
        let end = find_tag_end(bytes, name_end);

        let kind = if kind == TagKind::Open
            && (is_void_element(&name) || is_self_closed(&bytes[name_end..end]))
        {
            TagKind::SelfContained
        } else {
            kind
        };

        let raw_text = kind == TagKind::Open && RAW_TEXT_ELEMENTS.contains(&name.as_str());
        tracing::trace!("Scanned {:?} tag <{}> at {}..{}", kind, name, i, end);
        tokens.push(TagToken {
            name: name.clone(),
            kind,
            start: i,
            end,
        });
        i = end;

        // Skip raw text up to the matching closing tag
        if raw_text {
            let closing = format!("</{}", name);
            i = find_ignore_case(bytes, closing.as_bytes(), i).unwrap_or(bytes.len());
        }
    }

    tokens
}

/// Checks whether the tail of a tag (after its name) ends in `/>`
fn is_self_closed(tail: &[u8]) -> bool {
    let trimmed = match tail.last() {
        Some(b'>') => &tail[..tail.len() - 1],
        _ => tail,
    };
    trimmed
        .iter()
        .rev()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'/')
}

/// Builds nesting-aware element spans from the markup
///
/// Each opening tag is paired with the closing tag of the same name that
/// brings that name's depth back to zero. An opening tag that is never
/// closed runs to the end of the input. Stray closing tags are ignored.
/// The result is in document order of the opening tags.
pub(crate) fn elements(markup: &str) -> Vec<Element> {
    let tokens = tokenize(markup);
    let mut elements: Vec<Element> = Vec::new();
    let mut open: HashMap<String, Vec<usize>> = HashMap::new();

    for token in tokens {
        match token.kind {
            TagKind::Open => {
                open.entry(token.name.clone())
                    .or_default()
                    .push(elements.len());
                elements.push(Element {
                    name: token.name,
                    start: token.start,
                    open_end: token.end,
                    end: markup.len(),
                });
            }
            TagKind::SelfContained => elements.push(Element {
                name: token.name,
                start: token.start,
                open_end: token.end,
                end: token.end,
            }),
            TagKind::Close => {
                if let Some(index) = open.get_mut(&token.name).and_then(Vec::pop) {
                    elements[index].end = token.end;
                }
            }
        }
    }

    elements
}

/// Builds shortest-span element regions for a single tag name
///
/// Unlike [`elements`], every opening tag is paired with the *first* closing
/// tag of the same name that follows it, regardless of nesting. An opening
/// tag with no closing tag yields just the opening tag itself.
pub(crate) fn shortest_spans(markup: &str, name: &str) -> Vec<Element> {
    let tokens = tokenize(markup);
    let closes: Vec<&TagToken> = tokens
        .iter()
        .filter(|t| t.kind == TagKind::Close && t.name == name)
        .collect();

    tokens
        .iter()
        .filter(|t| t.kind != TagKind::Close && t.name == name)
        .map(|t| {
            let end = match t.kind {
                TagKind::SelfContained => t.end,
                _ => {
                    let next = closes.partition_point(|c| c.start < t.end);
                    closes.get(next).map_or(t.end, |c| c.end)
                }
            };
            Element {
                name: t.name.clone(),
                start: t.start,
                open_end: t.end,
                end,
            }
        })
        .collect()
}

/// Parses the attributes of an opening tag
///
/// Accepts `name`, `name=value`, `name="value"` and `name='value'`.
/// Names are lowercased; values are returned verbatim without quotes.
/// A bare attribute gets an empty value.
pub(crate) fn parse_attributes(open_tag: &str) -> Vec<(String, String)> {
    let bytes = open_tag.as_bytes();
    let mut attributes = Vec::new();

    // Skip '<' and the tag name
    let mut i = 1;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }

    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] == b'>' {
            break;
        }

        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let name = open_tag[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        if i >= bytes.len() || bytes[i] != b'=' {
            if !name.is_empty() {
                attributes.push((name, String::new()));
            } else {
                i += 1;
            }
            continue;
        }

        // Skip '=' and whitespace
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = match bytes.get(i) {
            Some(&q) if q == b'"' || q == b'\'' => {
                let value_start = i + 1;
                let value_end = bytes[value_start..]
                    .iter()
                    .position(|&b| b == q)
                    .map_or(bytes.len(), |p| value_start + p);
                i = (value_end + 1).min(bytes.len());
                &open_tag[value_start..value_end]
            }
            _ => {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                &open_tag[value_start..i]
            }
        };

        if !name.is_empty() {
            attributes.push((name, value.to_string()));
        }
    }

    attributes
}

/// Looks up one attribute value on an opening tag
pub(crate) fn attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
