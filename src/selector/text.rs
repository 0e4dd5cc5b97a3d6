//! Text and attribute helpers for extracted fragments

use super::scan::{attribute, parse_attributes, tokenize, TagKind};
use html_escape::decode_html_entities;

/// Returns the text content of a fragment
///
/// Text runs between tags are joined, entities are decoded, and runs of
/// whitespace collapse to a single space. The bodies of `<script>` and
/// `<style>` elements are not text.
///
/// # Examples
///
/// ```
/// use sumi_sieve::selector::fragment_text;
///
/// assert_eq!(fragment_text("<p> Fish &amp;\n <b>chips</b> </p>"), "Fish & chips");
/// ```
pub fn fragment_text(fragment: &str) -> String {
    let mut text = String::new();
    let mut cursor = 0;
    let mut in_raw_text = false;

    for token in tokenize(fragment) {
        if !in_raw_text {
            text.push_str(&fragment[cursor..token.start]);
            text.push(' ');
        }
        in_raw_text = token.kind == TagKind::Open && matches!(token.name.as_str(), "script" | "style");
        cursor = token.end;
    }
    if !in_raw_text {
        text.push_str(&fragment[cursor..]);
    }

    let decoded = decode_html_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the first value assigned to attribute `name` in a fragment
///
/// Opening tags are searched in document order, so for
/// `<a href="/x"><img src="y.png"></a>` asking for `src` finds the image.
pub fn attribute_value(fragment: &str, name: &str) -> Option<String> {
    tokenize(fragment)
        .iter()
        .filter(|t| t.kind != TagKind::Close)
        .find_map(|t| {
            let attributes = parse_attributes(&fragment[t.start..t.end]);
            attribute(&attributes, name).map(|v| decode_html_entities(v).into_owned())
        })
}
