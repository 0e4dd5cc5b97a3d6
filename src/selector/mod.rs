//! Selector-based extraction over raw markup
//!
//! A selector string is classified by its leading syntax:
//!
//! | Prefix | Kind        | Example                          |
//! |--------|-------------|----------------------------------|
//! | `//`   | XPath-like  | `//h1`, `//div[@class="desc"]`   |
//! | `<`    | Tag         | `<p>`                            |
//! | other  | CSS-like    | `.container p`, `#main [lang=en]`|
//!
//! Extraction works on a flat list of elements scanned from the markup (see
//! the `scan` module); no document tree is built. Every fragment returned is
//! a raw substring of the input markup.
//!
//! A malformed selector never fails: it simply matches nothing. Use
//! [`Selector::parse`] directly when "malformed" and "no match" need to be
//! told apart.

pub(crate) mod scan;
mod text;

pub use text::{attribute_value, fragment_text};

use scan::{attribute, is_valid_name, parse_attributes, Element};

/// The three selector forms, decided by literal prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    /// `<tag>`
    Tag,
    /// Whitespace-separated filter chain
    CssLike,
    /// `//tag`
    XPathLike,
}

impl SelectorKind {
    /// Classifies a selector string; the first matching prefix wins
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_sieve::selector::SelectorKind;
    ///
    /// assert_eq!(SelectorKind::classify("//h1"), SelectorKind::XPathLike);
    /// assert_eq!(SelectorKind::classify("<p>"), SelectorKind::Tag);
    /// assert_eq!(SelectorKind::classify(".item"), SelectorKind::CssLike);
    /// ```
    pub fn classify(selector: &str) -> Self {
        let selector = selector.trim();
        if selector.starts_with("//") {
            Self::XPathLike
        } else if selector.starts_with('<') {
            Self::Tag
        } else {
            Self::CssLike
        }
    }
}

/// Attribute test used by CSS-like and XPath-like selectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrFilter {
    /// `#value`: the `id` attribute equals the value
    Id(String),
    /// `.value`: the `class` attribute contains the value as one of its classes
    Class(String),
    /// `[name=value]` or `[@name="value"]`: the attribute equals the value
    Equals { name: String, value: String },
}

impl AttrFilter {
    fn matches(&self, attributes: &[(String, String)]) -> bool {
        match self {
            Self::Id(id) => attribute(attributes, "id") == Some(id.as_str()),
            Self::Class(class) => attribute(attributes, "class")
                .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class)),
            Self::Equals { name, value } => attribute(attributes, name) == Some(value.as_str()),
        }
    }
}

/// One whitespace-separated token of a CSS-like selector
///
/// A token is an optional tag name followed by any number of attribute
/// filters, e.g. `p`, `.item`, `div#main`, `a[rel=next]`. All parts must hold
/// for an element to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub filters: Vec<AttrFilter>,
}

impl CompoundSelector {
    fn parse(token: &str) -> Option<Self> {
        let name_len = token
            .find(|c| matches!(c, '#' | '.' | '['))
            .unwrap_or(token.len());
        let (tag, mut rest) = token.split_at(name_len);

        let tag = if tag.is_empty() {
            None
        } else if is_valid_name(tag) {
            Some(tag.to_ascii_lowercase())
        } else {
            return None;
        };

        let mut filters = Vec::new();
        while let Some(marker) = rest.chars().next() {
            match marker {
                '[' => {
                    let close = rest.find(']')?;
                    filters.push(parse_bracket(&rest[1..close], false)?);
                    rest = &rest[close + 1..];
                }
                '#' | '.' => {
                    let body = &rest[1..];
                    let len = body
                        .find(|c| matches!(c, '#' | '.' | '['))
                        .unwrap_or(body.len());
                    let value = &body[..len];
                    if value.is_empty() {
                        return None;
                    }
                    filters.push(if marker == '#' {
                        AttrFilter::Id(value.to_string())
                    } else {
                        AttrFilter::Class(value.to_string())
                    });
                    rest = &body[len..];
                }
                _ => return None,
            }
        }

        if tag.is_none() && filters.is_empty() {
            return None;
        }

        Some(Self { tag, filters })
    }

    fn matches(&self, element: &Element, markup: &str) -> bool {
        if let Some(tag) = &self.tag {
            if element.name != *tag {
                return false;
            }
        }
        if self.filters.is_empty() {
            return true;
        }
        let attributes = parse_attributes(element.open_tag(markup));
        self.filters.iter().all(|f| f.matches(&attributes))
    }
}

/// Parses the inside of `[name=value]` (or `[@name="value"]` when `xpath`)
fn parse_bracket(inner: &str, xpath: bool) -> Option<AttrFilter> {
    let inner = if xpath {
        inner.trim().strip_prefix('@')?
    } else {
        inner
    };
    let (name, value) = inner.split_once('=')?;
    let name = name.trim();
    if !is_valid_name(name) {
        return None;
    }
    Some(AttrFilter::Equals {
        name: name.to_ascii_lowercase(),
        value: unquote(value.trim()).to_string(),
    })
}

/// Strips one pair of matching single or double quotes
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// A parsed selector, one variant per [`SelectorKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Nesting-aware match on a tag name
    Tag(String),
    /// Shortest-span match on a tag name, with an optional attribute predicate
    XPath {
        tag: String,
        predicate: Option<AttrFilter>,
    },
    /// Left-to-right conjunctive filter chain
    Css(Vec<CompoundSelector>),
}

impl Selector {
    /// Parses a selector string
    ///
    /// Returns `None` for syntax this engine does not understand.
    pub fn parse(selector: &str) -> Option<Self> {
        let selector = selector.trim();
        match SelectorKind::classify(selector) {
            SelectorKind::Tag => {
                let name = selector.strip_prefix('<')?.strip_suffix('>')?.trim();
                is_valid_name(name).then(|| Self::Tag(name.to_ascii_lowercase()))
            }
            SelectorKind::XPathLike => {
                let step = &selector[2..];
                let (name, predicate) = match step.find('[') {
                    Some(open) => {
                        let inner = step[open + 1..].strip_suffix(']')?;
                        (&step[..open], Some(parse_bracket(inner, true)?))
                    }
                    None => (step, None),
                };
                is_valid_name(name).then(|| Self::XPath {
                    tag: name.to_ascii_lowercase(),
                    predicate,
                })
            }
            SelectorKind::CssLike => {
                let chain = selector
                    .split_whitespace()
                    .map(CompoundSelector::parse)
                    .collect::<Option<Vec<_>>>()?;
                (!chain.is_empty()).then_some(Self::Css(chain))
            }
        }
    }

    /// The kind this selector was parsed as
    pub fn kind(&self) -> SelectorKind {
        match self {
            Self::Tag(_) => SelectorKind::Tag,
            Self::XPath { .. } => SelectorKind::XPathLike,
            Self::Css(_) => SelectorKind::CssLike,
        }
    }

    /// Runs this selector over `markup`, returning fragments in document order
    pub fn select<'a>(&self, markup: &'a str) -> Vec<&'a str> {
        match self {
            Self::Tag(name) => scan::elements(markup)
                .iter()
                .filter(|e| e.name == *name)
                .map(|e| e.fragment(markup))
                .collect(),

            Self::XPath { tag, predicate } => scan::shortest_spans(markup, tag)
                .iter()
                .filter(|e| {
                    predicate
                        .as_ref()
                        .map_or(true, |p| p.matches(&parse_attributes(e.open_tag(markup))))
                })
                .map(|e| e.fragment(markup))
                .collect(),

            Self::Css(chain) => select_chain(chain, markup),
        }
    }
}

/// Narrows a candidate set token by token
///
/// The candidate set starts as the whole markup. Each token keeps the
/// elements inside the current candidates (the candidates themselves
/// included) that satisfy it, so the chain `.container p` yields the `p`
/// elements found within elements of class `container`.
fn select_chain<'a>(chain: &[CompoundSelector], markup: &'a str) -> Vec<&'a str> {
    let elements = scan::elements(markup);
    let mut candidates: Vec<(usize, usize)> = vec![(0, markup.len())];

    for token in chain {
        candidates = elements_within(&elements, &candidates)
            .filter(|e| token.matches(e, markup))
            .map(|e| (e.start, e.end))
            .collect();

        if candidates.is_empty() {
            break;
        }
    }

    candidates
        .into_iter()
        .map(|(start, end)| &markup[start..end])
        .collect()
}

/// Elements starting inside any of the `(start, end)` regions
///
/// Both `elements` and `regions` are sorted by start offset, so one forward
/// sweep suffices: an element is inside when it starts before the furthest
/// end reached by the regions that started at or before it.
fn elements_within<'e>(
    elements: &'e [Element],
    regions: &'e [(usize, usize)],
) -> impl Iterator<Item = &'e Element> + 'e {
    let mut next_region = 0;
    let mut reach = 0;
    elements.iter().filter(move |e| {
        while next_region < regions.len() && regions[next_region].0 <= e.start {
            reach = reach.max(regions[next_region].1);
            next_region += 1;
        }
        e.start < reach
    })
}

/// Extracts every fragment of `markup` matched by `selector`
///
/// An unparsable selector yields an empty list.
///
/// # Examples
///
/// ```
/// use sumi_sieve::selector::extract;
///
/// let html = r#"<div class="container"><h1>Title</h1><p>Content</p></div>"#;
/// assert_eq!(extract(html, "p"), vec!["<p>Content</p>"]);
/// assert_eq!(extract(html, "<p>"), vec!["<p>Content</p>"]);
/// assert_eq!(extract(html, ".container p"), vec!["<p>Content</p>"]);
/// assert_eq!(extract(html, "//h1"), vec!["<h1>Title</h1>"]);
/// ```
pub fn extract<'a>(markup: &'a str, selector: &str) -> Vec<&'a str> {
    match Selector::parse(selector) {
        Some(parsed) => parsed.select(markup),
        None => {
            tracing::debug!("Unsupported selector syntax: {:?}", selector);
            Vec::new()
        }
    }
}

/// Keeps the fragments containing the assignment `name="value"`
///
/// Every opening tag inside a fragment is inspected, and quoting style does
/// not matter (`name='value'`, `name="value"` and `name=value` all match).
pub fn filter_by_attribute<S: AsRef<str>>(fragments: &[S], name: &str, value: &str) -> Vec<String> {
    let filter = AttrFilter::Equals {
        name: name.to_ascii_lowercase(),
        value: value.to_string(),
    };

    fragments
        .iter()
        .map(|f| f.as_ref())
        .filter(|fragment| {
            scan::tokenize(fragment)
                .iter()
                .filter(|t| t.kind != scan::TagKind::Close)
                .any(|t| filter.matches(&parse_attributes(&fragment[t.start..t.end])))
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<div class="container"><h1>Title</h1><p>Content</p></div>"#;

    #[test]
    fn test_classify() {
        assert_eq!(SelectorKind::classify("//p"), SelectorKind::XPathLike);
        assert_eq!(SelectorKind::classify("<p>"), SelectorKind::Tag);
        assert_eq!(SelectorKind::classify("p"), SelectorKind::CssLike);
        assert_eq!(SelectorKind::classify("/p"), SelectorKind::CssLike);
        assert_eq!(SelectorKind::classify("  //p"), SelectorKind::XPathLike);
    }

    #[test]
    fn test_bare_tag_css() {
        assert_eq!(extract(PAGE, "p"), vec!["<p>Content</p>"]);
    }

    #[test]
    fn test_tag_selector() {
        assert_eq!(extract(PAGE, "<p>"), vec!["<p>Content</p>"]);
    }

    #[test]
    fn test_class_then_tag_chain() {
        assert_eq!(extract(PAGE, ".container p"), vec!["<p>Content</p>"]);
    }

    #[test]
    fn test_xpath_single_step() {
        assert_eq!(extract(PAGE, "//h1"), vec!["<h1>Title</h1>"]);
    }

    #[test]
    fn test_class_selector_finds_all() {
        let html = "<html><div class='article'>Article 1</div><div class='article'>Article 2</div></html>";
        assert_eq!(
            extract(html, ".article"),
            vec![
                "<div class='article'>Article 1</div>",
                "<div class='article'>Article 2</div>"
            ]
        );
    }

    #[test]
    fn test_class_matches_one_of_many() {
        let html = r#"<li class="item sale">A</li><li class="items">B</li>"#;
        assert_eq!(extract(html, ".item"), vec![r#"<li class="item sale">A</li>"#]);
    }

    #[test]
    fn test_id_selector() {
        let html = r#"<h1 id="title">Title</h1><h1 id="other">Other</h1>"#;
        assert_eq!(extract(html, "#title"), vec![r#"<h1 id="title">Title</h1>"#]);
    }

    #[test]
    fn test_attribute_selector() {
        let html = r#"<a rel="next" href="/2">Next</a><a rel="prev" href="/0">Prev</a>"#;
        assert_eq!(
            extract(html, "[rel=next]"),
            vec![r#"<a rel="next" href="/2">Next</a>"#]
        );
        assert_eq!(
            extract(html, r#"[rel="prev"]"#),
            vec![r#"<a rel="prev" href="/0">Prev</a>"#]
        );
    }

    #[test]
    fn test_compound_token() {
        let html = r#"<p class="x">1</p><div class="x">2</div>"#;
        assert_eq!(extract(html, "div.x"), vec![r#"<div class="x">2</div>"#]);
    }

    #[test]
    fn test_chain_narrows_not_restarts() {
        let html = r#"<div id="a"><p>in</p></div><p>out</p>"#;
        assert_eq!(extract(html, "#a p"), vec!["<p>in</p>"]);
    }

    #[test]
    fn test_chain_deduplicates_nested_candidates() {
        let html = "<div><div><p>x</p></div></div>";
        assert_eq!(extract(html, "div p"), vec!["<p>x</p>"]);
    }

    #[test]
    fn test_chain_empty_when_nothing_matches() {
        assert!(extract(PAGE, ".missing p").is_empty());
    }

    #[test]
    fn test_tag_mode_nesting_aware() {
        let html = "<div><div>inner</div>outer</div>";
        assert_eq!(
            extract(html, "<div>"),
            vec!["<div><div>inner</div>outer</div>", "<div>inner</div>"]
        );
    }

    #[test]
    fn test_xpath_mode_shortest_span() {
        let html = "<div><div>inner</div>outer</div>";
        assert_eq!(
            extract(html, "//div"),
            vec!["<div><div>inner</div>", "<div>inner</div>"]
        );
    }

    #[test]
    fn test_xpath_attribute_predicate() {
        let html = r#"<div class="product-description">Soft</div><div class="other">No</div>"#;
        assert_eq!(
            extract(html, r#"//div[@class="product-description"]"#),
            vec![r#"<div class="product-description">Soft</div>"#]
        );
    }

    #[test]
    fn test_tag_mode_unclosed_runs_to_end() {
        let html = "<section><p>never closed";
        assert_eq!(extract(html, "<p>"), vec!["<p>never closed"]);
    }

    #[test]
    fn test_malformed_selectors_match_nothing() {
        for selector in ["", "   ", "<>", "<p", "//", "//a/b", "//a[@x]", "[x]", "#", ".", "a..b", "p>q"] {
            assert!(extract(PAGE, selector).is_empty(), "selector {:?}", selector);
            assert!(Selector::parse(selector).is_none(), "selector {:?}", selector);
        }
    }

    #[test]
    fn test_extract_is_idempotent() {
        let first = extract(PAGE, ".container p");
        let second = extract(PAGE, ".container p");
        assert_eq!(first, second);
    }

    #[test]
    fn test_case_insensitive_tag_names() {
        let html = "<P>Upper</P>";
        assert_eq!(extract(html, "p"), vec!["<P>Upper</P>"]);
        assert_eq!(extract(html, "<P>"), vec!["<P>Upper</P>"]);
    }

    #[test]
    fn test_filter_by_attribute() {
        let elements = [r#"<h1 id="title">Title</h1>"#, r#"<p class="content">Content</p>"#];
        assert_eq!(
            filter_by_attribute(&elements, "class", "content"),
            vec![r#"<p class="content">Content</p>"#.to_string()]
        );
    }

    #[test]
    fn test_filter_by_attribute_quote_agnostic() {
        let elements = ["<p class='content'>A</p>", "<p class=content>B</p>", "<p>C</p>"];
        assert_eq!(filter_by_attribute(&elements, "class", "content").len(), 2);
    }

    #[test]
    fn test_filter_by_attribute_looks_inside() {
        let elements = [r#"<div><span data-id="7">x</span></div>"#];
        assert_eq!(filter_by_attribute(&elements, "data-id", "7").len(), 1);
    }

    #[test]
    fn test_selector_kind_of_parsed() {
        assert_eq!(Selector::parse("<p>").map(|s| s.kind()), Some(SelectorKind::Tag));
        assert_eq!(
            Selector::parse("//p").map(|s| s.kind()),
            Some(SelectorKind::XPathLike)
        );
        assert_eq!(
            Selector::parse("p .x").map(|s| s.kind()),
            Some(SelectorKind::CssLike)
        );
    }

    #[test]
    fn test_css_chain_on_large_page_is_linear() {
        let mut html = String::new();
        for _ in 0..20_000 {
            html.push_str(r#"<div class="x"></div>"#);
        }
        for _ in 0..5_000 {
            html.push_str(r#"<div class="x"><p>in</p></div>"#);
        }
        for _ in 0..20_000 {
            html.push_str("<p>out</p>");
        }

        let started = std::time::Instant::now();
        let matched = extract(&html, ".x p");
        let elapsed = started.elapsed();

        assert_eq!(matched.len(), 5_000);
        assert!(matched.iter().all(|f| *f == "<p>in</p>"));
        assert!(elapsed < std::time::Duration::from_secs(2), "took {:?}", elapsed);
    }

    #[test]
    fn test_css_chain_overlapping_candidates_keep_document_order() {
        let html = r#"<div class="a"><div class="a"><b>1</b></div><b>2</b></div><b>3</b>"#;
        assert_eq!(extract(html, ".a b"), vec!["<b>1</b>", "<b>2</b>"]);
    }

    #[test]
    fn test_unquoted_apostrophe_value() {
        let html = "<p title=don't>a</p><p>b</p>";
        assert_eq!(extract(html, "p"), vec!["<p title=don't>a</p>", "<p>b</p>"]);
    }
}
