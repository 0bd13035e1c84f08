use std::fmt::{self, Write};

use indexmap::IndexMap;
use scraper::{ElementRef, Html};

/// A node of the markup tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An owned markup element: tag name, attributes in document order and children.
///
/// `Clone` is a deep clone. Rewrites made while walking the tree always
/// happen on clones, the input tree is never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Parses an HTML fragment and returns its first top-level element.
    pub fn parse_fragment(html: &str) -> Option<Self> {
        parse_nodes(html).into_iter().find_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Parses a whole HTML document and returns its `html` element.
    ///
    /// Missing `html`, `head` and `body` tags are implied, as browsers do.
    pub fn parse_document(html: &str) -> Self {
        let document = Html::parse_document(html);
        log_errors(&document);
        convert(document.root_element())
    }

    /// Creates an element whose children are the parsed HTML fragment,
    /// the equivalent of assigning `innerHTML` on a fresh element.
    pub fn with_inner_html(name: impl Into<String>, html: &str) -> Self {
        Self {
            children: parse_nodes(html),
            ..Self::new(name)
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The attribute value, if present and non-empty.
    pub fn nonempty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.is_empty())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Element children in document order; text is skipped.
    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Replaces the element children in order, keeping text nodes in place.
    ///
    /// `None` keeps the existing child.
    pub(crate) fn replace_element_children(&mut self, replacements: Vec<Option<Element>>) {
        let mut replacements = replacements.into_iter();
        for child in self.children.iter_mut() {
            if let Node::Element(el) = child {
                if let Some(Some(replacement)) = replacements.next() {
                    *el = replacement;
                }
            }
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, into: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => into.push_str(t),
                Node::Element(el) => el.collect_text(into),
            }
        }
    }

    /// Serialized markup of the children.
    pub fn inner_html(&self) -> String {
        self.children.iter().map(Node::to_string).collect()
    }

    /// Returns `true` if this is the `head` or `body` of a document.
    pub fn is_document_section(&self) -> bool {
        self.name.eq_ignore_ascii_case("head") || self.name.eq_ignore_ascii_case("body")
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(text) => {
                for c in text.chars() {
                    match c {
                        '&' => f.write_str("&amp;")?,
                        '<' => f.write_str("&lt;")?,
                        '>' => f.write_str("&gt;")?,
                        c => f.write_char(c)?,
                    }
                }
                Ok(())
            }
            Node::Element(el) => fmt::Display::fmt(el, f),
        }
    }
}

/// Outer HTML.
impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in &self.attributes {
            write!(f, " {name}=\"")?;
            for c in value.chars() {
                match c {
                    '&' => f.write_str("&amp;")?,
                    '"' => f.write_str("&quot;")?,
                    c => f.write_char(c)?,
                }
            }
            f.write_char('"')?;
        }
        f.write_char('>')?;

        if self.children.is_empty() && VOID_ELEMENTS.contains(&self.name.as_str()) {
            return Ok(());
        }

        for child in &self.children {
            fmt::Display::fmt(child, f)?;
        }
        write!(f, "</{}>", self.name)
    }
}

fn parse_nodes(html: &str) -> Vec<Node> {
    let fragment = Html::parse_fragment(html);
    log_errors(&fragment);
    convert_children(fragment.root_element())
}

fn log_errors(html: &Html) {
    for err in &html.errors {
        tracing::debug!("HTML parse error: {err}");
    }
}

fn convert_children(el: ElementRef<'_>) -> Vec<Node> {
    el.children()
        .filter_map(|child| match child.value() {
            scraper::Node::Text(text) => Some(Node::Text(String::from(&**text))),
            scraper::Node::Element(_) => ElementRef::wrap(child).map(|el| Node::Element(convert(el))),
            // comments, doctypes and processing instructions carry no RDFa
            _ => None,
        })
        .collect()
}

fn convert(el: ElementRef<'_>) -> Element {
    let value = el.value();
    Element {
        name: value.name().to_string(),
        attributes: value
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        children: convert_children(el),
    }
}
