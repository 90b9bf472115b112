// Minimal element tree standing in for the host page.
// Widgets are elements handed over by the host; rendering appends children to them.

use std::fmt::Write;

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Text content, escaped on output.
    Text(String),
    /// Trusted markup inserted verbatim (the markdown service's output).
    Html(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.write_html(out),
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Html(html) => out.push_str(html),
        }
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.children.iter().for_each(|c| c.write_text(out)),
            Node::Text(text) => out.push_str(text),
            Node::Html(html) => out.push_str(html),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_class(self, class: &str) -> Self {
        self.with_attr("class", class)
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn append(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Replace all children with trusted markup.
    pub fn set_inner_html(&mut self, html: impl Into<String>) {
        self.children = vec![Node::Html(html.into())];
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Child elements, skipping text nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First descendant (or self) carrying `class`.
    pub fn find_by_class(&self, class: &str) -> Option<&Element> {
        if self.has_class(class) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find_by_class(class))
    }

    pub fn find_by_class_mut(&mut self, class: &str) -> Option<&mut Element> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find_map(|c| c.find_by_class_mut(class))
    }

    /// All descendants (or self) carrying `class`, outermost first.
    pub fn find_all_by_class(&self, class: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_by_class(class, &mut found);
        found
    }

    fn collect_by_class<'a>(&'a self, class: &str, out: &mut Vec<&'a Element>) {
        if self.has_class(class) {
            out.push(self);
        }
        for child in self.child_elements() {
            child.collect_by_class(class, out);
        }
    }

    /// Concatenated text content of the subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.children.iter().for_each(|c| c.write_text(&mut out));
        out
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        self.children.iter().for_each(|c| c.write_html(&mut out));
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
        }
        out.push('>');
        if is_void(&self.tag) {
            return;
        }
        self.children.iter().for_each(|c| c.write_html(out));
        let _ = write!(out, "</{}>", self.tag);
    }
}

/// Collect the widget placeholders under `root`.
///
/// Widgets are not searched for nested widgets.
pub fn find_widgets<'a>(root: &'a mut Element, css_class: &str) -> Vec<&'a mut Element> {
    let mut found = Vec::new();
    collect_widgets(root, css_class, &mut found);
    found
}

fn collect_widgets<'a>(el: &'a mut Element, css_class: &str, out: &mut Vec<&'a mut Element>) {
    if el.has_class(css_class) {
        out.push(el);
        return;
    }
    for child in el.children.iter_mut().filter_map(Node::as_element_mut) {
        collect_widgets(child, css_class, out);
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "img" | "br" | "hr" | "input" | "meta" | "link")
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_escapes_text_and_attrs() {
        let el = Element::new("a")
            .with_attr("href", "https://example.com/?a=1&b=\"2\"")
            .with_text("<b>not bold</b>");
        assert_eq!(
            el.to_html(),
            "<a href=\"https://example.com/?a=1&amp;b=&quot;2&quot;\">&lt;b&gt;not bold&lt;/b&gt;</a>"
        );
    }

    #[test]
    fn test_void_and_raw_html() {
        let el = Element::new("div")
            .with_child(Element::new("img").with_attr("width", 48))
            .with_child(Node::Html("<p>ok</p>".into()));
        assert_eq!(el.to_html(), "<div><img width=\"48\"><p>ok</p></div>");
    }

    #[test]
    fn test_classes() {
        let el = Element::new("div").with_class("hubbub dark");
        assert!(el.has_class("hubbub"));
        assert!(el.has_class("dark"));
        assert!(!el.has_class("hub"));
    }

    #[test]
    fn test_find_widgets_skips_nested() {
        let mut page = Element::new("body")
            .with_child(
                Element::new("div")
                    .with_class("hubbub")
                    .with_attr("data-gist-id", "1")
                    .with_child(Element::new("div").with_class("hubbub")),
            )
            .with_child(
                Element::new("section")
                    .with_child(Element::new("div").with_class("hubbub").with_attr("data-gist-id", "2")),
            );

        let widgets = find_widgets(&mut page, "hubbub");
        let ids: Vec<_> = widgets.iter().map(|w| w.attr("data-gist-id")).collect();
        assert_eq!(ids, vec![Some("1"), Some("2")]);
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut el = Element::new("time").with_attr("title", "a");
        el.set_attr("title", "b");
        assert_eq!(el.attrs.len(), 1);
        assert_eq!(el.attr("title"), Some("b"));
    }
}
