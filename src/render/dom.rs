//! Owned element tree standing in for the page DOM.
//!
//! Values are stored raw and escaped only when the tree is written out as HTML,
//! so nothing taken from the track list can inject markup.

use std::fmt::{self, Write};

use crate::clients::errors::{Error, Result};

const VOID_ELEMENTS: &[&str] = &["br", "img", "link", "meta"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Element(Element),
    Text(String),
}

/// One element with its attributes in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

/// Something whose children the renderer owns outright.
pub trait Container {
    /// Drop every child, text included.
    fn clear_children(&mut self);
    /// Add `child` after the existing children.
    fn append_child(&mut self, child: Element);
    /// Number of direct children.
    fn child_count(&self) -> usize;
}

impl Element {
    /// Empty element, e.g. `Element::new("div")`.
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attribute`].
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Append a child element.
    #[must_use]
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Append a text node.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Set `name`, replacing an earlier value in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Raw (unescaped) value of `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Child elements, skipping text nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Concatenated text of this element and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    /// First descendant (depth first, self excluded) with the given tag.
    pub fn find_first(&self, tag: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.tag == tag {
                return Some(child);
            }
            if let Some(found) = child.find_first(tag) {
                return Some(found);
            }
        }
        None
    }

    /// This element or the first descendant with the given id.
    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.element_by_id(id))
    }

    /// Mutable form of [`Element::element_by_id`].
    pub fn element_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|n| match n {
            Node::Element(e) => e.element_by_id_mut(id),
            Node::Text(_) => None,
        })
    }

    fn write_html(&self, out: &mut impl Write) -> fmt::Result {
        write!(out, "<{}", self.tag)?;
        for (name, value) in &self.attributes {
            write!(out, " {name}=\"")?;
            escape_into(out, value)?;
            out.write_char('"')?;
        }
        out.write_char('>')?;

        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return Ok(());
        }
        for child in &self.children {
            match child {
                Node::Text(t) => escape_into(out, t)?,
                Node::Element(e) => e.write_html(out)?,
            }
        }
        write!(out, "</{}>", self.tag)
    }
}

impl Container for Element {
    fn clear_children(&mut self) {
        self.children.clear();
    }

    fn append_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_html(f)
    }
}

fn escape_into(out: &mut impl Write, raw: &str) -> fmt::Result {
    for c in raw.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            '"' => out.write_str("&quot;")?,
            '\'' => out.write_str("&#39;")?,
            _ => out.write_char(c)?,
        }
    }
    Ok(())
}

/// A whole page: `<!DOCTYPE html>` followed by the root `<html>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Document around an existing `<html>` element.
    pub fn new(root: Element) -> Self {
        Document { root }
    }

    /// Host page with an empty container for the track cards.
    pub fn page(title: &str, container_id: &str) -> Self {
        let head = Element::new("head")
            .child(Element::new("meta").attr("charset", "utf-8"))
            .child(Element::new("title").text(title));
        let body = Element::new("body")
            .child(Element::new("h2").text(title))
            .child(Element::new("div").attr("id", container_id));
        Document::new(Element::new("html").attr("lang", "en").child(head).child(body))
    }

    /// Element with the given id anywhere in the page.
    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        self.root.element_by_id(id)
    }

    /// Mutable form of [`Document::element_by_id`].
    pub fn element_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.root.element_by_id_mut(id)
    }

    /// The render target, or `TargetNotFound` if the page has no such element.
    pub fn container(&mut self, id: &str) -> Result<&mut Element> {
        self.root
            .element_by_id_mut(id)
            .ok_or_else(|| Error::TargetNotFound(id.to_string()))
    }

    /// Serialize with every text and attribute value escaped.
    pub fn to_html(&self) -> String {
        format!("<!DOCTYPE html>\n{}\n", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text_and_attributes() {
        let el = Element::new("p")
            .attr("title", r#"say "hi" & 'bye'"#)
            .text("<script>alert(1)</script>");
        assert_eq!(
            el.to_string(),
            "<p title=\"say &quot;hi&quot; &amp; &#39;bye&#39;\">&lt;script&gt;alert(1)&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let img = Element::new("img").attr("src", "a.png");
        assert_eq!(img.to_string(), "<img src=\"a.png\">");
    }

    #[test]
    fn set_attribute_replaces_existing_value() {
        let mut el = Element::new("div").attr("class", "a");
        el.set_attribute("class", "b");
        assert_eq!(el.attribute("class"), Some("b"));
        assert_eq!(el.to_string(), "<div class=\"b\"></div>");
    }

    #[test]
    fn finds_nested_element_by_id() {
        let mut doc = Document::page("Recently played", "recent-tracks");
        assert!(doc.element_by_id("recent-tracks").is_some());

        let container = doc.container("recent-tracks").unwrap();
        container.append_child(Element::new("div").text("x"));
        assert_eq!(doc.element_by_id("recent-tracks").unwrap().child_count(), 1);
    }

    #[test]
    fn missing_container_is_named() {
        let mut doc = Document::page("Recently played", "recent-tracks");
        match doc.container("other") {
            Err(Error::TargetNotFound(id)) => assert_eq!(id, "other"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn clear_children_empties_container() {
        let mut el = Element::new("div").child(Element::new("p")).text("t");
        assert_eq!(el.child_count(), 2);
        el.clear_children();
        assert_eq!(el.child_count(), 0);
    }

    #[test]
    fn page_serializes_with_doctype() {
        let html = Document::page("Recently played", "recent-tracks").to_html();
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
        assert!(html.contains("<div id=\"recent-tracks\"></div>"));
        assert!(html.contains("<meta charset=\"utf-8\">"));
    }

    #[test]
    fn text_content_collects_descendants() {
        let el = Element::new("div")
            .child(Element::new("h3").text("Song A"))
            .child(Element::new("p").text("Artist X"));
        assert_eq!(el.text_content(), "Song AArtist X");
        assert_eq!(el.find_first("p").unwrap().text_content(), "Artist X");
    }
}
