//! Minimal owned XML element tree
//!
//! ADM documents are small enough to hold in memory, and the extractor needs
//! random access (root search, `find`, `descendants`), so the `quick-xml`
//! event stream is folded into a tree once. Element and attribute names are
//! stored by local name only: `ebu:audioChannelFormat` and
//! `audioChannelFormat` in the default namespace are the same element here.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{AdmError, AdmResult};

/// One XML element with its attributes, direct text and children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// Local (namespace-free) tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated, trimmed text directly inside this element
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Direct children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Every descendant (not including self), depth-first in document order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// First descendant with the given name
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.descendants().find(|e| e.name == name)
    }
}

/// Depth-first pre-order iterator over an element's descendants
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// A parsed XML document
#[derive(Debug, Clone, PartialEq)]
pub struct AdmDocument {
    root: Element,
}

impl AdmDocument {
    /// Parse XML text into an element tree.
    ///
    /// # Errors
    ///
    /// [`AdmError::Xml`] for syntax errors reported by the reader,
    /// [`AdmError::Malformed`] for unclosed elements, undecodable attributes or
    /// a document without a root element.
    pub fn parse(text: &str) -> AdmResult<Self> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event().map_err(|source| AdmError::Xml {
                position: reader.error_position(),
                source,
            })?;

            match event {
                Event::Start(ref e) => stack.push(open_element(e)?),
                Event::Empty(ref e) => {
                    let element = open_element(e)?;
                    attach(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| AdmError::Malformed("unexpected closing tag".into()))?;
                    attach(element, &mut stack, &mut root)?;
                }
                Event::Text(ref e) => {
                    let text = e.unescape().map_err(|source| AdmError::Xml {
                        position: reader.buffer_position(),
                        source,
                    })?;
                    append_text(&mut stack, &text);
                }
                Event::CData(e) => {
                    let bytes = e.into_inner();
                    let text = String::from_utf8_lossy(&bytes);
                    append_text(&mut stack, text.trim());
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(AdmError::Malformed(format!(
                "unclosed element <{}> at end of document",
                open.name
            )));
        }

        let root = root.ok_or_else(|| AdmError::Malformed("document has no root element".into()))?;
        log::debug!("Parsed XML document, root <{}>", root.name);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }
}

fn open_element(e: &BytesStart<'_>) -> AdmResult<Element> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| AdmError::Malformed(format!("<{name}>: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .unwrap_or_else(|_| Cow::Owned(String::from_utf8_lossy(&attr.value).into_owned()))
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

/// Hand a finished element to its parent, or make it the document root
fn attach(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> AdmResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(AdmError::Malformed(format!(
                "second root element <{}>",
                element.name
            )));
        }
    }
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(current) = stack.last_mut() {
        if !current.text.is_empty() {
            current.text.push(' ');
        }
        current.text.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let doc = AdmDocument::parse(
            r#"<?xml version="1.0"?>
            <a><b id="1">one</b><b id="2"/><c><b id="3">three</b></c></a>"#,
        )
        .unwrap();

        let root = doc.root();
        assert_eq!(root.name(), "a");
        assert_eq!(root.children().len(), 3);
        assert_eq!(root.children_named("b").count(), 2);
        assert_eq!(root.child("b").unwrap().text(), "one");
        assert_eq!(root.child("b").unwrap().attr("id"), Some("1"));

        let ids: Vec<_> = root
            .descendants()
            .filter(|e| e.name() == "b")
            .filter_map(|e| e.attr("id"))
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_namespaces_stripped() {
        let doc = AdmDocument::parse(
            r#"<ebu:root xmlns:ebu="urn:x"><ebu:item ebu:kind="k">v</ebu:item></ebu:root>"#,
        )
        .unwrap();
        let item = doc.root().child("item").unwrap();
        assert_eq!(doc.root().name(), "root");
        assert_eq!(item.attr("kind"), Some("k"));
        assert_eq!(item.text(), "v");
    }

    #[test]
    fn test_entities_unescaped() {
        let doc = AdmDocument::parse(r#"<a name="x &amp; y">1 &lt; 2</a>"#).unwrap();
        assert_eq!(doc.root().attr("name"), Some("x & y"));
        assert_eq!(doc.root().text(), "1 < 2");
    }

    #[test]
    fn test_find_depth_first() {
        let doc = AdmDocument::parse("<a><x><t>deep</t></x><t>shallow</t></a>").unwrap();
        assert_eq!(doc.root().find("t").unwrap().text(), "deep");
        assert!(doc.root().find("missing").is_none());
    }

    #[test]
    fn test_unclosed_is_error() {
        assert!(AdmDocument::parse("<a><b></b>").is_err());
    }

    #[test]
    fn test_mismatched_is_error() {
        assert!(AdmDocument::parse("<a><b></a></b>").is_err());
    }

    #[test]
    fn test_empty_is_error() {
        assert!(AdmDocument::parse("").is_err());
        assert!(AdmDocument::parse("   ").is_err());
    }
}
