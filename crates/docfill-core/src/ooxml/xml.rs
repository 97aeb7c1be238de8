//! Minimal mutable XML tree over quick-xml events
//!
//! Start tags and text nodes keep their original (escaped) bytes, so a part
//! that is parsed and written back without edits only changes in insignificant
//! ways (self-closing tags stay self-closing, attribute quoting is kept).

use std::borrow::Cow;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::DocfillError;

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(BytesText<'static>),
    /// Comments, CDATA, processing instructions
    Other(Event<'static>),
}

#[derive(Debug, Clone)]
pub struct XmlElement {
    start: BytesStart<'static>,
    children: Vec<XmlNode>,
    self_closing: bool,
}

impl XmlElement {
    /// New element with a qualified name such as `w:r`
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            start: BytesStart::new(qualified_name.into()),
            children: Vec::new(),
            self_closing: true,
        }
    }

    fn from_start(start: BytesStart<'static>, self_closing: bool) -> Self {
        Self {
            start,
            children: Vec::new(),
            self_closing,
        }
    }

    /// Local name without namespace prefix
    pub fn local_name(&self) -> &[u8] {
        self.start.local_name().into_inner()
    }

    pub fn is(&self, local_name: &[u8]) -> bool {
        self.local_name() == local_name
    }

    /// Namespace prefix of the element, e.g. `w` for `w:p`
    pub fn prefix(&self) -> Option<String> {
        self.start
            .name()
            .prefix()
            .map(|p| String::from_utf8_lossy(p.into_inner()).into_owned())
    }

    /// Qualified name for a sibling element sharing this element's prefix
    pub fn sibling_name(&self, local_name: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix}:{local_name}"),
            None => local_name.to_string(),
        }
    }

    /// Unescaped value of the first attribute whose local name matches
    pub fn attribute(&self, local_name: &[u8]) -> Option<String> {
        self.start
            .attributes()
            .flatten()
            .find(|attr| attr.key.local_name().as_ref() == local_name)
            .and_then(|attr| attr.unescape_value().ok().map(Cow::into_owned))
    }

    pub fn push_attribute(&mut self, key: &str, value: &str) {
        self.start.push_attribute((key, value));
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    pub fn push_child(&mut self, node: XmlNode) {
        self.children.push(node);
    }

    pub fn push_element(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    /// Append an escaped text node
    pub fn push_text(&mut self, text: &str) {
        self.children
            .push(XmlNode::Text(BytesText::new(text).into_owned()));
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Direct children with the given local name
    pub fn children_named<'a>(
        &'a self,
        local_name: &'a [u8],
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.child_elements().filter(move |el| el.is(local_name))
    }

    pub fn child(&self, local_name: &[u8]) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.is(local_name))
    }

    pub fn child_mut(&mut self, local_name: &[u8]) -> Option<&mut XmlElement> {
        self.child_elements_mut().find(|el| el.is(local_name))
    }

    /// Unescaped concatenation of the direct text children
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(text) => match text.unescape() {
                    Ok(s) => out.push_str(&s),
                    Err(_) => out.push_str(&String::from_utf8_lossy(text)),
                },
                XmlNode::Other(Event::CData(data)) => {
                    out.push_str(&String::from_utf8_lossy(data));
                }
                _ => {}
            }
        }
        out
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
        if self.self_closing && self.children.is_empty() {
            return writer.write_event(Event::Empty(self.start.clone()));
        }

        writer.write_event(Event::Start(self.start.clone()))?;
        for child in &self.children {
            match child {
                XmlNode::Element(el) => el.write(writer)?,
                XmlNode::Text(text) => writer.write_event(Event::Text(text.clone()))?,
                XmlNode::Other(event) => writer.write_event(event.clone())?,
            }
        }
        writer.write_event(Event::End(self.start.to_end()))
    }
}

/// A parsed XML part: prolog (declaration, comments), root element, trailer
#[derive(Debug, Clone)]
pub struct XmlTree {
    prolog: Vec<Event<'static>>,
    root: XmlElement,
    epilog: Vec<Event<'static>>,
}

impl XmlTree {
    pub fn parse(bytes: &[u8]) -> Result<Self, DocfillError> {
        let mut reader = Reader::from_reader(bytes);
        let mut buf = Vec::new();

        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| {
                    DocfillError::ReadError(format!(
                        "Malformed XML at byte {}: {}",
                        reader.buffer_position(),
                        e
                    ))
                })?
                .into_owned();

            match event {
                Event::Start(start) => stack.push(XmlElement::from_start(start, false)),
                Event::Empty(start) => {
                    let element = XmlElement::from_start(start, true);
                    match stack.last_mut() {
                        Some(parent) => parent.push_element(element),
                        None if root.is_none() => root = Some(element),
                        None => return Err(multiple_roots()),
                    }
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        DocfillError::ReadError("Unbalanced closing tag".to_string())
                    })?;
                    match stack.last_mut() {
                        Some(parent) => parent.push_element(element),
                        None if root.is_none() => root = Some(element),
                        None => return Err(multiple_roots()),
                    }
                }
                Event::Text(text) => {
                    // Whitespace outside the root carries nothing
                    if let Some(parent) = stack.last_mut() {
                        parent.push_child(XmlNode::Text(text));
                    }
                }
                Event::Eof => break,
                other => match stack.last_mut() {
                    Some(parent) => parent.push_child(XmlNode::Other(other)),
                    None if root.is_none() => prolog.push(other),
                    None => epilog.push(other),
                },
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(DocfillError::ReadError(
                "Unexpected end of XML: unclosed elements".to_string(),
            ));
        }

        let root = root.ok_or_else(|| DocfillError::ReadError("XML part has no root".to_string()))?;
        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocfillError> {
        let mut writer = Writer::new(Vec::new());
        self.write_all(&mut writer)
            .map_err(|e| DocfillError::WriteError(format!("XML serialization failed: {}", e)))?;
        Ok(writer.into_inner())
    }

    fn write_all(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), quick_xml::Error> {
        for event in &self.prolog {
            writer.write_event(event.clone())?;
            if matches!(event, Event::Decl(_)) {
                writer.get_mut().extend_from_slice(b"\r\n");
            }
        }
        self.root.write(writer)?;
        for event in &self.epilog {
            writer.write_event(event.clone())?;
        }
        Ok(())
    }
}

fn multiple_roots() -> DocfillError {
    DocfillError::ReadError("XML part has more than one root element".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t xml:space="preserve">Tom &amp; Jerry </w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#;

    #[test]
    fn test_parse_and_navigate() {
        let tree = XmlTree::parse(SAMPLE.as_bytes()).unwrap();
        assert!(tree.root().is(b"document"));
        let body = tree.root().child(b"body").unwrap();
        let p = body.child(b"p").unwrap();
        let t = p.child(b"r").unwrap().child(b"t").unwrap();
        assert_eq!(t.text(), "Tom & Jerry ");
        assert_eq!(t.attribute(b"space").as_deref(), Some("preserve"));
        assert_eq!(p.prefix().as_deref(), Some("w"));
        assert_eq!(p.sibling_name("r"), "w:r");
    }

    #[test]
    fn test_round_trip_keeps_content() {
        let tree = XmlTree::parse(SAMPLE.as_bytes()).unwrap();
        let bytes = tree.to_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\""));
        assert!(text.contains("<w:t xml:space=\"preserve\">Tom &amp; Jerry </w:t>"));
        assert!(text.contains("<w:sectPr/>"));

        let reparsed = XmlTree::parse(text.as_bytes()).unwrap();
        assert!(reparsed.root().child(b"body").is_some());
    }

    #[test]
    fn test_push_text_escapes() {
        let mut el = XmlElement::new("w:t");
        el.push_text("<a & b>");
        let tree = XmlTree {
            prolog: Vec::new(),
            root: el,
            epilog: Vec::new(),
        };
        let text = String::from_utf8(tree.to_bytes().unwrap()).unwrap();
        assert_eq!(text, "<w:t>&lt;a &amp; b&gt;</w:t>");
        assert_eq!(tree.root().text(), "<a & b>");
    }

    #[test]
    fn test_malformed_xml_is_read_error() {
        let err = XmlTree::parse(b"<w:document><w:body></w:document>").unwrap_err();
        assert!(matches!(err, DocfillError::ReadError(_)));
    }

    #[test]
    fn test_empty_input_is_read_error() {
        assert!(XmlTree::parse(b"").is_err());
    }
}
