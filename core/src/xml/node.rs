//! Minimal XML element tree used by the heuristic importers.
//!
//! Names are stored without namespace prefixes and every lookup is
//! case-insensitive, so the matching logic works the same on a parsed
//! document and on a tree built by hand in a test.

use crate::error::{ImportError, ImportResult};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmlNode {
    /// Local name, namespace stripped.
    pub name: String,
    /// Attributes keyed by local name.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// Text directly inside this element, whitespace preserved.
    pub text: String,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Shorthand for a leaf element holding only text.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).with_text(text)
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed `unit` attribute, if any.
    pub fn unit(&self) -> Option<&str> {
        self.attribute("unit").map(str::trim)
    }

    /// All text in this subtree: own text first, then each child's value.
    pub fn value(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.value());
        }
        out
    }

    /// Every element below this one in document order, excluding itself.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// First descendant with the given local name.
    pub fn first_descendant(&self, name: &str) -> Option<&XmlNode> {
        self.descendants().find(|n| n.is_named(name))
    }

    /// First descendant matching any of the names, trying names in order.
    pub fn first_descendant_of(&self, names: &[&str]) -> Option<&XmlNode> {
        names.iter().find_map(|name| self.first_descendant(name))
    }

    pub fn has_descendant(&self, name: &str) -> bool {
        self.descendants().any(|n| n.is_named(name))
    }

    /// Parse XML text into a tree rooted at the document element.
    pub fn parse(text: &str) -> ImportResult<XmlNode> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, options)
            .map_err(|e| ImportError::MalformedDocument(e.to_string()))?;
        Ok(Self::from_roxmltree(doc.root_element()))
    }

    fn from_roxmltree(node: roxmltree::Node<'_, '_>) -> XmlNode {
        let mut out = XmlNode::new(node.tag_name().name());
        out.attributes = node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect();

        for child in node.children() {
            if child.is_element() {
                out.children.push(Self::from_roxmltree(child));
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    out.text.push_str(text);
                }
            }
        }
        out
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a XmlNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Decode raw document bytes: UTF-8 (BOM optional) or UTF-16 with a BOM.
pub fn decode_document(bytes: &[u8]) -> ImportResult<String> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => utf8(rest),
        [0xFF, 0xFE, rest @ ..] => utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => utf16(rest, u16::from_be_bytes),
        _ => utf8(bytes),
    }
}

fn utf8(bytes: &[u8]) -> ImportResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| ImportError::MalformedDocument(e.to_string()))
}

fn utf16(bytes: &[u8], decode: fn([u8; 2]) -> u16) -> ImportResult<String> {
    if bytes.len() % 2 != 0 {
        return Err(ImportError::MalformedDocument(
            "odd byte count in UTF-16 document".to_string(),
        ));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| decode([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| ImportError::MalformedDocument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_namespaces() {
        let root = XmlNode::parse(
            r#"<u:uddf xmlns:u="http://www.streit.cc/uddf/3.2/"><u:Dive id="d1"><u:Depth U:unit="ft" xmlns:U="x">33</u:Depth></u:Dive></u:uddf>"#,
        )
        .unwrap();
        assert_eq!(root.name, "uddf");
        let dive = root.first_descendant("dive").unwrap();
        assert_eq!(dive.attribute("ID"), Some("d1"));
        let depth = dive.first_descendant("DEPTH").unwrap();
        assert_eq!(depth.unit(), Some("ft"));
        assert_eq!(depth.value(), "33");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = XmlNode::parse("<dive><depth>3</dive>").unwrap_err();
        assert!(matches!(err, ImportError::MalformedDocument(_)));
        assert!(XmlNode::parse("").is_err());
    }

    #[test]
    fn test_whitespace_preserved() {
        let root = XmlNode::parse("<a><time> 01:30 </time></a>").unwrap();
        assert_eq!(root.first_descendant("time").unwrap().text, " 01:30 ");
    }

    #[test]
    fn test_descendants_document_order() {
        let tree = XmlNode::new("root")
            .with_child(
                XmlNode::new("a")
                    .with_child(XmlNode::leaf("date", "inner"))
                    .with_child(XmlNode::new("b")),
            )
            .with_child(XmlNode::leaf("date", "outer"));

        let names: Vec<&str> = tree.descendants().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a", "date", "b", "date"]);
        assert_eq!(tree.first_descendant("date").unwrap().text, "inner");
        assert!(!tree.has_descendant("root"));
        assert_eq!(
            tree.first_descendant_of(&["missing", "b"]).map(|n| n.name.as_str()),
            Some("b")
        );
    }

    #[test]
    fn test_value_concatenates_subtree() {
        let tree = XmlNode::new("notes")
            .with_text("Nice ")
            .with_child(XmlNode::leaf("b", "viz"));
        assert_eq!(tree.value(), "Nice viz");
    }

    #[test]
    fn test_decode_document() {
        assert_eq!(decode_document(b"<a/>").unwrap(), "<a/>");
        assert_eq!(decode_document(b"\xEF\xBB\xBF<a/>").unwrap(), "<a/>");

        let mut le = vec![0xFF, 0xFE];
        for unit in "<a/>".encode_utf16() {
            le.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_document(&le).unwrap(), "<a/>");

        let mut be = vec![0xFE, 0xFF];
        for unit in "<é/>".encode_utf16() {
            be.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_document(&be).unwrap(), "<é/>");

        assert!(decode_document(&[0xFF, 0xFE, 0x3C]).is_err());
        assert!(decode_document(&[0xC3, 0x28]).is_err());
    }
}
