//! Owned element tree for a layer's metadata payload.
//!
//! Only what the field rules need is kept: element local names, character data
//! (text and CDATA, entities unescaped) and document order. Attributes,
//! comments and processing instructions are dropped.

use crate::utils::error::{ExtractError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Deepest element nesting accepted; the tree is walked recursively.
pub const MAX_DEPTH: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    content: Vec<Node>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            content: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.content.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// All character data below this element, in document order.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.content {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Depth-first, document-order match of `segments` against descendants.
    fn find_path(&self, segments: &[&str]) -> Option<&Element> {
        let Some((first, rest)) = segments.split_first() else {
            return Some(self);
        };

        self.children()
            .filter(|child| child.name == *first)
            .find_map(|child| child.find_path(rest))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDocument {
    root: Element,
}

impl MetadataDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    if stack.len() >= MAX_DEPTH {
                        return Err(ExtractError::MalformedMetadata {
                            message: format!("elements nested deeper than {}", MAX_DEPTH),
                        });
                    }
                    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    stack.push(Element::new(name));
                }
                Event::Empty(start) => {
                    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    attach(&mut stack, &mut root, Element::new(name))?;
                }
                Event::End(_) => {
                    // quick-xml has already matched the end name against the open tag
                    let element = stack.pop().ok_or_else(|| ExtractError::MalformedMetadata {
                        message: "closing tag without a matching opening tag".to_string(),
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    push_text(&mut stack, &text)?;
                }
                Event::CData(cdata) => {
                    let bytes = cdata.into_inner();
                    push_text(&mut stack, &String::from_utf8_lossy(&bytes))?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ExtractError::MalformedMetadata {
                message: format!("unclosed element <{}>", open.name),
            });
        }

        let root = root.ok_or_else(|| ExtractError::MalformedMetadata {
            message: "no root element".to_string(),
        })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Looks up the first element at a slash-separated path below the root,
    /// e.g. `dataIdInfo/idCitation/resTitle`.
    ///
    /// If nothing matches and the root element itself carries the first
    /// segment's name, the path is resolved from the root instead.
    pub fn find(&self, path: &str) -> Option<&Element> {
        let segments: Vec<&str> = path
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect();

        self.root.find_path(&segments).or_else(|| match segments.split_first() {
            Some((first, rest)) if self.root.name == *first => self.root.find_path(rest),
            _ => None,
        })
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.content.push(Node::Element(element));
        return Ok(());
    }

    if root.is_some() {
        return Err(ExtractError::MalformedMetadata {
            message: format!("unexpected element <{}> after the root element", element.name),
        });
    }

    *root = Some(element);
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.content.push(Node::Text(text.to_string()));
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(ExtractError::MalformedMetadata {
            message: "text outside the root element".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCGIS_METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xml:lang="en">
  <Esri><CreaDate>20210101</CreaDate></Esri>
  <dataIdInfo>
    <idCitation>
      <resTitle>Parcels 2021</resTitle>
      <date><reviseDate>2021-01-01T12:00:00</reviseDate></date>
    </idCitation>
    <idAbs>&lt;DIV&gt;&lt;P&gt;Parcel boundaries.&lt;/P&gt;&lt;/DIV&gt;</idAbs>
  </dataIdInfo>
</metadata>"#;

    #[test]
    fn test_find_below_root() {
        let doc = MetadataDocument::parse(ARCGIS_METADATA).unwrap();

        assert_eq!(doc.root().name(), "metadata");
        let title = doc.find("dataIdInfo/idCitation/resTitle").unwrap();
        assert_eq!(title.text(), "Parcels 2021");
        let date = doc.find("./dataIdInfo/idCitation/date/reviseDate").unwrap();
        assert_eq!(date.text(), "2021-01-01T12:00:00");
    }

    #[test]
    fn test_escaped_markup_is_unescaped_text() {
        let doc = MetadataDocument::parse(ARCGIS_METADATA).unwrap();
        let abs = doc.find("dataIdInfo/idAbs").unwrap();
        assert_eq!(abs.text(), "<DIV><P>Parcel boundaries.</P></DIV>");
        assert_eq!(abs.children().count(), 0);
    }

    #[test]
    fn test_text_includes_descendants_and_cdata() {
        let doc =
            MetadataDocument::parse("<a><b>Hello <i>big</i> <![CDATA[<World>]]></b></a>").unwrap();
        assert_eq!(doc.find("b").unwrap().text(), "Hello big <World>");
    }

    #[test]
    fn test_root_named_like_first_segment() {
        let doc = MetadataDocument::parse(
            "<dataIdInfo><idCitation><resTitle>T</resTitle></idCitation></dataIdInfo>",
        )
        .unwrap();
        assert_eq!(doc.find("dataIdInfo/idCitation/resTitle").unwrap().text(), "T");
    }

    #[test]
    fn test_first_match_in_document_order() {
        let doc = MetadataDocument::parse(
            "<m><d><x/></d><d><c><t>second</t></c></d><d><c><t>third</t></c></d></m>",
        )
        .unwrap();
        assert_eq!(doc.find("d/c/t").unwrap().text(), "second");
    }

    #[test]
    fn test_missing_path() {
        let doc = MetadataDocument::parse(ARCGIS_METADATA).unwrap();
        assert!(doc.find("dataIdInfo/idPurp").is_none());
        assert!(doc.find("idCitation/resTitle").is_none());
    }

    #[test]
    fn test_empty_element_has_empty_text() {
        let doc = MetadataDocument::parse("<m><dataIdInfo><idAbs/></dataIdInfo></m>").unwrap();
        assert_eq!(doc.find("dataIdInfo/idAbs").unwrap().text(), "");
    }

    #[test]
    fn test_namespace_prefixes_are_ignored() {
        let doc = MetadataDocument::parse(
            r#"<gmd:metadata xmlns:gmd="urn:x"><gmd:dataIdInfo><gmd:idAbs>a</gmd:idAbs></gmd:dataIdInfo></gmd:metadata>"#,
        )
        .unwrap();
        assert_eq!(doc.find("dataIdInfo/idAbs").unwrap().text(), "a");
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let nested = |depth: usize| format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));

        let doc = MetadataDocument::parse(&nested(MAX_DEPTH)).unwrap();
        assert_eq!(doc.root().name(), "a");

        let err = MetadataDocument::parse(&nested(MAX_DEPTH + 1)).unwrap_err();
        assert!(err.is_malformed_metadata());
        assert_eq!(
            err.reason(),
            format!("elements nested deeper than {}", MAX_DEPTH)
        );

        // far past the bound: rejected before the tree gets deep
        let err = MetadataDocument::parse(&nested(200_000)).unwrap_err();
        assert!(err.is_malformed_metadata());
    }

    #[test]
    fn test_malformed_documents() {
        for xml in [
            "<a><b></a>",
            "<a><b>",
            "",
            "just text",
            "<a/><b/>",
            "</a>",
        ] {
            let err = MetadataDocument::parse(xml).unwrap_err();
            assert!(err.is_malformed_metadata(), "{xml:?} gave {err}");
        }
    }
}
