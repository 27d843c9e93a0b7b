//! Arena DOM and the default html5ever-backed parser.
//!
//! # Example
//!
//! ```
//! use pathsift::dom::parse_html;
//! use pathsift::Tree;
//!
//! let dom = parse_html("<p class='intro'>Welcome!</p>");
//! let html = dom.root().unwrap();
//! assert_eq!(dom.tag(html), "html");
//! ```

mod arena;
mod tree_sink;

pub use arena::{Attribute, ChildrenIter, Dom, Node, NodeData, NodeId};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use crate::tree::{MarkupParser, Tree};
use tree_sink::DomSink;

/// Parse an HTML string into a [`Dom`].
pub fn parse_html(html: &str) -> Dom {
    let sink = DomSink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Parse HTML bytes, detecting the encoding from the content.
pub fn parse_html_bytes(html: &[u8]) -> Dom {
    let hint = crate::util::extract_charset(html);
    let text = crate::util::decode_text(html, hint);
    parse_html(&text)
}

/// Default [`MarkupParser`]: tolerant HTML parsing via html5ever.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl MarkupParser for HtmlParser {
    type Tree = Dom;

    fn parse(&self, bytes: &[u8]) -> Dom {
        parse_html_bytes(bytes)
    }

    fn parse_str(&self, text: &str) -> Dom {
        parse_html(text)
    }
}

impl Tree for Dom {
    type Node = NodeId;

    fn root(&self) -> Option<NodeId> {
        self.document_element()
    }

    fn tag(&self, node: NodeId) -> &str {
        self.element_name(node).map(|n| n.as_ref()).unwrap_or("")
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get_attr(node, name)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)
            .map(|n| n.parent)
            .filter(|&p| self.is_element(p))
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        Dom::children(self, node)
            .filter(|&c| self.is_element(c))
            .collect()
    }

    fn own_text(&self, node: NodeId) -> String {
        Dom::children(self, node)
            .filter_map(|c| self.text_content(c))
            .collect()
    }

    fn string_value(&self, node: NodeId) -> String {
        Dom::string_value(self, node)
    }
}
