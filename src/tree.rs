//! The tree capability the detection pipeline reads from.
//!
//! The pipeline never touches a concrete DOM. Anything that can answer
//! these questions about a parsed document can be compared, which keeps the
//! core testable without a real parser.

use std::fmt::Debug;

/// Read-only navigation over a parsed markup tree.
///
/// Only element nodes are ever handed to the pipeline; text is reached
/// through [`own_text`](Tree::own_text) and
/// [`string_value`](Tree::string_value).
pub trait Tree {
    /// Cheap handle to an element of this tree.
    type Node: Copy + Eq + Debug;

    /// The document element (the root every path is relative to).
    fn root(&self) -> Option<Self::Node>;

    /// Local tag name of an element.
    fn tag(&self, node: Self::Node) -> &str;

    fn attr(&self, node: Self::Node, name: &str) -> Option<&str>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Element children in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Concatenation of the element's direct text children.
    fn own_text(&self, node: Self::Node) -> String;

    /// Concatenation of every descendant text node.
    fn string_value(&self, node: Self::Node) -> String;
}

impl<T: Tree + ?Sized> Tree for &T {
    type Node = T::Node;

    fn root(&self) -> Option<Self::Node> {
        (**self).root()
    }

    fn tag(&self, node: Self::Node) -> &str {
        (**self).tag(node)
    }

    fn attr(&self, node: Self::Node, name: &str) -> Option<&str> {
        (**self).attr(node, name)
    }

    fn parent(&self, node: Self::Node) -> Option<Self::Node> {
        (**self).parent(node)
    }

    fn children(&self, node: Self::Node) -> Vec<Self::Node> {
        (**self).children(node)
    }

    fn own_text(&self, node: Self::Node) -> String {
        (**self).own_text(node)
    }

    fn string_value(&self, node: Self::Node) -> String {
        (**self).string_value(node)
    }
}

/// Turns raw document bytes into a [`Tree`].
///
/// Parsing is tolerant: malformed markup still yields a tree.
pub trait MarkupParser {
    type Tree: Tree;

    fn parse(&self, bytes: &[u8]) -> Self::Tree;

    /// Parse already-decoded text.
    fn parse_str(&self, text: &str) -> Self::Tree {
        self.parse(text.as_bytes())
    }
}

/// Hand-built tree for unit tests.
#[cfg(test)]
pub(crate) mod fake {
    use super::Tree;

    #[derive(Debug, Clone)]
    struct FakeNode {
        tag: String,
        attrs: Vec<(String, String)>,
        text: String,
        parent: Option<usize>,
        children: Vec<usize>,
    }

    /// Element builder; text is attached to the element itself.
    #[derive(Debug, Clone)]
    pub struct El {
        tag: String,
        attrs: Vec<(String, String)>,
        text: String,
        children: Vec<El>,
    }

    pub fn el(tag: &str) -> El {
        El {
            tag: tag.to_string(),
            attrs: Vec::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    impl El {
        pub fn attr(mut self, name: &str, value: &str) -> Self {
            self.attrs.push((name.to_string(), value.to_string()));
            self
        }

        pub fn text(mut self, text: &str) -> Self {
            self.text = text.to_string();
            self
        }

        pub fn child(mut self, child: El) -> Self {
            self.children.push(child);
            self
        }
    }

    #[derive(Debug, Clone)]
    pub struct FakeTree {
        nodes: Vec<FakeNode>,
    }

    impl FakeTree {
        pub fn new(root: El) -> Self {
            let mut tree = FakeTree { nodes: Vec::new() };
            let mut pending = vec![(root, None)];
            // Allocate depth-first so node ids follow document order
            while let Some((el, parent)) = pending.pop() {
                let id = tree.nodes.len();
                tree.nodes.push(FakeNode {
                    tag: el.tag,
                    attrs: el.attrs,
                    text: el.text,
                    parent,
                    children: Vec::new(),
                });
                if let Some(p) = parent {
                    tree.nodes[p].children.push(id);
                }
                for child in el.children.into_iter().rev() {
                    pending.push((child, Some(id)));
                }
            }
            tree
        }
    }

    impl Tree for FakeTree {
        type Node = usize;

        fn root(&self) -> Option<usize> {
            (!self.nodes.is_empty()).then_some(0)
        }

        fn tag(&self, node: usize) -> &str {
            &self.nodes[node].tag
        }

        fn attr(&self, node: usize, name: &str) -> Option<&str> {
            self.nodes[node]
                .attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
        }

        fn parent(&self, node: usize) -> Option<usize> {
            self.nodes[node].parent
        }

        fn children(&self, node: usize) -> Vec<usize> {
            self.nodes[node].children.clone()
        }

        fn own_text(&self, node: usize) -> String {
            self.nodes[node].text.clone()
        }

        fn string_value(&self, node: usize) -> String {
            let mut out = self.nodes[node].text.clone();
            for &child in &self.nodes[node].children {
                out.push_str(&self.string_value(child));
            }
            out
        }
    }
}
