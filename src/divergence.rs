//! Keep only the shared paths whose content differs between documents.
//!
//! A path present everywhere with the same text everywhere is template
//! boilerplate; differing text is per-instance content.

use std::collections::HashSet;

use crate::path::{self, PathExpr};
use crate::tree::Tree;

/// Tags that typically wrap inline markup, compared by full string value.
const INLINE_CONTAINERS: &[&str] = &["p", "span"];

/// How a resolved element is turned into comparable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// String value for inline containers, own text for everything else.
    ByTag,
    /// Always the full string value.
    StringValue,
}

/// The trimmed text of `node` used for comparison.
pub fn text_of<T: Tree>(tree: &T, node: T::Node, mode: TextMode) -> String {
    let full = match mode {
        TextMode::StringValue => true,
        TextMode::ByTag => INLINE_CONTAINERS.contains(&tree.tag(node)),
    };
    let text = if full {
        tree.string_value(node)
    } else {
        tree.own_text(node)
    };
    text.trim().to_string()
}

/// Whether `path` carries non-empty, non-identical text across `trees`.
///
/// A path that fails to resolve in any tree counts as empty there.
pub fn is_divergent<T: Tree>(trees: &[T], path: &PathExpr, mode: TextMode) -> bool {
    let mut distinct = HashSet::new();
    for tree in trees {
        let Some(node) = path::resolve(tree, path) else {
            return false;
        };
        let text = text_of(tree, node, mode);
        if text.is_empty() {
            return false;
        }
        distinct.insert(text);
    }
    distinct.len() > 1
}

/// Filter `common` down to the divergent paths, preserving order.
pub fn divergent_paths<T: Tree>(trees: &[T], common: &[PathExpr], mode: TextMode) -> Vec<PathExpr> {
    common
        .iter()
        .filter(|p| is_divergent(trees, p, mode))
        .cloned()
        .collect()
}
