//! Paths shared by every document.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::path::{self, PathExpr};
use crate::tree::Tree;

/// A way of enumerating the candidate paths of one tree.
pub trait PathStrategy {
    fn paths<T: Tree>(&self, tree: &T) -> Vec<PathExpr>;
}

/// Every element path below the root (see [`path::all_paths`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct FullPaths;

impl PathStrategy for FullPaths {
    fn paths<T: Tree>(&self, tree: &T) -> Vec<PathExpr> {
        path::all_paths(tree)
    }
}

/// Experimental: class-carrying elements whose text is new.
///
/// Walks every element pre-order and keeps the path of an element with a
/// `class` attribute unless its trimmed string value equals, or is contained
/// in, the value kept just before it. Nested wrappers around the same text
/// therefore collapse onto the outermost one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassStringPaths;

impl PathStrategy for ClassStringPaths {
    fn paths<T: Tree>(&self, tree: &T) -> Vec<PathExpr> {
        let Some(root) = tree.root() else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut last = String::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            let mut children = tree.children(node);
            children.reverse();
            stack.extend(children);

            if tree.attr(node, "class").is_none() {
                continue;
            }
            let text = tree.string_value(node).trim().to_string();
            if last.contains(text.as_str()) {
                continue;
            }
            out.push(path::address_of(tree, node));
            last = text;
        }

        out
    }
}

/// Intersect per-document path sets, keeping the first set's order.
pub fn intersect(sets: &[Vec<PathExpr>]) -> Result<Vec<PathExpr>> {
    let (first, rest) = match sets {
        [first, rest @ ..] if !rest.is_empty() => (first, rest),
        _ => return Err(Error::TooFewDocuments { got: sets.len() }),
    };

    let others: Vec<HashSet<&PathExpr>> = rest.iter().map(|s| s.iter().collect()).collect();

    let mut seen = HashSet::new();
    Ok(first
        .iter()
        .filter(|p| others.iter().all(|set| set.contains(p)))
        .filter(|p| seen.insert(*p))
        .cloned()
        .collect())
}

/// Paths that `strategy` finds, identically, in every tree.
pub fn keep_common<S: PathStrategy, T: Tree>(strategy: &S, trees: &[T]) -> Result<Vec<PathExpr>> {
    if trees.len() < 2 {
        return Err(Error::TooFewDocuments { got: trees.len() });
    }
    let sets: Vec<Vec<PathExpr>> = trees.iter().map(|t| strategy.paths(t)).collect();
    intersect(&sets)
}
