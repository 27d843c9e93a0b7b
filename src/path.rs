//! Absolute, position-qualified path expressions.
//!
//! A path such as `/html/body/div[2]/p` names exactly one element: each step
//! is a tag plus its 1-based position among same-tag siblings. The position
//! is only rendered when the parent has more than one child with that tag.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::tree::Tree;

/// Line breaks are stray formatting, never structural anchors.
const LINE_BREAK: &str = "br";

/// One `tag[n]` step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Step {
    pub tag: String,
    /// `None` when the element is the only child with this tag.
    pub position: Option<usize>,
}

impl Step {
    pub fn new(tag: impl Into<String>, position: Option<usize>) -> Self {
        Self {
            tag: tag.into(),
            position,
        }
    }

    /// Position with the implicit `1` filled in.
    pub fn index(&self) -> usize {
        self.position.unwrap_or(1)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(n) => write!(f, "{}[{}]", self.tag, n),
            None => f.write_str(&self.tag),
        }
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (tag, position) = match s.split_once('[') {
            Some((tag, rest)) => {
                let digits = rest
                    .strip_suffix(']')
                    .ok_or_else(|| format!("unterminated qualifier in `{s}`"))?;
                let n: usize = digits
                    .parse()
                    .map_err(|_| format!("non-numeric qualifier in `{s}`"))?;
                if n == 0 {
                    return Err(format!("positions are 1-based in `{s}`"));
                }
                (tag, Some(n))
            }
            None => (s, None),
        };
        if tag.is_empty() {
            return Err("empty step".to_string());
        }
        Ok(Step::new(tag, position))
    }
}

/// An absolute path from the document element down to one element.
///
/// Two paths are equal iff their rendered forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpr {
    steps: Vec<Step>,
}

impl PathExpr {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// The first `len` steps.
    pub fn prefix(&self, len: usize) -> PathExpr {
        PathExpr::new(self.steps[..len.min(self.steps.len())].to_vec())
    }

    /// Drop a trailing `br` step so a line break collapses into its parent.
    fn strip_line_break(mut self) -> Self {
        while self.steps.len() > 1 && self.steps.last().is_some_and(|s| s.tag == LINE_BREAK) {
            self.steps.pop();
        }
        self
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

impl FromStr for PathExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidPath {
            input: s.to_string(),
            reason,
        };
        let body = s
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with `/`".to_string()))?;
        if body.starts_with('/') {
            return Err(invalid("descendant steps are not absolute".to_string()));
        }
        let steps = body
            .split('/')
            .map(|part| part.parse::<Step>().map_err(&invalid))
            .collect::<Result<Vec<_>>>()?;
        Ok(PathExpr::new(steps))
    }
}

/// Every element below the root of `tree`, depth-first pre-order.
///
/// The root itself is excluded. Trailing `br` steps are stripped, and the
/// result is de-duplicated keeping first occurrences, so each path resolves
/// to exactly one element.
pub fn all_paths<T: Tree>(tree: &T) -> Vec<PathExpr> {
    let Some(root) = tree.root() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let root_steps = vec![Step::new(tree.tag(root), None)];

    // Stack of (node, its steps); children pushed in reverse for pre-order
    let mut stack: Vec<(T::Node, Vec<Step>)> = child_steps(tree, root, &root_steps);
    stack.reverse();

    while let Some((node, steps)) = stack.pop() {
        let mut children = child_steps(tree, node, &steps);
        children.reverse();

        let path = PathExpr::new(steps).strip_line_break();
        if seen.insert(path.clone()) {
            out.push(path);
        }
        stack.extend(children);
    }

    out
}

/// Children of `node` paired with their full step lists.
fn child_steps<T: Tree>(tree: &T, node: T::Node, parent_steps: &[Step]) -> Vec<(T::Node, Vec<Step>)> {
    let children = tree.children(node);
    let tags: Vec<&str> = children.iter().map(|&c| tree.tag(c)).collect();

    children
        .iter()
        .enumerate()
        .map(|(i, &child)| {
            let tag = tags[i];
            let total = tags.iter().filter(|&&t| t == tag).count();
            let position = (total > 1).then(|| tags[..=i].iter().filter(|&&t| t == tag).count());
            let mut steps = parent_steps.to_vec();
            steps.push(Step::new(tag, position));
            (child, steps)
        })
        .collect()
}

/// Resolve a path to its element, if the tree has one there.
pub fn resolve<T: Tree>(tree: &T, path: &PathExpr) -> Option<T::Node> {
    let root = tree.root()?;
    let (first, rest) = path.steps.split_first()?;
    if tree.tag(root) != first.tag || first.index() != 1 {
        return None;
    }

    rest.iter().try_fold(root, |node, step| {
        tree.children(node)
            .into_iter()
            .filter(|&c| tree.tag(c) == step.tag)
            .nth(step.index() - 1)
    })
}

/// The path of `node`, computed by walking parent links up to the root.
pub fn address_of<T: Tree>(tree: &T, node: T::Node) -> PathExpr {
    let mut steps = Vec::new();
    let mut current = node;

    while let Some(parent) = tree.parent(current) {
        let tag = tree.tag(current);
        let same: Vec<_> = tree
            .children(parent)
            .into_iter()
            .filter(|&c| tree.tag(c) == tag)
            .collect();
        let position = (same.len() > 1)
            .then(|| same.iter().position(|&c| c == current).map(|i| i + 1))
            .flatten();
        steps.push(Step::new(tag, position));
        current = parent;
    }
    steps.push(Step::new(tree.tag(current), None));

    steps.reverse();
    PathExpr::new(steps)
}
