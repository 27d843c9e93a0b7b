//! Simplified selectors: the compact form a discovered path is rewritten to.
//!
//! The grammar is the small XPath subset the simplifier emits:
//!
//! ```text
//! /html/body/div[2]/p           absolute, from the document element
//! //div[@id="price"]/span       any matching element, then child steps
//! //tbody/tr[2]/td[1]           unique suffix anywhere in the tree
//! ./td[2]/a                     relative to a context element
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::path::{PathExpr, Step};
use crate::tree::Tree;

/// Where evaluation of the first step starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// `/`: the first step must be the document element.
    Root,
    /// `//`: the first step may match any element.
    Descendant,
    /// `./`: steps are children of a context element.
    Relative,
}

/// Predicate attached to a step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Filter {
    Any,
    /// 1-based position among same-tag siblings.
    Position(usize),
    /// Exact attribute value.
    Attr { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorStep {
    pub tag: String,
    pub filter: Filter,
}

impl SelectorStep {
    pub fn new(tag: impl Into<String>, filter: Filter) -> Self {
        Self {
            tag: tag.into(),
            filter,
        }
    }

    pub fn with_attr(tag: impl Into<String>, name: &str, value: &str) -> Self {
        Self::new(
            tag,
            Filter::Attr {
                name: name.to_string(),
                value: value.to_string(),
            },
        )
    }

    /// The `[n]` of a position filter, defaulting to 1.
    pub fn index(&self) -> usize {
        match self.filter {
            Filter::Position(n) => n,
            _ => 1,
        }
    }

    /// Same tag matching any position; attribute filters are kept.
    pub fn generalized(&self) -> Self {
        match self.filter {
            Filter::Position(_) => Self::new(self.tag.clone(), Filter::Any),
            _ => self.clone(),
        }
    }
}

impl From<&Step> for SelectorStep {
    fn from(step: &Step) -> Self {
        let filter = match step.position {
            Some(n) => Filter::Position(n),
            None => Filter::Any,
        };
        SelectorStep::new(step.tag.clone(), filter)
    }
}

impl fmt::Display for SelectorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)?;
        match &self.filter {
            Filter::Any => Ok(()),
            Filter::Position(n) => write!(f, "[{n}]"),
            // XPath literals have no escapes; switch quotes when needed
            Filter::Attr { name, value } if value.contains('"') => {
                write!(f, "[@{name}='{value}']")
            }
            Filter::Attr { name, value } => write!(f, "[@{name}=\"{value}\"]"),
        }
    }
}

/// A selector: an anchor followed by steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    anchor: Anchor,
    steps: Vec<SelectorStep>,
}

impl Selector {
    pub fn new(anchor: Anchor, steps: Vec<SelectorStep>) -> Self {
        Self { anchor, steps }
    }

    /// The raw path itself, as a selector.
    pub fn absolute(path: &PathExpr) -> Self {
        Self::new(Anchor::Root, path.steps().iter().map(SelectorStep::from).collect())
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn steps(&self) -> &[SelectorStep] {
        &self.steps
    }

    /// The first `len` steps, same anchor.
    pub fn truncate(&self, len: usize) -> Selector {
        Selector::new(self.anchor, self.steps[..len.min(self.steps.len())].to_vec())
    }

    /// Steps from `from` onward, relative to a context element.
    pub fn tail(&self, from: usize) -> Selector {
        let from = from.min(self.steps.len());
        Selector::new(Anchor::Relative, self.steps[from..].to_vec())
    }

    /// Evaluate against a whole tree, in document order.
    ///
    /// Relative selectors are evaluated from the document element.
    pub fn select<T: Tree>(&self, tree: &T) -> Vec<T::Node> {
        let Some(root) = tree.root() else {
            return Vec::new();
        };
        let Some((first, rest)) = self.steps.split_first() else {
            return Vec::new();
        };

        let start: Vec<T::Node> = match self.anchor {
            Anchor::Root => {
                let matches_root = tree.tag(root) == first.tag
                    && match &first.filter {
                        Filter::Any => true,
                        Filter::Position(n) => *n == 1,
                        Filter::Attr { name, value } => tree.attr(root, name) == Some(value.as_str()),
                    };
                if !matches_root {
                    return Vec::new();
                }
                vec![root]
            }
            Anchor::Descendant => descendants_or_self(tree, root)
                .into_iter()
                .filter(|&n| matches_anywhere(tree, n, first))
                .collect(),
            Anchor::Relative => return self.select_from(tree, root),
        };

        rest.iter()
            .fold(start, |nodes, step| child_step(tree, &nodes, step))
    }

    /// Evaluate the steps as children of `context`, whatever the anchor.
    pub fn select_from<T: Tree>(&self, tree: &T, context: T::Node) -> Vec<T::Node> {
        self.steps
            .iter()
            .fold(vec![context], |nodes, step| child_step(tree, &nodes, step))
    }

    /// First match in document order.
    pub fn select_first<T: Tree>(&self, tree: &T) -> Option<T::Node> {
        self.select(tree).into_iter().next()
    }
}

/// Apply one child step to every node of the current set.
fn child_step<T: Tree>(tree: &T, nodes: &[T::Node], step: &SelectorStep) -> Vec<T::Node> {
    let mut out = Vec::new();
    for &node in nodes {
        let same_tag = tree
            .children(node)
            .into_iter()
            .filter(|&c| tree.tag(c) == step.tag);
        match &step.filter {
            Filter::Any => out.extend(same_tag),
            Filter::Position(n) => out.extend(same_tag.skip(n - 1).take(1)),
            Filter::Attr { name, value } => {
                out.extend(same_tag.filter(|&c| tree.attr(c, name) == Some(value.as_str())))
            }
        }
    }
    out
}

/// Whether `node` satisfies `step` as the first step of a `//` selector.
fn matches_anywhere<T: Tree>(tree: &T, node: T::Node, step: &SelectorStep) -> bool {
    if tree.tag(node) != step.tag {
        return false;
    }
    match &step.filter {
        Filter::Any => true,
        Filter::Attr { name, value } => tree.attr(node, name) == Some(value.as_str()),
        Filter::Position(n) => match tree.parent(node) {
            Some(parent) => tree
                .children(parent)
                .into_iter()
                .filter(|&c| tree.tag(c) == step.tag)
                .nth(n - 1)
                == Some(node),
            None => *n == 1,
        },
    }
}

/// Every element from `root` down, pre-order.
fn descendants_or_self<T: Tree>(tree: &T, root: T::Node) -> Vec<T::Node> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(node);
        let mut children = tree.children(node);
        children.reverse();
        stack.extend(children);
    }
    out
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self.anchor {
            Anchor::Root => "/",
            Anchor::Descendant => "//",
            Anchor::Relative => "./",
        })?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidSelector {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (anchor, body) = if let Some(rest) = s.strip_prefix("./") {
            (Anchor::Relative, rest)
        } else if let Some(rest) = s.strip_prefix("//") {
            (Anchor::Descendant, rest)
        } else if let Some(rest) = s.strip_prefix('/') {
            (Anchor::Root, rest)
        } else {
            return Err(invalid("must start with `/`, `//` or `./`"));
        };

        let steps = split_steps(body)
            .ok_or_else(|| invalid("unbalanced brackets or quotes"))?
            .into_iter()
            .map(|raw| parse_step(raw).map_err(|reason| invalid(&reason)))
            .collect::<Result<Vec<_>>>()?;
        if steps.is_empty() {
            return Err(invalid("no steps"));
        }

        Ok(Selector::new(anchor, steps))
    }
}

/// Split on `/` outside of `[...]` and quoted literals.
fn split_steps(body: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.checked_sub(1)?,
            (None, '/') if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    parts.push(&body[start..]);
    Some(parts)
}

fn parse_step(raw: &str) -> std::result::Result<SelectorStep, String> {
    let Some((tag, rest)) = raw.split_once('[') else {
        if raw.is_empty() {
            return Err("empty step".to_string());
        }
        return Ok(SelectorStep::new(raw, Filter::Any));
    };
    if tag.is_empty() {
        return Err(format!("missing tag in `{raw}`"));
    }
    let predicate = rest
        .strip_suffix(']')
        .ok_or_else(|| format!("trailing text after predicate in `{raw}`"))?;

    let Some(attr) = predicate.strip_prefix('@') else {
        let n: usize = predicate
            .parse()
            .map_err(|_| format!("non-numeric position in `{raw}`"))?;
        if n == 0 {
            return Err(format!("positions are 1-based in `{raw}`"));
        }
        return Ok(SelectorStep::new(tag, Filter::Position(n)));
    };

    let (name, literal) = attr
        .split_once('=')
        .ok_or_else(|| format!("attribute predicate without value in `{raw}`"))?;
    let value = literal
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| literal.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .ok_or_else(|| format!("unquoted attribute value in `{raw}`"))?;

    Ok(SelectorStep::with_attr(tag, name, value))
}

#[cfg(feature = "serde")]
impl serde::Serialize for Selector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
