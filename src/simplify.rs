//! Rewrite a raw path into a short, attribute-aware selector.
//!
//! The path is shortened one trailing step at a time. The first (deepest)
//! ancestor carrying an `id`, or else a non-blank `class`, becomes the
//! anchor of a `//tag[@attr="value"]/rest` selector. Without any
//! attribute anchor the shortest suffix that is unique among every known
//! path is used, and as a last resort the raw path itself under a hashed
//! name.

use std::collections::HashSet;

use log::debug;

use crate::config::Config;
use crate::path::{self, PathExpr, Step};
use crate::selector::{Anchor, Selector, SelectorStep};
use crate::tree::Tree;
use crate::util::content_hash;

/// A simplified path on its way to becoming a named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub raw_path: PathExpr,
    pub name: String,
    pub selector: Selector,
    /// Appended to `name` when another candidate shares it.
    pub disambiguator: String,
}

/// Every raw path seen in any document, used as a uniqueness oracle.
#[derive(Debug, Clone, Default)]
pub struct KnownPaths {
    rendered: Vec<String>,
}

impl KnownPaths {
    pub fn new<'a>(paths: impl IntoIterator<Item = &'a PathExpr>) -> Self {
        let mut seen = HashSet::new();
        let rendered = paths
            .into_iter()
            .map(|p| p.to_string())
            .filter(|p| seen.insert(p.clone()))
            .collect();
        Self { rendered }
    }

    /// How many known paths end with `suffix` on a step boundary.
    pub fn count_suffix(&self, suffix: &str) -> usize {
        let needle = format!("/{suffix}");
        self.rendered.iter().filter(|p| p.ends_with(&needle)).count()
    }
}

enum Attr {
    Id,
    Class,
}

impl Attr {
    fn name(&self) -> &'static str {
        match self {
            Attr::Id => "id",
            Attr::Class => "class",
        }
    }
}

pub struct Simplifier<'a> {
    config: &'a Config,
    known: Option<&'a KnownPaths>,
}

impl<'a> Simplifier<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            known: None,
        }
    }

    /// Enable the unique-suffix rule.
    pub fn with_known_paths(mut self, known: &'a KnownPaths) -> Self {
        self.known = Some(known);
        self
    }

    /// Simplify `path` as found in `tree`.
    ///
    /// Returns `None` when a configured opt-out applies.
    pub fn simplify<T: Tree>(&self, tree: &T, path: &PathExpr) -> Option<Candidate> {
        let len = path.len();

        for trim in 0..len {
            let prefix_len = len - trim;
            let Some(node) = path::resolve(tree, &path.prefix(prefix_len)) else {
                continue;
            };

            if let Some(id) = tree.attr(node, "id").filter(|v| !v.trim().is_empty()) {
                if self.config.ignore_id.contains(id) {
                    debug!("{path}: ignored id {id:?}");
                    return None;
                }
                return Some(anchored(path, prefix_len, Attr::Id, id));
            }

            if let Some(class) = tree.attr(node, "class") {
                if self.config.ignore_class.contains(class) {
                    debug!("{path}: ignored class {class:?}");
                    return None;
                }
                if !class.trim().is_empty() {
                    return Some(anchored(path, prefix_len, Attr::Class, class));
                }
            }

            if trim == 0 && self.config.ignore_tag.contains(tree.tag(node)) {
                debug!("{path}: ignored tag");
                return None;
            }
        }

        if let Some(known) = self.known {
            for trim in 1..len {
                let steps = &path.steps()[len - trim..];
                let suffix = join(steps, "/");
                if known.count_suffix(&suffix) == 1 {
                    return Some(Candidate {
                        raw_path: path.clone(),
                        name: join(steps, "_"),
                        selector: Selector::new(
                            Anchor::Descendant,
                            steps.iter().map(SelectorStep::from).collect(),
                        ),
                        disambiguator: String::new(),
                    });
                }
            }
        }

        let raw = path.to_string();
        Some(Candidate {
            raw_path: path.clone(),
            name: content_hash(&raw),
            selector: Selector::absolute(path),
            disambiguator: String::new(),
        })
    }
}

/// Build the `//tag[@attr="value"]/suffix` candidate anchored at step `prefix_len - 1`.
fn anchored(path: &PathExpr, prefix_len: usize, attr: Attr, value: &str) -> Candidate {
    let steps = path.steps();
    let anchor = &steps[prefix_len - 1];
    let suffix = &steps[prefix_len..];

    let mut selector_steps = vec![SelectorStep::with_attr(
        anchor.tag.clone(),
        attr.name(),
        value,
    )];
    selector_steps.extend(suffix.iter().map(SelectorStep::from));

    // The positions the selector no longer spells out, then the kept suffix
    let disambiguator = steps[..prefix_len]
        .iter()
        .filter(|s| s.position.is_some())
        .chain(suffix)
        .map(|s| format!("_{s}"))
        .collect();

    Candidate {
        raw_path: path.clone(),
        name: value.trim().to_string(),
        selector: Selector::new(Anchor::Descendant, selector_steps),
        disambiguator,
    }
}

fn join(steps: &[Step], sep: &str) -> String {
    steps
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::all_paths;
    use crate::tree::fake::{FakeTree, el};

    fn shop() -> FakeTree {
        FakeTree::new(
            el("html").child(
                el("body")
                    .child(el("title").text("Shop"))
                    .child(
                        el("div")
                            .attr("id", "main")
                            .child(el("span").attr("class", "price").text("10"))
                            .child(el("span").attr("class", " ").text("note")),
                    )
                    .child(
                        el("div").child(el("ul").child(el("li").text("a")).child(el("li").text("b"))),
                    )
                    .child(el("script").text("var x = 1;")),
            ),
        )
    }

    fn p(s: &str) -> PathExpr {
        s.parse().unwrap()
    }

    fn simplify(config: &Config, tree: &FakeTree, path: &str) -> Option<Candidate> {
        let known = KnownPaths::new(&all_paths(tree));
        Simplifier::new(config)
            .with_known_paths(&known)
            .simplify(tree, &p(path))
    }

    #[test]
    fn test_deepest_class_wins_over_outer_id() {
        let c = simplify(&Config::new(), &shop(), "/html/body/div[1]/span[1]").unwrap();
        assert_eq!(c.name, "price");
        assert_eq!(c.selector.to_string(), "//span[@class=\"price\"]");
        assert_eq!(c.disambiguator, "_div[1]_span[1]");
    }

    #[test]
    fn test_blank_class_falls_through_to_id() {
        let c = simplify(&Config::new(), &shop(), "/html/body/div[1]/span[2]").unwrap();
        assert_eq!(c.name, "main");
        assert_eq!(c.selector.to_string(), "//div[@id=\"main\"]/span[2]");
        assert_eq!(c.disambiguator, "_div[1]_span[2]");
    }

    #[test]
    fn test_unique_suffix() {
        let c = simplify(&Config::new(), &shop(), "/html/body/title").unwrap();
        assert_eq!(c.name, "title");
        assert_eq!(c.selector.to_string(), "//title");
        assert_eq!(c.disambiguator, "");

        let c = simplify(&Config::new(), &shop(), "/html/body/div[2]/ul/li[2]").unwrap();
        assert_eq!(c.name, "li[2]");
        assert_eq!(c.selector.to_string(), "//li[2]");
    }

    #[test]
    fn test_longer_suffix_when_short_one_repeats() {
        let tree = FakeTree::new(
            el("html").child(
                el("body")
                    .child(el("section").child(el("h2").text("a")))
                    .child(el("aside").child(el("h2").text("b"))),
            ),
        );
        let c = simplify(&Config::new(), &tree, "/html/body/aside/h2").unwrap();
        assert_eq!(c.name, "aside_h2");
        assert_eq!(c.selector.to_string(), "//aside/h2");
    }

    #[test]
    fn test_hash_fallback_without_known_paths() {
        let config = Config::new();
        let tree = shop();
        let c = Simplifier::new(&config)
            .simplify(&tree, &p("/html/body/title"))
            .unwrap();
        assert_eq!(c.name, content_hash("/html/body/title"));
        assert_eq!(c.selector.to_string(), "/html/body/title");
    }

    #[test]
    fn test_configured_exclusions() {
        let tree = shop();
        let by_id = Config::new().with_ignore_id(["main"]);
        assert_eq!(simplify(&by_id, &tree, "/html/body/div[1]/span[2]"), None);

        let by_class = Config::new().with_ignore_class(["price"]);
        assert_eq!(simplify(&by_class, &tree, "/html/body/div[1]/span[1]"), None);

        let by_tag = Config::new().with_ignore_tag(["script"]);
        assert_eq!(simplify(&by_tag, &tree, "/html/body/script"), None);
        // Only the untrimmed path's own tag counts
        let by_body = Config::new().with_ignore_tag(["body"]);
        assert!(simplify(&by_body, &tree, "/html/body/title").is_some());
    }

    #[test]
    fn test_deterministic() {
        let tree = shop();
        let config = Config::new();
        for path in all_paths(&tree) {
            let a = simplify(&config, &tree, &path.to_string());
            let b = simplify(&config, &tree, &path.to_string());
            assert_eq!(a, b);
        }
    }
}
