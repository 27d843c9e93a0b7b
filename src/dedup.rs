//! Make candidate names unique.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::path::PathExpr;
use crate::selector::Selector;
use crate::simplify::Candidate;

/// A named selector ready for output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Field {
    pub name: String,
    pub selector: Selector,
    /// The absolute path the selector was derived from, in the reference tree.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub raw_path: PathExpr,
}

/// Resolve name collisions among `candidates`.
///
/// Candidates whose rendered selector is in `ignore` are removed first.
/// A name used once is kept; a shared name gets its candidate's
/// disambiguator appended. Should that still collide, `_2`, `_3`, ... are
/// appended, so output names are always pairwise distinct.
pub fn dedupe(candidates: Vec<Candidate>, ignore: &HashSet<String>) -> Vec<Field> {
    let kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| {
            let skip = ignore.contains(&c.selector.to_string());
            if skip {
                debug!("{}: ignored selector {}", c.raw_path, c.selector);
            }
            !skip
        })
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for c in &kept {
        *counts.entry(c.name.as_str()).or_default() += 1;
    }

    let mut used = HashSet::new();
    let mut fields = Vec::with_capacity(kept.len());
    for c in &kept {
        let base = if counts[c.name.as_str()] == 1 {
            c.name.clone()
        } else {
            format!("{}{}", c.name, c.disambiguator)
        };

        let mut name = base.clone();
        let mut n = 2;
        while used.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        used.insert(name.clone());

        fields.push(Field {
            name,
            selector: c.selector.clone(),
            raw_path: c.raw_path.clone(),
        });
    }
    fields
}
