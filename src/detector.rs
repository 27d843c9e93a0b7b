//! Run the whole comparison pipeline over a set of documents.

use std::fmt;
use std::path::Path;

use log::{debug, info};

use crate::common::{self, ClassStringPaths};
use crate::config::Config;
use crate::dedup::{self, Field};
use crate::divergence::{self, TextMode};
use crate::dom::HtmlParser;
use crate::error::{Error, Result};
use crate::io::DocumentSource;
use crate::path::{self, PathExpr};
use crate::selector::Selector;
use crate::simplify::{Candidate, KnownPaths, Simplifier};
use crate::table::{self, TableDescriptor};
use crate::tree::{MarkupParser, Tree};

/// Named selectors and tables found by a [`Detector`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResultSet {
    /// Plain fields, names pairwise distinct.
    pub fields: Vec<Field>,
    pub tables: Vec<TableDescriptor>,
}

impl ResultSet {
    /// Selector of the field called `name`.
    pub fn get(&self, name: &str) -> Option<&Selector> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.selector)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.tables.is_empty()
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[ key_val ]")?;
        if self.fields.is_empty() {
            writeln!(f, "      None")?;
        }
        for field in &self.fields {
            writeln!(f, "      {} : {}", field.name, field.selector)?;
        }

        writeln!(f, "[ tables ]")?;
        if self.tables.is_empty() {
            writeln!(f, "      None")?;
        }
        for (i, table) in self.tables.iter().enumerate() {
            writeln!(f, "[ table: {i} ]")?;
            writeln!(f, "    [ rows ]")?;
            writeln!(f, "    {}", table.rows)?;
            writeln!(f, "    [ cols ]")?;
            if table.columns.is_empty() {
                writeln!(f, "        None")?;
            }
            for column in &table.columns {
                writeln!(f, "        {} : {}", column.name, column.pattern)?;
            }
        }
        Ok(())
    }
}

/// Compares documents built from one template and reports where they differ.
///
/// # Example
///
/// ```
/// use pathsift::{Config, Detector};
///
/// let detector = Detector::new(Config::new());
/// let result = detector
///     .detect_strs(&["<h1>Welcome A</h1>", "<h1>Welcome B</h1>"])
///     .unwrap();
/// assert_eq!(result.get("h1").unwrap().to_string(), "//h1");
/// ```
#[derive(Debug, Clone)]
pub struct Detector<P: MarkupParser = HtmlParser> {
    config: Config,
    parser: P,
}

impl Detector {
    /// A detector using the built-in HTML parser.
    pub fn new(config: Config) -> Self {
        Self::with_parser(config, HtmlParser)
    }
}

impl<P: MarkupParser> Detector<P> {
    pub fn with_parser(config: Config, parser: P) -> Self {
        Self { config, parser }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Detect over raw markup strings.
    pub fn detect_strs<S: AsRef<str>>(&self, docs: &[S]) -> Result<ResultSet> {
        ensure_enough(docs.len())?;
        let trees: Vec<P::Tree> = docs
            .iter()
            .map(|d| self.parser.parse_str(d.as_ref()))
            .collect();
        self.detect(&trees)
    }

    /// Detect over undecoded markup; the encoding is sniffed per document.
    pub fn detect_bytes<B: AsRef<[u8]>>(&self, docs: &[B]) -> Result<ResultSet> {
        ensure_enough(docs.len())?;
        let trees: Vec<P::Tree> = docs.iter().map(|d| self.parser.parse(d.as_ref())).collect();
        self.detect(&trees)
    }

    /// Detect over files on disk.
    pub fn detect_files<F: AsRef<Path>>(&self, files: &[F]) -> Result<ResultSet> {
        ensure_enough(files.len())?;
        let docs = files
            .iter()
            .map(std::fs::read)
            .collect::<std::io::Result<Vec<_>>>()?;
        self.detect_bytes(&docs)
    }

    /// Fetch every id from `source`, in order, then detect.
    pub fn detect_from<S: DocumentSource>(&self, source: &S, ids: &[&str]) -> Result<ResultSet> {
        ensure_enough(ids.len())?;
        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            debug!("fetching {id}");
            docs.push(source.fetch(id)?);
        }
        self.detect_bytes(&docs)
    }

    /// Download every URL, then detect.
    #[cfg(feature = "fetch")]
    pub fn detect_urls(&self, urls: &[&str]) -> Result<ResultSet> {
        ensure_enough(urls.len())?;
        let source = crate::io::HttpSource::new()?;
        self.detect_from(&source, urls)
    }

    /// Detect over already-parsed trees.
    ///
    /// Names and selectors are derived from the first tree.
    pub fn detect<T: Tree>(&self, trees: &[T]) -> Result<ResultSet> {
        ensure_enough(trees.len())?;

        let sets: Vec<Vec<PathExpr>> = trees.iter().map(|t| path::all_paths(t)).collect();
        let known = KnownPaths::new(sets.iter().flatten());
        let common = common::intersect(&sets)?;
        let divergent = divergence::divergent_paths(trees, &common, TextMode::ByTag);
        debug!("{} common paths, {} divergent", common.len(), divergent.len());

        let extra = if self.config.experimental_class_strings {
            let class_common = common::keep_common(&ClassStringPaths, trees)?;
            let mut extra =
                divergence::divergent_paths(trees, &class_common, TextMode::StringValue);
            extra.retain(|p| !divergent.contains(p));
            debug!("{} extra divergent class paths", extra.len());
            extra
        } else {
            Vec::new()
        };

        if divergent.is_empty() && extra.is_empty() {
            info!("no divergent common paths across {} documents", trees.len());
            return Ok(ResultSet::default());
        }

        let first = &trees[0];
        let simplifier = Simplifier::new(&self.config).with_known_paths(&known);
        let candidates: Vec<Candidate> = divergent
            .iter()
            .chain(&extra)
            .filter_map(|p| simplifier.simplify(first, p))
            .collect();
        debug!("{} candidates after exclusions", candidates.len());

        let fields = dedup::dedupe(candidates, &self.config.ignore_simple_path);
        let (fields, tables) = table::reconstruct(first, fields);
        debug!("{} fields, {} tables", fields.len(), tables.len());

        Ok(ResultSet { fields, tables })
    }
}

fn ensure_enough(got: usize) -> Result<()> {
    if got < 2 {
        return Err(Error::TooFewDocuments { got });
    }
    Ok(())
}
