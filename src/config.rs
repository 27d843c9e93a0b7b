//! Detection options.

use std::collections::HashSet;

/// Opt-outs applied while simplifying and deduplicating candidates.
///
/// Every set defaults to empty.
///
/// ```
/// use pathsift::Config;
///
/// let config = Config::new()
///     .with_ignore_tag(["script", "style"])
///     .with_ignore_id(["pageNumber"])
///     .with_ignore_simple_path(["//td[2]/font"]);
/// assert!(config.ignore_tag.contains("script"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Tags whose own paths are dropped.
    pub ignore_tag: HashSet<String>,
    /// Class values that drop any path anchored on them.
    pub ignore_class: HashSet<String>,
    /// Id values that drop any path anchored on them.
    pub ignore_id: HashSet<String>,
    /// Literal selectors removed before naming.
    pub ignore_simple_path: HashSet<String>,
    /// Also compare class-carrying elements by string value.
    pub experimental_class_strings: bool,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_tag<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_tag.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_ignore_class<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_class.extend(classes.into_iter().map(Into::into));
        self
    }

    pub fn with_ignore_id<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_id.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_ignore_simple_path<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_simple_path
            .extend(selectors.into_iter().map(Into::into));
        self
    }

    pub fn with_experimental_class_strings(mut self, enabled: bool) -> Self {
        self.experimental_class_strings = enabled;
        self
    }

    /// Merge another config's opt-outs into this one.
    pub fn merge(mut self, other: Config) -> Self {
        self.ignore_tag.extend(other.ignore_tag);
        self.ignore_class.extend(other.ignore_class);
        self.ignore_id.extend(other.ignore_id);
        self.ignore_simple_path.extend(other.ignore_simple_path);
        self.experimental_class_strings |= other.experimental_class_strings;
        self
    }

    /// Parse a JSON object with any of the field names above.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(feature = "serde")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
