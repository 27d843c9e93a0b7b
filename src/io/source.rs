use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::Result;

/// Where documents come from: files, memory, the network.
///
/// Fetch errors are surfaced unchanged; detection never retries.
pub trait DocumentSource {
    /// Fetch the raw bytes of the document named `id`.
    fn fetch(&self, id: &str) -> Result<Vec<u8>>;
}

// --- Implementation: Local File ---

/// Reads documents from the filesystem, optionally below a base directory.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    base: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative ids against `base`.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }
}

impl DocumentSource for FileSource {
    fn fetch(&self, id: &str) -> Result<Vec<u8>> {
        let path = match &self.base {
            Some(base) => base.join(id),
            None => PathBuf::from(id),
        };
        Ok(std::fs::read(path)?)
    }
}

// --- Implementation: In-Memory ---

/// Documents held in memory, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    docs: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, id: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.docs.insert(id.into(), data.into());
        self
    }
}

impl DocumentSource for MemorySource {
    fn fetch(&self, id: &str) -> Result<Vec<u8>> {
        self.docs.get(id).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("no document `{id}`")).into()
        })
    }
}

// --- Implementation: HTTP ---

#[cfg(feature = "fetch")]
pub use http::HttpSource;

#[cfg(feature = "fetch")]
mod http {
    use super::DocumentSource;
    use crate::error::{Error, Result};

    const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1)";

    /// Blocking HTTP GET, one request per document.
    pub struct HttpSource {
        client: reqwest::blocking::Client,
    }

    impl HttpSource {
        pub fn new() -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .map_err(|source| Error::Fetch {
                    url: String::new(),
                    source,
                })?;
            Ok(Self { client })
        }
    }

    impl DocumentSource for HttpSource {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            let fetch_err = |source| Error::Fetch {
                url: url.to_string(),
                source,
            };
            let response = self
                .client
                .get(url)
                .send()
                .and_then(|r| r.error_for_status())
                .map_err(fetch_err)?;
            let body = response.bytes().map_err(fetch_err)?;
            Ok(body.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new().with_document("a", "<p>a</p>");
        assert_eq!(source.fetch("a").unwrap(), b"<p>a</p>");
        assert!(matches!(source.fetch("b"), Err(Error::Io(_))));
    }

    #[test]
    fn test_file_source_with_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "<h1>hi</h1>").unwrap();

        let source = FileSource::with_base(dir.path());
        assert_eq!(source.fetch("page.html").unwrap(), b"<h1>hi</h1>");
        assert!(matches!(source.fetch("missing.html"), Err(Error::Io(_))));
    }
}
