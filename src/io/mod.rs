//! Document acquisition.

mod source;

#[cfg(feature = "fetch")]
pub use source::HttpSource;
pub use source::{DocumentSource, FileSource, MemorySource};
