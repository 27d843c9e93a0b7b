//! # pathsift
//!
//! Find the content-bearing parts of templated HTML pages.
//!
//! Pages generated from one template share their structure but differ in
//! the data they show. Given two or more such pages, pathsift finds the
//! element paths present in all of them whose text differs, and turns each
//! into a short, named selector.
//!
//! ## Features
//!
//! - Tolerant HTML parsing via html5ever, with charset sniffing
//! - Selectors anchored on the nearest `id` or `class`
//! - Row/cell fields folded into table descriptors named by header cells
//! - Pluggable parsers through the [`Tree`] and [`MarkupParser`] traits
//!
//! ## Quick Start
//!
//! ```
//! use pathsift::{Config, Detector};
//!
//! let a = r#"<div id="main"><h1>Welcome A</h1></div><p>(c) Shop</p>"#;
//! let b = r#"<div id="main"><h1>Welcome B</h1></div><p>(c) Shop</p>"#;
//!
//! let result = Detector::new(Config::new()).detect_strs(&[a, b]).unwrap();
//! assert_eq!(result.get("main").unwrap().to_string(), "//div[@id=\"main\"]/h1");
//! println!("{result}");
//! ```

pub mod common;
pub mod config;
pub mod dedup;
pub mod detector;
pub mod divergence;
pub mod dom;
pub mod error;
pub mod io;
pub mod path;
pub mod selector;
pub mod simplify;
pub mod table;
pub mod tree;
pub(crate) mod util;

pub use config::Config;
pub use dedup::Field;
pub use detector::{Detector, ResultSet};
pub use dom::HtmlParser;
pub use error::{Error, Result};
pub use path::PathExpr;
pub use selector::Selector;
pub use table::{Column, TableDescriptor};
pub use tree::{MarkupParser, Tree};
