//! sift — normalizes RSS and Atom feeds into one canonical schema.
//!
//! Feed XML is parsed into a deliberately loose tree (a child may appear
//! as a bare value, a single-key wrapper, or a list of either), then a
//! dialect-aware transformer reduces that tree to a canonical [`Feed`]
//! with ordered entries, regardless of whether the source spoke RSS or
//! Atom.
//!
//! # Pipeline
//!
//! ```text
//! raw text → tree::xml::parse_xml → feed::normalize → Feed
//! ```
//!
//! The engine is purely computational: fetching bytes is a separate
//! collaborator in [`fetch`], and configuration is an explicit value
//! threaded through every call rather than process-global state.
//!
//! # Example
//!
//! ```
//! use sift::config::{ParserConfig, ReaderConfig};
//! use sift::feed::parse_and_normalize;
//!
//! let xml = r#"<rss version="2.0"><channel>
//!     <title>Example</title>
//!     <item><title>First post</title><description>Hello</description></item>
//! </channel></rss>"#;
//!
//! let feed = parse_and_normalize(xml, &ParserConfig::default(), &ReaderConfig::default())?;
//! assert_eq!(feed.title, "Example");
//! assert_eq!(feed.entries[0].description, "Hello");
//! # Ok::<(), sift::feed::NormalizeError>(())
//! ```

pub mod config;
pub mod feed;
pub mod fetch;
pub mod tree;

pub use config::{Config, FetchConfig, ParserConfig, ReaderConfig};
pub use feed::{normalize, parse_and_normalize, Entry, Feed, NormalizeError};
pub use fetch::{fetch_feed, FetchError, FetchedFeed};
