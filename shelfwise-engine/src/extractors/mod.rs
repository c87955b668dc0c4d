//! Source extractors
//!
//! Adapters that read raw data from external sources. Only embedded tags are
//! read here; directory traversal belongs to the calling collaborator.

pub mod tag_reader;

pub use tag_reader::{LoftyTagReader, TagReadError, TagSnapshot, TagSource};
