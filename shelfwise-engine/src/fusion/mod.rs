//! Metadata Fusion
//!
//! Two independent estimators feed one fuser:
//! - `tag_estimator`: embedded tags → estimate
//! - `filename_parser`: relative path → estimate
//! - `metadata_fuser`: tag estimate + filename estimate → fused estimate

pub mod filename_parser;
pub mod metadata_fuser;
pub mod tag_estimator;

pub use filename_parser::{
    analyze_directory_path, analyze_file_path, decompose_filename,
    detect_directory_shape, looks_like_author, DirectoryShape, FilenamePattern, ParsedFilename,
};
pub use metadata_fuser::MetadataFuser;
pub use tag_estimator::{estimate_from_tags, tag_confidence};
