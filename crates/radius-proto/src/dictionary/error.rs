//! Dictionary loading errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or merging dictionary sources
///
/// All of these are fatal at startup; a dictionary is never partially loaded.
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// Dictionary file could not be read
    #[error("Cannot read dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Line does not follow the dictionary grammar
    #[error("{location}: malformed line: {reason}")]
    Malformed { location: String, reason: String },

    /// ATTRIBUTE references a data type the codec does not implement
    #[error("{location}: unknown data type '{data_type}'")]
    UnknownType { location: String, data_type: String },

    /// Attribute or block references a vendor that was never declared
    #[error("{location}: unknown vendor '{vendor}'")]
    UnknownVendor { location: String, vendor: String },

    /// VALUE references an attribute that is not defined
    #[error("{location}: VALUE for undefined attribute '{attribute}'")]
    UnknownAttribute { location: String, attribute: String },

    /// A name or code was redefined with a different meaning
    #[error("{location}: conflicting definition: {reason}")]
    Conflict { location: String, reason: String },

    /// A file includes itself, directly or indirectly
    #[error("Include cycle detected at {0}")]
    IncludeCycle(PathBuf),
}
