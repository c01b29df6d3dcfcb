//! Error types for IFC Audit.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing IFC files.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the IFC file from disk.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The STEP format is invalid or malformed.
    #[error("invalid STEP format: {message}")]
    InvalidStep { message: String },
}

/// Errors raised while evaluating element geometry.
///
/// These are never fatal: the analyses skip the element and log a warning.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The element has no `Representation` attribute.
    #[error("element #{id} has no shape representation")]
    NoRepresentation { id: u64 },

    /// The geometry library could not decode or mesh the element.
    #[error("element #{id} could not be evaluated: {message}")]
    Evaluation { id: u64, message: String },

    /// The representation produced an empty mesh.
    #[error("element #{id} has no supported geometry")]
    Empty { id: u64 },
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },
}

/// Errors that can occur when writing a BCF archive.
#[derive(Debug, Error)]
pub enum BcfError {
    /// Failed to create the archive file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write an archive entry.
    #[error("zip archive error: {source}")]
    Zip {
        #[from]
        source: zip::result::ZipError,
    },

    /// Failed to emit XML.
    #[error("XML write failed: {message}")]
    Xml { message: String },

    /// I/O failure while streaming an entry.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A component GUID is neither an IFC GlobalId nor a UUID.
    #[error(transparent)]
    Guid(#[from] GuidError),
}

/// Errors raised when converting between IFC GlobalIds and UUIDs.
#[derive(Debug, Error)]
pub enum GuidError {
    /// Input has neither 22 (IFC) nor 36 (UUID) characters.
    #[error("unknown GUID format: '{0}'")]
    UnknownFormat(String),

    /// Input contains a character outside the IFC base64 alphabet.
    #[error("invalid character '{ch}' in IFC GlobalId '{guid}'")]
    InvalidChar { guid: String, ch: char },

    /// Input is not a valid UUID.
    #[error("invalid UUID '{guid}': {source}")]
    Uuid { guid: String, source: uuid::Error },
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read configuration '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse TOML configuration: {0}")]
    Parse(String),

    /// An explicitly requested configuration file does not exist.
    #[error("missing configuration file: {0}")]
    MissingFile(PathBuf),

    /// A threshold has a value that cannot work.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Errors raised while looking for IFC model pairs in a directory.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The directory does not exist.
    #[error("directory '{0}' does not exist")]
    MissingDirectory(PathBuf),

    /// Failed to list the directory.
    #[error("failed to read directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The directory has no IFC files.
    #[error("no .ifc files found in '{0}'")]
    NoFiles(PathBuf),
}
