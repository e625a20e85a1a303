//! Error types for hemesh.
//!
//! This module defines all error types used throughout the library.
//!
//! Errors are reserved for malformed input and I/O failures. Geometric
//! precondition failures (an illegal collapse, an impossible flip) are
//! reported through typed return values instead, and invariant violations
//! inside the kernel are assertions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh construction and I/O.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The input has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A submesh index is out of range for the input.
    #[error("submesh index {submesh} out of range ({count} submeshes)")]
    InvalidSubmesh {
        /// The requested submesh.
        submesh: usize,
        /// Number of submeshes in the input.
        count: usize,
    },

    /// A line of mesh text could not be parsed.
    #[error("parse error at line {line}: {message}")]
    ParseError {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading a mesh from a file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving a mesh to a file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}
