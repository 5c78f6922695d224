//! Error types for the `docrag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, indexing, retrieving, or answering.
#[derive(Debug, Error)]
pub enum RagError {
    /// A document, index file, or directory does not exist.
    #[error("File not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The document extension is not one of the supported formats.
    #[error("Unsupported document format '{extension}': {}", path.display())]
    UnsupportedFormat {
        /// The rejected document path.
        path: PathBuf,
        /// The extension that was found (empty if the path has none).
        extension: String,
    },

    /// Text could not be extracted from a document.
    #[error("Failed to parse {}: {message}", path.display())]
    DocumentParse {
        /// The document that failed to parse.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// Search or save was called before an index was built or loaded.
    #[error("Index has not been built; build or load an index first")]
    IndexNotBuilt,

    /// A question was asked before the pipeline was prepared.
    #[error("Pipeline is not ready; call prepare() before asking questions")]
    PipelineNotReady,

    /// The language model call failed.
    #[error("Generation failed ({provider}): {message}")]
    GenerationFailed {
        /// The language model backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector did not have the dimensionality of the index.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality of the index.
        expected: usize,
        /// The dimensionality of the offending vector.
        actual: usize,
    },

    /// A vector store was handed a different number of chunks and vectors.
    #[error("Count mismatch: {chunks} chunks but {embeddings} embeddings")]
    CountMismatch {
        /// Number of chunks supplied.
        chunks: usize,
        /// Number of embeddings supplied.
        embeddings: usize,
    },

    /// Persisted index state is unreadable or its parts disagree.
    #[error("Corrupt index at {}: {message}", path.display())]
    CorruptIndex {
        /// The file or directory holding the corrupt state.
        path: PathBuf,
        /// A description of the problem.
        message: String,
    },

    /// A filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagError {
    /// Wrap an I/O error, turning `ErrorKind::NotFound` into [`RagError::NotFound`].
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            RagError::NotFound { path }
        } else {
            RagError::Io { path, source }
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err = RagError::io(
            "missing.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, RagError::NotFound { ref path } if path == &PathBuf::from("missing.txt")));
    }

    #[test]
    fn other_io_errors_keep_their_source() {
        let err = RagError::io(
            "models/doc_index",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, RagError::Io { .. }));
        assert!(err.to_string().contains("denied"));
    }
}
