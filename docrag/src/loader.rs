//! Document loading: format detection, text extraction, and chunking.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
use crate::config::{ChunkingStrategy, RagConfig};
use crate::document::{Chunk, ChunkMetadata};
use crate::error::{RagError, Result};

/// A document format the loader can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// UTF-8 plain text (`.txt`).
    Text,
    /// PDF (`.pdf`).
    Pdf,
}

impl DocumentFormat {
    /// Detect the format from the path's extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// The `file_type` recorded in chunk metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Pdf => "pdf",
        }
    }
}

/// Extensions accepted by [`DocumentLoader`], with leading dots.
pub fn supported_extensions() -> &'static [&'static str] {
    &[".txt", ".pdf"]
}

/// Returns true if the path has a supported extension.
pub fn is_supported(path: &Path) -> bool {
    DocumentFormat::from_path(path).is_some()
}

/// Reads a document and splits it into ordered [`Chunk`]s.
///
/// PDF pages are split independently, so no chunk spans two pages. Chunk ids
/// run continuously across pages in document order.
#[derive(Clone)]
pub struct DocumentLoader {
    chunker: Arc<dyn Chunker>,
}

impl std::fmt::Debug for DocumentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentLoader").finish_non_exhaustive()
    }
}

impl DocumentLoader {
    /// Create a loader using the given chunker.
    pub fn new(chunker: Arc<dyn Chunker>) -> Self {
        Self { chunker }
    }

    /// Create a loader whose chunker follows the config's strategy and sizes.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the config fails [`RagConfig::validate`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        config.validate()?;
        let chunker: Arc<dyn Chunker> = match config.chunking {
            ChunkingStrategy::Fixed => {
                Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap))
            }
            ChunkingStrategy::Recursive => {
                Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap))
            }
        };
        Ok(Self::new(chunker))
    }

    /// Load `path` and split it into chunks.
    ///
    /// # Errors
    ///
    /// - [`RagError::NotFound`] if the path does not exist
    /// - [`RagError::UnsupportedFormat`] if the extension is not `.txt` or `.pdf`
    /// - [`RagError::Io`] if the file cannot be read or is not valid UTF-8
    /// - [`RagError::DocumentParse`] if PDF text extraction fails
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<Chunk>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RagError::NotFound { path: path.to_path_buf() });
        }
        let format = DocumentFormat::from_path(path).ok_or_else(|| RagError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
        })?;

        debug!(path = %path.display(), format = format.as_str(), "loading document");
        let chunks = match format {
            DocumentFormat::Text => {
                let text = std::fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
                self.split_text(path, &text)
            }
            DocumentFormat::Pdf => {
                let pages = extract_pdf_pages(path)?;
                self.split_pages(path, &pages)
            }
        };

        info!(path = %path.display(), chunk_count = chunks.len(), "document split into chunks");
        Ok(chunks)
    }

    /// Split plain text read from `path`.
    pub fn split_text(&self, path: &Path, text: &str) -> Vec<Chunk> {
        let base = base_metadata(path, DocumentFormat::Text);
        self.chunker
            .split(text)
            .into_iter()
            .enumerate()
            .map(|(id, span)| Chunk {
                id,
                content: span.text,
                metadata: ChunkMetadata { offset: span.offset, ..base.clone() },
            })
            .collect()
    }

    /// Split PDF page texts read from `path`; `pages[0]` is page 1.
    pub fn split_pages(&self, path: &Path, pages: &[String]) -> Vec<Chunk> {
        let base = base_metadata(path, DocumentFormat::Pdf);
        let total_pages = pages.len();
        let mut chunks = Vec::new();

        for (index, page_text) in pages.iter().enumerate() {
            for span in self.chunker.split(page_text) {
                chunks.push(Chunk {
                    id: chunks.len(),
                    content: span.text,
                    metadata: ChunkMetadata {
                        page: Some(index + 1),
                        total_pages: Some(total_pages),
                        offset: span.offset,
                        ..base.clone()
                    },
                });
            }
        }

        chunks
    }
}

fn base_metadata(path: &Path, format: DocumentFormat) -> ChunkMetadata {
    ChunkMetadata {
        source: path.to_string_lossy().into_owned(),
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string()),
        file_type: format.as_str().to_string(),
        page: None,
        total_pages: None,
        offset: 0,
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf_pages(path: &Path) -> Result<Vec<String>> {
    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| RagError::DocumentParse {
        path: PathBuf::from(path),
        message: e.to_string(),
    })?;
    let total_chars: usize = pages.iter().map(|p| p.chars().count()).sum();
    info!(path = %path.display(), page_count = pages.len(), total_chars, "extracted PDF text");
    Ok(pages)
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf_pages(path: &Path) -> Result<Vec<String>> {
    Err(RagError::DocumentParse {
        path: PathBuf::from(path),
        message: "PDF support not enabled. Compile with --features pdf".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> DocumentLoader {
        DocumentLoader::new(Arc::new(FixedSizeChunker::new(10, 2)))
    }

    #[test]
    fn format_detection_ignores_case() {
        assert_eq!(DocumentFormat::from_path(Path::new("a/B.TXT")), Some(DocumentFormat::Text));
        assert_eq!(DocumentFormat::from_path(Path::new("report.Pdf")), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_path(Path::new("notes.md")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("README")), None);
        assert!(is_supported(Path::new("x.pdf")));
    }

    #[test]
    fn from_config_rejects_overlap_not_below_size() {
        let mut config = RagConfig::default();
        config.chunk_overlap = config.chunk_size;
        let err = DocumentLoader::from_config(&config).unwrap_err();
        assert!(matches!(err, RagError::Config(msg) if msg.contains("chunk_overlap")));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = loader().load("missing.txt").unwrap_err();
        assert!(matches!(err, RagError::NotFound { .. }));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("notes.md");
        std::fs::write(&path, "# notes").unwrap();

        let err = loader().load(&path).unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFormat { ref extension, .. } if extension == ".md"));
    }

    #[test]
    fn text_chunks_carry_offsets_and_source() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("Guide.TXT");
        std::fs::write(&path, "abcdefghijklmnopqrstuvwxyz").unwrap();

        let chunks = loader().load(&path).unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(chunks[1].metadata.offset, 8);
        assert_eq!(chunks[1].content, "ijklmnopqr");
        assert_eq!(chunks[0].metadata.file_name, "Guide.TXT");
        assert_eq!(chunks[0].metadata.file_type, "txt");
        assert_eq!(chunks[0].metadata.page, None);
    }

    #[test]
    fn pages_are_split_independently_with_continuous_ids() {
        let pages = vec!["first page text".to_string(), String::new(), "third".to_string()];
        let chunks = loader().split_pages(Path::new("doc.pdf"), &pages);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(chunks[0].metadata.page, Some(1));
        assert_eq!(chunks[1].metadata.page, Some(1));
        assert_eq!(chunks[2].metadata.page, Some(3));
        assert_eq!(chunks[2].metadata.offset, 0);
        assert!(chunks.iter().all(|c| c.metadata.total_pages == Some(3)));
        assert_eq!(chunks[2].metadata.location(), "3/3");
    }
}
