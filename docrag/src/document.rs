//! Data types for chunks, search results, and answers.

use serde::{Deserialize, Serialize};

/// Where a [`Chunk`] came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Path of the source document as given to the loader.
    pub source: String,
    /// Base file name of the source document.
    pub file_name: String,
    /// `"txt"` or `"pdf"`.
    pub file_type: String,
    /// Originating page, 1-indexed. Only set for PDF sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    /// Page count of the source. Only set for PDF sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
    /// Character offset of the chunk start within its page (PDF) or the whole text.
    pub offset: usize,
}

impl ChunkMetadata {
    /// Human-readable location: `3/10` for a PDF page, the character offset otherwise.
    pub fn location(&self) -> String {
        match (self.page, self.total_pages) {
            (Some(page), Some(total)) => format!("{page}/{total}"),
            (Some(page), None) => page.to_string(),
            _ => self.offset.to_string(),
        }
    }
}

/// A contiguous slice of a document's text.
///
/// `id` is the position of the chunk in document order and doubles as its
/// position in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Sequence number assigned at split time, starting at 0.
    pub id: usize,
    /// The text content of the chunk.
    pub content: String,
    /// Source and position information.
    pub metadata: ChunkMetadata,
}

/// A retrieved [`Chunk`] paired with its distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Distance to the query (lower is more similar).
    pub distance: f32,
}

/// The outcome of a question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The model's response, verbatim.
    pub text: String,
    /// Retrieved chunks, most similar first.
    pub sources: Vec<SearchResult>,
    /// The context block substituted into the prompt.
    pub context: String,
}
