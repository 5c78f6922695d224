//! Formatting retrieved chunks into the context block of a prompt.

use crate::document::SearchResult;

/// Render search results as numbered source blocks, in the order given.
///
/// Each block starts with a header naming the ordinal (from 1), the source
/// path, the page (`page/total`) or character offset, and the distance with
/// four decimals, followed by the chunk text. Blocks are separated by a blank
/// line. The output depends only on the input.
///
/// ```rust
/// use docrag::{Chunk, ChunkMetadata, SearchResult, format_context};
///
/// let result = SearchResult {
///     chunk: Chunk {
///         id: 0,
///         content: "本文".into(),
///         metadata: ChunkMetadata {
///             source: "data/a.pdf".into(),
///             file_name: "a.pdf".into(),
///             file_type: "pdf".into(),
///             page: Some(2),
///             total_pages: Some(5),
///             offset: 0,
///         },
///     },
///     distance: 0.25,
/// };
/// assert_eq!(
///     format_context(&[result]),
///     "[ドキュメント 1] (ソース: data/a.pdf, ページ: 2/5, 距離: 0.2500)\n本文\n"
/// );
/// ```
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let metadata = &result.chunk.metadata;
            let location = if metadata.page.is_some() {
                format!("ページ: {}", metadata.location())
            } else {
                format!("位置: {}", metadata.offset)
            };
            format!(
                "[ドキュメント {}] (ソース: {}, {location}, 距離: {:.4})\n{}\n",
                i + 1,
                metadata.source,
                result.distance,
                result.chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Chunk, ChunkMetadata};

    fn result(id: usize, text: &str, distance: f32) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id,
                content: text.to_string(),
                metadata: ChunkMetadata {
                    source: "data/notes.txt".into(),
                    file_name: "notes.txt".into(),
                    file_type: "txt".into(),
                    page: None,
                    total_pages: None,
                    offset: id * 800,
                },
            },
            distance,
        }
    }

    #[test]
    fn numbers_sources_in_supplied_order() {
        let context = format_context(&[result(3, "後半", 0.1), result(0, "前半", 0.123456)]);
        assert_eq!(
            context,
            "[ドキュメント 1] (ソース: data/notes.txt, 位置: 2400, 距離: 0.1000)\n後半\n\
             \n\
             [ドキュメント 2] (ソース: data/notes.txt, 位置: 0, 距離: 0.1235)\n前半\n"
        );
    }

    #[test]
    fn empty_results_give_empty_context() {
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn formatting_is_deterministic() {
        let results = vec![result(0, "a", 0.5), result(1, "b", 0.75)];
        assert_eq!(format_context(&results), format_context(&results.clone()));
    }
}
