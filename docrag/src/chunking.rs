//! Text chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`] splits by character count with configurable overlap
//! - [`RecursiveChunker`] splits at paragraph, line, sentence, and word boundaries
//!
//! Both work in `char` units, never bytes, so multi-byte text is never cut
//! inside a code point.

use std::collections::VecDeque;

/// A slice of text produced by a [`Chunker`], with its character offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    /// Character offset of the span start within the input text.
    pub offset: usize,
    /// The span text.
    pub text: String,
}

/// A strategy for splitting text into overlapping spans.
///
/// Implementations must be deterministic: the same input always yields the
/// same spans in the same order.
pub trait Chunker: Send + Sync {
    /// Split `text` into spans. Returns an empty `Vec` for empty text.
    fn split(&self, text: &str) -> Vec<TextSpan>;
}

fn check_sizes(chunk_size: usize, chunk_overlap: usize) {
    assert!(chunk_size > 0, "chunk_size must be greater than zero");
    assert!(
        chunk_overlap < chunk_size,
        "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
    );
}

/// Splits text into fixed-size windows by character count.
///
/// Window starts advance by `chunk_size - chunk_overlap` for as long as the
/// start lies inside the text, so consecutive windows share `chunk_overlap`
/// characters and the last window may be short.
///
/// # Example
///
/// ```rust
/// use docrag::{Chunker, FixedSizeChunker};
///
/// let text = "a".repeat(2500);
/// let spans = FixedSizeChunker::new(1000, 200).split(&text);
/// let starts: Vec<_> = spans.iter().map(|s| s.offset).collect();
/// assert_eq!(starts, vec![0, 800, 1600, 2400]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    /// [`RagConfig::validate`](crate::RagConfig::validate) rejects both first.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        check_sizes(chunk_size, chunk_overlap);
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn split(&self, text: &str) -> Vec<TextSpan> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let mut spans = Vec::new();
        let mut start = 0;
        let step = self.chunk_size - self.chunk_overlap;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            spans.push(TextSpan { offset: start, text: chars[start..end].iter().collect() });
            start += step;
        }

        spans
    }
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// Text is cut at the coarsest separator that yields pieces no longer than
/// `chunk_size`; pieces are then merged greedily up to `chunk_size`. When a
/// chunk is emitted, its trailing pieces (up to `chunk_overlap` characters)
/// start the next one. Separators stay attached to the preceding piece, so
/// concatenating the pieces reproduces the input.
///
/// # Example
///
/// ```rust
/// use docrag::{Chunker, RecursiveChunker};
///
/// let spans = RecursiveChunker::new(20, 0).split("First line.\n\nSecond paragraph here.");
/// assert!(spans.iter().all(|s| s.text.chars().count() <= 20));
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

const SEPARATORS: &[&str] = &["\n\n", "\n", "。", ". ", "! ", "? ", "！", "？", " "];

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    /// [`RagConfig::validate`](crate::RagConfig::validate) rejects both first.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        check_sizes(chunk_size, chunk_overlap);
        Self { chunk_size, chunk_overlap }
    }

    /// Break `text` into pieces no longer than `chunk_size`, in order.
    fn pieces<'a>(&self, text: &'a str, separators: &[&str], out: &mut Vec<&'a str>) {
        if char_len(text) <= self.chunk_size {
            if !text.is_empty() {
                out.push(text);
            }
            return;
        }

        let Some((separator, rest)) = separators.split_first() else {
            // No separator left: fall back to hard character cuts.
            let mut remaining = text;
            while !remaining.is_empty() {
                let cut = byte_index(remaining, self.chunk_size);
                out.push(&remaining[..cut]);
                remaining = &remaining[cut..];
            }
            return;
        };

        if !text.contains(separator) {
            self.pieces(text, rest, out);
            return;
        }

        for segment in split_keeping_separator(text, separator) {
            self.pieces(segment, rest, out);
        }
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the `n`th character, or `text.len()` if there are fewer.
fn byte_index(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map(|(i, _)| i).unwrap_or(text.len())
}

impl Chunker for RecursiveChunker {
    fn split(&self, text: &str) -> Vec<TextSpan> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        self.pieces(text, SEPARATORS, &mut pieces);

        // (char offset, char length, text) for each piece in the current window.
        let mut window: VecDeque<(usize, usize, &str)> = VecDeque::new();
        let mut window_len = 0;
        let mut offset = 0;
        let mut spans = Vec::new();

        for piece in pieces {
            let len = char_len(piece);
            if window_len + len > self.chunk_size && !window.is_empty() {
                spans.push(TextSpan {
                    offset: window[0].0,
                    text: window.iter().map(|(_, _, t)| *t).collect(),
                });
                // Keep trailing pieces that fit in the overlap and leave room for `piece`.
                while !window.is_empty()
                    && (window_len > self.chunk_overlap || window_len + len > self.chunk_size)
                {
                    if let Some((_, dropped, _)) = window.pop_front() {
                        window_len -= dropped;
                    }
                }
            }
            window.push_back((offset, len, piece));
            window_len += len;
            offset += len;
        }

        if !window.is_empty() {
            spans.push(TextSpan {
                offset: window[0].0,
                text: window.iter().map(|(_, _, t)| *t).collect(),
            });
        }

        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_windows_overlap_by_configured_amount() {
        let text: String = (0..2500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let spans = FixedSizeChunker::new(1000, 200).split(&text);

        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].offset, 0);
        assert_eq!(spans[0].text, text[0..1000]);
        assert_eq!(spans[1].offset, 800);
        assert_eq!(spans[1].text, text[800..1800]);
        assert_eq!(spans[2].text, text[1600..2500]);
        assert_eq!(spans[3].text, text[2400..2500]);

        for pair in spans[..3].windows(2) {
            let tail: String = pair[0].text.chars().skip(800).collect();
            let head: String = pair[1].text.chars().take(200).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn fixed_chunker_counts_characters_not_bytes() {
        let text = "日本語のテキスト".repeat(10);
        let spans = FixedSizeChunker::new(16, 4).split(&text);
        assert!(spans.iter().all(|s| s.text.chars().count() <= 16));
        assert_eq!(spans[1].offset, 12);
        let tail: String = spans[0].text.chars().skip(12).collect();
        let head: String = spans[1].text.chars().take(4).collect();
        assert_eq!(tail, head);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(FixedSizeChunker::new(10, 2).split("").is_empty());
        assert!(RecursiveChunker::new(10, 2).split("").is_empty());
    }

    #[test]
    fn recursive_prefers_paragraph_boundaries() {
        let text = "Alpha beta gamma.\n\nDelta epsilon zeta.\n\nEta theta iota.";
        let spans = RecursiveChunker::new(25, 0).split(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].text, "Alpha beta gamma.\n\n");
        assert_eq!(spans[1].text, "Delta epsilon zeta.\n\n");
        assert_eq!(spans[2].text, "Eta theta iota.");
        assert_eq!(spans[1].offset, 19);
    }

    #[test]
    fn recursive_splits_japanese_sentences() {
        let text = "これは最初の文です。これは二番目の文です。これは三番目の文です。";
        let spans = RecursiveChunker::new(12, 0).split(text);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].text, "これは最初の文です。");
        assert!(spans.iter().all(|s| s.text.chars().count() <= 12));
    }

    #[test]
    fn recursive_carries_overlap_into_next_chunk() {
        let text = "one two three four five six seven eight nine ten";
        let spans = RecursiveChunker::new(15, 6).split(text);
        assert!(spans.len() > 1);
        assert!(spans.iter().all(|s| s.text.chars().count() <= 15));
        // "three " ends the first chunk and opens the second.
        assert!(spans[0].text.ends_with("three "));
        assert!(spans[1].text.starts_with("three "));
    }

    #[test]
    #[should_panic(expected = "chunk_overlap (10) must be less than chunk_size (10)")]
    fn fixed_chunker_rejects_overlap_equal_to_size() {
        FixedSizeChunker::new(10, 10);
    }

    #[test]
    #[should_panic(expected = "chunk_overlap")]
    fn recursive_chunker_rejects_overlap_larger_than_size() {
        RecursiveChunker::new(10, 12);
    }

    #[test]
    #[should_panic(expected = "chunk_size must be greater than zero")]
    fn zero_chunk_size_is_rejected() {
        FixedSizeChunker::new(0, 0);
    }

    #[test]
    fn fixed_windows_cover_the_whole_text() {
        let text = "a".repeat(30);
        let spans = FixedSizeChunker::new(10, 9).split(&text);
        let last = spans.last().unwrap();
        assert_eq!(last.offset + last.text.chars().count(), 30);
        assert_eq!(spans.len(), 30);
    }

    #[test]
    fn recursive_hard_cuts_unbroken_text() {
        let text = "x".repeat(25);
        let spans = RecursiveChunker::new(10, 0).split(&text);
        let lens: Vec<_> = spans.iter().map(|s| s.text.len()).collect();
        assert_eq!(lens, vec![10, 10, 5]);
    }
}
