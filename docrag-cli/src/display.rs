//! Console rendering of answers.

use std::fmt::Write;

use docrag::{Answer, SearchResult};

const RULE: &str = "----------------------------------------";

/// The answer text followed by its numbered sources.
pub fn render_answer(answer: &Answer) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n回答:");
    let _ = writeln!(out, "{}", answer.text.trim_end());

    if answer.sources.is_empty() {
        let _ = writeln!(out, "\n参照元: なし");
        return out;
    }

    let _ = writeln!(out, "\n参照元:");
    for (i, source) in answer.sources.iter().enumerate() {
        if i > 0 {
            let _ = writeln!(out, "{RULE}");
        }
        render_source(&mut out, i + 1, source);
    }
    out
}

fn render_source(out: &mut String, number: usize, source: &SearchResult) {
    let metadata = &source.chunk.metadata;
    let _ = writeln!(out, "--- ソース {number} ---");
    let _ = writeln!(out, "  ファイル: {}", metadata.file_name);
    let _ = writeln!(out, "  パス: {}", metadata.source);
    if metadata.page.is_some() {
        let _ = writeln!(out, "  ページ: {}", metadata.location());
    } else {
        let _ = writeln!(out, "  位置: {}", metadata.location());
    }
    let _ = writeln!(out, "  距離: {:.4}", source.distance);
}
