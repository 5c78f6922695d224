//! Choosing a document from the data directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

/// A candidate document and its size in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub path: PathBuf,
    pub size: u64,
}

/// Supported files directly inside `data_dir`, sorted by path.
///
/// A missing directory yields an empty list.
pub fn list_documents(data_dir: &Path) -> anyhow::Result<Vec<Listing>> {
    if !data_dir.exists() {
        warn!(data_dir = %data_dir.display(), "data directory not found");
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    for entry in fs::read_dir(data_dir)
        .with_context(|| format!("failed to read {}", data_dir.display()))?
    {
        let entry = entry?;
        let metadata = entry.metadata()?;
        let path = entry.path();
        if metadata.is_file() && docrag::is_supported(&path) {
            documents.push(Listing { path, size: metadata.len() });
        }
    }
    documents.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(documents)
}

/// `512B`, `1.5KB`, `2.0MB`.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes}B")
    } else if bytes < MB {
        format!("{:.1}KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Choice {
    Selected(usize),
    Empty,
    OutOfRange,
    NotANumber,
}

/// Interpret a 1-based selection among `count` entries.
pub fn parse_choice(input: &str, count: usize) -> Choice {
    let input = input.trim();
    if input.is_empty() {
        return Choice::Empty;
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Choice::Selected(n - 1),
        Ok(_) => Choice::OutOfRange,
        Err(_) if input.parse::<i64>().is_ok() => Choice::OutOfRange,
        Err(_) => Choice::NotANumber,
    }
}

/// List the documents in `data_dir` and prompt until one is picked.
///
/// Returns `None` when there is nothing to pick or the prompt is interrupted.
pub fn choose_document(editor: &mut DefaultEditor, data_dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let documents = list_documents(data_dir)?;
    if documents.is_empty() {
        println!("利用可能なドキュメントファイルがありません。({})", data_dir.display());
        return Ok(None);
    }

    println!("\n利用可能なドキュメントファイル:");
    for (i, doc) in documents.iter().enumerate() {
        let name = doc.path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!("  {}. {} ({})", i + 1, name, format_size(doc.size));
    }

    let prompt = format!("\nファイルを選択してください (1-{}): ", documents.len());
    loop {
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("\n処理を中断しました。");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match parse_choice(&line, documents.len()) {
            Choice::Selected(index) => return Ok(Some(documents[index].path.clone())),
            Choice::Empty => continue,
            Choice::OutOfRange => println!("1から{}の間の数字を入力してください。", documents.len()),
            Choice::NotANumber => println!("有効な数字を入力してください。"),
        }
    }
}
