//! Article loading.
//!
//! Articles come as a JSON array of `{"title", "content"}` objects, as
//! JSONL (one object per line), or as a single raw markup file titled
//! after its file stem.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading articles.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid JSONL at line {line}: {message}")]
    JsonlError { line: usize, message: String },
}

/// One article to process: a title and its raw markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub content: String,
}

/// How the articles of an input are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// A JSON array of articles
    Json,
    /// One JSON article per line
    JsonLines,
    /// The whole input is one article's markup
    Markup,
}

impl InputFormat {
    /// Picks the format from a file extension: `.json`, `.jsonl`, anything else is markup.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") => InputFormat::JsonLines,
            _ => InputFormat::Markup,
        }
    }
}

/// Loads the articles of a file, choosing the format by extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its JSON is invalid.
pub fn load_articles(path: &Path) -> Result<Vec<Article>, InputError> {
    let content = fs::read_to_string(path)?;
    let title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_articles(&content, InputFormat::from_path(path), &title)
}

/// Parses articles from already-read content. `title` names the article
/// when the content is raw markup.
pub fn parse_articles(
    content: &str,
    format: InputFormat,
    title: &str,
) -> Result<Vec<Article>, InputError> {
    match format {
        InputFormat::Markup => Ok(vec![Article {
            title: title.to_string(),
            content: content.to_string(),
        }]),
        InputFormat::Json if content.trim().is_empty() => Ok(Vec::new()),
        InputFormat::Json => Ok(serde_json::from_str(content)?),
        InputFormat::JsonLines => parse_json_lines(content),
    }
}

fn parse_json_lines(content: &str) -> Result<Vec<Article>, InputError> {
    let mut articles = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Article>(line) {
            Ok(article) => articles.push(article),
            Err(e) => {
                return Err(InputError::JsonlError {
                    line: line_num + 1,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(articles)
}
