//! Модуль чтения файлов расшифровок
//!
//! Файл начинается с блока служебных строк (пустые строки и строки с
//! фиксированными префиксами), после которого идет сам текст.

use std::path::Path;

use crate::error::{ProsodyError, Result};

/// Префиксы служебных строк заголовка
pub const HEADER_PREFIXES: &[&str] = &["GITHUB", "=", "Generated", "AI", "Type"];

fn is_header_line(line: &str) -> bool {
    line.trim().is_empty() || HEADER_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// Извлечь текст расшифровки, пропустив заголовок
pub fn extract_transcript_text(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let start = lines
        .iter()
        .position(|line| !is_header_line(line))
        .unwrap_or(0);

    lines[start..].join("\n").trim().to_string()
}

/// Прочитать файл расшифровки и извлечь текст
pub async fn read_transcript<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    if tokio::fs::metadata(path).await.is_err() {
        return Err(ProsodyError::FileNotFound(format!(
            "Transcript file not found: {}",
            path.display()
        )));
    }

    let content = tokio::fs::read_to_string(path).await?;
    Ok(extract_transcript_text(&content))
}
