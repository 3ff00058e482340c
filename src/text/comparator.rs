//! Модуль сравнения исходного и нормализованного текста
//!
//! Статистика используется только для ручной проверки результата
//! нормализации и не влияет на работу конвейера.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref PAUSE_PUNCTUATION: Regex = Regex::new(r"[.;,]").unwrap();
}

/// Изменение, найденное при сравнении
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextChange {
    /// Изменилось количество знаков `.`, `;`, `,`
    PunctuationCount {
        original: usize,
        normalized: usize,
        difference: i64,
    },
}

/// Результат сравнения двух текстов
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextComparison {
    pub original_length: usize,
    pub normalized_length: usize,
    pub original_words: usize,
    pub normalized_words: usize,
    pub changes: Vec<TextChange>,
}

impl TextComparison {
    /// Краткая сводка для вывода в консоль
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "Original length: {} chars, {} words",
                self.original_length, self.original_words
            ),
            format!(
                "Normalized length: {} chars, {} words",
                self.normalized_length, self.normalized_words
            ),
        ];

        for change in &self.changes {
            match change {
                TextChange::PunctuationCount {
                    original,
                    normalized,
                    difference,
                } => lines.push(format!(
                    "Punctuation count: {} -> {} ({:+})",
                    original, normalized, difference
                )),
            }
        }

        lines
    }
}

/// Сравнить исходный и нормализованный текст
///
/// Длины считаются в символах Unicode, слова - по любым пробельным символам,
/// включая неразрывный пробел.
pub fn compare_texts(original: &str, normalized: &str) -> TextComparison {
    let mut changes = Vec::new();

    if original != normalized {
        let original_punct = PAUSE_PUNCTUATION.find_iter(original).count();
        let normalized_punct = PAUSE_PUNCTUATION.find_iter(normalized).count();

        changes.push(TextChange::PunctuationCount {
            original: original_punct,
            normalized: normalized_punct,
            difference: normalized_punct as i64 - original_punct as i64,
        });
    }

    TextComparison {
        original_length: original.chars().count(),
        normalized_length: normalized.chars().count(),
        original_words: original.split_whitespace().count(),
        normalized_words: normalized.split_whitespace().count(),
        changes,
    }
}
