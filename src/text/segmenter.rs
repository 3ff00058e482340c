//! Модуль разбиения текста на предложения
//!
//! Разбиение чисто синтаксическое: граница предложения - это серия символов
//! `.`, `!` или `?`, за которой следует пробельный символ. Сокращения
//! ("Dr. Smith") и числа с точкой перед пробелом ("version 3. Next")
//! дают ложную границу; семантического анализа нет.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::{Matches, Regex};

lazy_static! {
    static ref SENTENCE_DELIMITER: Regex = Regex::new(r"[.!?]+\s+").unwrap();
}

/// Тип фрагмента
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Тело предложения
    Body,
    /// Терминальная пунктуация вместе с пробелами после нее
    Delimiter,
}

/// Фрагмент текста, заданный диапазоном байтов
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub range: Range<usize>,
    pub kind: SpanKind,
}

impl Span {
    /// Текст фрагмента в исходной строке
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.clone()]
    }
}

/// Ленивый итератор фрагментов
///
/// Тела и разделители чередуются; пустые тела (например, между двумя
/// соседними разделителями или в начале строки) не выдаются.
pub struct Segments<'a> {
    text: &'a str,
    delimiters: Matches<'static, 'a>,
    cursor: usize,
    pending: Option<Span>,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        if let Some(span) = self.pending.take() {
            return Some(span);
        }

        match self.delimiters.next() {
            Some(m) => {
                let delimiter = Span {
                    range: m.start()..m.end(),
                    kind: SpanKind::Delimiter,
                };
                let body = self.cursor..m.start();
                self.cursor = m.end();
                if body.is_empty() {
                    Some(delimiter)
                } else {
                    self.pending = Some(delimiter);
                    Some(Span {
                        range: body,
                        kind: SpanKind::Body,
                    })
                }
            }
            None if self.cursor < self.text.len() => {
                let body = self.cursor..self.text.len();
                self.cursor = self.text.len();
                Some(Span {
                    range: body,
                    kind: SpanKind::Body,
                })
            }
            None => None,
        }
    }
}

/// Разбить текст на чередующиеся тела предложений и разделители
///
/// Повторный вызов на той же строке дает то же разбиение.
pub fn segment(text: &str) -> Segments<'_> {
    Segments {
        text,
        delimiters: SENTENCE_DELIMITER.find_iter(text),
        cursor: 0,
        pending: None,
    }
}

/// Разбиение текста, собранное в массив фрагментов
#[derive(Debug, Clone)]
pub struct Segmentation<'a> {
    source: &'a str,
    spans: Vec<Span>,
}

impl<'a> Segmentation<'a> {
    /// Разбить текст и сохранить все фрагменты
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            spans: segment(source).collect(),
        }
    }

    /// Все фрагменты по порядку
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Текст фрагмента по индексу
    pub fn text_at(&self, index: usize) -> Option<&'a str> {
        self.spans.get(index).map(|span| span.text(self.source))
    }

    /// Количество разделителей предложений
    pub fn delimiter_count(&self) -> usize {
        self.spans
            .iter()
            .filter(|span| span.kind == SpanKind::Delimiter)
            .count()
    }

    /// Собрать строку заново, преобразуя только тела предложений
    pub fn rejoin_with<F>(&self, mut map_body: F) -> String
    where
        F: FnMut(&str) -> String,
    {
        let mut out = String::with_capacity(self.source.len());
        for span in &self.spans {
            let text = span.text(self.source);
            match span.kind {
                SpanKind::Body => out.push_str(&map_body(text)),
                SpanKind::Delimiter => out.push_str(text),
            }
        }
        out
    }
}

/// Количество разделителей предложений в тексте
pub fn count_delimiters(text: &str) -> usize {
    SENTENCE_DELIMITER.find_iter(text).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<(SpanKind, &str)> {
        segment(input).map(|s| (s.kind, s.text(input))).collect()
    }

    #[test]
    fn test_segment_basic() {
        let parts = texts("One two. Three four! Five");
        assert_eq!(
            parts,
            vec![
                (SpanKind::Body, "One two"),
                (SpanKind::Delimiter, ". "),
                (SpanKind::Body, "Three four"),
                (SpanKind::Delimiter, "! "),
                (SpanKind::Body, "Five"),
            ]
        );
    }

    #[test]
    fn test_punctuation_runs_are_one_delimiter() {
        let parts = texts("Wait... What?! Yes.");
        assert_eq!(
            parts,
            vec![
                (SpanKind::Body, "Wait"),
                (SpanKind::Delimiter, "... "),
                (SpanKind::Body, "What"),
                (SpanKind::Delimiter, "?! "),
                (SpanKind::Body, "Yes."),
            ]
        );
    }

    #[test]
    fn test_no_terminal_punctuation() {
        assert_eq!(texts("just words here"), vec![(SpanKind::Body, "just words here")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment("").next().is_none());
    }

    #[test]
    fn test_leading_delimiter_has_no_empty_body() {
        assert_eq!(
            texts("! Hi"),
            vec![(SpanKind::Delimiter, "! "), (SpanKind::Body, "Hi")]
        );
    }

    #[test]
    fn test_abbreviation_is_missegmented() {
        // Известное ограничение: сокращение дает ложную границу
        let seg = Segmentation::new("Dr. Smith spoke. Pi is 3.14 today.");
        assert_eq!(seg.delimiter_count(), 2);
        assert_eq!(seg.text_at(0), Some("Dr"));
    }

    #[test]
    fn test_segmentation_is_restartable() {
        let input = "A b. C d? E";
        let first: Vec<Span> = segment(input).collect();
        let second: Vec<Span> = segment(input).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejoin_maps_only_bodies() {
        let input = "a b. c d";
        let seg = Segmentation::new(input);
        assert_eq!(seg.rejoin_with(|body| body.to_uppercase()), "A B. C D");
        assert_eq!(seg.rejoin_with(|body| body.to_string()), input);
    }
}
