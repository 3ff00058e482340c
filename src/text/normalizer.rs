//! Модуль нормализации текста для TTS
//!
//! Преобразует текст расшифровки так, чтобы синтезатор делал паузы только на
//! настоящих границах предложений. Последний шаг заменяет все пробелы внутри
//! предложений неразрывными: эвристика пауз синтезатора срабатывает только на
//! обычном пробеле после терминальной пунктуации.

use lazy_static::lazy_static;
use regex::Regex;

use crate::text::locale::Locale;
use crate::text::segmenter::Segmentation;

/// Неразрывный пробел (U+00A0)
pub const NBSP: char = '\u{00A0}';

lazy_static! {
    static ref LINE_BREAKS: Regex = Regex::new(r"\r\n|\r|\n").unwrap();
    static ref SPACE_RUNS: Regex = Regex::new(r" {2,}").unwrap();
    static ref DASHES: Regex = Regex::new(r"[—–]").unwrap();
    static ref QUOTES: Regex = Regex::new(r#"["'“”‘’„‚«»]"#).unwrap();
}

/// Нормализация текста расшифровки для синтеза речи
///
/// Детерминирована и определена для любой строки. Порядок шагов важен:
/// 1. переводы строк в пробел;
/// 2. серии пробелов в один пробел, обрезка краев;
/// 3. тире в `", "`;
/// 4. маркеры локали (`". Meanwhile"` в `"; Meanwhile"`);
/// 5. вводные обороты (`". Here's"` в `"; Here's"`);
/// 6. удаление кавычек, повторное схлопывание пробелов;
/// 7. неразрывные пробелы внутри предложений.
pub fn normalize(text: &str, locale: Locale) -> String {
    let rules = locale.rules();

    let normalized = LINE_BREAKS.replace_all(text, " ");
    let normalized = SPACE_RUNS.replace_all(&normalized, " ");
    let normalized = normalized.trim();
    let normalized = DASHES.replace_all(normalized, ", ");
    let normalized = rules.apply_markers(&normalized);
    let normalized = rules.apply_lead_ins(&normalized);
    let normalized = QUOTES.replace_all(&normalized, "");
    let normalized = SPACE_RUNS.replace_all(&normalized, " ");
    let normalized = normalized.trim();

    neutralize_sentence_spaces(normalized)
}

/// Заменить обычные пробелы внутри предложений неразрывными
///
/// Разделители (`[.!?]+` с пробелами после них) остаются как есть.
pub fn neutralize_sentence_spaces(text: &str) -> String {
    Segmentation::new(text).rejoin_with(|body| body.replace(' ', &NBSP.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::segmenter::{count_delimiters, segment, SpanKind};

    const SAMPLES: &[&str] = &[
        "He said \"hello\"—then left.\n\nMeanwhile, she stayed.",
        "Markets fell.   However, bonds rallied! What next?\r\nNobody knows...",
        "Here's the news. Heres more. Dr. Smith said 3.14 is close – enough.",
        "  leading and trailing  ",
        "No terminal punctuation at all",
        "",
        "Tabs\tstay.\tHere's why: ‘quoted’ “words”.",
        "She said \"stop.\" Meanwhile he ran. \" Then\" it ended.",
        "Done. ' Meanwhile, rain.",
        "Done. ' Here's more. \" ' However, fine.",
    ];

    #[test]
    fn test_scenario_a() {
        let out = normalize(
            "He said \"hello\"—then left.\n\nMeanwhile, she stayed.",
            Locale::EnGb,
        );
        let expected = "He said hello, then left; Meanwhile, she stayed."
            .replace(' ', &NBSP.to_string());
        assert_eq!(out, expected);
        assert!(!out.contains(' '));
        assert!(!out.contains('"'));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize("", Locale::EnGb), "");
        assert_eq!(normalize("   \n ", Locale::PlPl), "");
    }

    #[test]
    fn test_sentence_boundaries_keep_regular_space() {
        let out = normalize("One two. Three four! Five six", Locale::EnGb);
        assert_eq!(
            out,
            format!("One{0}two. Three{0}four! Five{0}six", NBSP)
        );
    }

    #[test]
    fn test_no_punctuation_is_single_sentence() {
        let out = normalize("no   terminal\npunctuation — here", Locale::EnGb);
        assert_eq!(
            out,
            format!("no{0}terminal{0}punctuation{0},{0}here", NBSP)
        );
    }

    #[test]
    fn test_here_is_rewrite() {
        let out = normalize("That is all. Here's the weather.", Locale::EnGbLondon);
        assert_eq!(out, format!("That{0}is{0}all;{0}Heres{0}the{0}weather.", NBSP));
    }

    #[test]
    fn test_locale_changes_rules() {
        let text = "Prices rose. Meanwhile wages fell.";
        let english = normalize(text, Locale::EnGb);
        let polish = normalize(text, Locale::PlPl);
        assert!(english.contains(';'));
        assert!(!polish.contains(';'));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for locale in Locale::ALL {
            for sample in SAMPLES {
                let once = normalize(sample, locale);
                let twice = normalize(&once, locale);
                assert_eq!(once, twice, "not idempotent for {:?} / {}", sample, locale);
            }
        }
    }

    #[test]
    fn test_standalone_quote_before_marker() {
        let once = normalize("Done. ' Meanwhile, rain.", Locale::EnGb);
        assert_eq!(once, format!("Done;{0}Meanwhile,{0}rain.", NBSP));
        assert_eq!(normalize(&once, Locale::EnGb), once);
    }

    #[test]
    fn test_stripped_quote_leaves_single_separator() {
        let out = normalize("He said \" then left", Locale::EnGb);
        assert_eq!(out, format!("He{0}said{0}then{0}left", NBSP));
    }

    #[test]
    fn test_regular_spaces_only_in_delimiters() {
        for locale in Locale::ALL {
            for sample in SAMPLES {
                let out = normalize(sample, locale);
                for span in segment(&out) {
                    if span.kind == SpanKind::Body {
                        assert!(!span.text(&out).contains(' '), "space in body of {:?}", out);
                    }
                }
            }
        }
    }

    #[test]
    fn test_sentence_boundaries_are_preserved() {
        // Число границ после шагов 1-6 совпадает с числом границ в результате
        for sample in SAMPLES {
            let rules = Locale::EnGb.rules();
            let collapsed = LINE_BREAKS.replace_all(sample, " ");
            let collapsed = SPACE_RUNS.replace_all(&collapsed, " ");
            let collapsed = DASHES.replace_all(collapsed.trim(), ", ");
            let rewritten = rules.apply_lead_ins(&rules.apply_markers(&collapsed));
            let stripped = QUOTES.replace_all(&rewritten, "");
            let stripped = SPACE_RUNS.replace_all(&stripped, " ");
            let before = count_delimiters(stripped.trim());

            let after = count_delimiters(&normalize(sample, Locale::EnGb));
            assert_eq!(before, after, "boundary count changed for {:?}", sample);
        }
    }
}
