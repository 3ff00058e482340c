//! Модуль локалей и правил пунктуации
//!
//! Для каждой локали хранится упорядоченный список правил вида
//! (маркер, сила соединения). Маркер, стоящий после точки, превращает
//! границу предложения в `"; "` или `", "`, чтобы синтезатор не делал
//! полную паузу перед словом, которое продолжает мысль.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{ProsodyError, Result};

/// Идентификатор локали (язык, регион или персона диктора)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "en_GB")]
    EnGb,
    #[serde(rename = "en_GB_LON")]
    EnGbLondon,
    #[serde(rename = "en_GB_LIV")]
    EnGbLiverpool,
    #[serde(rename = "pl_PL")]
    PlPl,
    #[serde(rename = "bella")]
    Bella,
    #[serde(rename = "fr_FR")]
    FrFr,
    #[serde(rename = "de_DE")]
    DeDe,
    #[serde(rename = "es_ES")]
    EsEs,
    #[serde(rename = "it_IT")]
    ItIt,
    #[serde(rename = "nl_NL")]
    NlNl,
}

impl Default for Locale {
    fn default() -> Self {
        Self::EnGb
    }
}

impl Locale {
    /// Все поддерживаемые локали
    pub const ALL: [Locale; 10] = [
        Locale::EnGb,
        Locale::EnGbLondon,
        Locale::EnGbLiverpool,
        Locale::PlPl,
        Locale::Bella,
        Locale::FrFr,
        Locale::DeDe,
        Locale::EsEs,
        Locale::ItIt,
        Locale::NlNl,
    ];

    /// Получить строковое представление локали
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnGb => "en_GB",
            Self::EnGbLondon => "en_GB_LON",
            Self::EnGbLiverpool => "en_GB_LIV",
            Self::PlPl => "pl_PL",
            Self::Bella => "bella",
            Self::FrFr => "fr_FR",
            Self::DeDe => "de_DE",
            Self::EsEs => "es_ES",
            Self::ItIt => "it_IT",
            Self::NlNl => "nl_NL",
        }
    }

    /// Голос синтеза по умолчанию для локали
    ///
    /// Имена голосов HTTP сервиса синтеза (`/v1/audio/speech`); голоса
    /// многоязычные, поэтому локаль выбирает только тембр диктора.
    pub fn default_voice(&self) -> &'static str {
        match self {
            Self::EnGb | Self::EsEs => "nova",
            Self::EnGbLondon | Self::FrFr => "shimmer",
            Self::EnGbLiverpool => "onyx",
            Self::Bella => "fable",
            Self::PlPl | Self::ItIt => "alloy",
            Self::DeDe | Self::NlNl => "echo",
        }
    }

    /// Набор правил пунктуации для локали
    pub fn rules(&self) -> &'static RuleSet {
        // Таблица строится из LOCALE_RULE_DATA, где перечислены все варианты Locale
        &RULE_SETS[self]
    }

    /// Определить локаль по компоненту пути вида `/en_GB/`
    ///
    /// Возвращает `None`, если ни один компонент пути не совпадает с локалью.
    pub fn detect_from_path<P: AsRef<Path>>(path: P) -> Option<Locale> {
        path.as_ref()
            .parent()
            .into_iter()
            .flat_map(|dir| dir.components())
            .filter_map(|component| component.as_os_str().to_str())
            .find_map(|name| name.parse::<Locale>().ok())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = ProsodyError;

    fn from_str(s: &str) -> Result<Self> {
        Locale::ALL
            .iter()
            .copied()
            .find(|locale| locale.as_str() == s)
            .ok_or_else(|| {
                ProsodyError::Configuration(format!(
                    "No punctuation rules configured for locale '{}'",
                    s
                ))
            })
    }
}

/// Сила соединения двух предложений
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStrength {
    /// `"; "` - заметная, но короткая пауза
    Semicolon,
    /// `", "` - самая мягкая пауза
    Comma,
}

impl JoinStrength {
    /// Разделитель, который заменяет `". "`
    pub fn separator(&self) -> &'static str {
        match self {
            Self::Semicolon => "; ",
            Self::Comma => ", ",
        }
    }
}

/// Правило замены границы предложения перед маркером
#[derive(Debug, Clone)]
pub struct MarkerRule {
    pattern: Regex,
    join: JoinStrength,
    lowercase_marker: bool,
}

impl MarkerRule {
    /// Создать правило из регулярного выражения маркера
    ///
    /// Маркер сопоставляется без учета регистра и только целым словом.
    /// Между точкой и маркером допускается любая смесь кавычек и пробелов,
    /// если в ней есть хотя бы один пробельный символ: кавычки позже
    /// удаляются, и такая же граница иначе появилась бы при повторном вызове.
    pub fn new(marker: &str, join: JoinStrength, lowercase_marker: bool) -> Result<Self> {
        let source = format!(
            r#"(?i)\.["'“”‘’„‚«»]*\s["'“”‘’„‚«»\s]*((?:{})\b)"#,
            marker
        );
        let pattern = Regex::new(&source).map_err(|e| {
            ProsodyError::Configuration(format!("Invalid marker pattern '{}': {}", marker, e))
        })?;

        Ok(Self {
            pattern,
            join,
            lowercase_marker,
        })
    }

    /// Сила соединения правила
    pub fn join(&self) -> JoinStrength {
        self.join
    }

    /// Применить правило ко всему тексту
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| {
                let marker = &caps[1];
                if self.lowercase_marker {
                    format!("{}{}", self.join.separator(), lowercase_first(marker))
                } else {
                    format!("{}{}", self.join.separator(), marker)
                }
            })
            .into_owned()
    }
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Упорядоченный набор правил одной локали
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    /// Маркеры переходов между темами ("Meanwhile", "Turning to")
    pub markers: Vec<MarkerRule>,
    /// Вводные обороты вида "Here's"
    pub lead_ins: Vec<MarkerRule>,
}

impl RuleSet {
    /// Применить маркеры, затем вводные обороты
    pub fn apply_markers(&self, text: &str) -> String {
        self.markers
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }

    /// Применить только вводные обороты
    pub fn apply_lead_ins(&self, text: &str) -> String {
        self.lead_ins
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }
}

use JoinStrength::{Comma, Semicolon};

/// (маркер, сила соединения, писать маркер со строчной буквы)
type RuleData = &'static [(&'static str, JoinStrength, bool)];

const ENGLISH_NEWS: RuleData = &[
    (
        r"In (?:politics|economy|health|international|climate|technology|crime) news",
        Semicolon,
        true,
    ),
    (r"Meanwhile|Additionally|Furthermore|However", Semicolon, false),
];

const ENGLISH_LEAD_INS: RuleData = &[(r"Here['’]?s", Semicolon, false)];

const LOCALE_RULE_DATA: &[(Locale, RuleData, RuleData)] = &[
    (Locale::EnGb, ENGLISH_NEWS, ENGLISH_LEAD_INS),
    (Locale::EnGbLondon, ENGLISH_NEWS, ENGLISH_LEAD_INS),
    (Locale::EnGbLiverpool, ENGLISH_NEWS, ENGLISH_LEAD_INS),
    (
        Locale::Bella,
        &[
            (
                r"Turning to|On the|Meanwhile|For banking|For those|From a|Looking at",
                Semicolon,
                false,
            ),
            (
                r"The|This|These|When|Understanding|From a banking|For your",
                Comma,
                false,
            ),
        ],
        ENGLISH_LEAD_INS,
    ),
    (
        Locale::PlPl,
        &[
            (
                r"W wiadomościach (?:polityka|ekonomia|zdrowie|międzynarodowe|klimat|technologia|przestępczość) dzisiaj",
                Semicolon,
                true,
            ),
            (r"Tymczasem|Dodatkowo|Ponadto|Jednakże", Semicolon, false),
        ],
        &[(r"Oto", Semicolon, false), (r"Here['’]?s", Semicolon, false)],
    ),
    (
        Locale::FrFr,
        &[(
            r"Pendant ce temps|Par ailleurs|De plus|En outre|Cependant",
            Semicolon,
            false,
        )],
        &[(r"Voici", Semicolon, false), (r"Here['’]?s", Semicolon, false)],
    ),
    (
        Locale::DeDe,
        &[(
            r"Unterdessen|Außerdem|Darüber hinaus|Zudem|Jedoch",
            Semicolon,
            false,
        )],
        &[(r"Hier (?:ist|sind)", Semicolon, false), (r"Here['’]?s", Semicolon, false)],
    ),
    (
        Locale::EsEs,
        &[(
            r"Mientras tanto|Además|Asimismo|Sin embargo",
            Semicolon,
            false,
        )],
        &[(r"Aquí (?:está|están)", Semicolon, false), (r"Here['’]?s", Semicolon, false)],
    ),
    (
        Locale::ItIt,
        &[(r"Nel frattempo|Inoltre|Per di più|Tuttavia", Semicolon, false)],
        &[(r"Ecco", Semicolon, false), (r"Here['’]?s", Semicolon, false)],
    ),
    (
        Locale::NlNl,
        &[(r"Ondertussen|Bovendien|Daarnaast|Echter", Semicolon, false)],
        &[(r"Hier (?:is|zijn)", Semicolon, false), (r"Here['’]?s", Semicolon, false)],
    ),
];

fn compile(data: RuleData) -> Result<Vec<MarkerRule>> {
    data.iter()
        .map(|(marker, join, lowercase)| MarkerRule::new(marker, *join, *lowercase))
        .collect()
}

/// Собрать таблицу правил для всех локалей
///
/// Возвращает ошибку конфигурации, если какое-либо правило не компилируется
/// или для локали нет набора правил.
pub fn build_rule_sets() -> Result<HashMap<Locale, RuleSet>> {
    let mut sets = HashMap::new();
    for (locale, markers, lead_ins) in LOCALE_RULE_DATA {
        sets.insert(
            *locale,
            RuleSet {
                markers: compile(markers)?,
                lead_ins: compile(lead_ins)?,
            },
        );
    }

    if let Some(missing) = Locale::ALL.iter().find(|l| !sets.contains_key(l)) {
        return Err(ProsodyError::Configuration(format!(
            "Locale '{}' has no punctuation rule set",
            missing
        )));
    }

    Ok(sets)
}

lazy_static! {
    static ref RULE_SETS: HashMap<Locale, RuleSet> = match build_rule_sets() {
        Ok(sets) => sets,
        // Таблица статическая: ошибка здесь означает опечатку в LOCALE_RULE_DATA
        Err(e) => panic!("Invalid built-in locale rules: {}", e),
    };
}
