//! Модуль для работы с TTS
//!
//! Сервис синтеза речи для конвейера - черный ящик: на вход текст, голос и
//! темп речи, на выходе закодированное аудио.

pub mod openai;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ProsodyError, Result};

pub use openai::OpenAiSynthesizer;

lazy_static! {
    static ref RATE_PATTERN: Regex = Regex::new(r"^([+-]?)(\d{1,3})%$").unwrap();
}

/// Темп речи в виде `±N%`
///
/// `"0%"` приводится к `"+0%"`: сервис различает эти записи и принимает
/// только вторую как "без изменений".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RateSpec {
    percent: i32,
}

impl RateSpec {
    /// Темп с заданным изменением в процентах
    pub fn new(percent: i32) -> Self {
        Self { percent }
    }

    /// Изменение темпа в процентах
    pub fn percent(&self) -> i32 {
        self.percent
    }

    /// Множитель скорости для API, где темп задается числом (1.0 - без изменений)
    pub fn speed_factor(&self) -> f32 {
        (1.0 + self.percent as f32 / 100.0).clamp(0.25, 4.0)
    }
}

impl fmt::Display for RateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}%", self.percent)
    }
}

impl FromStr for RateSpec {
    type Err = ProsodyError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = RATE_PATTERN.captures(s.trim()).ok_or_else(|| {
            ProsodyError::Configuration(format!(
                "Invalid speech rate '{}': expected a value like +10% or -5%",
                s
            ))
        })?;

        let magnitude: i32 = caps[2]
            .parse()
            .map_err(|_| ProsodyError::Configuration(format!("Invalid speech rate '{}'", s)))?;
        let percent = if &caps[1] == "-" { -magnitude } else { magnitude };

        Ok(Self { percent })
    }
}

impl TryFrom<String> for RateSpec {
    type Error = ProsodyError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RateSpec> for String {
    fn from(rate: RateSpec) -> Self {
        rate.to_string()
    }
}

/// Сервис синтеза речи
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Синтезировать речь и вернуть закодированное аудио
    ///
    /// Ошибки сети и пустой ответ возвращаются как `ProsodyError::Transport`.
    async fn synthesize(&self, text: &str, voice: &str, rate: &RateSpec) -> Result<Vec<u8>>;
}

/// Текст подсказки для ошибок сети
pub fn transport_guidance() -> &'static str {
    "This might be a network connectivity issue. Check your internet connection, \
     verify the speech service is accessible, and try again in a few moments."
}
