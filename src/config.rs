//! Модуль конфигурации библиотеки tts-prosody
//!
//! Этот модуль содержит структуры для настройки конвейера: параметры сервиса
//! синтеза, сжатия тишины, формата результата и голосов по локалям.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProsodyError, Result};
use crate::media::audio::AudioFormat;
use crate::text::locale::Locale;
use crate::tts::RateSpec;

/// Параметры классификации и сжатия пауз
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceCompressionConfig {
    /// Нижняя граница "неправильной" паузы, мс
    pub lower_bound_ms: u64,
    /// Верхняя граница "неправильной" паузы, мс
    pub upper_bound_ms: u64,
    /// Длительность, до которой сжимается неправильная пауза, мс
    pub target_ms: u64,
    /// Минимальная длина тишины; более короткие промежутки не считаются паузой
    pub min_silence_ms: u64,
    /// Шаг сканирования, мс
    pub seek_step_ms: u64,
    /// Порог тишины ниже средней громкости клипа, дБ
    pub threshold_margin_db: f32,
    /// Абсолютный порог, если громкость клипа не вычисляется, dBFS
    pub fallback_threshold_dbfs: f32,
}

impl Default for SilenceCompressionConfig {
    fn default() -> Self {
        Self {
            lower_bound_ms: 400,
            upper_bound_ms: 1100,
            target_ms: 90,
            min_silence_ms: 60,
            seek_step_ms: 10,
            threshold_margin_db: 35.0,
            fallback_threshold_dbfs: -35.0,
        }
    }
}

impl SilenceCompressionConfig {
    /// Конфигурация с заданными границами и целевой длительностью
    pub fn with_bounds(lower_bound_ms: u64, upper_bound_ms: u64, target_ms: u64) -> Self {
        Self {
            lower_bound_ms,
            upper_bound_ms,
            target_ms,
            ..Self::default()
        }
    }

    /// Проверка согласованности параметров
    pub fn validate(&self) -> Result<()> {
        if self.lower_bound_ms > self.upper_bound_ms {
            return Err(ProsodyError::Configuration(format!(
                "Silence lower bound {}ms is above upper bound {}ms",
                self.lower_bound_ms, self.upper_bound_ms
            )));
        }
        if self.min_silence_ms == 0 || self.seek_step_ms == 0 {
            return Err(ProsodyError::Configuration(
                "min_silence_ms and seek_step_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Настройки HTTP-сервиса синтеза речи
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    /// Адрес эндпоинта синтеза (совместимого с OpenAI `/v1/audio/speech`)
    pub endpoint: String,
    /// Модель TTS
    pub model: String,
    /// Переменная окружения с API ключом
    pub api_key_env: String,
    /// Таймаут запроса в секундах
    pub timeout_secs: u64,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/audio/speech".to_string(),
            model: "tts-1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Конфигурация конвейера
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Настройки сервиса синтеза
    pub synthesizer: SynthesizerConfig,
    /// Темп речи по умолчанию
    pub rate: RateSpec,
    /// Переопределение голосов по локалям
    pub voices: HashMap<Locale, String>,
    /// Формат итогового аудио
    pub output_format: AudioFormat,
    /// Сжимать ли неправильные паузы после синтеза
    pub compress_silences: bool,
    /// Параметры сжатия пауз
    pub silence: SilenceCompressionConfig,
    /// Длина текста, после которой сервис синтеза может не справиться
    pub max_input_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            synthesizer: SynthesizerConfig::default(),
            rate: RateSpec::default(),
            voices: HashMap::new(),
            output_format: AudioFormat::default(),
            compress_silences: false,
            silence: SilenceCompressionConfig::default(),
            max_input_chars: 5000,
        }
    }
}

impl PipelineConfig {
    /// Загрузить конфигурацию из JSON файла
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProsodyError::Configuration(format!(
                "Configuration file not found: {} ({})",
                path.display(),
                e
            ))
        })?;
        let config: PipelineConfig = serde_json::from_str(&content).map_err(|e| {
            ProsodyError::Configuration(format!("Invalid JSON in {}: {}", path.display(), e))
        })?;
        config.silence.validate()?;
        Ok(config)
    }

    /// Голос для локали: переопределение из конфигурации или голос по умолчанию
    pub fn voice_for(&self, locale: Locale) -> String {
        self.voices
            .get(&locale)
            .cloned()
            .unwrap_or_else(|| locale.default_voice().to_string())
    }

    /// Применить темп речи из файла настроек голоса
    pub fn apply_voice_config(&mut self, voice_config: &VoiceConfig) -> Result<()> {
        if let Some(rate) = voice_config.edge_tts_rate() {
            self.rate = rate.parse()?;
        }
        Ok(())
    }
}

/// Файл настроек голоса (`voice_config.json`)
///
/// Из файла используется только `tts_settings.edge_tts.rate`, остальные
/// поля игнорируются.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default)]
    pub tts_settings: TtsSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsSettings {
    #[serde(default)]
    pub edge_tts: EdgeTtsSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeTtsSettings {
    #[serde(default)]
    pub rate: Option<String>,
}

impl VoiceConfig {
    /// Загрузить настройки голоса из JSON файла
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProsodyError::Configuration(format!(
                "Configuration file not found: {} ({})",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ProsodyError::Configuration(format!("Invalid JSON in {}: {}", path.display(), e))
        })
    }

    /// Темп речи из настроек
    pub fn edge_tts_rate(&self) -> Option<&str> {
        self.tts_settings.edge_tts.rate.as_deref()
    }
}
