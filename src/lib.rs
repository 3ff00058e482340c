//! Основной файл библиотеки tts-prosody
//!
//! Библиотека управляет просодией синтезированной речи для новостных
//! расшифровок: перед синтезом текст нормализуется так, чтобы сервис не
//! делал пауз внутри предложений, а после синтеза ошибочные паузы средней
//! длины сжимаются.

pub mod config;
pub mod error;
pub mod media;
pub mod text;
pub mod tts;
pub mod utils;

use std::path::{Path, PathBuf};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

pub use crate::config::{PipelineConfig, SilenceCompressionConfig, VoiceConfig};
pub use crate::error::{ProsodyError, Result};
pub use crate::text::{compare_texts, normalize, segment, Locale, TextComparison};
pub use crate::tts::{OpenAiSynthesizer, RateSpec, SpeechSynthesizer};

use crate::media::audio;
use crate::media::silence;
use crate::text::transcript;

/// Режим запуска конвейера
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Синтез исходного текста
    Original,
    /// Синтез нормализованного текста
    Normalized,
    /// Синтез обоих вариантов и сравнение текстов
    Compare,
}

impl RunMode {
    fn variants(&self) -> &'static [TextVariant] {
        match self {
            Self::Original => &[TextVariant::Original],
            Self::Normalized => &[TextVariant::Normalized],
            Self::Compare => &[TextVariant::Original, TextVariant::Normalized],
        }
    }
}

/// Вариант текста, отправленного на синтез
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextVariant {
    Original,
    Normalized,
}

impl TextVariant {
    /// Суффикс имени выходного файла
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Normalized => "normalized",
        }
    }
}

/// Параметры одного запуска
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Каталог для результатов
    pub output_dir: PathBuf,
    /// Локаль; если не задана, определяется по пути к файлу
    pub locale: Option<Locale>,
    /// Голос вместо голоса локали
    pub voice: Option<String>,
    /// Темп речи вместо темпа из конфигурации
    pub rate: Option<RateSpec>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("test_audio"),
            locale: None,
            voice: None,
            rate: None,
        }
    }
}

/// Результат синтеза одного варианта текста
#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    pub variant: TextVariant,
    pub path: PathBuf,
    pub size_bytes: usize,
    /// Были ли сжаты паузы
    pub compressed: bool,
}

/// Отчет о запуске конвейера
#[derive(Debug, Clone)]
pub struct RunReport {
    pub locale: Locale,
    pub voice: String,
    pub rate: RateSpec,
    pub outputs: Vec<GeneratedAudio>,
    /// Сравнение текстов (только в режиме `Compare`)
    pub comparison: Option<TextComparison>,
}

/// Синтезированное аудио и признак сжатия пауз
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub data: Vec<u8>,
    pub extension: &'static str,
    pub compressed: bool,
}

/// Основная структура для работы с библиотекой
pub struct ProsodyPipeline {
    /// Конфигурация конвейера
    config: PipelineConfig,
    /// Сервис синтеза речи
    synthesizer: Box<dyn SpeechSynthesizer>,
}

impl ProsodyPipeline {
    /// Создать конвейер с заданным сервисом синтеза
    pub fn new(config: PipelineConfig, synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        Self {
            config,
            synthesizer,
        }
    }

    /// Создать конвейер с HTTP сервисом синтеза из конфигурации
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let synthesizer = OpenAiSynthesizer::from_config(&config.synthesizer)?;
        Ok(Self::new(config, Box::new(synthesizer)))
    }

    /// Текущая конфигурация
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Определить локаль: явная, по пути к файлу или `en_GB`
    pub fn resolve_locale(&self, transcript_path: &Path, requested: Option<Locale>) -> Locale {
        if let Some(locale) = requested {
            return locale;
        }
        match Locale::detect_from_path(transcript_path) {
            Some(locale) => {
                info!("Detected locale {} from path", locale);
                locale
            }
            None => {
                warn!(
                    "Could not detect locale from {}, using {}",
                    transcript_path.display(),
                    Locale::EnGb
                );
                Locale::EnGb
            }
        }
    }

    /// Синтезировать текст и, если включено, сжать ошибочные паузы
    ///
    /// Сжатие выполняется по принципу best effort: при любой ошибке на этом
    /// этапе возвращается исходное аудио от сервиса синтеза.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        rate: &RateSpec,
    ) -> Result<SynthesizedAudio> {
        let length = text.chars().count();
        if length > self.config.max_input_chars {
            warn!(
                "Text is {} characters long (limit {}), synthesis may fail or be truncated",
                length, self.config.max_input_chars
            );
        }

        let raw = self.synthesizer.synthesize(text, voice, rate).await?;
        info!("Synthesized {} bytes of audio", raw.len());

        if !self.config.compress_silences {
            let extension = audio::sniff_extension(&raw);
            return Ok(SynthesizedAudio {
                data: raw,
                extension,
                compressed: false,
            });
        }

        let format = self.config.output_format;
        match silence::compress_silences(&raw, &self.config.silence, format) {
            Ok(data) => Ok(SynthesizedAudio {
                data,
                extension: format.extension(),
                compressed: true,
            }),
            Err(e) => {
                warn!("Silence compression skipped, keeping original audio: {}", e);
                let extension = audio::sniff_extension(&raw);
                Ok(SynthesizedAudio {
                    data: raw,
                    extension,
                    compressed: false,
                })
            }
        }
    }

    /// Основной метод: прочитать расшифровку, синтезировать и сохранить аудио
    pub async fn process<P: AsRef<Path>>(
        &self,
        transcript_path: P,
        mode: RunMode,
        options: &RunOptions,
    ) -> Result<RunReport> {
        let transcript_path = transcript_path.as_ref();
        info!("Reading transcript {}", transcript_path.display());

        let original = transcript::read_transcript(transcript_path).await?;
        let locale = self.resolve_locale(transcript_path, options.locale);
        let voice = options
            .voice
            .clone()
            .unwrap_or_else(|| self.config.voice_for(locale));
        let rate = options.rate.unwrap_or(self.config.rate);
        info!("Locale {}, voice {}, rate {}", locale, voice, rate);

        let normalized = match mode {
            RunMode::Original => None,
            RunMode::Normalized | RunMode::Compare => Some(normalize(&original, locale)),
        };

        let comparison = match (&normalized, mode) {
            (Some(normalized), RunMode::Compare) => {
                let comparison = compare_texts(&original, normalized);
                for line in comparison.summary_lines() {
                    info!("{}", line);
                }
                Some(comparison)
            }
            _ => None,
        };

        tokio::fs::create_dir_all(&options.output_dir).await?;
        let stem = transcript_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("transcript");

        let mut outputs = Vec::new();
        for &variant in mode.variants() {
            let text = match (variant, &normalized) {
                (TextVariant::Normalized, Some(normalized)) => normalized.as_str(),
                _ => original.as_str(),
            };

            info!("Generating {} audio", variant.suffix());
            let audio = self.synthesize(text, &voice, &rate).await.map_err(|e| {
                error!("Speech generation failed: {}", e);
                e
            })?;

            let path = options.output_dir.join(format!(
                "{}_{}.{}",
                stem,
                variant.suffix(),
                audio.extension
            ));
            tokio::fs::write(&path, &audio.data).await?;
            info!("Saved {} ({} bytes)", path.display(), audio.data.len());

            outputs.push(GeneratedAudio {
                variant,
                path,
                size_bytes: audio.data.len(),
                compressed: audio.compressed,
            });
        }

        Ok(RunReport {
            locale,
            voice,
            rate,
            outputs,
            comparison,
        })
    }
}

/// Публичный API для удобного использования: нормализовать и озвучить файл
pub async fn generate_speech<P: AsRef<Path>, Q: AsRef<Path>>(
    transcript_path: P,
    mode: RunMode,
    output_dir: Q,
    api_key: &str,
) -> Result<RunReport> {
    let config = PipelineConfig::default();
    let synthesizer = OpenAiSynthesizer::new(&config.synthesizer, api_key)?;
    let pipeline = ProsodyPipeline::new(config, Box::new(synthesizer));

    let options = RunOptions {
        output_dir: output_dir.as_ref().to_path_buf(),
        ..RunOptions::default()
    };
    pipeline.process(transcript_path, mode, &options).await
}

/// Нормализовать текст для локали, заданной строкой
pub fn normalize_for_locale(text: &str, locale: &str) -> Result<String> {
    let locale: Locale = locale.parse()?;
    Ok(normalize(text, locale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_variants() {
        assert_eq!(RunMode::Original.variants(), &[TextVariant::Original]);
        assert_eq!(
            RunMode::Compare.variants(),
            &[TextVariant::Original, TextVariant::Normalized]
        );
    }

    #[test]
    fn test_normalize_for_unknown_locale() {
        let err = normalize_for_locale("Hello.", "xx_XX").unwrap_err();
        assert!(matches!(err, ProsodyError::Configuration(_)));
        assert!(normalize_for_locale("Hello.", "pl_PL").is_ok());
    }
}
