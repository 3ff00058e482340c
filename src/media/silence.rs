//! Модуль поиска и сжатия пауз
//!
//! Синтезатор иногда вставляет паузу средней длины (примерно 400-1100 мс)
//! там, где предложение продолжается. Настоящие границы предложений и абзацев
//! дают либо очень короткую, либо длинную паузу. Поэтому сжимаются только
//! паузы из среднего диапазона, остальные остаются без изменений.
//!
//! Поиск тишины устроен как в pydub: окно длиной `min_silence_ms` сдвигается
//! с шагом `seek_step_ms`, окно считается тихим, если его RMS не выше порога.
//! Соседние тихие окна сливаются в один интервал.

use log::{debug, info};

use crate::config::SilenceCompressionConfig;
use crate::error::Result;
use crate::media::audio::{self, AudioClip, AudioFormat};

/// Интервал тишины в миллисекундах
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilenceInterval {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl SilenceInterval {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Класс паузы по длительности
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilenceClass {
    /// Короче нижней границы: обычная пауза между словами
    Short,
    /// В пределах границ: ошибочная пауза внутри предложения
    Wrong,
    /// Длиннее верхней границы: пауза между предложениями или абзацами
    Long,
}

/// Классифицировать паузу по длительности; границы включительные
pub fn classify(duration_ms: u64, config: &SilenceCompressionConfig) -> SilenceClass {
    if duration_ms < config.lower_bound_ms {
        SilenceClass::Short
    } else if duration_ms > config.upper_bound_ms {
        SilenceClass::Long
    } else {
        SilenceClass::Wrong
    }
}

/// Порог тишины для клипа в dBFS
///
/// Средняя громкость минус запас; для тихого клипа - абсолютный порог.
pub fn silence_threshold_dbfs(clip: &AudioClip, config: &SilenceCompressionConfig) -> f32 {
    let loudness = clip.dbfs();
    if loudness.is_finite() {
        loudness - config.threshold_margin_db
    } else {
        config.fallback_threshold_dbfs
    }
}

/// Префиксные суммы квадратов семплов по кадрам
struct EnergyIndex {
    prefix: Vec<f64>,
    channels: usize,
}

impl EnergyIndex {
    fn new(clip: &AudioClip) -> Self {
        let channels = clip.channels as usize;
        let mut prefix = Vec::with_capacity(clip.frames() + 1);
        prefix.push(0.0);
        let mut total = 0.0f64;
        for frame in clip.samples.chunks_exact(channels) {
            total += frame.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>();
            prefix.push(total);
        }
        Self { prefix, channels }
    }

    fn rms(&self, start: usize, end: usize) -> f32 {
        let end = end.min(self.prefix.len() - 1);
        if end <= start {
            return 0.0;
        }
        let energy = self.prefix[end] - self.prefix[start];
        (energy / ((end - start) * self.channels) as f64).sqrt() as f32
    }
}

/// Найти все интервалы тишины не короче `min_silence_ms`
pub fn detect_silences(
    clip: &AudioClip,
    min_silence_ms: u64,
    threshold_dbfs: f32,
    seek_step_ms: u64,
) -> Vec<SilenceInterval> {
    let clip_ms = clip.duration_ms();
    if clip_ms < min_silence_ms || seek_step_ms == 0 {
        return Vec::new();
    }

    let threshold = audio::dbfs_to_amplitude(threshold_dbfs);
    let energy = EnergyIndex::new(clip);

    let last_start = clip_ms - min_silence_ms;
    let mut starts: Vec<u64> = (0..=last_start).step_by(seek_step_ms as usize).collect();
    if last_start % seek_step_ms != 0 {
        starts.push(last_start);
    }

    let silent_starts: Vec<u64> = starts
        .into_iter()
        .filter(|&start| {
            let from = clip.frame_at(start);
            let to = clip.frame_at(start + min_silence_ms);
            energy.rms(from, to) <= threshold
        })
        .collect();

    let mut intervals = Vec::new();
    let mut iter = silent_starts.into_iter();
    let Some(first) = iter.next() else {
        return intervals;
    };

    let mut range_start = first;
    let mut prev = first;
    for start in iter {
        let continuous = start == prev + seek_step_ms;
        let has_gap = start > prev + min_silence_ms;
        if !continuous && has_gap {
            intervals.push(SilenceInterval {
                start_ms: range_start,
                end_ms: prev + min_silence_ms,
            });
            range_start = start;
        }
        prev = start;
    }
    intervals.push(SilenceInterval {
        start_ms: range_start,
        end_ms: prev + min_silence_ms,
    });

    intervals
}

/// Найденная пауза вместе с ее классом
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedSilence {
    pub interval: SilenceInterval,
    pub class: SilenceClass,
}

/// Найти и классифицировать паузы клипа
pub fn analyze(clip: &AudioClip, config: &SilenceCompressionConfig) -> Vec<ClassifiedSilence> {
    let threshold = silence_threshold_dbfs(clip, config);
    debug!("Silence threshold {:.1} dBFS", threshold);

    detect_silences(clip, config.min_silence_ms, threshold, config.seek_step_ms)
        .into_iter()
        .map(|interval| ClassifiedSilence {
            interval,
            class: classify(interval.duration_ms(), config),
        })
        .collect()
}

/// Сжать ошибочные паузы клипа до `target_ms`
///
/// Короткие и длинные паузы, а также весь звук между паузами копируются
/// без изменений и в исходном порядке.
pub fn compress_clip(clip: &AudioClip, config: &SilenceCompressionConfig) -> AudioClip {
    let silences = analyze(clip, config);
    let replacement = AudioClip::silent(config.target_ms, clip.sample_rate, clip.channels);

    let mut samples = Vec::with_capacity(clip.samples.len());
    let mut last_end = 0usize;
    let mut compressed = 0usize;

    for silence in &silences {
        let start = clip.frame_at(silence.interval.start_ms);
        let end = clip.frame_at(silence.interval.end_ms);

        samples.extend_from_slice(clip.frame_slice(last_end, start));
        if silence.class == SilenceClass::Wrong {
            samples.extend_from_slice(&replacement.samples);
            compressed += 1;
        } else {
            samples.extend_from_slice(clip.frame_slice(start, end));
        }
        last_end = end;
    }
    samples.extend_from_slice(clip.frame_slice(last_end, clip.frames()));

    info!(
        "Found {} silences, compressed {} to {}ms",
        silences.len(),
        compressed,
        config.target_ms
    );

    AudioClip::new(samples, clip.sample_rate, clip.channels)
}

/// Декодировать аудио, сжать ошибочные паузы и закодировать заново
///
/// Ошибка декодирования возвращается как `ProsodyError::Decode`; вызывающий
/// код может в этом случае оставить исходное аудио.
pub fn compress_silences(
    data: &[u8],
    config: &SilenceCompressionConfig,
    format: AudioFormat,
) -> Result<Vec<u8>> {
    config.validate()?;
    let clip = audio::decode_audio(data)?;
    let compressed = compress_clip(&clip, config);
    debug!(
        "Clip duration {}ms -> {}ms",
        clip.duration_ms(),
        compressed.duration_ms()
    );
    audio::encode_audio(&compressed, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProsodyError;
    use crate::media::audio::{decode_audio, encode_wav, ms_to_frames};

    const RATE: u32 = 16000;

    /// Клип из чередующихся участков звука и тишины
    fn build_clip(parts: &[(u64, f32)], channels: u16) -> AudioClip {
        let mut samples = Vec::new();
        for &(duration_ms, level) in parts {
            let frames = ms_to_frames(duration_ms, RATE);
            for i in 0..frames {
                // Ненулевой сигнал с меняющимся знаком, чтобы тишиной были только нули
                let value = if level == 0.0 {
                    0.0
                } else if i % 2 == 0 {
                    level
                } else {
                    -level
                };
                for _ in 0..channels {
                    samples.push(value);
                }
            }
        }
        AudioClip::new(samples, RATE, channels)
    }

    /// Длины всех серий нулевых кадров в миллисекундах
    fn zero_runs_ms(clip: &AudioClip) -> Vec<u64> {
        let channels = clip.channels as usize;
        let mut runs = Vec::new();
        let mut current = 0usize;
        for frame in clip.samples.chunks_exact(channels) {
            if frame.iter().all(|&s| s == 0.0) {
                current += 1;
            } else if current > 0 {
                runs.push(current);
                current = 0;
            }
        }
        if current > 0 {
            runs.push(current);
        }
        runs.into_iter()
            .map(|frames| frames as u64 * 1000 / RATE as u64)
            .collect()
    }

    fn non_silent(clip: &AudioClip) -> Vec<f32> {
        clip.samples.iter().copied().filter(|&s| s != 0.0).collect()
    }

    #[test]
    fn test_classify_bands() {
        let config = SilenceCompressionConfig::default();
        assert_eq!(classify(399, &config), SilenceClass::Short);
        assert_eq!(classify(400, &config), SilenceClass::Wrong);
        assert_eq!(classify(1100, &config), SilenceClass::Wrong);
        assert_eq!(classify(1101, &config), SilenceClass::Long);
    }

    #[test]
    fn test_detect_silences_exact_gaps() {
        let clip = build_clip(
            &[(500, 0.5), (250, 0.0), (500, 0.5), (700, 0.0), (500, 0.5)],
            1,
        );
        let threshold = silence_threshold_dbfs(&clip, &SilenceCompressionConfig::default());
        let silences = detect_silences(&clip, 60, threshold, 10);
        assert_eq!(
            silences,
            vec![
                SilenceInterval { start_ms: 500, end_ms: 750 },
                SilenceInterval { start_ms: 1250, end_ms: 1950 },
            ]
        );
    }

    #[test]
    fn test_micro_gaps_are_not_silence() {
        let clip = build_clip(&[(300, 0.5), (50, 0.0), (300, 0.5)], 1);
        let threshold = silence_threshold_dbfs(&clip, &SilenceCompressionConfig::default());
        assert!(detect_silences(&clip, 60, threshold, 10).is_empty());
    }

    #[test]
    fn test_scenario_b() {
        let clip = build_clip(
            &[
                (500, 0.5),
                (250, 0.0),
                (500, 0.5),
                (700, 0.0),
                (500, 0.5),
                (1500, 0.0),
                (500, 0.5),
            ],
            1,
        );
        let config = SilenceCompressionConfig::with_bounds(400, 1100, 90);
        let out = compress_clip(&clip, &config);

        assert_eq!(zero_runs_ms(&out), vec![250, 90, 1500]);
        assert_eq!(out.duration_ms(), clip.duration_ms() - 700 + 90);
    }

    #[test]
    fn test_band_edges() {
        let clip = build_clip(
            &[
                (300, 0.5),
                (390, 0.0),
                (300, 0.5),
                (400, 0.0),
                (300, 0.5),
                (1100, 0.0),
                (300, 0.5),
                (1110, 0.0),
                (300, 0.5),
            ],
            1,
        );
        let out = compress_clip(&clip, &SilenceCompressionConfig::default());
        assert_eq!(zero_runs_ms(&out), vec![390, 90, 90, 1110]);
    }

    #[test]
    fn test_non_silent_audio_is_preserved_in_order() {
        let clip = build_clip(
            &[
                (200, 0.1),
                (600, 0.0),
                (300, 0.3),
                (150, 0.0),
                (250, 0.7),
                (900, 0.0),
                (100, 0.9),
            ],
            2,
        );
        let out = compress_clip(&clip, &SilenceCompressionConfig::default());
        assert_eq!(non_silent(&out), non_silent(&clip));
        assert_eq!(out.channels, 2);
        assert_eq!(zero_runs_ms(&out), vec![90, 150, 90]);
    }

    #[test]
    fn test_scenario_c_silent_only_audio() {
        let config = SilenceCompressionConfig::default();

        let in_band = AudioClip::silent(700, RATE, 1);
        let out = compress_clip(&in_band, &config);
        assert_eq!(out.duration_ms(), 90);

        let long = AudioClip::silent(2000, RATE, 1);
        assert_eq!(compress_clip(&long, &config), long);

        let short = AudioClip::silent(300, RATE, 1);
        assert_eq!(compress_clip(&short, &config), short);
    }

    #[test]
    fn test_empty_clip() {
        let empty = AudioClip::new(Vec::new(), RATE, 1);
        let out = compress_clip(&empty, &SilenceCompressionConfig::default());
        assert!(out.samples.is_empty());
    }

    #[test]
    fn test_compress_silences_wav_bytes() {
        let clip = build_clip(&[(400, 0.5), (800, 0.0), (400, 0.5)], 1);
        let bytes = encode_wav(&clip).unwrap();

        let out = compress_silences(&bytes, &SilenceCompressionConfig::default(), AudioFormat::Wav)
            .unwrap();
        let decoded = decode_audio(&out).unwrap();
        assert_eq!(zero_runs_ms(&decoded), vec![90]);
        assert_eq!(non_silent(&decoded), non_silent(&clip));
    }

    #[test]
    fn test_compress_silences_rejects_undecodable_audio() {
        let err = compress_silences(
            b"not audio",
            &SilenceCompressionConfig::default(),
            AudioFormat::Wav,
        )
        .unwrap_err();
        assert!(matches!(err, ProsodyError::Decode(_)));
    }
}
