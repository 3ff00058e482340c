//! Модуль для работы с аудио
//!
//! Декодирование ответа сервиса синтеза в PCM, расчет громкости и
//! кодирование результата обратно в WAV или MP3.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{ProsodyError, Result};
use crate::utils::ffmpeg;

/// Декодированный аудиоклип
///
/// Семплы хранятся чередованием каналов (interleaved) в диапазоне [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    /// Создать клип из семплов
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Тишина заданной длительности
    pub fn silent(duration_ms: u64, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let frames = ms_to_frames(duration_ms, sample_rate);
        Self::new(vec![0.0; frames * channels as usize], sample_rate, channels)
    }

    /// Количество кадров (семплов на канал)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Длительность в миллисекундах, округленная как в pydub
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frames() as f64 * 1000.0 / self.sample_rate as f64).round() as u64
    }

    /// Перевод миллисекунд в номер кадра, ограниченный длиной клипа
    pub fn frame_at(&self, ms: u64) -> usize {
        ms_to_frames(ms, self.sample_rate).min(self.frames())
    }

    /// Семплы между кадрами `start` и `end`
    pub fn frame_slice(&self, start: usize, end: usize) -> &[f32] {
        let channels = self.channels as usize;
        let end = end.min(self.frames());
        let start = start.min(end);
        &self.samples[start * channels..end * channels]
    }

    /// Среднеквадратичное значение амплитуды
    pub fn rms(&self) -> f32 {
        compute_rms(&self.samples)
    }

    /// Средняя громкость в dBFS; для пустого или тихого клипа `-inf`
    pub fn dbfs(&self) -> f32 {
        amplitude_to_dbfs(self.rms())
    }
}

/// Перевод миллисекунд в кадры
pub fn ms_to_frames(ms: u64, sample_rate: u32) -> usize {
    (ms * sample_rate as u64 / 1000) as usize
}

/// Вычисляет среднеквадратичное значение (RMS) для массива семплов.
pub fn compute_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Амплитуда относительно полной шкалы в децибелы
pub fn amplitude_to_dbfs(amplitude: f32) -> f32 {
    20.0 * amplitude.log10()
}

/// Децибелы относительно полной шкалы в амплитуду
pub fn dbfs_to_amplitude(dbfs: f32) -> f32 {
    10f32.powf(dbfs / 20.0)
}

/// Формат, в котором сохраняется результат
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "format")]
pub enum AudioFormat {
    /// WAV, 32 бита с плавающей точкой
    Wav,
    /// MP3 с фиксированным битрейтом (кодируется через FFmpeg)
    Mp3 { bitrate_kbps: u32 },
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::Mp3 { bitrate_kbps: 192 }
    }
}

impl AudioFormat {
    /// Расширение файла
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 { .. } => "mp3",
        }
    }
}

fn is_wav(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE"
}

/// Расширение файла для аудио в исходном виде, по сигнатуре данных
pub fn sniff_extension(data: &[u8]) -> &'static str {
    if is_wav(data) {
        "wav"
    } else {
        "mp3"
    }
}

/// Декодирование аудиоданных в клип
///
/// WAV читается через hound, остальные форматы (MP3, AAC) - через symphonia.
pub fn decode_audio(data: &[u8]) -> Result<AudioClip> {
    if is_wav(data) {
        decode_wav(data)
    } else {
        decode_compressed(data)
    }
}

/// Декодирование WAV через hound
pub fn decode_wav(data: &[u8]) -> Result<AudioClip> {
    let reader = WavReader::new(Cursor::new(data))
        .map_err(|e| ProsodyError::Decode(format!("Invalid WAV data: {}", e)))?;

    let spec = reader.spec();
    let decode_err = |e: hound::Error| ProsodyError::Decode(format!("Failed to read WAV samples: {}", e));

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0).map_err(decode_err))
            .collect::<Result<_>>()?,
        (SampleFormat::Int, 24) => reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0).map_err(decode_err))
            .collect::<Result<_>>()?,
        (SampleFormat::Int, 32) => reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0).map_err(decode_err))
            .collect::<Result<_>>()?,
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .map(|s| s.map_err(decode_err))
            .collect::<Result<_>>()?,
        (format, bits) => {
            return Err(ProsodyError::Decode(format!(
                "Unsupported WAV format: {:?}, {} bits",
                format, bits
            )))
        }
    };

    debug!(
        "Decoded {} WAV samples ({} channels, {} Hz)",
        samples.len(),
        spec.channels,
        spec.sample_rate
    );
    Ok(AudioClip::new(samples, spec.sample_rate, spec.channels))
}

fn decode_compressed(data: &[u8]) -> Result<AudioClip> {
    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let format_opts = FormatOptions {
        enable_gapless: true,
        ..Default::default()
    };

    let probed = symphonia::default::get_probe()
        .format(&Hint::new(), mss, &format_opts, &MetadataOptions::default())
        .map_err(|e| ProsodyError::Decode(format!("Unrecognized audio format: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ProsodyError::Decode("No audio track found".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| ProsodyError::Decode(format!("Failed to create decoder: {}", e)))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut samples = Vec::new();

    while let Ok(packet) = format.next_packet() {
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;

                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(sample_buf.samples());
            }
            Err(e) => {
                // Пропускаем поврежденный пакет и продолжаем
                warn!("Skipping undecodable audio packet: {}", e);
            }
        }
    }

    decoded_clip(samples, sample_rate, channels)
}

/// Проверить результат декодирования сжатого потока
///
/// Если не удалось декодировать ни одного пакета, это ошибка: пустой клип
/// заменил бы исходное аудио тишиной.
fn decoded_clip(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<AudioClip> {
    if sample_rate == 0 || channels == 0 {
        return Err(ProsodyError::Decode(
            "Audio stream has no sample rate or channel layout".to_string(),
        ));
    }
    if samples.is_empty() {
        return Err(ProsodyError::Decode(
            "No audio packets could be decoded".to_string(),
        ));
    }

    debug!(
        "Decoded {} samples ({} channels, {} Hz)",
        samples.len(),
        channels,
        sample_rate
    );
    Ok(AudioClip::new(samples, sample_rate, channels))
}

/// Кодирование клипа в WAV (32 бита с плавающей точкой)
pub fn encode_wav(clip: &AudioClip) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: clip.channels,
        sample_rate: clip.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in &clip.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Кодирование клипа в MP3 через FFmpeg
pub fn encode_mp3(clip: &AudioClip, bitrate_kbps: u32) -> Result<Vec<u8>> {
    if !ffmpeg::check_ffmpeg_installed() {
        return Err(ProsodyError::Encode(
            "FFmpeg is not installed, MP3 output is unavailable".to_string(),
        ));
    }

    let temp_dir = tempfile::tempdir()?;
    let wav_path = temp_dir.path().join("clip.wav");
    let mp3_path = temp_dir.path().join("clip.mp3");

    std::fs::write(&wav_path, encode_wav(clip)?)?;
    ffmpeg::encode_mp3_file(&wav_path, &mp3_path, bitrate_kbps)
        .map_err(|e| ProsodyError::Encode(e.to_string()))?;

    Ok(std::fs::read(&mp3_path)?)
}

/// Кодирование клипа в заданный формат
pub fn encode_audio(clip: &AudioClip, format: AudioFormat) -> Result<Vec<u8>> {
    match format {
        AudioFormat::Wav => encode_wav(clip),
        AudioFormat::Mp3 { bitrate_kbps } => encode_mp3(clip, bitrate_kbps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(duration_ms: u64, sample_rate: u32) -> Vec<f32> {
        let frames = ms_to_frames(duration_ms, sample_rate);
        (0..frames)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 0.5
            })
            .collect()
    }

    #[test]
    fn test_duration_calculation() {
        let clip = AudioClip::new(vec![0.0; 44100], 44100, 1);
        assert_eq!(clip.duration_ms(), 1000);

        let stereo = AudioClip::new(vec![0.0; 44100], 44100, 2);
        assert_eq!(stereo.frames(), 22050);
        assert_eq!(stereo.duration_ms(), 500);
    }

    #[test]
    fn test_compute_rms() {
        let samples = vec![0.0, 0.5, -0.5, 1.0, -1.0];
        assert!((compute_rms(&samples) - 0.7071).abs() < 0.0001);
        assert_eq!(compute_rms(&[]), 0.0);
    }

    #[test]
    fn test_dbfs() {
        let full = AudioClip::new(vec![1.0, -1.0, 1.0, -1.0], 8000, 1);
        assert!(full.dbfs().abs() < 0.001);

        let half = AudioClip::new(vec![0.5; 100], 8000, 1);
        assert!((half.dbfs() + 6.0206).abs() < 0.001);

        assert!(!AudioClip::silent(100, 8000, 1).dbfs().is_finite());
        assert!((dbfs_to_amplitude(-6.0206) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_frame_slice_is_clamped() {
        let clip = AudioClip::new((0..20).map(|i| i as f32).collect(), 1000, 2);
        assert_eq!(clip.frame_slice(2, 4), &[4.0, 5.0, 6.0, 7.0]);
        assert_eq!(clip.frame_slice(8, 100).len(), 4);
        assert!(clip.frame_slice(50, 100).is_empty());
        assert_eq!(clip.frame_at(1_000_000), 10);
    }

    #[test]
    fn test_wav_encode_decode() {
        let clip = AudioClip::new(sine(100, 44100), 44100, 1);
        let bytes = encode_wav(&clip).unwrap();
        let decoded = decode_audio(&bytes).unwrap();
        assert_eq!(decoded, clip);
    }

    #[test]
    fn test_decode_16bit_stereo_wav() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for sample in [16384i16, -16384, 0, 32767] {
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }

        let clip = decode_audio(&cursor.into_inner()).unwrap();
        assert_eq!(clip.channels, 2);
        assert_eq!(clip.sample_rate, 22050);
        assert_eq!(clip.frames(), 2);
        assert_eq!(clip.samples[0], 0.5);
        assert_eq!(clip.samples[1], -0.5);
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let err = decode_audio(b"definitely not audio at all").unwrap_err();
        assert!(matches!(err, ProsodyError::Decode(_)));
    }

    #[test]
    fn test_stream_without_decoded_packets_is_decode_error() {
        let err = decoded_clip(Vec::new(), 24000, 1).unwrap_err();
        assert!(matches!(err, ProsodyError::Decode(_)));

        let err = decoded_clip(vec![0.1, 0.2], 0, 1).unwrap_err();
        assert!(matches!(err, ProsodyError::Decode(_)));

        let clip = decoded_clip(vec![0.1, 0.2], 24000, 2).unwrap();
        assert_eq!(clip.frames(), 1);
    }

    #[test]
    fn test_audio_format_extension() {
        assert_eq!(AudioFormat::default().extension(), "mp3");
        assert_eq!(AudioFormat::Wav.extension(), "wav");
    }

    #[test]
    fn test_sniff_extension() {
        let wav = encode_wav(&AudioClip::silent(10, 8000, 1)).unwrap();
        assert_eq!(sniff_extension(&wav), "wav");
        assert_eq!(sniff_extension(b"ID3\x04"), "mp3");
    }
}
