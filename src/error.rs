//! Модуль обработки ошибок библиотеки tts-prosody
//!
//! Этот модуль содержит типы ошибок, которые могут возникнуть при работе конвейера.

use thiserror::Error;

/// Ошибки библиотеки tts-prosody
#[derive(Debug, Error)]
pub enum ProsodyError {
    /// Ошибка HTTP запроса
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка WAV-кодирования
    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),

    /// Ошибка конфигурации: неизвестная локаль, нет голоса, неверный темп речи
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Сервис синтеза недоступен или не вернул аудио
    #[error("Transport error: {0}")]
    Transport(String),

    /// Аудио от сервиса синтеза не удалось декодировать
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Ошибка кодирования результата
    #[error("Audio encode error: {0}")]
    Encode(String),

    /// Ошибка запуска FFmpeg
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// Файл не найден
    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// Тип Result для библиотеки tts-prosody
pub type Result<T> = std::result::Result<T, ProsodyError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn read_missing() -> Result<Vec<u8>> {
        Ok(std::fs::read("/no/such/audio.mp3")?)
    }

    #[test]
    fn test_io_error_converts() {
        assert!(matches!(read_missing(), Err(ProsodyError::Io(_))));
    }

    #[test]
    fn test_error_messages() {
        let err = ProsodyError::Transport("no audio".to_string());
        assert_eq!(err.to_string(), "Transport error: no audio");
        let err = ProsodyError::Decode("bad frame".to_string());
        assert_eq!(err.to_string(), "Audio decode error: bad frame");
    }
}
