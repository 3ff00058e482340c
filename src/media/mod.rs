//! Модуль для работы с аудио после синтеза

pub mod audio;
pub mod silence;

pub use audio::{AudioClip, AudioFormat};
pub use silence::{compress_silences, SilenceClass, SilenceInterval};
