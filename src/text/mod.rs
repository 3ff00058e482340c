//! Модуль подготовки текста для TTS
//!
//! Этот модуль содержит нормализацию текста, разбиение на предложения,
//! правила локалей и чтение файлов расшифровок.

pub mod comparator;
pub mod locale;
pub mod normalizer;
pub mod segmenter;
pub mod transcript;

pub use comparator::{compare_texts, TextComparison};
pub use locale::Locale;
pub use normalizer::normalize;
pub use segmenter::segment;
