//! Модуль для работы с FFmpeg
//!
//! FFmpeg нужен только для кодирования MP3: декодирование выполняется
//! средствами symphonia и hound.

use std::path::Path;
use std::process::Command;

use crate::error::{ProsodyError, Result};

/// Проверка наличия FFmpeg
pub fn check_ffmpeg_installed() -> bool {
    match Command::new("ffmpeg").arg("-version").output() {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// Запуск команды FFmpeg
pub fn run_ffmpeg_command(args: &[&str]) -> Result<()> {
    log::debug!("Running ffmpeg {}", args.join(" "));
    let output = Command::new("ffmpeg")
        .args(args)
        .output()
        .map_err(|e| ProsodyError::Ffmpeg(format!("Failed to start ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let last_line = stderr.lines().last().unwrap_or("");
        return Err(ProsodyError::Ffmpeg(format!(
            "FFmpeg command failed with status {}: {}",
            output.status, last_line
        )));
    }

    Ok(())
}

/// Кодирование WAV-файла в MP3 с фиксированным битрейтом
pub fn encode_mp3_file(input: &Path, output: &Path, bitrate_kbps: u32) -> Result<()> {
    let input = path_str(input)?;
    let output = path_str(output)?;
    let bitrate = format!("{}k", bitrate_kbps);

    run_ffmpeg_command(&[
        "-y",
        "-loglevel", "error",
        "-i", input,
        "-codec:a", "libmp3lame",
        "-b:a", &bitrate,
        output,
    ])
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        ProsodyError::Ffmpeg(format!("Path is not valid UTF-8: {}", path.display()))
    })
}
