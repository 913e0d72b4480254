//! # Speech Input Module
//!
//! The speech-to-text model is an external collaborator consumed through a
//! narrow contract; this module defines that contract plus the input
//! validation that runs before any audio enters the pipeline. Validation
//! rejects unsupported containers and oversized recordings outright — no
//! partial processing of bad input.

use std::fs::File;
use std::io::{BufReader, Read};

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};
use unic_langid::LanguageIdentifier;

use crate::recognition_config::AudioConfig;
use crate::recognition_errors::RecognitionError;

/// Bytes needed to identify every supported container.
const FORMAT_SNIFF_BYTES: usize = 12;

/// Contract for the external speech-to-text model.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe raw audio into text. The language hint selects the
    /// recognition model variant; it is not a guarantee about the content.
    async fn transcribe(&self, audio: &[u8], language: &LanguageIdentifier) -> Result<String>;

    /// Report readiness without transcribing.
    fn is_available(&self) -> bool;

    /// Load model weights into memory. Called once at process startup,
    /// outside request handling.
    async fn load_model(&self) -> Result<()>;
}

/// Audio containers accepted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
    Flac,
    M4a,
}

impl AudioFormat {
    /// Identify the container from its leading magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < FORMAT_SNIFF_BYTES {
            return None;
        }
        if &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
            return Some(AudioFormat::Wav);
        }
        if &bytes[0..4] == b"OggS" {
            return Some(AudioFormat::Ogg);
        }
        if &bytes[0..4] == b"fLaC" {
            return Some(AudioFormat::Flac);
        }
        if &bytes[4..8] == b"ftyp" {
            return Some(AudioFormat::M4a);
        }
        // MP3: ID3 tag or a bare frame sync.
        if &bytes[0..3] == b"ID3" || (bytes[0] == 0xFF && (bytes[1] & 0xE0) == 0xE0) {
            return Some(AudioFormat::Mp3);
        }
        None
    }

    fn size_cap(self, config: &AudioConfig) -> u64 {
        match self {
            AudioFormat::Wav => config.size_limits.wav_max,
            AudioFormat::Mp3 => config.size_limits.mp3_max,
            AudioFormat::Ogg => config.size_limits.ogg_max,
            AudioFormat::Flac => config.size_limits.flac_max,
            AudioFormat::M4a => config.size_limits.m4a_max,
        }
    }
}

/// Estimated duration of a WAV payload in seconds, from the header's byte
/// rate. Compressed containers would need decoding, so only WAV gets a
/// duration check.
fn wav_duration_secs(bytes: &[u8]) -> Option<f32> {
    if bytes.len() < 44 {
        return None;
    }
    let byte_rate = u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]);
    if byte_rate == 0 {
        return None;
    }
    let data_len = bytes.len().saturating_sub(44) as f32;
    Some(data_len / byte_rate as f32)
}

/// Validate audio input before it enters the pipeline.
///
/// Checks, in order: the global size cap, container detection, the
/// per-format size cap, and (for WAV) the duration cap. Returns the
/// detected format so callers can route the payload.
pub fn validate_audio(bytes: &[u8], config: &AudioConfig) -> Result<AudioFormat, RecognitionError> {
    if bytes.len() as u64 > config.max_file_size {
        return Err(RecognitionError::AudioTooLong(format!(
            "{} bytes exceeds the {} byte cap",
            bytes.len(),
            config.max_file_size
        )));
    }

    let format = AudioFormat::detect(bytes).ok_or_else(|| {
        RecognitionError::AudioFormat("unrecognized audio container".to_string())
    })?;

    let cap = format.size_cap(config);
    if bytes.len() as u64 > cap {
        return Err(RecognitionError::AudioTooLong(format!(
            "{} bytes exceeds the {} byte cap for {:?}",
            bytes.len(),
            cap,
            format
        )));
    }

    if format == AudioFormat::Wav {
        if let Some(duration) = wav_duration_secs(bytes) {
            if duration > config.max_duration_secs as f32 {
                return Err(RecognitionError::AudioTooLong(format!(
                    "{duration:.1}s exceeds the {}s cap",
                    config.max_duration_secs
                )));
            }
        }
    }

    debug!("Validated {} byte {:?} payload", bytes.len(), format);
    Ok(format)
}

/// Check whether a file on disk looks like supported audio.
///
/// Reads only the sniff window, so it is cheap to call before loading the
/// whole payload.
pub fn is_supported_audio_file(file_path: &str) -> bool {
    match File::open(file_path) {
        Ok(file) => {
            let mut reader = BufReader::new(file);
            let mut buffer = vec![0; FORMAT_SNIFF_BYTES];
            match reader.read(&mut buffer) {
                Ok(bytes_read) if bytes_read >= FORMAT_SNIFF_BYTES => {
                    let detected = AudioFormat::detect(&buffer);
                    if let Some(format) = detected {
                        info!("Detected {:?} audio in file: {}", format, file_path);
                    }
                    detected.is_some()
                }
                Ok(bytes_read) => {
                    info!(
                        "File {} too short for format detection ({} bytes)",
                        file_path, bytes_read
                    );
                    false
                }
                Err(e) => {
                    info!("Error reading {} for format detection: {}", file_path, e);
                    false
                }
            }
        }
        Err(e) => {
            info!("Could not open {} for format detection: {}", file_path, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Minimal WAV header: 44 bytes, little-endian byte rate at offset 28.
    fn wav_bytes(byte_rate: u32, data_len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; 44 + data_len];
        bytes[0..4].copy_from_slice(b"RIFF");
        bytes[8..12].copy_from_slice(b"WAVE");
        bytes[28..32].copy_from_slice(&byte_rate.to_le_bytes());
        bytes
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(AudioFormat::detect(&wav_bytes(16000, 0)), Some(AudioFormat::Wav));

        let mut ogg = vec![0u8; 12];
        ogg[0..4].copy_from_slice(b"OggS");
        assert_eq!(AudioFormat::detect(&ogg), Some(AudioFormat::Ogg));

        let mut flac = vec![0u8; 12];
        flac[0..4].copy_from_slice(b"fLaC");
        assert_eq!(AudioFormat::detect(&flac), Some(AudioFormat::Flac));

        let mut m4a = vec![0u8; 12];
        m4a[4..8].copy_from_slice(b"ftyp");
        assert_eq!(AudioFormat::detect(&m4a), Some(AudioFormat::M4a));

        let mut mp3 = vec![0u8; 12];
        mp3[0..3].copy_from_slice(b"ID3");
        assert_eq!(AudioFormat::detect(&mp3), Some(AudioFormat::Mp3));

        assert_eq!(AudioFormat::detect(b"not audio at all"), None);
        assert_eq!(AudioFormat::detect(b"short"), None);
    }

    #[test]
    fn test_validate_accepts_small_wav() {
        let config = AudioConfig::default();
        let bytes = wav_bytes(16000, 16000); // one second of audio
        assert_eq!(validate_audio(&bytes, &config).unwrap(), AudioFormat::Wav);
    }

    #[test]
    fn test_validate_rejects_unknown_container() {
        let config = AudioConfig::default();
        let err = validate_audio(&[0u8; 64], &config).unwrap_err();
        assert!(matches!(err, RecognitionError::AudioFormat(_)));
    }

    #[test]
    fn test_validate_rejects_oversized_payload() {
        let config = AudioConfig {
            max_file_size: 100,
            ..Default::default()
        };
        let bytes = wav_bytes(16000, 200);
        let err = validate_audio(&bytes, &config).unwrap_err();
        assert!(matches!(err, RecognitionError::AudioTooLong(_)));
    }

    #[test]
    fn test_validate_rejects_long_wav() {
        let config = AudioConfig {
            max_duration_secs: 2,
            ..Default::default()
        };
        // 10 seconds at a 16 kB/s byte rate.
        let bytes = wav_bytes(16000, 160_000);
        let err = validate_audio(&bytes, &config).unwrap_err();
        assert!(matches!(err, RecognitionError::AudioTooLong(_)));
    }

    #[test]
    fn test_file_sniffing() {
        let mut wav_file = tempfile::NamedTempFile::new().unwrap();
        wav_file.write_all(&wav_bytes(16000, 100)).unwrap();
        assert!(is_supported_audio_file(wav_file.path().to_str().unwrap()));

        let mut text_file = tempfile::NamedTempFile::new().unwrap();
        text_file.write_all(b"definitely not audio data").unwrap();
        assert!(!is_supported_audio_file(text_file.path().to_str().unwrap()));

        assert!(!is_supported_audio_file("/nonexistent/audio.wav"));
    }
}
