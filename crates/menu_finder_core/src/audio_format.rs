//! crates/menu_finder_core/src/audio_format.rs
//!
//! Picks the encoding and sample rate to request from the speech provider.
//! The file's magic bytes win over whatever content type the uploader declared.

use crate::domain::{AudioEncoding, AudioFormat};
use tracing::debug;

/// Minimum number of bytes needed before sniffing is attempted.
const SNIFF_LEN: usize = 12;

const WEBM_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
const OGG_MAGIC: &[u8; 4] = b"OggS";
const RIFF_MAGIC: &[u8; 4] = b"RIFF";
const WAVE_MAGIC: &[u8; 4] = b"WAVE";
const FLAC_MAGIC: &[u8; 4] = b"fLaC";

/// Determines the encoding for an upload. Always returns a usable format,
/// defaulting to 16 kHz LINEAR16.
pub fn detect_encoding(audio: &[u8], content_type: Option<&str>) -> AudioFormat {
    if let Some(encoding) = sniff_encoding(audio) {
        debug!(%encoding, "Audio format detected from file content");
        return encoding.into();
    }

    let encoding = content_type
        .map(encoding_from_content_type)
        .unwrap_or(AudioEncoding::Linear16);
    debug!(%encoding, content_type = ?content_type, "Audio format taken from declared content type");
    encoding.into()
}

/// Inspects the leading magic bytes. Returns `None` for short or unknown input.
pub fn sniff_encoding(audio: &[u8]) -> Option<AudioEncoding> {
    if audio.len() < SNIFF_LEN {
        return None;
    }

    let head = &audio[0..4];
    if head == WEBM_MAGIC {
        Some(AudioEncoding::WebmOpus)
    } else if head == OGG_MAGIC {
        Some(AudioEncoding::OggOpus)
    } else if head == RIFF_MAGIC && &audio[8..12] == WAVE_MAGIC {
        Some(AudioEncoding::Linear16)
    } else if head == FLAC_MAGIC {
        Some(AudioEncoding::Flac)
    } else {
        None
    }
}

/// Maps a declared MIME type onto an encoding by case-insensitive substring match.
pub fn encoding_from_content_type(content_type: &str) -> AudioEncoding {
    let content_type = content_type.to_lowercase();

    if content_type.contains("wav") {
        AudioEncoding::Linear16
    } else if content_type.contains("flac") {
        AudioEncoding::Flac
    } else if content_type.contains("mp3") {
        AudioEncoding::Mp3
    } else if content_type.contains("webm") {
        AudioEncoding::WebmOpus
    } else if content_type.contains("ogg") || content_type.contains("opus") {
        AudioEncoding::OggOpus
    } else {
        AudioEncoding::Linear16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(magic: &[u8]) -> Vec<u8> {
        let mut bytes = magic.to_vec();
        bytes.resize(32, 0);
        bytes
    }

    fn wav_header() -> Vec<u8> {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0x24, 0x08, 0x00, 0x00]);
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.resize(44, 0);
        bytes
    }

    #[test]
    fn webm_magic_wins_over_declared_wav() {
        let format = detect_encoding(&padded(&WEBM_MAGIC), Some("audio/wav"));
        assert_eq!(format.encoding, AudioEncoding::WebmOpus);
        assert_eq!(format.sample_rate_hz, 48_000);
    }

    #[test]
    fn ogg_magic_wins_over_declared_mp3() {
        let format = detect_encoding(&padded(b"OggS"), Some("audio/mpeg; codecs=mp3"));
        assert_eq!(format.encoding, AudioEncoding::OggOpus);
        assert_eq!(format.sample_rate_hz, 48_000);
    }

    #[test]
    fn riff_wave_header_is_linear16_even_when_declared_webm() {
        let format = detect_encoding(&wav_header(), Some("audio/webm"));
        assert_eq!(format.encoding, AudioEncoding::Linear16);
        assert_eq!(format.sample_rate_hz, 16_000);
    }

    #[test]
    fn riff_without_wave_marker_is_not_sniffed() {
        let mut bytes = b"RIFF\0\0\0\0AVI LIST".to_vec();
        bytes.resize(32, 0);
        assert_eq!(sniff_encoding(&bytes), None);
        assert_eq!(
            detect_encoding(&bytes, Some("audio/ogg")).encoding,
            AudioEncoding::OggOpus
        );
    }

    #[test]
    fn flac_magic_wins_over_missing_content_type() {
        let format = detect_encoding(&padded(b"fLaC"), None);
        assert_eq!(format.encoding, AudioEncoding::Flac);
        assert_eq!(format.sample_rate_hz, 16_000);
    }

    #[test]
    fn short_input_is_never_sniffed() {
        // A complete WEBM magic, but under twelve bytes in total.
        let bytes = [0x1A, 0x45, 0xDF, 0xA3, 0, 0, 0, 0];
        assert_eq!(sniff_encoding(&bytes), None);

        let format = detect_encoding(&bytes, Some("audio/wav"));
        assert_eq!(format.encoding, AudioEncoding::Linear16);
        assert_eq!(format.sample_rate_hz, 16_000);
    }

    #[test]
    fn empty_input_without_content_type_defaults_to_linear16() {
        let format = detect_encoding(&[], None);
        assert_eq!(format, AudioFormat::from(AudioEncoding::Linear16));
    }

    #[test]
    fn unknown_bytes_without_content_type_default_to_linear16() {
        let format = detect_encoding(&[0x55; 64], None);
        assert_eq!(format.encoding, AudioEncoding::Linear16);
        assert_eq!(format.sample_rate_hz, 16_000);
    }

    #[test]
    fn declared_types_map_case_insensitively() {
        let cases = [
            ("audio/x-wav", AudioEncoding::Linear16, 16_000),
            ("AUDIO/FLAC", AudioEncoding::Flac, 16_000),
            ("audio/mp3", AudioEncoding::Mp3, 16_000),
            ("audio/WebM;codecs=opus", AudioEncoding::WebmOpus, 48_000),
            ("audio/ogg", AudioEncoding::OggOpus, 48_000),
            ("audio/opus", AudioEncoding::OggOpus, 48_000),
            ("application/octet-stream", AudioEncoding::Linear16, 16_000),
        ];

        for (content_type, encoding, rate) in cases {
            let format = detect_encoding(b"not audio", Some(content_type));
            assert_eq!(format.encoding, encoding, "content type {content_type}");
            assert_eq!(format.sample_rate_hz, rate, "content type {content_type}");
        }
    }

    #[test]
    fn encodings_serialize_to_provider_names() {
        assert_eq!(
            serde_json::to_string(&AudioEncoding::WebmOpus).unwrap(),
            "\"WEBM_OPUS\""
        );
        assert_eq!(
            serde_json::to_string(&AudioEncoding::Linear16).unwrap(),
            "\"LINEAR16\""
        );
        assert_eq!(AudioEncoding::OggOpus.to_string(), "OGG_OPUS");
    }
}
