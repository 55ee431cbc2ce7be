//! Media type sniffing via the image and audio decoders

use anyhow::{Context, Result};
use image::ImageReader;
use lofty::file::FileType;
use lofty::prelude::*;
use lofty::probe::Probe;
use std::io::Cursor;

const OCTET_STREAM: &str = "application/octet-stream";

/// What a widget stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

/// Best-effort MIME type of a payload
///
/// Unknown payloads are still accepted and tagged as an octet stream; whether
/// they can be shown or played is decided when they are opened.
pub fn sniff_media_type(kind: MediaKind, data: &[u8]) -> String {
    let sniffed = match kind {
        MediaKind::Image => image::guess_format(data)
            .ok()
            .map(|format| format.to_mime_type()),
        MediaKind::Audio => Probe::new(Cursor::new(data))
            .guess_file_type()
            .ok()
            .and_then(|probe| probe.file_type())
            .and_then(audio_mime_type),
    };
    sniffed.unwrap_or(OCTET_STREAM).to_string()
}

fn audio_mime_type(file_type: FileType) -> Option<&'static str> {
    let mime = match file_type {
        FileType::Aac => "audio/aac",
        FileType::Aiff => "audio/aiff",
        FileType::Flac => "audio/flac",
        FileType::Mpeg => "audio/mpeg",
        FileType::Mp4 => "audio/mp4",
        FileType::Opus => "audio/opus",
        FileType::Vorbis => "audio/ogg",
        FileType::Wav => "audio/wav",
        _ => return None,
    };
    Some(mime)
}

/// Pixel dimensions of an image payload, reading only its header
pub fn image_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("Failed to guess image format")?
        .into_dimensions()
        .context("Failed to read image dimensions")
}

/// Duration of an audio payload in seconds
pub fn track_duration(data: &[u8]) -> Result<f64> {
    let tagged_file = Probe::new(Cursor::new(data))
        .guess_file_type()
        .context("Failed to guess audio format")?
        .read()
        .context("Failed to read audio file")?;

    let duration = tagged_file.properties().duration().as_secs_f64();
    if duration <= 0.0 {
        anyhow::bail!("Audio file reports no duration");
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbImage::new(width, height)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_sniff_png() {
        let data = png_bytes(4, 3);
        assert_eq!(sniff_media_type(MediaKind::Image, &data), "image/png");
    }

    #[test]
    fn test_sniff_unknown_falls_back() {
        assert_eq!(
            sniff_media_type(MediaKind::Image, b"plain text"),
            OCTET_STREAM
        );
        assert_eq!(
            sniff_media_type(MediaKind::Audio, b"plain text"),
            OCTET_STREAM
        );
    }

    #[test]
    fn test_image_dimensions() {
        let data = png_bytes(16, 9);
        assert_eq!(image_dimensions(&data).unwrap(), (16, 9));
        assert!(image_dimensions(b"nope").is_err());
    }

    #[test]
    fn test_duration_of_garbage_fails() {
        assert!(track_duration(b"definitely not audio").is_err());
    }
}
