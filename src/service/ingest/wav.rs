use std::io::Cursor;
use std::time::Duration;

use hound::{SampleFormat, WavReader, WavWriter};

use crate::shared::error::IngestError;

pub fn looks_like_wav(content_type: &str, bytes: &[u8]) -> bool {
    matches!(
        content_type,
        "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave"
    ) || (bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE")
}

/// Cuts a WAV file down to `max` of audio, keeping its format.
///
/// Returns `Ok(None)` when the file is already short enough.
pub fn trim_wav(bytes: &[u8], max: Duration) -> Result<Option<Vec<u8>>, IngestError> {
    let mut reader =
        WavReader::new(Cursor::new(bytes)).map_err(|e| IngestError::InvalidAudio(e.to_string()))?;
    let spec = reader.spec();
    let max_frames = (spec.sample_rate as f64 * max.as_secs_f64()).floor() as u64;
    if u64::from(reader.duration()) <= max_frames {
        return Ok(None);
    }
    let keep = (max_frames * u64::from(spec.channels)) as usize;

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            WavWriter::new(&mut cursor, spec).map_err(|e| IngestError::InvalidAudio(e.to_string()))?;
        match spec.sample_format {
            SampleFormat::Float => {
                for s in reader.samples::<f32>().take(keep) {
                    let s = s.map_err(|e| IngestError::InvalidAudio(e.to_string()))?;
                    writer
                        .write_sample(s)
                        .map_err(|e| IngestError::InvalidAudio(e.to_string()))?;
                }
            }
            SampleFormat::Int => {
                for s in reader.samples::<i32>().take(keep) {
                    let s = s.map_err(|e| IngestError::InvalidAudio(e.to_string()))?;
                    writer
                        .write_sample(s)
                        .map_err(|e| IngestError::InvalidAudio(e.to_string()))?;
                }
            }
        }
        writer
            .finalize()
            .map_err(|e| IngestError::InvalidAudio(e.to_string()))?;
    }
    log::debug!(
        "[ingest] trimmed wav from {} to {} frames",
        reader.duration(),
        max_frames
    );
    Ok(Some(cursor.into_inner()))
}

#[cfg(test)]
pub(crate) fn sine_wav(sample_rate: u32, seconds: f64) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        let frames = (sample_rate as f64 * seconds) as u32;
        for i in 0..frames {
            let t = i as f64 / sample_rate as f64;
            let v = (t * 440.0 * std::f64::consts::TAU).sin() * 8000.0;
            writer.write_sample(v as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_wav_is_cut_to_cap() {
        let bytes = sine_wav(8_000, 7.0);
        let trimmed = trim_wav(&bytes, Duration::from_secs(5)).unwrap().unwrap();
        let reader = WavReader::new(Cursor::new(trimmed)).unwrap();
        assert_eq!(reader.duration(), 40_000);
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.spec().bits_per_sample, 16);
    }

    #[test]
    fn short_wav_is_left_alone() {
        let bytes = sine_wav(16_000, 1.5);
        assert!(trim_wav(&bytes, Duration::from_secs(5)).unwrap().is_none());
    }

    #[test]
    fn garbage_is_invalid_audio() {
        let err = trim_wav(b"RIFF----WAVEnope", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, IngestError::InvalidAudio(_)));
    }

    #[test]
    fn detects_wav_by_type_or_magic() {
        assert!(looks_like_wav("audio/wav", b""));
        assert!(looks_like_wav("application/octet-stream", &sine_wav(8_000, 0.01)));
        assert!(!looks_like_wav("audio/webm", b"\x1aE\xdf\xa3"));
    }
}
