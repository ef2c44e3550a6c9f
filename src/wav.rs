use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec};

use crate::{Error, Result};

/// Byte offset of the sample-rate field in a canonical WAV header.
pub const SAMPLE_RATE_OFFSET: u64 = 24;

/// Minimum number of bytes a source needs for the sample-rate field to be present.
pub const MIN_HEADER_LEN: u64 = SAMPLE_RATE_OFFSET + 4;

/// Read the sample rate from a WAV header.
///
/// We seek to byte 24 and decode the next 4 bytes as a little-endian `u32`. Nothing else in the
/// header is looked at, so a non-WAV source yields whatever happens to sit at that offset.
///
/// The reader is left positioned after the field. Callers that want the full content must
/// re-open or rewind.
pub fn read_sample_rate<R>(mut reader: R) -> Result<u32>
where
    R: Read + Seek,
{
    reader
        .seek(SeekFrom::Start(SAMPLE_RATE_OFFSET))
        .map_err(|err| Error::io("failed to seek to sample rate", err))?;

    // `read_exact` fails with `UnexpectedEof` on short sources instead of returning a partial
    // (zero-padded) value.
    let mut bytes = [0u8; 4];
    reader
        .read_exact(&mut bytes)
        .map_err(|err| Error::io("failed to read sample rate bytes", err))?;

    Ok(u32::from_le_bytes(bytes))
}

/// Open `path`, read its sample rate, and close the handle before returning.
pub fn sample_rate_from_path(path: impl AsRef<Path>) -> Result<u32> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|err| Error::io(format!("failed to open WAV file '{}'", path.display()), err))?;

    read_sample_rate(file)
}

/// Read the whole audio file for transmission.
///
/// This always goes through a fresh handle, so an earlier header read cannot affect it.
pub fn read_audio_content(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path)
        .map_err(|err| Error::io(format!("failed to read audio file '{}'", path.display()), err))
}

/// Check that `content` is a 16-bit linear PCM WAV whose header agrees with `sample_rate`.
///
/// This is opt-in hardening. The default pipeline trusts the offset-24 value as-is.
pub fn validate_wav(content: &[u8], sample_rate: u32) -> Result<WavSpec> {
    let reader = WavReader::new(Cursor::new(content))
        .map_err(|err| Error::InvalidWav(format!("failed to parse WAV header: {err}")))?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(Error::InvalidWav(format!(
            "expected 16-bit linear PCM, got {:?} with {} bits per sample",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    if spec.sample_rate != sample_rate {
        return Err(Error::InvalidWav(format!(
            "header sample rate {} Hz does not match the {} Hz read at offset {}",
            spec.sample_rate, sample_rate, SAMPLE_RATE_OFFSET
        )));
    }

    Ok(spec)
}
